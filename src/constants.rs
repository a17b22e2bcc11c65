// src/constants.rs
//! Per-draw shader constants.
//!
//! `DynamicConstants` is the typed form; `GpuDrawConstants` is the same data
//! packed into 16-byte registers, ready to be uploaded with `bytemuck`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::config::ShadingConfig;
use crate::context::OptionContext;
use crate::error::{Error, Result};
use crate::lighting::{LightState, PackedLight, MAX_LIGHTS};
use crate::params::ParameterSet;
use crate::pbr_materials::{effective_tint, PbrParams};
use crate::render_context::{DrawContext, FogState};
use crate::shadows::{
    hash_shadow_2d_jitter, shadow_atten_from_state, shadow_filter_from_state, ShadowFilter,
};
use crate::snapshot::MaterialSnapshot;

pub const MIN_ENV_MAP_LOD: f32 = 4.0;
pub const MAX_ENV_MAP_LOD: f32 = 12.0;

/// Mip LOD bias for an environment map of the given base width.
#[inline]
pub fn env_map_lod_bias(width: u32) -> f32 {
    (width.max(1).ilog2() as f32).clamp(MIN_ENV_MAP_LOD, MAX_ENV_MAP_LOD)
}

/// `[end/(end-start), fog_z, max_density, 1/(end-start)]`.
pub fn pack_fog_params(fog: &FogState) -> [f32; 4] {
    let range = fog.end - fog.start;
    let (scale, inv_range) = if range.abs() > f32::EPSILON {
        (fog.end / range, 1.0 / range)
    } else {
        (0.0, 0.0)
    };
    [scale, fog.fog_z, fog.max_density.clamp(0.0, 1.0), inv_range]
}

/// Projected light (flashlight) constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedLightBlock {
    pub world_to_texture: Mat4,
    /// constant, linear, quadratic, far z
    pub attenuation: [f32; 4],
    pub origin: Vec3,
    pub filter: ShadowFilter,
    /// filter size, shadow atten, jitter u, jitter v
    pub shadow_tweaks: [f32; 4],
    pub shadows_active: bool,
    pub cookie_frame: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicConstants {
    /// xyz = camera position, w = environment map LOD bias.
    pub eye_pos_lod: Vec4,
    pub base_tint: Vec3,
    /// Albedo texture coordinate transform.
    pub base_texture_transform: Mat4,
    pub diffuse_modulation: Vec4,
    pub fog_params: [f32; 4],
    pub fog_color: Vec3,
    pub lights: LightState,
    pub projected: Option<ProjectedLightBlock>,
}

pub fn build_dynamic_constants(
    snapshot: &MaterialSnapshot,
    params: &ParameterSet,
    handles: &PbrParams,
    draw: &DrawContext<'_>,
    config: &ShadingConfig,
) -> Result<DynamicConstants> {
    let features = &snapshot.features;

    let lod = match params.texture(handles.env_map) {
        Some(env) if features.has_env_map => env_map_lod_bias(env.width),
        _ => 0.0,
    };

    let base_tint = effective_tint(params, handles);
    let modulation = params.vec3(handles.color2) * draw.lightmap_scale;

    let projected = if features.flashlight_active {
        let light = draw.flashlight.or_fail(Error::MissingFlashlightState)?;
        let caps = &snapshot.context.caps;
        let (jitter_u, jitter_v) = hash_shadow_2d_jitter(light.shadow_jitter_seed);
        Some(ProjectedLightBlock {
            world_to_texture: light.world_to_texture,
            attenuation: light.attenuation(),
            origin: light.origin,
            filter: ShadowFilter::from_mode(snapshot.key().shadow_filter_mode),
            shadow_tweaks: [
                shadow_filter_from_state(light, config.shadow_map_reference_resolution),
                shadow_atten_from_state(light, caps.uses_srgb_correct_blending),
                jitter_u,
                jitter_v,
            ],
            shadows_active: light.shadows_active() && caps.shadow_depth_textures,
            cookie_frame: match light.spotlight_texture {
                Some(_) => light.spotlight_texture_frame,
                None => params.int(handles.flashlight_texture_frame),
            },
        })
    } else {
        None
    };

    Ok(DynamicConstants {
        eye_pos_lod: draw.camera_position.extend(lod),
        base_tint,
        base_texture_transform: params.matrix(handles.base_texture_transform),
        diffuse_modulation: modulation.extend(1.0),
        fog_params: pack_fog_params(&draw.fog),
        fog_color: draw.fog.color,
        lights: LightState::gather(draw.lights, draw.ambient_cube, features.is_lightmapped),
        projected,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Upload layout
// ─────────────────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuDrawConstants {
    pub eye_pos_lod: [f32; 4],
    pub base_tint: [f32; 4],
    pub base_texture_transform: [[f32; 4]; 4],
    pub diffuse_modulation: [f32; 4],
    pub fog_params: [f32; 4],
    pub fog_color: [f32; 4],
    /// num lights, ambient present, shadows active, filter mode
    pub counts: [u32; 4],
    pub ambient_cube: [[f32; 4]; 6],
    pub lights: [PackedLight; MAX_LIGHTS],
    pub flashlight_world_to_texture: [[f32; 4]; 4],
    pub flashlight_atten: [f32; 4],
    pub flashlight_origin: [f32; 4],
    pub shadow_tweaks: [f32; 4],
}

impl DynamicConstants {
    pub fn to_gpu(&self) -> GpuDrawConstants {
        let mut gpu = GpuDrawConstants::zeroed();
        gpu.eye_pos_lod = self.eye_pos_lod.to_array();
        gpu.base_tint = self.base_tint.extend(1.0).to_array();
        gpu.base_texture_transform = self.base_texture_transform.to_cols_array_2d();
        gpu.diffuse_modulation = self.diffuse_modulation.to_array();
        gpu.fog_params = self.fog_params;
        gpu.fog_color = self.fog_color.extend(1.0).to_array();
        gpu.counts[0] = self.lights.num_lights;
        gpu.counts[1] = self.lights.ambient_present as u32;
        gpu.ambient_cube = self.lights.ambient_cube.packed();
        gpu.lights = self.lights.lights;
        if let Some(block) = &self.projected {
            gpu.counts[2] = block.shadows_active as u32;
            gpu.counts[3] = block.filter as u32;
            gpu.flashlight_world_to_texture = block.world_to_texture.to_cols_array_2d();
            gpu.flashlight_atten = block.attenuation;
            gpu.flashlight_origin = block.origin.extend(1.0).to_array();
            gpu.shadow_tweaks = block.shadow_tweaks;
        }
        gpu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lod_bias_is_clamped() {
        assert_eq!(env_map_lod_bias(256), 8.0);
        assert_eq!(env_map_lod_bias(8), MIN_ENV_MAP_LOD);
        assert_eq!(env_map_lod_bias(1), MIN_ENV_MAP_LOD);
        assert_eq!(env_map_lod_bias(0), MIN_ENV_MAP_LOD);
        assert_eq!(env_map_lod_bias(16384), MAX_ENV_MAP_LOD);
        assert_eq!(env_map_lod_bias(4096), 12.0);
        assert_eq!(env_map_lod_bias(300), 8.0);
    }

    #[test]
    fn fog_packing() {
        let fog = FogState {
            start: 100.0,
            end: 500.0,
            max_density: 1.5,
            fog_z: 32.0,
            ..Default::default()
        };
        assert_eq!(pack_fog_params(&fog), [1.25, 32.0, 1.0, 1.0 / 400.0]);

        let degenerate = FogState { start: 50.0, end: 50.0, ..Default::default() };
        let packed = pack_fog_params(&degenerate);
        assert_eq!(packed[0], 0.0);
        assert_eq!(packed[3], 0.0);
    }

    #[test]
    fn gpu_layout_is_register_aligned() {
        assert_eq!(std::mem::size_of::<GpuDrawConstants>() % 16, 0);
        let gpu = GpuDrawConstants::zeroed();
        assert_eq!(bytemuck::bytes_of(&gpu).len(), std::mem::size_of::<GpuDrawConstants>());
    }
}
