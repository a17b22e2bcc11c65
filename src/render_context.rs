// src/render_context.rs
//! Inputs supplied by the renderer.
//!
//! - `RenderContext`: snapshot-time state (hardware capabilities, whether this
//!   is a projected-light pass). Hashable, so snapshots can be cached per context.
//! - `DrawContext`: live per-draw state (camera, fog, lights, projected light,
//!   debug overrides). Borrowed for one draw and never stored.

use glam::Vec3;

use crate::lighting::{AmbientCube, LightDesc};
use crate::params::MaterialFlags;
use crate::shadows::FlashlightState;

/// Device capabilities queried from the graphics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareCaps {
    pub supports_border_color: bool,
    pub supports_cubemaps: bool,
    pub hdr_enabled: bool,
    /// Vendor/format dependent depth filtering mode for shadow maps (0..=2).
    pub shadow_filter_mode: u8,
    /// sRGB-correct blending makes shadows look lighter; attenuation compensates.
    pub uses_srgb_correct_blending: bool,
    /// The renderer can produce shadow depth textures at all.
    pub shadow_depth_textures: bool,
}

impl Default for HardwareCaps {
    fn default() -> Self {
        Self {
            supports_border_color: true,
            supports_cubemaps: true,
            hdr_enabled: false,
            shadow_filter_mode: 0,
            uses_srgb_correct_blending: false,
            shadow_depth_textures: true,
        }
    }
}

/// State that is fixed for the lifetime of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderContext {
    pub caps: HardwareCaps,
    /// A projected light (flashlight) affects the draws of this snapshot.
    pub flashlight_active: bool,
}

impl RenderContext {
    pub fn new(caps: HardwareCaps) -> Self {
        Self {
            caps,
            flashlight_active: false,
        }
    }

    pub fn with_flashlight(mut self, active: bool) -> Self {
        self.flashlight_active = active;
        self
    }
}

/// Scene fog mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FogMode {
    #[default]
    None,
    Linear,
    /// Linear fog below a water plane at `fog_z`.
    LinearBelowFogZ,
}

impl FogMode {
    /// Water fog index used by the vertex shader.
    #[inline]
    pub fn water_fog_index(self) -> u32 {
        match self {
            FogMode::LinearBelowFogZ => 1,
            _ => 0,
        }
    }

    /// Pixel fog type combo: height fog under water, range fog otherwise.
    #[inline]
    pub fn pixel_fog_type(self) -> u32 {
        match self {
            FogMode::LinearBelowFogZ => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FogState {
    pub mode: FogMode,
    pub start: f32,
    pub end: f32,
    pub max_density: f32,
    /// Water plane height for `LinearBelowFogZ`.
    pub fog_z: f32,
    pub color: Vec3,
}

/// Process-wide debug toggles, sampled fresh for every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugOverrides {
    /// 0 = off, 1 = fullbright, 2 = diffuse lighting only.
    pub fullbright: u8,
    /// `false` rebinds the environment map to black.
    pub specular: bool,
}

impl Default for DebugOverrides {
    fn default() -> Self {
        Self {
            fullbright: 0,
            specular: true,
        }
    }
}

impl DebugOverrides {
    /// Albedo replaced by neutral grey, unless the material opts out.
    #[inline]
    pub fn lighting_only(&self, flags: MaterialFlags) -> bool {
        self.fullbright == 2 && !flags.contains(MaterialFlags::NO_DEBUG_OVERRIDE)
    }

    #[inline]
    pub fn specular_disabled(&self) -> bool {
        !self.specular
    }
}

/// Everything one draw needs beyond the cached snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    pub camera_position: Vec3,
    pub fog: FogState,
    /// Active lights, forwarded verbatim. Only the first `MAX_LIGHTS` are used.
    pub lights: &'a [LightDesc],
    /// `None` when no ambient light reaches this draw.
    pub ambient_cube: Option<AmbientCube>,
    pub lightmap_scale: f32,
    pub bone_count: u32,
    pub fixed_lighting_preview: bool,
    pub vertex_compression: bool,
    /// The renderer asks opaque surfaces to write depth into destination alpha.
    pub write_depth_to_alpha: bool,
    pub flashlight: Option<&'a FlashlightState>,
    pub debug: DebugOverrides,
}

impl Default for DrawContext<'_> {
    fn default() -> Self {
        Self {
            camera_position: Vec3::ZERO,
            fog: FogState::default(),
            lights: &[],
            ambient_cube: None,
            lightmap_scale: 1.0,
            bone_count: 0,
            fixed_lighting_preview: false,
            vertex_compression: false,
            write_depth_to_alpha: false,
            flashlight: None,
            debug: DebugOverrides::default(),
        }
    }
}
