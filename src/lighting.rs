// src/lighting.rs
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Maximum number of dynamic lights a single draw forwards to the shader.
pub const MAX_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum LightType {
    #[default]
    Point = 0,
    Spot = 1,
    Directional = 2,
}

/// A light as described by the scene's lighting context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDesc {
    pub light_type: LightType,
    pub color: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    pub attenuation: [f32; 3],
    /// Cosines of the inner/outer spot cone angles.
    pub spot_cos_inner: f32,
    pub spot_cos_outer: f32,
}

impl Default for LightDesc {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Vec3::ONE,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            range: 0.0,
            attenuation: [1.0, 0.0, 0.0],
            spot_cos_inner: 1.0,
            spot_cos_outer: 0.0,
        }
    }
}

/// Four vec4s per light, matching the pixel shader's light info array.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedLight {
    /// rgb = color, w = light type
    pub color: [f32; 4],
    /// xyz = direction, w = cos(inner)
    pub direction: [f32; 4],
    /// xyz = position, w = cos(outer)
    pub position: [f32; 4],
    /// constant, linear, quadratic, range
    pub attenuation: [f32; 4],
}

impl PackedLight {
    pub fn pack(light: &LightDesc) -> Self {
        Self {
            color: light.color.extend(light.light_type as u32 as f32).to_array(),
            direction: light.direction.extend(light.spot_cos_inner).to_array(),
            position: light.position.extend(light.spot_cos_outer).to_array(),
            attenuation: [
                light.attenuation[0],
                light.attenuation[1],
                light.attenuation[2],
                light.range,
            ],
        }
    }
}

/// Ambient light cube: one color per axis direction (+x, -x, +y, -y, +z, -z).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AmbientCube(pub [Vec3; 6]);

impl AmbientCube {
    pub const BLACK: Self = Self([Vec3::ZERO; 6]);

    pub fn uniform(color: Vec3) -> Self {
        Self([color; 6])
    }

    pub fn is_black(&self) -> bool {
        self.0.iter().all(|c| *c == Vec3::ZERO)
    }

    pub fn packed(&self) -> [[f32; 4]; 6] {
        let mut out = [[0.0; 4]; 6];
        for (dst, src) in out.iter_mut().zip(self.0.iter()) {
            *dst = src.extend(0.0).to_array();
        }
        out
    }
}

/// Per-draw lighting payload: fixed size, no allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub num_lights: u32,
    pub lights: [PackedLight; MAX_LIGHTS],
    pub ambient_cube: AmbientCube,
    /// The ambient cube carries actual light for this draw.
    pub ambient_present: bool,
}

impl LightState {
    pub const NONE: Self = Self {
        num_lights: 0,
        lights: [PackedLight {
            color: [0.0; 4],
            direction: [0.0; 4],
            position: [0.0; 4],
            attenuation: [0.0; 4],
        }; MAX_LIGHTS],
        ambient_cube: AmbientCube::BLACK,
        ambient_present: false,
    };

    /// Forward the context's lights and ambient cube.
    ///
    /// Lightmapped surfaces get their diffuse lighting from the lightmap, so
    /// dynamic lights and ambient are forced off for them.
    pub fn gather(lights: &[LightDesc], ambient: Option<AmbientCube>, lightmapped: bool) -> Self {
        if lightmapped {
            return Self::NONE;
        }
        let mut state = Self::NONE;
        let count = lights.len().min(MAX_LIGHTS);
        if lights.len() > MAX_LIGHTS {
            log::trace!("dropping {} lights beyond the per-draw limit", lights.len() - MAX_LIGHTS);
        }
        for (dst, src) in state.lights.iter_mut().zip(&lights[..count]) {
            *dst = PackedLight::pack(src);
        }
        state.num_lights = count as u32;
        if let Some(cube) = ambient {
            state.ambient_cube = cube;
            state.ambient_present = true;
        }
        state
    }
}
