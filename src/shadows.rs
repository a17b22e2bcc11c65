// src/shadows.rs
// Projected light (flashlight) state and the shadow tweak helpers that feed the
// projected light block.
//
// The renderer owns the flashlight and its depth texture; this file only reads
// them and derives the handful of scalars the pixel shader needs.

use glam::{Mat4, Vec3};

use crate::params::TextureRef;

/// Size of the screen-space shadow noise texture the jitter indexes into.
const SHADOW_NOISE_RES: i32 = 32;

/// Depth filtering modes reported by the device, in static-combo order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ShadowFilter {
    /// Hardware PCF on a depth format.
    #[default]
    Hardware = 0,
    /// Vendor depth format fetched and filtered in the shader.
    VendorFetch = 1,
    /// Generic depth-as-color fallback.
    Generic = 2,
}

impl ShadowFilter {
    pub const MAX: u8 = 2;

    pub fn from_mode(mode: u8) -> Self {
        match mode {
            0 => ShadowFilter::Hardware,
            1 => ShadowFilter::VendorFetch,
            _ => ShadowFilter::Generic,
        }
    }
}

/// State of the projected light affecting a draw.
#[derive(Clone, Debug, PartialEq)]
pub struct FlashlightState {
    pub world_to_texture: Mat4,
    pub origin: Vec3,
    pub constant_atten: f32,
    pub linear_atten: f32,
    pub quadratic_atten: f32,
    pub far_z: f32,
    /// The light's own cookie; the material's cookie is used when absent.
    pub spotlight_texture: Option<TextureRef>,
    pub spotlight_texture_frame: i32,
    pub enable_shadows: bool,
    pub shadow_depth_texture: Option<TextureRef>,
    pub shadow_jitter_seed: f32,
    /// Penumbra size in texels of the reference shadow map resolution.
    pub shadow_filter_size: f32,
    pub shadow_atten: f32,
}

impl Default for FlashlightState {
    fn default() -> Self {
        Self {
            world_to_texture: Mat4::IDENTITY,
            origin: Vec3::ZERO,
            constant_atten: 0.0,
            linear_atten: 0.0,
            quadratic_atten: 1.0,
            far_z: 1000.0,
            spotlight_texture: None,
            spotlight_texture_frame: 0,
            enable_shadows: false,
            shadow_depth_texture: None,
            shadow_jitter_seed: 0.0,
            shadow_filter_size: 3.0,
            shadow_atten: 0.0,
        }
    }
}

impl FlashlightState {
    /// Shadows are sampled only with shadows enabled *and* a depth texture.
    #[inline]
    pub fn shadows_active(&self) -> bool {
        self.enable_shadows && self.shadow_depth_texture.is_some()
    }

    #[inline]
    pub fn attenuation(&self) -> [f32; 4] {
        [self.constant_atten, self.linear_atten, self.quadratic_atten, self.far_z]
    }
}

/// Penumbra filter size normalised to the reference shadow map resolution.
#[inline]
pub fn shadow_filter_from_state(state: &FlashlightState, reference_resolution: f32) -> f32 {
    state.shadow_filter_size / reference_resolution
}

#[inline]
pub fn shadow_atten_from_state(state: &FlashlightState, srgb_correct_blending: bool) -> f32 {
    if srgb_correct_blending {
        state.shadow_atten * 0.1
    } else {
        state.shadow_atten
    }
}

/// Hash a jitter seed into a texel offset of the 32x32 noise grid.
///
/// Only the fractional part of the seed matters; the result is `(row, col)`
/// in `[0, 1)`.
pub fn hash_shadow_2d_jitter(seed: f32) -> (f32, f32) {
    let frac = seed.rem_euclid(1.0);
    let cell = (frac * (SHADOW_NOISE_RES * SHADOW_NOISE_RES) as f32) as i32;
    let cell = cell.clamp(0, SHADOW_NOISE_RES * SHADOW_NOISE_RES - 1);
    let row = cell / SHADOW_NOISE_RES;
    let col = cell % SHADOW_NOISE_RES;
    (
        row as f32 / SHADOW_NOISE_RES as f32,
        col as f32 / SHADOW_NOISE_RES as f32,
    )
}
