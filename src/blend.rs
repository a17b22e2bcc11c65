// src/blend.rs
//! Blend & opacity classification.
//!
//! The blend category is decided at snapshot time from the albedo alpha and
//! the material's translucency flags. Per draw, a fully opaque surface may
//! repurpose its destination alpha for depth or for water fog, never both.

use crate::error::{Error, Result};
use crate::features::FeatureFlags;
use crate::render_context::FogMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendCategory {
    Opaque,
    AdditiveBlend,
    StandardBlend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Fixed-function blend state recorded in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub enabled: bool,
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub depth_write: bool,
}

impl BlendState {
    pub const OPAQUE: Self = Self {
        enabled: false,
        src: BlendFactor::One,
        dst: BlendFactor::Zero,
        depth_write: true,
    };
}

/// Whether alpha from the albedo or the vertices makes the surface see-through.
#[inline]
fn is_translucent(flags: &FeatureFlags) -> bool {
    flags.translucent
        || flags.vertex_alpha
        || (flags.has_albedo && flags.albedo_translucent && !flags.alpha_tested)
}

pub fn classify_blend(flags: &FeatureFlags) -> BlendCategory {
    if flags.additive {
        BlendCategory::AdditiveBlend
    } else if is_translucent(flags) {
        BlendCategory::StandardBlend
    } else {
        BlendCategory::Opaque
    }
}

#[inline]
pub fn is_fully_opaque(category: BlendCategory, alpha_tested: bool) -> bool {
    category == BlendCategory::Opaque && !alpha_tested
}

pub fn blend_state(category: BlendCategory, flags: &FeatureFlags) -> BlendState {
    match category {
        BlendCategory::Opaque => BlendState::OPAQUE,
        BlendCategory::StandardBlend => BlendState {
            enabled: true,
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
            depth_write: false,
        },
        BlendCategory::AdditiveBlend => BlendState {
            enabled: true,
            // Translucent additive surfaces still fade by alpha.
            src: if is_translucent(flags) {
                BlendFactor::SrcAlpha
            } else {
                BlendFactor::One
            },
            dst: BlendFactor::One,
            depth_write: false,
        },
    }
}

/// What the destination alpha channel carries for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DestAlpha {
    #[default]
    Untouched,
    Depth,
    WaterFog,
}

impl DestAlpha {
    /// Build from the two independent requests. Both at once is an invariant
    /// violation upstream.
    pub fn from_requests(depth: bool, water_fog: bool) -> Result<Self> {
        match (depth, water_fog) {
            (true, true) => Err(Error::ConflictingAlphaWrites),
            (true, false) => Ok(DestAlpha::Depth),
            (false, true) => Ok(DestAlpha::WaterFog),
            (false, false) => Ok(DestAlpha::Untouched),
        }
    }

    #[inline]
    pub fn writes_depth(self) -> bool {
        self == DestAlpha::Depth
    }

    #[inline]
    pub fn writes_water_fog(self) -> bool {
        self == DestAlpha::WaterFog
    }
}

/// Decide the destination alpha usage for one draw.
pub fn select_dest_alpha(
    fully_opaque: bool,
    depth_requested: bool,
    fog: FogMode,
) -> Result<DestAlpha> {
    if !fully_opaque {
        return Ok(DestAlpha::Untouched);
    }
    DestAlpha::from_requests(depth_requested, fog == FogMode::LinearBelowFogZ)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_albedo() -> FeatureFlags {
        FeatureFlags { has_albedo: true, ..Default::default() }
    }

    #[test]
    fn opaque_albedo_is_fully_opaque() {
        let flags = opaque_albedo();
        let category = classify_blend(&flags);
        assert_eq!(category, BlendCategory::Opaque);
        assert!(is_fully_opaque(category, flags.alpha_tested));
        assert_eq!(blend_state(category, &flags), BlendState::OPAQUE);
    }

    #[test]
    fn alpha_test_suppresses_albedo_translucency() {
        let flags = FeatureFlags {
            albedo_translucent: true,
            alpha_tested: true,
            ..opaque_albedo()
        };
        let category = classify_blend(&flags);
        assert_eq!(category, BlendCategory::Opaque);
        assert!(!is_fully_opaque(category, flags.alpha_tested));
    }

    #[test]
    fn categories() {
        let blended = FeatureFlags { albedo_translucent: true, ..opaque_albedo() };
        assert_eq!(classify_blend(&blended), BlendCategory::StandardBlend);
        assert!(!blend_state(BlendCategory::StandardBlend, &blended).depth_write);

        let additive = FeatureFlags { additive: true, ..opaque_albedo() };
        assert_eq!(classify_blend(&additive), BlendCategory::AdditiveBlend);
        assert_eq!(blend_state(BlendCategory::AdditiveBlend, &additive).src, BlendFactor::One);
    }

    #[test]
    fn dest_alpha_policy() {
        assert_eq!(select_dest_alpha(true, true, FogMode::Linear).unwrap(), DestAlpha::Depth);
        assert_eq!(
            select_dest_alpha(true, false, FogMode::LinearBelowFogZ).unwrap(),
            DestAlpha::WaterFog
        );
        assert_eq!(
            select_dest_alpha(false, true, FogMode::LinearBelowFogZ).unwrap(),
            DestAlpha::Untouched
        );
        assert!(matches!(
            select_dest_alpha(true, true, FogMode::LinearBelowFogZ),
            Err(Error::ConflictingAlphaWrites)
        ));
    }

    #[test]
    fn dest_alpha_never_both() {
        for fully_opaque in [false, true] {
            for depth in [false, true] {
                for fog in [FogMode::None, FogMode::Linear, FogMode::LinearBelowFogZ] {
                    if let Ok(dest) = select_dest_alpha(fully_opaque, depth, fog) {
                        assert!(!(dest.writes_depth() && dest.writes_water_fog()));
                        if !fully_opaque {
                            assert_eq!(dest, DestAlpha::Untouched);
                        }
                    }
                }
            }
        }
    }
}
