// src/config.rs
// Shading configuration. Everything has a default; a JSON document only needs
// the keys it wants to change.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which parameter-aliasing rules a material follows.
///
/// `Legacy` declares both `normaltexture` and `bumpmap` and copies the former
/// into the latter when only the old name is set. `Current` declares
/// `bumpmap` alone.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShaderGeneration {
    #[default]
    Legacy,
    Current,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ShadingConfig {
    pub shader_name: String,
    pub generation: ShaderGeneration,
    pub variant_cache_capacity: usize,
    pub flat_normal_texture: String,
    pub flashlight_texture: String,
    pub flashlight_border_texture: String,
    /// BRDF lookup table bound on every draw.
    pub pbr_lookup_texture: String,
    /// Shadow map size the penumbra filter sizes were tuned against.
    pub shadow_map_reference_resolution: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            shader_name: "pbr".to_owned(),
            generation: ShaderGeneration::Legacy,
            variant_cache_capacity: 64,
            flat_normal_texture: "dev/flat_normal".to_owned(),
            flashlight_texture: "effects/flashlight001".to_owned(),
            flashlight_border_texture: "effects/flashlight_border".to_owned(),
            pbr_lookup_texture: "dev/pbr_lookup".to_owned(),
            shadow_map_reference_resolution: 1024.0,
        }
    }
}

impl ShadingConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        Ok(cfg.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.variant_cache_capacity = self.variant_cache_capacity.max(1);
        if !(self.shadow_map_reference_resolution > 0.0) {
            log::warn!(
                "shadow_map_reference_resolution {} is not positive, using 1024",
                self.shadow_map_reference_resolution
            );
            self.shadow_map_reference_resolution = 1024.0;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ShadingConfig::from_json(r#"{ "generation": "current", "variant_cache_capacity": 0 }"#)
            .unwrap();
        assert_eq!(cfg.generation, ShaderGeneration::Current);
        assert_eq!(cfg.variant_cache_capacity, 1);
        assert_eq!(cfg.flashlight_texture, "effects/flashlight001");
        assert_eq!(cfg.shader_name, "pbr");
        assert_eq!(cfg.pbr_lookup_texture, "dev/pbr_lookup");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ShadingConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
        assert!(!err.is_fatal());
    }
}
