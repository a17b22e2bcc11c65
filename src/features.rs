// src/features.rs
//! Feature flag derivation.
//!
//! `derive_feature_flags` is a pure function of the parameter set and the
//! snapshot-time render context. Every flag is computed independently from
//! those inputs; nothing reads a previous result.

use crate::params::{MaterialFlags, ParameterSet};
use crate::pbr_materials::PbrParams;
use crate::render_context::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureFlags {
    // geometry
    pub is_skinned_geometry: bool,
    pub is_lightmapped: bool,

    // material textures
    pub has_albedo: bool,
    pub has_normal_map: bool,
    pub has_env_map: bool,
    pub has_mrao: bool,
    pub has_emissive: bool,
    /// An albedo tint color is set.
    pub has_color: bool,
    /// The bound albedo texture has a meaningful alpha channel.
    pub albedo_translucent: bool,

    // material switches
    pub use_env_ambient: bool,
    pub alpha_tested: bool,
    pub translucent: bool,
    pub additive: bool,
    pub vertex_alpha: bool,

    // render context
    pub flashlight_active: bool,
    pub supports_border_color: bool,
    pub supports_cubemaps: bool,
    pub hdr_enabled: bool,
}

pub fn derive_feature_flags(
    params: &ParameterSet,
    handles: &PbrParams,
    ctx: &RenderContext,
) -> FeatureFlags {
    let flags = params.flags();
    let is_model = flags.contains(MaterialFlags::MODEL);
    let albedo = params.texture(handles.base_texture);

    FeatureFlags {
        is_skinned_geometry: is_model,
        is_lightmapped: !is_model,

        has_albedo: albedo.is_some(),
        has_normal_map: params.is_texture(handles.bump_map),
        has_env_map: params.is_texture(handles.env_map),
        has_mrao: params.is_texture(handles.mrao_texture),
        has_emissive: params.is_texture(handles.emission_texture),
        has_color: params.is_defined(handles.color),
        albedo_translucent: albedo.map_or(false, |t| t.translucent),

        use_env_ambient: params.bool(handles.use_env_ambient),
        alpha_tested: flags.contains(MaterialFlags::ALPHATEST),
        translucent: flags.contains(MaterialFlags::TRANSLUCENT),
        additive: flags.contains(MaterialFlags::ADDITIVE),
        vertex_alpha: flags.contains(MaterialFlags::VERTEXALPHA),

        flashlight_active: ctx.flashlight_active,
        supports_border_color: ctx.caps.supports_border_color,
        supports_cubemaps: ctx.caps.supports_cubemaps,
        hdr_enabled: ctx.caps.hdr_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShaderGeneration;
    use crate::params::{SlotValue, TextureRef};
    use crate::pbr_materials::{names, pbr_parameter_set};
    use crate::render_context::HardwareCaps;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TEXTURE_SLOTS: [&str; 5] = [
        names::BASE_TEXTURE,
        names::BUMP_MAP,
        names::ENV_MAP,
        names::MRAO_TEXTURE,
        names::EMISSION_TEXTURE,
    ];

    fn random_params(rng: &mut StdRng) -> ParameterSet {
        let mut params = pbr_parameter_set(ShaderGeneration::Legacy, MaterialFlags(rng.gen_range(0..64)));
        for (i, name) in TEXTURE_SLOTS.iter().enumerate() {
            match rng.gen_range(0..3) {
                0 => {}
                1 => params.set_string(name, "placeholder").unwrap(),
                _ => params
                    .set_texture(name, TextureRef::new(i as u32, 128, 128).translucent(rng.gen()))
                    .unwrap(),
            }
        }
        params.set_bool(names::USE_ENV_AMBIENT, rng.gen()).unwrap();
        params
    }

    fn random_ctx(rng: &mut StdRng) -> RenderContext {
        RenderContext {
            caps: HardwareCaps {
                supports_border_color: rng.gen(),
                supports_cubemaps: rng.gen(),
                hdr_enabled: rng.gen(),
                shadow_filter_mode: rng.gen_range(0..3),
                ..Default::default()
            },
            flashlight_active: rng.gen(),
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..256 {
            let params = random_params(&mut rng);
            let handles = PbrParams::resolve(&params).unwrap();
            let ctx = random_ctx(&mut rng);
            let first = derive_feature_flags(&params, &handles, &ctx);
            let second = derive_feature_flags(&params, &handles, &ctx);
            assert_eq!(first, second);
            assert_ne!(first.is_lightmapped, first.is_skinned_geometry);
        }
    }

    #[test]
    fn placeholders_do_not_count_as_textures() {
        let mut params = pbr_parameter_set(ShaderGeneration::Current, MaterialFlags::empty());
        params.set_string(names::ENV_MAP, "env/unloaded").unwrap();
        params
            .set_texture(names::MRAO_TEXTURE, TextureRef::new(4, 64, 64))
            .unwrap();
        let handles = PbrParams::resolve(&params).unwrap();
        let flags = derive_feature_flags(&params, &handles, &RenderContext::default());
        assert!(!flags.has_env_map);
        assert!(flags.has_mrao);
        assert!(flags.is_lightmapped);
    }

    #[test]
    fn context_flags_come_from_context() {
        let mut params = pbr_parameter_set(ShaderGeneration::Current, MaterialFlags::MODEL);
        params
            .set_by_name(names::USE_ENV_AMBIENT, SlotValue::Bool(true))
            .unwrap();
        let handles = PbrParams::resolve(&params).unwrap();
        let ctx = RenderContext {
            caps: HardwareCaps { hdr_enabled: true, supports_cubemaps: false, ..Default::default() },
            flashlight_active: true,
        };
        let flags = derive_feature_flags(&params, &handles, &ctx);
        assert!(flags.hdr_enabled);
        assert!(!flags.supports_cubemaps);
        assert!(flags.flashlight_active);
        assert!(flags.use_env_ambient);
        assert!(flags.is_skinned_geometry);
    }
}
