// src/snapshot.rs
//! Snapshot phase.
//!
//! Runs when a material's render state is (re)captured for a render context:
//! features → blend category → variant key → cached permutation + layout,
//! plus the fixed-function pipeline state the permutation is drawn with.
//! The result is immutable until the next invalidation.

use crate::blend::{blend_state, classify_blend, is_fully_opaque, BlendCategory, BlendState};
use crate::error::Result;
use crate::features::{derive_feature_flags, FeatureFlags};
use crate::params::ParameterSet;
use crate::pbr_materials::PbrParams;
use crate::render_context::RenderContext;
use crate::textures::{SamplerStages, TextureChannel};
use crate::variant::{PermutationHandle, SelectedVariant, VariantKey, VertexLayoutDescriptor};
use crate::variant_cache::VariantCache;

/// Fixed-function state recorded alongside the permutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineState {
    pub alpha_test: bool,
    /// GEQUAL reference, whenever the material sets a positive one.
    pub alpha_ref: Option<f32>,
    pub blend: BlendState,
    pub alpha_writes: bool,
    pub samplers: SamplerStages,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSnapshot {
    pub context: RenderContext,
    pub features: FeatureFlags,
    pub blend: BlendCategory,
    pub fully_opaque: bool,
    pub variant: SelectedVariant,
    pub pipeline: PipelineState,
}

impl MaterialSnapshot {
    #[inline]
    pub fn key(&self) -> &VariantKey {
        &self.variant.key
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayoutDescriptor {
        &self.variant.layout
    }

    #[inline]
    pub fn permutation(&self) -> PermutationHandle {
        self.variant.permutation
    }
}

/// Every channel the binding plan always fills gets a stage, with sRGB reads
/// matching how `load_textures` loads that channel.
fn sampler_stages(features: &FeatureFlags) -> SamplerStages {
    let mut stages = SamplerStages::default();
    stages.enable(TextureChannel::Albedo, true);
    stages.enable(TextureChannel::Normal, false);
    stages.enable(TextureChannel::EnvMap, false);
    stages.enable(TextureChannel::Lightmap, false);
    stages.enable(TextureChannel::PbrLookup, false);
    stages.enable(TextureChannel::Mrao, false);
    stages.enable(TextureChannel::Emissive, true);
    if features.flashlight_active {
        stages.enable(TextureChannel::ShadowDepth, false);
        stages.enable(TextureChannel::Noise, false);
        stages.enable(TextureChannel::FlashlightCookie, true);
    }
    stages
}

/// Capture the render state of one material for one render context.
pub fn resolve_snapshot(
    params: &ParameterSet,
    handles: &PbrParams,
    ctx: &RenderContext,
    variants: &VariantCache,
) -> Result<MaterialSnapshot> {
    let features = derive_feature_flags(params, handles, ctx);
    let blend = classify_blend(&features);
    let fully_opaque = is_fully_opaque(blend, features.alpha_tested);

    let key = VariantKey::from_features(&features, &ctx.caps);
    let variant = variants.select(&key)?;

    let alpha_ref = params.float(handles.alpha_test_reference);
    let pipeline = PipelineState {
        alpha_test: features.alpha_tested,
        alpha_ref: (alpha_ref > 0.0).then_some(alpha_ref),
        blend: blend_state(blend, &features),
        alpha_writes: fully_opaque,
        samplers: sampler_stages(&features),
    };

    log::debug!(
        "snapshot [{}] blend={:?} opaque={} combo={}",
        key,
        blend,
        fully_opaque,
        variant.permutation.combo
    );

    Ok(MaterialSnapshot {
        context: *ctx,
        features,
        blend,
        fully_opaque,
        variant,
        pipeline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShaderGeneration;
    use crate::params::{MaterialFlags, TextureRef};
    use crate::pbr_materials::{names, pbr_parameter_set};
    use crate::render_context::HardwareCaps;
    use crate::variant::CompiledPermutations;
    use std::sync::Arc;

    fn cache() -> VariantCache {
        VariantCache::new(Arc::new(CompiledPermutations::new("pbr")), 16)
    }

    fn material(flags: MaterialFlags) -> (ParameterSet, PbrParams) {
        let mut params = pbr_parameter_set(ShaderGeneration::Current, flags);
        params
            .set_texture(names::BASE_TEXTURE, TextureRef::new(1, 512, 512))
            .unwrap();
        let handles = PbrParams::resolve(&params).unwrap();
        (params, handles)
    }

    #[test]
    fn opaque_static_snapshot() {
        let (params, handles) = material(MaterialFlags::empty());
        let snap = resolve_snapshot(&params, &handles, &RenderContext::default(), &cache()).unwrap();
        assert!(snap.key().lightmapped);
        assert!(!snap.key().flashlight);
        assert_eq!(*snap.layout(), VertexLayoutDescriptor::LIGHTMAPPED);
        assert!(snap.pipeline.alpha_writes);
        assert_eq!(snap.pipeline.blend, BlendState::OPAQUE);
        assert!(!snap.pipeline.samplers.get(TextureChannel::FlashlightCookie).enabled);
        assert!(snap.pipeline.samplers.get(TextureChannel::Lightmap).enabled);
    }

    #[test]
    fn stages_cover_every_always_bound_channel() {
        let (params, handles) = material(MaterialFlags::MODEL);
        let snap = resolve_snapshot(&params, &handles, &RenderContext::default(), &cache()).unwrap();
        let plan = crate::textures::plan_textures(
            &snap,
            &params,
            &handles,
            &crate::render_context::DrawContext::default(),
        )
        .unwrap();
        for (channel, _) in plan.iter() {
            assert!(snap.pipeline.samplers.get(channel).enabled, "{:?} bound without a stage", channel);
        }

        let stages = &snap.pipeline.samplers;
        assert!(!snap.features.has_env_map);
        assert!(stages.get(TextureChannel::EnvMap).enabled);
        assert!(!stages.get(TextureChannel::EnvMap).srgb_read);
        assert!(stages.get(TextureChannel::Lightmap).enabled);
        assert!(stages.get(TextureChannel::PbrLookup).enabled);
        assert!(!stages.get(TextureChannel::PbrLookup).srgb_read);
        assert!(stages.get(TextureChannel::Albedo).srgb_read);
        assert!(!stages.get(TextureChannel::ShadowDepth).enabled);
    }

    #[test]
    fn alpha_reference_survives_without_alpha_test() {
        let (mut params, handles) = material(MaterialFlags::MODEL);
        params.set_float(names::ALPHA_TEST_REFERENCE, 0.5).unwrap();
        let snap = resolve_snapshot(&params, &handles, &RenderContext::default(), &cache()).unwrap();
        assert!(!snap.pipeline.alpha_test);
        assert_eq!(snap.pipeline.alpha_ref, Some(0.5));

        params.set_float(names::ALPHA_TEST_REFERENCE, 0.0).unwrap();
        let snap = resolve_snapshot(&params, &handles, &RenderContext::default(), &cache()).unwrap();
        assert_eq!(snap.pipeline.alpha_ref, None);
    }

    #[test]
    fn out_of_range_filter_mode_is_clamped() {
        let (params, handles) = material(MaterialFlags::MODEL);
        let ctx = RenderContext::new(HardwareCaps { shadow_filter_mode: 7, ..Default::default() })
            .with_flashlight(true);
        let snap = resolve_snapshot(&params, &handles, &ctx, &cache()).unwrap();
        assert_eq!(snap.key().shadow_filter_mode, crate::shadows::ShadowFilter::Generic as u8);
    }

    #[test]
    fn alpha_tested_model_records_reference() {
        let (mut params, handles) = material(MaterialFlags::MODEL | MaterialFlags::ALPHATEST);
        params.set_float(names::ALPHA_TEST_REFERENCE, 0.5).unwrap();
        let snap = resolve_snapshot(&params, &handles, &RenderContext::default(), &cache()).unwrap();
        assert!(snap.pipeline.alpha_test);
        assert_eq!(snap.pipeline.alpha_ref, Some(0.5));
        assert!(!snap.fully_opaque);
        assert!(!snap.pipeline.alpha_writes);
        assert_eq!(*snap.layout(), VertexLayoutDescriptor::SKINNED);
    }

    #[test]
    fn flashlight_snapshot_enables_shadow_stages() {
        let (params, handles) = material(MaterialFlags::MODEL);
        let ctx = RenderContext::new(HardwareCaps { shadow_filter_mode: 1, ..Default::default() })
            .with_flashlight(true);
        let snap = resolve_snapshot(&params, &handles, &ctx, &cache()).unwrap();
        assert!(snap.key().flashlight);
        assert_eq!(snap.key().shadow_filter_mode, 1);
        for channel in [TextureChannel::ShadowDepth, TextureChannel::Noise, TextureChannel::FlashlightCookie] {
            assert!(snap.pipeline.samplers.get(channel).enabled);
        }
    }

    #[test]
    fn missing_permutation_is_fatal() {
        let (params, handles) = material(MaterialFlags::empty());
        let registry = CompiledPermutations::new("pbr").without_combo(
            VariantKey { lightmapped: true, ..Default::default() }.combo_index().unwrap(),
        );
        let variants = VariantCache::new(Arc::new(registry), 4);
        let err = resolve_snapshot(&params, &handles, &RenderContext::default(), &variants).unwrap_err();
        assert!(err.is_fatal());
    }
}
