// src/lib.rs
//! PBR material shading state.
//!
//! Turns a material's parameters plus the renderer's context into everything
//! a draw needs: shader permutation, vertex layout, texture bindings and the
//! constant payload.
//!
//! Two phases:
//! - **snapshot** (cached per material and render context):
//!   features → blend category → variant key → permutation + vertex layout
//! - **draw** (per visible instance, no allocation):
//!   texture binding plan + dynamic constants + dynamic combos
//!
//! Missing optional textures are never errors; they fall back to standard
//! textures. Configuration-invariant violations are fatal and abort the draw
//! that hit them (see [`Error::is_fatal`]).

// -------------------------------
// SECURITY NOTE
// -------------------------------
// Advisory: lru IterMut soundness issue. The variant cache only uses
// get/put/clear and `lru` is pinned to 0.16.3 or later.
// -------------------------------

pub mod context;
pub mod error;

pub mod config;
pub mod params;
pub mod render_context;

pub mod lighting;
pub mod shadows;

pub mod blend;
pub mod features;
pub mod resolver;
pub mod variant;
pub mod variant_cache;

pub mod constants;
pub mod draw;
pub mod snapshot;
pub mod textures;

pub mod pbr_materials;

pub use blend::{BlendCategory, DestAlpha};
pub use config::{ShaderGeneration, ShadingConfig};
pub use constants::{DynamicConstants, GpuDrawConstants, ProjectedLightBlock};
pub use context::{Context, OptionContext};
pub use draw::{build_draw_state, DrawSink, DrawState};
pub use error::{Error, Result};
pub use features::{derive_feature_flags, FeatureFlags};
pub use params::{MaterialFlags, ParameterSet, SlotValue, TextureRef};
pub use pbr_materials::{names, pbr_parameter_set, PbrMaterial, PbrParams};
pub use render_context::{DebugOverrides, DrawContext, FogMode, FogState, HardwareCaps, RenderContext};
pub use resolver::{TextureLoadFlags, TextureSource};
pub use shadows::FlashlightState;
pub use snapshot::{resolve_snapshot, MaterialSnapshot};
pub use textures::{Binding, StandardTexture, TextureBindingPlan, TextureChannel};
pub use variant::{
    CompiledPermutations, PermutationHandle, PermutationRegistry, SelectedVariant, VariantKey,
    VertexLayoutDescriptor,
};
pub use variant_cache::VariantCache;
