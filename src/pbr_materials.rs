// src/pbr_materials.rs
// PBR material: parameter declarations, resolved handles and the material
// object that owns a ParameterSet for its lifetime.
//
// Exports:
// - names (parameter names as written in material files)
// - pbr_definitions / pbr_parameter_set (declared slots per shader generation)
// - PbrParams (slot handles resolved once, used on the hot path)
// - PbrMaterial (init, per-context snapshot cache, per-draw submission)
//
// Usage summary:
// let mut params = pbr_parameter_set(config.generation, MaterialFlags::MODEL);
// params.set_string(names::BASE_TEXTURE, "models/crate01")?;
// let mut mat = PbrMaterial::new("crate01", params, config, variants, &caps, &mut textures)?;
// mat.draw(&ctx, &draw, &mut sink)?;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::config::{ShaderGeneration, ShadingConfig};
use crate::draw::{build_draw_state, DrawSink, DrawState};
use crate::error::Result;
use crate::params::{MaterialFlags, ParamHandle, ParameterDefinition, ParameterKind, ParameterSet, SlotValue};
use crate::render_context::{DrawContext, HardwareCaps, RenderContext};
use crate::resolver::{init_params, load_textures, TextureSource};
use crate::snapshot::{resolve_snapshot, MaterialSnapshot};
use crate::variant_cache::VariantCache;

/// Parameter names
pub mod names {
    pub const BASE_TEXTURE: &str = "basetexture";
    pub const FRAME: &str = "frame";
    pub const BASE_TEXTURE_TRANSFORM: &str = "basetexturetransform";
    pub const COLOR: &str = "color";
    pub const COLOR2: &str = "color2";
    pub const BUMP_MAP: &str = "bumpmap";
    /// Legacy spelling of `bumpmap`.
    pub const NORMAL_TEXTURE: &str = "normaltexture";
    pub const ENV_MAP: &str = "envmap";
    pub const MRAO_TEXTURE: &str = "mraotexture";
    pub const EMISSION_TEXTURE: &str = "emissiontexture";
    pub const USE_ENV_AMBIENT: &str = "useenvambient";
    pub const ALPHA_TEST_REFERENCE: &str = "alphatestreference";
    pub const FLASHLIGHT_TEXTURE: &str = "flashlighttexture";
    pub const FLASHLIGHT_TEXTURE_FRAME: &str = "flashlighttextureframe";
    pub const PBR_LOOKUP: &str = "pbrlookup";
}

pub fn pbr_definitions(generation: ShaderGeneration) -> Vec<ParameterDefinition> {
    let mut defs = vec![
        ParameterDefinition::new(names::BASE_TEXTURE, ParameterKind::Texture).with_help("albedo (sRGB, alpha = opacity)"),
        ParameterDefinition::new(names::FRAME, ParameterKind::Int),
        ParameterDefinition::new(names::BASE_TEXTURE_TRANSFORM, ParameterKind::Matrix)
            .with_help("base texture coordinate transform"),
        ParameterDefinition::new(names::COLOR, ParameterKind::Vec3)
            .with_default(SlotValue::Vec3(Vec3::ONE))
            .with_help("albedo tint"),
        ParameterDefinition::new(names::COLOR2, ParameterKind::Vec3)
            .with_default(SlotValue::Vec3(Vec3::ONE))
            .with_help("diffuse modulation"),
        ParameterDefinition::new(names::BUMP_MAP, ParameterKind::Texture).with_help("tangent space normal map"),
        ParameterDefinition::new(names::ENV_MAP, ParameterKind::Texture),
        ParameterDefinition::new(names::MRAO_TEXTURE, ParameterKind::Texture)
            .with_help("metalness, roughness, ambient occlusion"),
        ParameterDefinition::new(names::EMISSION_TEXTURE, ParameterKind::Texture),
        ParameterDefinition::new(names::USE_ENV_AMBIENT, ParameterKind::Bool),
        ParameterDefinition::new(names::ALPHA_TEST_REFERENCE, ParameterKind::Float),
        ParameterDefinition::new(names::FLASHLIGHT_TEXTURE, ParameterKind::Texture)
            .with_default(SlotValue::String("effects/flashlight001".to_owned())),
        ParameterDefinition::new(names::FLASHLIGHT_TEXTURE_FRAME, ParameterKind::Int),
        ParameterDefinition::new(names::PBR_LOOKUP, ParameterKind::Texture)
            .with_default(SlotValue::String("dev/pbr_lookup".to_owned()))
            .with_help("BRDF lookup table, not meant to be edited"),
    ];
    if generation == ShaderGeneration::Legacy {
        defs.push(ParameterDefinition::new(names::NORMAL_TEXTURE, ParameterKind::Texture));
    }
    defs
}

pub fn pbr_parameter_set(generation: ShaderGeneration, flags: MaterialFlags) -> ParameterSet {
    ParameterSet::new(pbr_definitions(generation), flags)
}

/// Slot handles, resolved once per material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbrParams {
    pub base_texture: ParamHandle,
    pub frame: ParamHandle,
    pub base_texture_transform: ParamHandle,
    pub color: ParamHandle,
    pub color2: ParamHandle,
    pub bump_map: ParamHandle,
    /// Only declared by the legacy generation.
    pub normal_texture: Option<ParamHandle>,
    pub env_map: ParamHandle,
    pub mrao_texture: ParamHandle,
    pub emission_texture: ParamHandle,
    pub use_env_ambient: ParamHandle,
    pub alpha_test_reference: ParamHandle,
    pub flashlight_texture: ParamHandle,
    pub flashlight_texture_frame: ParamHandle,
    pub pbr_lookup: ParamHandle,
}

impl PbrParams {
    pub fn resolve(params: &ParameterSet) -> Result<Self> {
        Ok(Self {
            base_texture: params.find(names::BASE_TEXTURE)?,
            frame: params.find(names::FRAME)?,
            base_texture_transform: params.find(names::BASE_TEXTURE_TRANSFORM)?,
            color: params.find(names::COLOR)?,
            color2: params.find(names::COLOR2)?,
            bump_map: params.find(names::BUMP_MAP)?,
            normal_texture: params.find_optional(names::NORMAL_TEXTURE),
            env_map: params.find(names::ENV_MAP)?,
            mrao_texture: params.find(names::MRAO_TEXTURE)?,
            emission_texture: params.find(names::EMISSION_TEXTURE)?,
            use_env_ambient: params.find(names::USE_ENV_AMBIENT)?,
            alpha_test_reference: params.find(names::ALPHA_TEST_REFERENCE)?,
            flashlight_texture: params.find(names::FLASHLIGHT_TEXTURE)?,
            flashlight_texture_frame: params.find(names::FLASHLIGHT_TEXTURE_FRAME)?,
            pbr_lookup: params.find(names::PBR_LOOKUP)?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Material
// ═══════════════════════════════════════════════════════════════════════════════

/// A PBR material instance.
///
/// Parameter edits and draws must be serialised by the caller; the material
/// does no locking of its own. The variant cache it points at is shared and
/// internally synchronised.
pub struct PbrMaterial {
    name: String,
    params: ParameterSet,
    handles: PbrParams,
    config: Arc<ShadingConfig>,
    variants: Arc<VariantCache>,
    snapshots: HashMap<RenderContext, MaterialSnapshot>,
}

impl PbrMaterial {
    /// Resolve, default and load a material's parameters.
    pub fn new(
        name: impl Into<String>,
        mut params: ParameterSet,
        config: Arc<ShadingConfig>,
        variants: Arc<VariantCache>,
        caps: &HardwareCaps,
        textures: &mut dyn TextureSource,
    ) -> Result<Self> {
        let name = name.into();
        let handles = PbrParams::resolve(&params)?;
        init_params(&mut params, &handles, caps, &config)?;
        load_textures(&mut params, &handles, textures, caps)?;
        log::debug!("material `{}` initialised ({} params)", name, params.len());

        Ok(Self {
            name,
            params,
            handles,
            config,
            variants,
            snapshots: HashMap::new(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    #[inline]
    pub fn handles(&self) -> &PbrParams {
        &self.handles
    }

    /// The snapshot for `ctx`, resolved on first use.
    pub fn snapshot(&mut self, ctx: &RenderContext) -> Result<MaterialSnapshot> {
        let snapshot = match self.snapshots.entry(*ctx) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let resolved = resolve_snapshot(&self.params, &self.handles, ctx, &self.variants)?;
                entry.insert(resolved)
            }
        };
        Ok(*snapshot)
    }

    pub fn cached_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    /// Drop every cached snapshot. The next draw re-derives features.
    pub fn invalidate(&mut self) {
        self.snapshots.clear();
    }

    /// Mutate parameters; snapshots are invalidated afterwards.
    pub fn edit_params<R>(&mut self, edit: impl FnOnce(&mut ParameterSet) -> R) -> R {
        let out = edit(&mut self.params);
        self.invalidate();
        out
    }

    /// Load texture names set since initialisation.
    pub fn reload_textures(&mut self, textures: &mut dyn TextureSource, caps: &HardwareCaps) -> Result<()> {
        load_textures(&mut self.params, &self.handles, textures, caps)?;
        self.invalidate();
        Ok(())
    }

    pub fn build_draw_state(&mut self, ctx: &RenderContext, draw: &DrawContext<'_>) -> Result<DrawState> {
        let snapshot = self.snapshot(ctx)?;
        build_draw_state(&snapshot, &self.params, &self.handles, draw, &self.config)
    }

    /// Build the draw state and hand it to `sink`.
    ///
    /// A failure aborts this draw only: nothing is submitted, the error is
    /// logged and returned.
    pub fn draw(&mut self, ctx: &RenderContext, draw: &DrawContext<'_>, sink: &mut dyn DrawSink) -> Result<()> {
        match self.build_draw_state(ctx, draw) {
            Ok(state) => {
                sink.submit(&state);
                Ok(())
            }
            Err(err) => {
                if err.is_fatal() {
                    log::error!("material `{}`: draw aborted: {}", self.name, err);
                } else {
                    log::warn!("material `{}`: draw skipped: {}", self.name, err);
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for PbrMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PbrMaterial")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("snapshots", &self.snapshots.len())
            .finish()
    }
}

/// Albedo tint helper for tools that want the effective color.
pub fn effective_tint(params: &ParameterSet, handles: &PbrParams) -> Vec3 {
    if params.is_defined(handles.color) {
        params.vec3(handles.color)
    } else {
        Vec3::ONE
    }
}
