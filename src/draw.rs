// src/draw.rs
//! Per-draw phase.
//!
//! `build_draw_state` combines a cached snapshot with the live draw context.
//! It performs no allocation and never touches the variant cache: the
//! permutation and vertex layout come straight from the snapshot.

use crate::blend::{select_dest_alpha, DestAlpha};
use crate::config::ShadingConfig;
use crate::constants::{build_dynamic_constants, DynamicConstants};
use crate::context::OptionContext;
use crate::error::Result;
use crate::params::ParameterSet;
use crate::pbr_materials::PbrParams;
use crate::render_context::DrawContext;
use crate::snapshot::MaterialSnapshot;
use crate::textures::{plan_textures, TextureBindingPlan};
use crate::variant::{DynamicCombos, PermutationHandle, VertexLayoutDescriptor};

/// Everything the submitter needs to issue one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub permutation: PermutationHandle,
    pub layout: VertexLayoutDescriptor,
    pub combos: DynamicCombos,
    pub dynamic_combo: u32,
    pub dest_alpha: DestAlpha,
    pub textures: TextureBindingPlan,
    pub constants: DynamicConstants,
}

/// External draw submission.
pub trait DrawSink {
    fn submit(&mut self, state: &DrawState);
}

impl<F: FnMut(&DrawState)> DrawSink for F {
    fn submit(&mut self, state: &DrawState) {
        self(state)
    }
}

pub fn build_draw_state(
    snapshot: &MaterialSnapshot,
    params: &ParameterSet,
    handles: &PbrParams,
    draw: &DrawContext<'_>,
    config: &ShadingConfig,
) -> Result<DrawState> {
    let textures = plan_textures(snapshot, params, handles, draw)?;
    let constants = build_dynamic_constants(snapshot, params, handles, draw, config)?;
    let dest_alpha = select_dest_alpha(snapshot.fully_opaque, draw.write_depth_to_alpha, draw.fog.mode)?;

    let combos = DynamicCombos {
        water_fog: draw.fog.mode.water_fog_index(),
        skinning: draw.bone_count > 0,
        lighting_preview: draw.fixed_lighting_preview,
        compressed_verts: draw.vertex_compression,
        num_lights: constants.lights.num_lights,
        write_water_fog_to_alpha: dest_alpha.writes_water_fog(),
        write_depth_to_alpha: dest_alpha.writes_depth(),
        pixel_fog_type: draw.fog.mode.pixel_fog_type(),
        flashlight_shadows: constants.projected.map_or(false, |p| p.shadows_active),
    };
    let dynamic_combo = combos
        .combo_index()
        .context("dynamic combo outside the axis table")?;

    Ok(DrawState {
        permutation: snapshot.permutation(),
        layout: *snapshot.layout(),
        combos,
        dynamic_combo,
        dest_alpha,
        textures,
        constants,
    })
}
