// src/textures.rs
//! Texture binding plan.
//!
//! Every logical channel resolves to either the material's loaded texture or
//! one of a fixed set of standard textures. The plan is a fixed-size array
//! rebuilt on every draw.
//!
//! Order of resolution:
//! 1. per-channel texture or fallback (lightmap and BRDF lookup always bound)
//! 2. projected light channels (cookie always, depth + noise only with shadows)
//! 3. debug overrides (lighting-only albedo, specular-off envmap)

use crate::context::OptionContext;
use crate::error::{Error, Result};
use crate::params::{ParamHandle, ParameterSet, TextureRef};
use crate::pbr_materials::{names, PbrParams};
use crate::render_context::DrawContext;
use crate::snapshot::MaterialSnapshot;

// ─────────────────────────────────────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChannel {
    Albedo,
    Normal,
    EnvMap,
    ShadowDepth,
    Noise,
    FlashlightCookie,
    Lightmap,
    PbrLookup,
    Mrao,
    Emissive,
}

pub const CHANNEL_COUNT: usize = 10;

impl TextureChannel {
    pub const ALL: [TextureChannel; CHANNEL_COUNT] = [
        TextureChannel::Albedo,
        TextureChannel::Normal,
        TextureChannel::EnvMap,
        TextureChannel::ShadowDepth,
        TextureChannel::Noise,
        TextureChannel::FlashlightCookie,
        TextureChannel::Lightmap,
        TextureChannel::PbrLookup,
        TextureChannel::Mrao,
        TextureChannel::Emissive,
    ];

    /// Dense index into per-channel arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Pixel shader sampler register.
    pub const fn sampler(self) -> u8 {
        match self {
            TextureChannel::Albedo => 0,
            TextureChannel::Normal => 1,
            TextureChannel::EnvMap => 2,
            TextureChannel::ShadowDepth => 4,
            TextureChannel::Noise => 5,
            TextureChannel::FlashlightCookie => 6,
            TextureChannel::Lightmap => 7,
            TextureChannel::PbrLookup => 9,
            TextureChannel::Mrao => 10,
            TextureChannel::Emissive => 11,
        }
    }

    pub const fn is_shadow_channel(self) -> bool {
        matches!(
            self,
            TextureChannel::ShadowDepth | TextureChannel::Noise | TextureChannel::FlashlightCookie
        )
    }
}

/// Textures the renderer always has available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardTexture {
    White,
    Grey,
    Black,
    FlatNormal,
    LightmapBumped,
    ShadowNoise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    Texture { texture: TextureRef, frame: i32 },
    Standard(StandardTexture),
}

impl Binding {
    #[inline]
    pub fn texture(texture: TextureRef) -> Self {
        Binding::Texture { texture, frame: 0 }
    }

    pub fn is_standard(&self, which: StandardTexture) -> bool {
        matches!(self, Binding::Standard(s) if *s == which)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sampler stages (snapshot)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerStage {
    pub enabled: bool,
    pub srgb_read: bool,
}

/// Which sampler stages a snapshot enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerStages([SamplerStage; CHANNEL_COUNT]);

impl SamplerStages {
    pub fn enable(&mut self, channel: TextureChannel, srgb_read: bool) {
        self.0[channel.index()] = SamplerStage { enabled: true, srgb_read };
    }

    #[inline]
    pub fn get(&self, channel: TextureChannel) -> SamplerStage {
        self.0[channel.index()]
    }

    pub fn enabled_count(&self) -> usize {
        self.0.iter().filter(|s| s.enabled).count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plan
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureBindingPlan {
    slots: [Option<Binding>; CHANNEL_COUNT],
}

impl TextureBindingPlan {
    #[inline]
    pub fn get(&self, channel: TextureChannel) -> Option<&Binding> {
        self.slots[channel.index()].as_ref()
    }

    #[inline]
    pub fn bind(&mut self, channel: TextureChannel, binding: Binding) {
        self.slots[channel.index()] = Some(binding);
    }

    pub fn is_bound(&self, channel: TextureChannel) -> bool {
        self.get(channel).is_some()
    }

    /// Bound channels in sampler order.
    pub fn iter(&self) -> impl Iterator<Item = (TextureChannel, &Binding)> {
        TextureChannel::ALL
            .iter()
            .filter_map(move |&c| self.get(c).map(|b| (c, b)))
    }
}

#[inline]
fn texture_or(params: &ParameterSet, handle: ParamHandle, fallback: StandardTexture) -> Binding {
    match params.texture(handle) {
        Some(texture) => Binding::texture(*texture),
        None => Binding::Standard(fallback),
    }
}

pub fn plan_textures(
    snapshot: &MaterialSnapshot,
    params: &ParameterSet,
    handles: &PbrParams,
    draw: &DrawContext<'_>,
) -> Result<TextureBindingPlan> {
    let flags = &snapshot.features;
    let mut plan = TextureBindingPlan::default();

    plan.bind(
        TextureChannel::Albedo,
        match params.texture(handles.base_texture) {
            Some(texture) => Binding::Texture {
                texture: *texture,
                frame: params.int(handles.frame),
            },
            None => Binding::Standard(StandardTexture::White),
        },
    );
    plan.bind(
        TextureChannel::Normal,
        texture_or(params, handles.bump_map, StandardTexture::FlatNormal),
    );
    plan.bind(
        TextureChannel::EnvMap,
        texture_or(params, handles.env_map, StandardTexture::Grey),
    );
    plan.bind(
        TextureChannel::Mrao,
        texture_or(params, handles.mrao_texture, StandardTexture::White),
    );
    plan.bind(
        TextureChannel::Emissive,
        texture_or(params, handles.emission_texture, StandardTexture::Black),
    );
    plan.bind(
        TextureChannel::Lightmap,
        Binding::Standard(StandardTexture::LightmapBumped),
    );
    plan.bind(
        TextureChannel::PbrLookup,
        texture_or(params, handles.pbr_lookup, StandardTexture::White),
    );

    if flags.flashlight_active {
        let light = draw.flashlight.or_fail(Error::MissingFlashlightState)?;

        // The light's own cookie wins; otherwise the material must supply one.
        let cookie = match light.spotlight_texture {
            Some(texture) => Binding::Texture {
                texture,
                frame: light.spotlight_texture_frame,
            },
            None => Binding::Texture {
                texture: *params
                    .texture(handles.flashlight_texture)
                    .or_fail(Error::MissingRequiredParameter(names::FLASHLIGHT_TEXTURE))?,
                frame: params.int(handles.flashlight_texture_frame),
            },
        };
        plan.bind(TextureChannel::FlashlightCookie, cookie);

        if let Some(depth) = light.shadow_depth_texture {
            if light.enable_shadows && snapshot.context.caps.shadow_depth_textures {
                plan.bind(TextureChannel::ShadowDepth, Binding::texture(depth));
                plan.bind(
                    TextureChannel::Noise,
                    Binding::Standard(StandardTexture::ShadowNoise),
                );
            }
        }
    }

    if draw.debug.lighting_only(params.flags()) {
        plan.bind(TextureChannel::Albedo, Binding::Standard(StandardTexture::Grey));
    }
    if draw.debug.specular_disabled() {
        plan.bind(TextureChannel::EnvMap, Binding::Standard(StandardTexture::Black));
    }

    Ok(plan)
}
