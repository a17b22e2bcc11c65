// src/variant.rs
//! Static variant selection.
//!
//! The permutation space is described by a declarative axis table. A
//! `VariantKey` maps to a mixed-radix combo index over `STATIC_AXES`; the
//! registry either has that combo compiled or the selection fails. Nothing is
//! ever substituted: a permutation compiled for another vertex layout would
//! render garbage.
//!
//! The vertex layout depends on the lightmapped axis only.

use std::collections::HashSet;
use std::fmt;

use xxhash_rust::xxh3::xxh3_64;

use crate::error::{Error, Result};
use crate::features::FeatureFlags;
use crate::render_context::HardwareCaps;
use crate::shadows::ShadowFilter;

// ═══════════════════════════════════════════════════════════════════════════════
// Axis tables
// ═══════════════════════════════════════════════════════════════════════════════

/// One combo axis: a named integer in `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboAxis {
    pub name: &'static str,
    pub max: u32,
}

impl ComboAxis {
    pub const fn new(name: &'static str, max: u32) -> Self {
        Self { name, max }
    }
}

pub const STATIC_AXES: [ComboAxis; 5] = [
    ComboAxis::new("LIGHTMAPPED", 1),
    ComboAxis::new("FLASHLIGHT", 1),
    ComboAxis::new("FLASHLIGHTDEPTHFILTERMODE", ShadowFilter::MAX as u32),
    ComboAxis::new("EMISSIVE", 1),
    ComboAxis::new("USE_ENV_AMBIENT", 1),
];

pub const DYNAMIC_AXES: [ComboAxis; 9] = [
    ComboAxis::new("DOWATERFOG", 1),
    ComboAxis::new("SKINNING", 1),
    ComboAxis::new("LIGHTING_PREVIEW", 1),
    ComboAxis::new("COMPRESSED_VERTS", 1),
    ComboAxis::new("NUM_LIGHTS", crate::lighting::MAX_LIGHTS as u32),
    ComboAxis::new("WRITEWATERFOGTODESTALPHA", 1),
    ComboAxis::new("WRITE_DEPTH_TO_DESTALPHA", 1),
    ComboAxis::new("PIXELFOGTYPE", 1),
    ComboAxis::new("FLASHLIGHTSHADOWS", 1),
];

/// Mixed-radix index of `values` over `axes` (first axis varies fastest).
/// `None` when a value is out of its axis range.
pub fn combo_index(axes: &[ComboAxis], values: &[u32]) -> Option<u32> {
    debug_assert_eq!(axes.len(), values.len());
    let mut index = 0u32;
    let mut stride = 1u32;
    for (axis, &value) in axes.iter().zip(values) {
        if value > axis.max {
            return None;
        }
        index += value * stride;
        stride *= axis.max + 1;
    }
    Some(index)
}

/// Number of combos spanned by an axis table.
pub fn combo_count(axes: &[ComboAxis]) -> u32 {
    axes.iter().map(|a| a.max + 1).product()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Variant key & vertex layout
// ═══════════════════════════════════════════════════════════════════════════════

/// The subset of features that selects a permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VariantKey {
    pub lightmapped: bool,
    pub flashlight: bool,
    /// Only meaningful with `flashlight`; neutral (0) otherwise.
    pub shadow_filter_mode: u8,
    pub emissive: bool,
    pub env_ambient: bool,
}

impl VariantKey {
    pub fn from_features(flags: &FeatureFlags, caps: &HardwareCaps) -> Self {
        Self {
            lightmapped: flags.is_lightmapped,
            flashlight: flags.flashlight_active,
            // Modes past the table saturate, as `ShadowFilter::from_mode` does.
            shadow_filter_mode: if flags.flashlight_active {
                ShadowFilter::from_mode(caps.shadow_filter_mode) as u8
            } else {
                0
            },
            emissive: flags.has_emissive,
            env_ambient: flags.use_env_ambient,
        }
    }

    pub fn axis_values(&self) -> [u32; 5] {
        [
            self.lightmapped as u32,
            self.flashlight as u32,
            self.shadow_filter_mode as u32,
            self.emissive as u32,
            self.env_ambient as u32,
        ]
    }

    pub fn combo_index(&self) -> Option<u32> {
        combo_index(&STATIC_AXES, &self.axis_values())
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.axis_values();
        let mut first = true;
        for (axis, value) in STATIC_AXES.iter().zip(values) {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}={}", axis.name, value)?;
        }
        Ok(())
    }
}

pub const MAX_TEXCOORDS: usize = 3;

/// Required vertex attributes for a permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayoutDescriptor {
    pub position: bool,
    pub normal: bool,
    pub compressed: bool,
    pub texcoord_count: u8,
    /// Component count per texcoord set; 0 for unused sets.
    pub texcoord_dims: [u8; MAX_TEXCOORDS],
    pub bone_weights: u8,
}

impl VertexLayoutDescriptor {
    /// Skinned models: compressed position/normal, one UV set, up to four
    /// bone weights.
    pub const SKINNED: Self = Self {
        position: true,
        normal: true,
        compressed: true,
        texcoord_count: 1,
        texcoord_dims: [2, 0, 0],
        bone_weights: 4,
    };

    /// Lightmapped world geometry: base UV plus lightmap UVs, uncompressed,
    /// no skinning.
    pub const LIGHTMAPPED: Self = Self {
        position: true,
        normal: true,
        compressed: false,
        texcoord_count: 3,
        texcoord_dims: [2, 2, 2],
        bone_weights: 0,
    };

    #[inline]
    pub fn for_key(key: &VariantKey) -> Self {
        if key.lightmapped {
            Self::LIGHTMAPPED
        } else {
            Self::SKINNED
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permutation registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity of a compiled permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermutationHandle {
    pub combo: u32,
    /// Stable hash of shader name + combo, usable as a sort key.
    pub fingerprint: u64,
}

impl PermutationHandle {
    pub fn new(shader_name: &str, combo: u32) -> Self {
        let mut bytes = Vec::with_capacity(shader_name.len() + 4);
        bytes.extend_from_slice(shader_name.as_bytes());
        bytes.extend_from_slice(&combo.to_le_bytes());
        Self {
            combo,
            fingerprint: xxh3_64(&bytes),
        }
    }
}

/// Compiled shader permutations, provided by the shader system.
pub trait PermutationRegistry: Send + Sync {
    fn lookup(&self, key: &VariantKey) -> Option<PermutationHandle>;
}

/// Rule excluding combos from compilation.
pub type SkipRule = fn(&VariantKey) -> bool;

/// Filter modes only exist on the flashlight path.
pub fn skip_filter_without_flashlight(key: &VariantKey) -> bool {
    !key.flashlight && key.shadow_filter_mode != 0
}

/// A registry defined by the axis table minus skip rules, like an offline
/// shader compile that emits every combo not skipped.
pub struct CompiledPermutations {
    shader_name: String,
    skips: Vec<SkipRule>,
    missing: HashSet<u32>,
}

impl CompiledPermutations {
    pub fn new(shader_name: impl Into<String>) -> Self {
        Self {
            shader_name: shader_name.into(),
            skips: vec![skip_filter_without_flashlight as SkipRule],
            missing: HashSet::new(),
        }
    }

    /// Mark a combo as absent, e.g. a failed compile.
    pub fn without_combo(mut self, combo: u32) -> Self {
        self.missing.insert(combo);
        self
    }

    pub fn compiled_count(&self) -> usize {
        (0..combo_count(&STATIC_AXES))
            .filter(|&c| self.is_compiled(&decode_static(c)))
            .count()
    }

    fn is_compiled(&self, key: &VariantKey) -> bool {
        match key.combo_index() {
            Some(combo) => !self.missing.contains(&combo) && !self.skips.iter().any(|skip| skip(key)),
            None => false,
        }
    }
}

impl PermutationRegistry for CompiledPermutations {
    fn lookup(&self, key: &VariantKey) -> Option<PermutationHandle> {
        if !self.is_compiled(key) {
            return None;
        }
        key.combo_index()
            .map(|combo| PermutationHandle::new(&self.shader_name, combo))
    }
}

/// Inverse of `VariantKey::combo_index`.
pub fn decode_static(mut combo: u32) -> VariantKey {
    let mut values = [0u32; 5];
    for (value, axis) in values.iter_mut().zip(STATIC_AXES.iter()) {
        *value = combo % (axis.max + 1);
        combo /= axis.max + 1;
    }
    VariantKey {
        lightmapped: values[0] != 0,
        flashlight: values[1] != 0,
        shadow_filter_mode: values[2] as u8,
        emissive: values[3] != 0,
        env_ambient: values[4] != 0,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Selection
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of static selection: identical for identical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectedVariant {
    pub key: VariantKey,
    pub layout: VertexLayoutDescriptor,
    pub permutation: PermutationHandle,
}

pub fn select_variant(key: &VariantKey, registry: &dyn PermutationRegistry) -> Result<SelectedVariant> {
    let Some(permutation) = registry.lookup(key) else {
        crate::bail!(Error::PermutationMissing {
            key: *key,
            combo: key.combo_index().unwrap_or(u32::MAX),
        });
    };
    Ok(SelectedVariant {
        key: *key,
        layout: VertexLayoutDescriptor::for_key(key),
        permutation,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dynamic combos
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-draw combo selection. Changes the dynamic index only, never the
/// static permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DynamicCombos {
    pub water_fog: u32,
    pub skinning: bool,
    pub lighting_preview: bool,
    pub compressed_verts: bool,
    pub num_lights: u32,
    pub write_water_fog_to_alpha: bool,
    pub write_depth_to_alpha: bool,
    pub pixel_fog_type: u32,
    pub flashlight_shadows: bool,
}

impl DynamicCombos {
    pub fn axis_values(&self) -> [u32; 9] {
        [
            self.water_fog,
            self.skinning as u32,
            self.lighting_preview as u32,
            self.compressed_verts as u32,
            self.num_lights,
            self.write_water_fog_to_alpha as u32,
            self.write_depth_to_alpha as u32,
            self.pixel_fog_type,
            self.flashlight_shadows as u32,
        ]
    }

    pub fn combo_index(&self) -> Option<u32> {
        combo_index(&DYNAMIC_AXES, &self.axis_values())
    }
}
