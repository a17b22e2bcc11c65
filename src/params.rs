// src/params.rs
//! Material parameter store.
//!
//! A `ParameterSet` is a flat table of typed value slots, built once from a
//! list of `ParameterDefinition`s. Each slot carries a *defined* bit that is
//! only set by an explicit assignment, never by the declared default.
//!
//! Names are resolved to `ParamHandle`s once (see `PbrParams`); every
//! draw-time read goes through a handle, so the hot path never hashes a string.

use std::collections::HashMap;
use std::fmt;

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};

/// The kind of value a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParameterKind {
    /// Texture reference, or a string placeholder naming one.
    Texture,
    /// 32-bit floating point scalar
    Float,
    /// 3D vector of floats (also used for RGB colors)
    Vec3,
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// 4x4 transform, e.g. a texture coordinate transform
    Matrix,
}

/// Opaque handle to a texture owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u32);

/// How a loaded texture is meant to be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureShape {
    Flat2D,
    Cube,
    /// Stand-in for a cube map on hardware without cubemap support.
    SphereMap,
}

/// A loaded texture as seen by the shading core: a handle plus the few
/// properties that influence state selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureRef {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
    /// The texture carries a meaningful alpha channel.
    pub translucent: bool,
    pub shape: TextureShape,
}

impl TextureRef {
    pub fn new(handle: u32, width: u32, height: u32) -> Self {
        Self {
            handle: TextureHandle(handle),
            width,
            height,
            translucent: false,
            shape: TextureShape::Flat2D,
        }
    }

    pub fn translucent(mut self, translucent: bool) -> Self {
        self.translucent = translucent;
        self
    }

    pub fn with_shape(mut self, shape: TextureShape) -> Self {
        self.shape = shape;
        self
    }
}

/// The value held by a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Texture(TextureRef),
    /// Unloaded texture name. Only valid in texture slots.
    String(String),
    Float(f32),
    Vec3(Vec3),
    Bool(bool),
    Int(i32),
    Matrix(Mat4),
}

impl SlotValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            SlotValue::Texture(_) | SlotValue::String(_) => ParameterKind::Texture,
            SlotValue::Float(_) => ParameterKind::Float,
            SlotValue::Vec3(_) => ParameterKind::Vec3,
            SlotValue::Bool(_) => ParameterKind::Bool,
            SlotValue::Int(_) => ParameterKind::Int,
            SlotValue::Matrix(_) => ParameterKind::Matrix,
        }
    }

    fn zero(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Texture => SlotValue::String(String::new()),
            ParameterKind::Float => SlotValue::Float(0.0),
            ParameterKind::Vec3 => SlotValue::Vec3(Vec3::ZERO),
            ParameterKind::Bool => SlotValue::Bool(false),
            ParameterKind::Int => SlotValue::Int(0),
            ParameterKind::Matrix => SlotValue::Matrix(Mat4::IDENTITY),
        }
    }
}

/// A single declared parameter.
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: &'static str,
    pub kind: ParameterKind,
    pub default_value: SlotValue,
    /// Free-form description, kept for tooling.
    pub help: &'static str,
}

impl ParameterDefinition {
    pub fn new(name: &'static str, kind: ParameterKind) -> Self {
        Self {
            name,
            kind,
            default_value: SlotValue::zero(kind),
            help: "",
        }
    }

    /// Set the default value. The kind must match; a mismatching default is
    /// replaced by the kind's zero value.
    pub fn with_default(mut self, value: SlotValue) -> Self {
        if value.kind() == self.kind {
            self.default_value = value;
        }
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }
}

/// Slot state: definition, current value and the defined bit.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub definition: ParameterDefinition,
    value: SlotValue,
    defined: bool,
}

impl Parameter {
    fn new(definition: ParameterDefinition) -> Self {
        Self {
            value: definition.default_value.clone(),
            definition,
            defined: false,
        }
    }

    #[inline]
    pub fn value(&self) -> &SlotValue {
        &self.value
    }

    #[inline]
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Defined and holding a loaded texture (not a string placeholder).
    #[inline]
    pub fn is_texture(&self) -> bool {
        self.defined && matches!(self.value, SlotValue::Texture(_))
    }
}

/// Index of a slot inside its `ParameterSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamHandle(u16);

/// Material-level flags, set by the material file rather than by parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialFlags(pub u32);

impl MaterialFlags {
    /// Drawn on models (skinned geometry) instead of lightmapped world brushes.
    pub const MODEL: Self = Self(1 << 0);
    pub const ALPHATEST: Self = Self(1 << 1);
    pub const TRANSLUCENT: Self = Self(1 << 2);
    pub const ADDITIVE: Self = Self(1 << 3);
    pub const VERTEXALPHA: Self = Self(1 << 4);
    /// Opt out of process-wide debug overrides (fullbright and friends).
    pub const NO_DEBUG_OVERRIDE: Self = Self(1 << 5);

    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for MaterialFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The material's declared parameters and their current values.
#[derive(Clone)]
pub struct ParameterSet {
    params: Vec<Parameter>,
    by_name: HashMap<&'static str, ParamHandle>,
    flags: MaterialFlags,
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSet")
            .field("params", &self.params.len())
            .field("flags", &self.flags)
            .finish()
    }
}

impl ParameterSet {
    pub fn new<I>(definitions: I, flags: MaterialFlags) -> Self
    where
        I: IntoIterator<Item = ParameterDefinition>,
    {
        let mut params = Vec::new();
        let mut by_name = HashMap::new();
        for def in definitions {
            // Later duplicates shadow earlier ones, like a material file would.
            let handle = ParamHandle(params.len() as u16);
            by_name.insert(def.name, handle);
            params.push(Parameter::new(def));
        }
        Self {
            params,
            by_name,
            flags,
        }
    }

    #[inline]
    pub fn flags(&self) -> MaterialFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: MaterialFlags) {
        self.flags = flags;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Resolve a name once. Fails for names that were never declared.
    pub fn find(&self, name: &str) -> Result<ParamHandle> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownParameter(name.to_owned()))
    }

    /// Like `find`, for parameters a generation may not declare.
    pub fn find_optional(&self, name: &str) -> Option<ParamHandle> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn get(&self, handle: ParamHandle) -> &Parameter {
        &self.params[handle.0 as usize]
    }

    #[inline]
    pub fn is_defined(&self, handle: ParamHandle) -> bool {
        self.get(handle).is_defined()
    }

    #[inline]
    pub fn is_texture(&self, handle: ParamHandle) -> bool {
        self.get(handle).is_texture()
    }

    // ---------- typed getters (hot path) ----------

    /// The loaded texture, if the slot is defined and loaded.
    #[inline]
    pub fn texture(&self, handle: ParamHandle) -> Option<&TextureRef> {
        let p = self.get(handle);
        match &p.value {
            SlotValue::Texture(t) if p.defined => Some(t),
            _ => None,
        }
    }

    /// The unloaded texture name, if the slot is defined and not loaded yet.
    pub fn string(&self, handle: ParamHandle) -> Option<&str> {
        let p = self.get(handle);
        match &p.value {
            SlotValue::String(s) if p.defined => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn float(&self, handle: ParamHandle) -> f32 {
        match self.get(handle).value {
            SlotValue::Float(v) => v,
            _ => 0.0,
        }
    }

    #[inline]
    pub fn vec3(&self, handle: ParamHandle) -> Vec3 {
        match self.get(handle).value {
            SlotValue::Vec3(v) => v,
            _ => Vec3::ZERO,
        }
    }

    #[inline]
    pub fn bool(&self, handle: ParamHandle) -> bool {
        match self.get(handle).value {
            SlotValue::Bool(v) => v,
            SlotValue::Int(v) => v != 0,
            _ => false,
        }
    }

    #[inline]
    pub fn int(&self, handle: ParamHandle) -> i32 {
        match self.get(handle).value {
            SlotValue::Int(v) => v,
            _ => 0,
        }
    }

    /// Identity for non-matrix slots.
    #[inline]
    pub fn matrix(&self, handle: ParamHandle) -> Mat4 {
        match self.get(handle).value {
            SlotValue::Matrix(m) => m,
            _ => Mat4::IDENTITY,
        }
    }

    // ---------- setters ----------

    /// Assign a value and mark the slot defined. The value kind must match
    /// the declaration.
    pub fn set(&mut self, handle: ParamHandle, value: SlotValue) -> Result<()> {
        let param = &mut self.params[handle.0 as usize];
        if value.kind() != param.definition.kind {
            return Err(Error::TypeMismatch {
                name: param.definition.name.to_owned(),
                expected: param.definition.kind,
                found: value.kind(),
            });
        }
        param.value = value;
        param.defined = true;
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: SlotValue) -> Result<()> {
        let handle = self.find(name)?;
        self.set(handle, value)
    }

    pub fn set_texture(&mut self, name: &str, texture: TextureRef) -> Result<()> {
        self.set_by_name(name, SlotValue::Texture(texture))
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.set_by_name(name, SlotValue::String(value.into()))
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.set_by_name(name, SlotValue::Float(value))
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<()> {
        self.set_by_name(name, SlotValue::Vec3(value))
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.set_by_name(name, SlotValue::Bool(value))
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.set_by_name(name, SlotValue::Int(value))
    }

    pub fn set_matrix(&mut self, name: &str, value: Mat4) -> Result<()> {
        self.set_by_name(name, SlotValue::Matrix(value))
    }

    /// Reset a slot to its declared default and clear the defined bit.
    pub fn undefine(&mut self, name: &str) -> Result<()> {
        let handle = self.find(name)?;
        let param = &mut self.params[handle.0 as usize];
        param.value = param.definition.default_value.clone();
        param.defined = false;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamHandle, &Parameter)> {
        self.params
            .iter()
            .enumerate()
            .map(|(i, p)| (ParamHandle(i as u16), p))
    }
}
