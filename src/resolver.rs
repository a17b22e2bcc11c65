// src/resolver.rs
//! Initialization-time parameter resolution.
//!
//! Runs once per material, before the first snapshot:
//! 1. `init_params` applies defaulting and back-compat rewrites.
//! 2. `load_textures` turns defined texture names into loaded references
//!    through the renderer's `TextureSource`.
//!
//! Missing optional textures are never an error here. The only hard failure
//! is the flashlight cookie slot, which every generation declares.

use crate::config::{ShaderGeneration, ShadingConfig};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::params::{ParamHandle, ParameterSet, SlotValue, TextureRef, TextureShape};
use crate::pbr_materials::{names, PbrParams};
use crate::render_context::HardwareCaps;

/// How a texture should be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureLoadFlags {
    pub srgb: bool,
    pub normal_map: bool,
    pub no_mip: bool,
    pub shape: Option<TextureShape>,
}

impl TextureLoadFlags {
    pub const SRGB: Self = Self { srgb: true, normal_map: false, no_mip: false, shape: None };
    pub const NORMAL: Self = Self { srgb: false, normal_map: true, no_mip: false, shape: None };
    pub const LINEAR: Self = Self { srgb: false, normal_map: false, no_mip: false, shape: None };
    /// Lookup tables: linear, single mip.
    pub const LOOKUP: Self = Self { srgb: false, normal_map: false, no_mip: true, shape: None };

    pub fn cube() -> Self {
        Self { shape: Some(TextureShape::Cube), ..Self::LINEAR }
    }

    pub fn sphere_map() -> Self {
        Self { shape: Some(TextureShape::SphereMap), ..Self::LINEAR }
    }
}

/// Texture asset loading, provided by the renderer.
pub trait TextureSource {
    /// Load (or find) a texture by name. `None` when the asset does not exist.
    fn load(&mut self, name: &str, flags: TextureLoadFlags) -> Option<TextureRef>;
}

/// Apply first-use defaulting and back-compat rewrites.
pub fn init_params(
    params: &mut ParameterSet,
    handles: &PbrParams,
    caps: &HardwareCaps,
    config: &ShadingConfig,
) -> Result<()> {
    match (config.generation, handles.normal_texture) {
        (ShaderGeneration::Legacy, Some(legacy)) => {
            if params.is_defined(legacy) && !params.is_defined(handles.bump_map) {
                let value = params.get(legacy).value().clone();
                params
                    .set(handles.bump_map, value)
                    .context("copying legacy normal texture into bumpmap")?;
                log::debug!("aliased `{}` to `{}`", names::NORMAL_TEXTURE, names::BUMP_MAP);
            }
        }
        (ShaderGeneration::Legacy, None) => {
            log::warn!("legacy generation without a `{}` slot", names::NORMAL_TEXTURE);
        }
        (ShaderGeneration::Current, _) => {}
    }

    if !params.is_defined(handles.bump_map) {
        params.set(
            handles.bump_map,
            SlotValue::String(config.flat_normal_texture.clone()),
        )?;
    }

    // The lookup table is not material-editable.
    params.set(
        handles.pbr_lookup,
        SlotValue::String(config.pbr_lookup_texture.clone()),
    )?;

    let cookie = if caps.supports_border_color {
        &config.flashlight_border_texture
    } else {
        &config.flashlight_texture
    };
    params
        .set(handles.flashlight_texture, SlotValue::String(cookie.clone()))
        .map_err(|_| Error::MissingRequiredParameter(names::FLASHLIGHT_TEXTURE))?;
    crate::ensure!(
        params.is_defined(handles.flashlight_texture),
        Error::MissingRequiredParameter(names::FLASHLIGHT_TEXTURE)
    );

    Ok(())
}

/// Load every defined texture slot that still holds a name.
pub fn load_textures(
    params: &mut ParameterSet,
    handles: &PbrParams,
    source: &mut dyn TextureSource,
    caps: &HardwareCaps,
) -> Result<()> {
    let env_flags = if caps.supports_cubemaps {
        TextureLoadFlags::cube()
    } else {
        log::warn!("device lacks cubemap support, loading environment maps as sphere maps");
        TextureLoadFlags::sphere_map()
    };

    let mut slots: Vec<(ParamHandle, TextureLoadFlags)> = vec![
        (handles.base_texture, TextureLoadFlags::SRGB),
        (handles.bump_map, TextureLoadFlags::NORMAL),
        (handles.env_map, env_flags),
        (handles.mrao_texture, TextureLoadFlags::LINEAR),
        (handles.emission_texture, TextureLoadFlags::SRGB),
        (handles.flashlight_texture, TextureLoadFlags::SRGB),
        (handles.pbr_lookup, TextureLoadFlags::LOOKUP),
    ];
    if let Some(legacy) = handles.normal_texture {
        slots.push((legacy, TextureLoadFlags::NORMAL));
    }

    for (handle, flags) in slots {
        let Some(name) = params.string(handle).map(str::to_owned) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        match source.load(&name, flags) {
            Some(mut texture) => {
                if let Some(shape) = flags.shape {
                    texture.shape = shape;
                }
                params.set(handle, SlotValue::Texture(texture))?;
            }
            None if handle == handles.flashlight_texture => {
                log::warn!("flashlight cookie `{}` failed to load", name);
            }
            None => {
                log::debug!("texture `{}` not found, channel will use its fallback", name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MaterialFlags;
    use crate::pbr_materials::pbr_parameter_set;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Library {
        known: HashMap<String, TextureRef>,
        requests: Vec<(String, TextureLoadFlags)>,
    }

    impl Library {
        fn with(mut self, name: &str, handle: u32) -> Self {
            self.known.insert(name.to_owned(), TextureRef::new(handle, 256, 256));
            self
        }
    }

    impl TextureSource for Library {
        fn load(&mut self, name: &str, flags: TextureLoadFlags) -> Option<TextureRef> {
            self.requests.push((name.to_owned(), flags));
            self.known.get(name).copied()
        }
    }

    fn setup(generation: ShaderGeneration) -> (ParameterSet, PbrParams, ShadingConfig) {
        let config = ShadingConfig { generation, ..Default::default() };
        let params = pbr_parameter_set(generation, MaterialFlags::MODEL);
        let handles = PbrParams::resolve(&params).unwrap();
        (params, handles, config)
    }

    #[test]
    fn legacy_alias_copies_normal_texture() {
        let (mut params, handles, config) = setup(ShaderGeneration::Legacy);
        params.set_string(names::NORMAL_TEXTURE, "brick/wall_normal").unwrap();
        init_params(&mut params, &handles, &HardwareCaps::default(), &config).unwrap();
        assert_eq!(params.string(handles.bump_map), Some("brick/wall_normal"));
    }

    #[test]
    fn modern_slot_wins_over_alias() {
        let (mut params, handles, config) = setup(ShaderGeneration::Legacy);
        params.set_string(names::NORMAL_TEXTURE, "old").unwrap();
        params.set_string(names::BUMP_MAP, "new").unwrap();
        init_params(&mut params, &handles, &HardwareCaps::default(), &config).unwrap();
        assert_eq!(params.string(handles.bump_map), Some("new"));
    }

    #[test]
    fn current_generation_has_no_alias() {
        let (mut params, handles, config) = setup(ShaderGeneration::Current);
        assert!(handles.normal_texture.is_none());
        assert!(params.set_string(names::NORMAL_TEXTURE, "old").is_err());
        init_params(&mut params, &handles, &HardwareCaps::default(), &config).unwrap();
        assert_eq!(params.string(handles.bump_map), Some("dev/flat_normal"));
    }

    #[test]
    fn cookie_follows_border_color_support() {
        let (mut params, handles, config) = setup(ShaderGeneration::Legacy);
        let caps = HardwareCaps { supports_border_color: false, ..Default::default() };
        init_params(&mut params, &handles, &caps, &config).unwrap();
        assert_eq!(params.string(handles.flashlight_texture), Some("effects/flashlight001"));

        init_params(&mut params, &handles, &HardwareCaps::default(), &config).unwrap();
        assert_eq!(params.string(handles.flashlight_texture), Some("effects/flashlight_border"));
    }

    #[test]
    fn load_resolves_known_names_only() {
        let (mut params, handles, config) = setup(ShaderGeneration::Legacy);
        params.set_string(names::BASE_TEXTURE, "brick/wall").unwrap();
        params.set_string(names::ENV_MAP, "env/sky").unwrap();
        init_params(&mut params, &handles, &HardwareCaps::default(), &config).unwrap();

        let mut lib = Library::default()
            .with("brick/wall", 1)
            .with("env/sky", 2)
            .with("effects/flashlight_border", 3);
        let caps = HardwareCaps { supports_cubemaps: false, ..Default::default() };
        load_textures(&mut params, &handles, &mut lib, &caps).unwrap();

        assert!(params.is_texture(handles.base_texture));
        assert!(params.is_texture(handles.flashlight_texture));
        // flat normal is unknown to this library: stays a name
        assert!(!params.is_texture(handles.bump_map));
        assert_eq!(params.texture(handles.env_map).unwrap().shape, TextureShape::SphereMap);
        assert!(lib
            .requests
            .iter()
            .any(|(n, f)| n == "brick/wall" && f.srgb));
    }

    #[test]
    fn lookup_table_loads_without_mips() {
        let (mut params, handles, config) = setup(ShaderGeneration::Current);
        params.set_string(names::PBR_LOOKUP, "custom/lookup").unwrap();
        init_params(&mut params, &handles, &HardwareCaps::default(), &config).unwrap();
        assert_eq!(params.string(handles.pbr_lookup), Some("dev/pbr_lookup"));

        let mut lib = Library::default().with("dev/pbr_lookup", 7);
        load_textures(&mut params, &handles, &mut lib, &HardwareCaps::default()).unwrap();

        assert_eq!(params.texture(handles.pbr_lookup).map(|t| t.handle.0), Some(7));
        let (_, flags) = lib
            .requests
            .iter()
            .find(|(n, _)| n == "dev/pbr_lookup")
            .unwrap();
        assert_eq!(*flags, TextureLoadFlags::LOOKUP);
        assert!(flags.no_mip && !flags.srgb);
    }
}
