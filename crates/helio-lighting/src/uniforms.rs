//! Shader property ids
//!
//! Ids are the FNV-1a hash of the property name, computed at compile time.
//! The reverse map is built once on first use and never mutated.

use std::collections::HashMap;

use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderPropertyId(u32);

impl ShaderPropertyId {
    pub const fn from_name(name: &str) -> Self {
        Self(const_fnv1a_hash::fnv1a_hash_str_32(name))
    }

    /// Name of a registered property, for diagnostics.
    pub fn name(self) -> Option<&'static str> {
        PROPERTY_NAMES.get(&self).copied()
    }
}

macro_rules! shader_properties {
    ($($ident:ident = $name:literal),* $(,)?) => {
        $(pub const $ident: ShaderPropertyId = ShaderPropertyId::from_name($name);)*

        /// Every property the lighting passes publish.
        pub const ALL: &[(&str, ShaderPropertyId)] = &[$(($name, $ident)),*];
    };
}

pub mod properties {
    use super::ShaderPropertyId;

    shader_properties! {
        DIRECTIONAL_LIGHT_COUNT = "_DirectionalLightCount",
        DIRECTIONAL_LIGHT_COLORS = "_DirectionalLightColors",
        DIRECTIONAL_LIGHT_DIRECTIONS = "_DirectionalLightDirections",
        DIRECTIONAL_LIGHT_SHADOW_DATA = "_DirectionalLightShadowData",
        DIRECTIONAL_SHADOW_ATLAS = "_DirectionalShadowAtlas",
        DIRECTIONAL_SHADOW_MATRICES = "_DirectionalShadowMatrices",
        CASCADE_COUNT = "_CascadeCount",
        CASCADE_CULLING_SPHERES = "_CascadeCullingSpheres",
        CASCADE_DATA = "_CascadeData",
        SHADOW_ATLAS_SIZE = "_ShadowAtlasSize",
        SHADOW_DISTANCE_FADE = "_ShadowDistanceFade",
    }
}

lazy_static! {
    static ref PROPERTY_NAMES: HashMap<ShaderPropertyId, &'static str> = {
        let mut names = HashMap::with_capacity(properties::ALL.len());
        for &(name, id) in properties::ALL {
            if let Some(previous) = names.insert(id, name) {
                log::error!("shader property id collision: {previous} and {name}");
            }
        }
        names
    };
}
