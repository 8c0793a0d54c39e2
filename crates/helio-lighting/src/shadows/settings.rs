//! Shadow configuration
//!
//! Static settings read by every stage of the directional shadow pass. They
//! are validated once when the shadow subsystem is created; the per-frame
//! path assumes a validated value.

use glam::Vec3;
use helio_core::{HelioError, Result};
use serde::{Deserialize, Serialize};

use super::MAX_SHADOWED_DIRECTIONAL_LIGHTS;

/// Largest tile grid the atlas layout supports (4×4).
pub const MAX_ATLAS_TILES: usize = 16;
/// Maximum cascades per directional light.
pub const MAX_CASCADES: usize = 4;

pub const MIN_ATLAS_SIZE: u32 = 256;
pub const MAX_ATLAS_SIZE: u32 = 8192;

const MIN_DISTANCE: f32 = 0.001;
const MIN_FADE: f32 = 0.001;

/// PCF kernel used when sampling directional shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum FilterQuality {
    #[default]
    Pcf3 = 1,
    Pcf5 = 2,
    Pcf7 = 3,
}

impl FilterQuality {
    pub fn level(self) -> u32 {
        self as u32
    }

    /// Filter width in texels, relative to the tile resolution.
    pub fn texel_span(self) -> f32 {
        (self.level() + 1) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    pub atlas_size: u32,
    pub filter: FilterQuality,
    pub cascade_count: u32,
    /// Far end of the first three cascades as a fraction of the shadow
    /// distance. The last cascade always ends at the full distance.
    pub cascade_ratios: [f32; 3],
    pub cascade_fade: f32,
}

impl DirectionalShadowSettings {
    pub fn cascade_ratios(&self) -> Vec3 {
        Vec3::from_array(self.cascade_ratios)
    }
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: 1024,
            filter: FilterQuality::Pcf3,
            cascade_count: 4,
            cascade_ratios: [0.1, 0.25, 0.5],
            cascade_fade: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub max_distance: f32,
    pub distance_fade: f32,
    pub directional: DirectionalShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
        }
    }
}

impl ShadowSettings {
    /// Clamp the continuous values into their usable ranges and reject
    /// structural violations.
    ///
    /// `cascade_fade` is clamped away from zero so the shading fade term
    /// `1 / (1 - (1 - cascade_fade)^2)` stays finite.
    pub fn validated(mut self) -> Result<Self> {
        if !self.max_distance.is_finite() {
            return Err(invalid("max_distance must be finite"));
        }
        self.max_distance = self.max_distance.max(MIN_DISTANCE);
        self.distance_fade = clamp_unit(self.distance_fade, "distance_fade")?;

        let directional = &mut self.directional;
        directional.cascade_fade = clamp_unit(directional.cascade_fade, "cascade_fade")?;

        let size = directional.atlas_size;
        if !size.is_power_of_two() || !(MIN_ATLAS_SIZE..=MAX_ATLAS_SIZE).contains(&size) {
            return Err(invalid(format!(
                "atlas_size {size} must be a power of two in [{MIN_ATLAS_SIZE}, {MAX_ATLAS_SIZE}]"
            )));
        }

        let cascades = directional.cascade_count as usize;
        if !(1..=MAX_CASCADES).contains(&cascades) {
            return Err(invalid(format!(
                "cascade_count {cascades} must be in [1, {MAX_CASCADES}]"
            )));
        }

        let used = &directional.cascade_ratios[..cascades - 1];
        let mut previous = 0.0;
        for &ratio in used {
            if !(ratio > previous && ratio < 1.0) {
                return Err(invalid(format!(
                    "cascade ratios {used:?} must increase strictly inside (0, 1)"
                )));
            }
            previous = ratio;
        }

        let tiles = MAX_SHADOWED_DIRECTIONAL_LIGHTS * cascades;
        if tiles > MAX_ATLAS_TILES {
            return Err(invalid(format!(
                "{MAX_SHADOWED_DIRECTIONAL_LIGHTS} lights x {cascades} cascades needs {tiles} tiles, atlas holds {MAX_ATLAS_TILES}"
            )));
        }

        Ok(self)
    }
}

fn clamp_unit(value: f32, name: &str) -> Result<f32> {
    if value.is_nan() {
        return Err(invalid(format!("{name} is NaN")));
    }
    Ok(value.clamp(MIN_FADE, 1.0))
}

fn invalid(message: impl Into<String>) -> HelioError {
    HelioError::InvalidConfiguration(message.into())
}
