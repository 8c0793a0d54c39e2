//! Directional shadow caster selection
//!
//! Runs during light setup. Each visible directional light is offered once,
//! in visibility order, and admitted first-come until the cap is reached.
//! There is no ranking by brightness or distance: when more lights qualify
//! than the cap allows, the ones later in the visible list lose shadows.

use glam::Vec4;

use super::MAX_SHADOWED_DIRECTIONAL_LIGHTS;
use crate::culling::CullingResults;
use crate::lights::Light;

/// Bookkeeping for one admitted shadow caster, valid for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowedLight {
    pub visible_light_index: usize,
    pub slope_scale_bias: f32,
    pub near_plane_offset: f32,
}

/// Per-light shadow parameters published alongside the light itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowData {
    pub strength: f32,
    /// First atlas tile of this light; its cascades follow contiguously.
    pub atlas_base_index: u32,
    pub normal_bias: f32,
}

impl ShadowData {
    /// Returned for lights that do not cast shadows this frame.
    pub const NONE: ShadowData = ShadowData {
        strength: 0.0,
        atlas_base_index: 0,
        normal_bias: 0.0,
    };

    pub fn is_shadowed(&self) -> bool {
        self.strength > 0.0
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.strength, self.atlas_base_index as f32, self.normal_bias, 0.0)
    }
}

/// The lights admitted for this frame, handed from light setup to the shadow
/// render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowReservation {
    lights: [ShadowedLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    count: usize,
    cascade_count: u32,
}

impl ShadowReservation {
    pub fn empty(cascade_count: u32) -> Self {
        Self {
            lights: [ShadowedLight::default(); MAX_SHADOWED_DIRECTIONAL_LIGHTS],
            count: 0,
            cascade_count,
        }
    }

    pub fn lights(&self) -> &[ShadowedLight] {
        &self.lights[..self.count]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn cascade_count(&self) -> u32 {
        self.cascade_count
    }

    pub fn tile_count(&self) -> usize {
        self.count * self.cascade_count as usize
    }
}

pub struct LightSelector<'a> {
    culling: &'a dyn CullingResults,
    reservation: ShadowReservation,
    over_capacity: usize,
}

impl<'a> LightSelector<'a> {
    pub fn new(culling: &'a dyn CullingResults, cascade_count: u32) -> Self {
        Self {
            culling,
            reservation: ShadowReservation::empty(cascade_count),
            over_capacity: 0,
        }
    }

    /// Offer a visible directional light for shadow casting.
    ///
    /// Admission requires a shadow mode other than none, a positive
    /// strength, non-empty caster bounds and a free slot. Rejected lights get
    /// [`ShadowData::NONE`] and shade unshadowed.
    pub fn reserve(&mut self, light: &Light, visible_light_index: usize) -> ShadowData {
        if !light.casts_shadows() {
            return ShadowData::NONE;
        }
        if self.culling.shadow_caster_bounds(visible_light_index).is_none() {
            return ShadowData::NONE;
        }
        if self.reservation.count >= MAX_SHADOWED_DIRECTIONAL_LIGHTS {
            self.over_capacity += 1;
            return ShadowData::NONE;
        }

        let slot = self.reservation.count;
        self.reservation.lights[slot] = ShadowedLight {
            visible_light_index,
            slope_scale_bias: light.shadow_bias,
            near_plane_offset: light.shadow_near_plane,
        };
        self.reservation.count += 1;

        ShadowData {
            strength: light.shadow_strength,
            atlas_base_index: self.reservation.cascade_count * slot as u32,
            normal_bias: light.shadow_normal_bias,
        }
    }

    pub fn admitted(&self) -> usize {
        self.reservation.count
    }

    /// Lights that qualified for shadows but found the cap already reached.
    pub fn dropped(&self) -> usize {
        self.over_capacity
    }

    pub fn finish(self) -> ShadowReservation {
        if self.over_capacity > 0 {
            log::warn!(
                "{} shadowed directional light(s) dropped, cap is {}",
                self.over_capacity,
                MAX_SHADOWED_DIRECTIONAL_LIGHTS
            );
        }
        self.reservation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::{CullingResults, SceneCulling};
    use crate::lights::{LightShadows, VisibleLight};
    use glam::Vec3;
    use helio_core::{Aabb, Camera};

    fn casters() -> Option<Aabb> {
        Some(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(5.0)))
    }

    fn shadowed() -> Light {
        Light::default()
            .with_shadows(LightShadows::Soft, 0.8)
            .with_biases(1.5, 0.3, 0.7)
    }

    #[test]
    fn admission_records_biases_and_base_index() {
        let culling = SceneCulling::new(Camera::default(), 50.0)
            .with_light(VisibleLight::directional(Light::default(), Vec3::NEG_Y), casters())
            .with_light(VisibleLight::directional(shadowed(), Vec3::NEG_Y), casters())
            .with_light(VisibleLight::directional(shadowed(), Vec3::NEG_Y), casters());

        let mut selector = LightSelector::new(&culling, 4);
        assert_eq!(selector.reserve(&Light::default(), 0), ShadowData::NONE);

        let first = selector.reserve(&shadowed(), 1);
        let second = selector.reserve(&shadowed(), 2);
        assert_eq!(first.atlas_base_index, 0);
        assert_eq!(second.atlas_base_index, 4);
        assert_eq!(first.strength, 0.8);
        assert_eq!(first.normal_bias, 0.3);

        let reservation = selector.finish();
        assert_eq!(reservation.len(), 2);
        assert_eq!(reservation.tile_count(), 8);
        assert_eq!(reservation.lights()[0].visible_light_index, 1);
        assert_eq!(reservation.lights()[0].slope_scale_bias, 1.5);
        assert_eq!(reservation.lights()[0].near_plane_offset, 0.7);
    }

    #[test]
    fn lights_without_casters_are_rejected() {
        let culling = SceneCulling::new(Camera::default(), 50.0)
            .with_light(VisibleLight::directional(shadowed(), Vec3::NEG_Y), None);
        let mut selector = LightSelector::new(&culling, 2);
        assert!(!selector.reserve(&shadowed(), 0).is_shadowed());
        assert!(selector.finish().is_empty());
    }

    #[test]
    fn admission_is_first_come_up_to_the_cap() {
        let mut culling = SceneCulling::new(Camera::default(), 50.0);
        for _ in 0..6 {
            culling.push_light(VisibleLight::directional(shadowed(), Vec3::NEG_Y), casters());
        }
        let mut selector = LightSelector::new(&culling, 1);
        let data: Vec<_> = (0..6).map(|i| selector.reserve(&shadowed(), i)).collect();
        assert!(data[..4].iter().all(ShadowData::is_shadowed));
        assert!(data[4..].iter().all(|d| !d.is_shadowed()));

        assert_eq!(selector.dropped(), 2);

        let reservation = selector.finish();
        let indices: Vec<_> = reservation.lights().iter().map(|l| l.visible_light_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn only_qualifying_lights_count_as_dropped() {
        let mut culling = SceneCulling::new(Camera::default(), 50.0);
        for _ in 0..4 {
            culling.push_light(VisibleLight::directional(shadowed(), Vec3::NEG_Y), casters());
        }
        culling.push_light(VisibleLight::directional(shadowed(), Vec3::NEG_Y), None);
        culling.push_light(VisibleLight::directional(Light::default(), Vec3::NEG_Y), casters());
        culling.push_light(VisibleLight::directional(shadowed(), Vec3::NEG_Y), casters());

        let mut selector = LightSelector::new(&culling, 4);
        for (index, visible) in culling.visible_lights().iter().enumerate() {
            selector.reserve(&visible.light, index);
        }
        assert_eq!(selector.admitted(), 4);
        assert_eq!(selector.dropped(), 1);
    }
}
