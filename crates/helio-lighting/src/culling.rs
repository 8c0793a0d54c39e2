//! Culling collaborators consumed by the shadow pass
//!
//! The shadow subsystem never culls on its own. It reads the frame's visible
//! lights and their shadow-caster bounds from a [`CullingResults`] and asks a
//! [`CascadeFitter`] for the light-space frustum of every cascade.
//! [`SceneCulling`] implements both for a single camera.

use glam::{Mat4, Vec3};
use helio_core::{Aabb, Camera, Sphere};

use crate::lights::{LightType, VisibleLight};

/// Per-cascade culling data handed back with the cascade frustum and passed
/// on to the caster draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSplitData {
    pub culling_sphere: Sphere,
    /// Casters fully covered by the previous cascade may be skipped once this
    /// fraction of the blend region is reached.
    pub cascade_blend_culling_factor: f32,
}

/// View/projection pair for one cascade of one light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeFrustum {
    pub view: Mat4,
    /// Clip space follows the OpenGL convention, z in [-1, 1].
    pub projection: Mat4,
    pub split: ShadowSplitData,
}

pub trait CullingResults {
    /// Visible lights for this frame. Indices are stable until the next cull.
    fn visible_lights(&self) -> &[VisibleLight];

    /// Bounds of everything the light can cast shadows from, or `None` when
    /// no caster is in range.
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Aabb>;
}

pub trait CascadeFitter {
    /// Fit the cascade `cascade_index` of `cascade_count` for a directional
    /// light. `ratios` holds the far end of the first three cascades as a
    /// fraction of the shadow distance.
    fn compute_directional_cascade(
        &self,
        visible_light_index: usize,
        cascade_index: u32,
        cascade_count: u32,
        ratios: Vec3,
        tile_size: u32,
        near_plane_offset: f32,
    ) -> CascadeFrustum;
}

/// Culling results for one camera.
///
/// Cascades are the bounding spheres of consecutive camera-frustum slices
/// out to the shadow distance, seen through an orthographic projection
/// looking down the light direction.
#[derive(Debug, Clone)]
pub struct SceneCulling {
    camera: Camera,
    shadow_distance: f32,
    visible: Vec<VisibleLight>,
    caster_bounds: Vec<Option<Aabb>>,
}

impl SceneCulling {
    /// Shadows never reach past the camera far plane.
    pub fn new(camera: Camera, max_shadow_distance: f32) -> Self {
        Self {
            camera,
            shadow_distance: max_shadow_distance.min(camera.far_plane),
            visible: Vec::new(),
            caster_bounds: Vec::new(),
        }
    }

    pub fn with_light(mut self, light: VisibleLight, caster_bounds: Option<Aabb>) -> Self {
        self.push_light(light, caster_bounds);
        self
    }

    pub fn push_light(&mut self, light: VisibleLight, caster_bounds: Option<Aabb>) -> usize {
        self.visible.push(light);
        self.caster_bounds.push(caster_bounds.filter(|b| !b.is_empty()));
        self.visible.len() - 1
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn shadow_distance(&self) -> f32 {
        self.shadow_distance
    }

    /// View distances covered by a cascade.
    pub fn cascade_range(&self, cascade_index: u32, cascade_count: u32, ratios: Vec3) -> (f32, f32) {
        let fraction = |i: u32| -> f32 {
            if i == 0 {
                0.0
            } else if i >= cascade_count {
                1.0
            } else {
                ratios[(i - 1) as usize]
            }
        };
        let near = self.camera.near_plane;
        let span = self.shadow_distance - near;
        (
            near + span * fraction(cascade_index),
            near + span * fraction(cascade_index + 1),
        )
    }
}

impl CullingResults for SceneCulling {
    fn visible_lights(&self) -> &[VisibleLight] {
        &self.visible
    }

    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Aabb> {
        let light = self.visible.get(visible_light_index)?;
        if light.light_type() != LightType::Directional {
            return None;
        }
        self.caster_bounds[visible_light_index]
    }
}

impl CascadeFitter for SceneCulling {
    fn compute_directional_cascade(
        &self,
        visible_light_index: usize,
        cascade_index: u32,
        cascade_count: u32,
        ratios: Vec3,
        _tile_size: u32,
        near_plane_offset: f32,
    ) -> CascadeFrustum {
        let (near, far) = self.cascade_range(cascade_index, cascade_count, ratios);
        let sphere = Sphere::enclosing(&self.camera.slice_corners(near, far));

        let (forward, casters) = match self.visible.get(visible_light_index) {
            Some(light) => (light.forward(), self.caster_bounds[visible_light_index]),
            None => (Vec3::NEG_Y, None),
        };

        // Casters behind the sphere (towards the light) must still land in
        // front of the near plane.
        let behind = casters
            .map(|bounds| -bounds.project_onto(sphere.center, forward).0)
            .unwrap_or(0.0)
            .max(sphere.radius);
        let eye_distance = behind + near_plane_offset.max(0.0);

        let eye = sphere.center - forward * eye_distance;
        let view = Mat4::look_to_rh(eye, forward, stable_up(forward));
        let r = sphere.radius;
        let projection = Mat4::orthographic_rh_gl(-r, r, -r, r, 0.0, eye_distance + r);

        CascadeFrustum {
            view,
            projection,
            split: ShadowSplitData {
                culling_sphere: sphere,
                cascade_blend_culling_factor: 0.0,
            },
        }
    }
}

fn stable_up(forward: Vec3) -> Vec3 {
    if forward.dot(Vec3::Y).abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::{Light, LightShadows};
    use approx::assert_relative_eq;
    use glam::Vec4Swizzles;

    fn culling() -> SceneCulling {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 5.0, 20.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);
        let light = Light::default().with_shadows(LightShadows::Hard, 1.0);
        SceneCulling::new(camera, 60.0).with_light(
            VisibleLight::directional(light, Vec3::new(0.2, -1.0, 0.1)),
            Some(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(30.0))),
        )
    }

    #[test]
    fn cascade_ranges_tile_the_shadow_distance() {
        let culling = culling();
        let ratios = Vec3::new(0.1, 0.25, 0.5);
        let mut previous_far = culling.camera().near_plane;
        for i in 0..4 {
            let (near, far) = culling.cascade_range(i, 4, ratios);
            assert_relative_eq!(near, previous_far);
            assert!(far > near);
            previous_far = far;
        }
        assert_relative_eq!(previous_far, 60.0, epsilon = 1e-4);
    }

    #[test]
    fn cascade_sphere_lands_inside_clip_volume() {
        let culling = culling();
        let frustum = culling.compute_directional_cascade(0, 1, 4, Vec3::new(0.1, 0.25, 0.5), 512, 0.2);
        let sphere = frustum.split.culling_sphere;
        let clip = frustum.projection * frustum.view * sphere.center.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-4);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn empty_caster_bounds_are_not_reported() {
        let culling = SceneCulling::new(Camera::default(), 50.0).with_light(
            VisibleLight::directional(Light::default(), Vec3::NEG_Y),
            Some(Aabb::new(Vec3::ONE, Vec3::ZERO)),
        );
        assert!(culling.shadow_caster_bounds(0).is_none());
        assert!(culling.shadow_caster_bounds(7).is_none());
    }
}
