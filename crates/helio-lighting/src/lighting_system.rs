use glam::Vec4;
use helio_core::Result;

use crate::context::{RenderContext, RenderTargetAllocator};
use crate::culling::{CascadeFitter, CullingResults};
use crate::lights::LightType;
use crate::shadows::{ShadowData, ShadowFrameReport, ShadowSettings, Shadows};
use crate::uniforms::properties;

/// Directional lights beyond this many are ignored for shading.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Result of one frame's light setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingFrame {
    pub directional_light_count: usize,
    pub shadows: ShadowFrameReport,
}

/// Per-camera light setup: publishes the visible directional lights and
/// drives the shadow pass for them.
pub struct Lighting {
    shadows: Shadows,
    colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    shadow_data: [Vec4; MAX_DIRECTIONAL_LIGHTS],
}

impl Lighting {
    pub fn new(settings: ShadowSettings) -> Result<Self> {
        Ok(Self::with_shadows(Shadows::new(settings)?))
    }

    /// Use an already configured shadow pass (depth convention, overlay).
    pub fn with_shadows(shadows: Shadows) -> Self {
        Self {
            shadows,
            colors: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directions: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            shadow_data: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
        }
    }

    pub fn shadows(&self) -> &Shadows {
        &self.shadows
    }

    pub fn shadows_mut(&mut self) -> &mut Shadows {
        &mut self.shadows
    }

    pub fn setup<C>(
        &mut self,
        culling: &dyn CullingResults,
        fitter: &dyn CascadeFitter,
        ctx: &mut C,
    ) -> Result<LightingFrame>
    where
        C: RenderContext + ?Sized,
    {
        self.shadows.setup(ctx);

        let mut selector = self.shadows.selector(culling);
        let mut count = 0;
        for (index, visible) in culling.visible_lights().iter().enumerate() {
            if visible.light_type() != LightType::Directional {
                continue;
            }
            if count == MAX_DIRECTIONAL_LIGHTS {
                log::debug!("directional light {} skipped, limit of {} reached", index, MAX_DIRECTIONAL_LIGHTS);
                continue;
            }

            let shadow: ShadowData = selector.reserve(&visible.light, index);
            self.colors[count] = visible.final_color();
            self.directions[count] = visible.direction_to_light();
            self.shadow_data[count] = shadow.to_vec4();
            count += 1;
        }
        let reservation = selector.finish();

        ctx.set_global_int(properties::DIRECTIONAL_LIGHT_COUNT, count as i32);
        ctx.set_global_vector_array(properties::DIRECTIONAL_LIGHT_COLORS, &self.colors);
        ctx.set_global_vector_array(properties::DIRECTIONAL_LIGHT_DIRECTIONS, &self.directions);
        ctx.set_global_vector_array(properties::DIRECTIONAL_LIGHT_SHADOW_DATA, &self.shadow_data);

        let shadows = self.shadows.render(&reservation, fitter, ctx)?;
        Ok(LightingFrame {
            directional_light_count: count,
            shadows,
        })
    }

    pub fn cleanup<A>(&mut self, allocator: &mut A)
    where
        A: RenderTargetAllocator + ?Sized,
    {
        self.shadows.cleanup(allocator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::SceneCulling;
    use crate::headless::HeadlessContext;
    use crate::lights::{Light, LightShadows, VisibleLight};
    use glam::Vec3;
    use helio_core::{Aabb, Camera};

    fn scene(lights: usize) -> SceneCulling {
        let mut culling = SceneCulling::new(Camera::default(), 100.0);
        let bounds = Aabb::new(Vec3::splat(-20.0), Vec3::splat(20.0));
        for _ in 0..lights {
            let light = Light::directional(Vec3::ONE, 2.0).with_shadows(LightShadows::Soft, 0.8);
            culling.push_light(VisibleLight::directional(light, Vec3::new(0.3, -1.0, 0.2)), Some(bounds));
        }
        culling
    }

    #[test]
    fn publishes_lights_and_their_shadow_slots() {
        let culling = scene(2);
        let mut ctx = HeadlessContext::new();
        let mut lighting = Lighting::new(ShadowSettings::default()).unwrap();

        let frame = lighting.setup(&culling, &culling, &mut ctx).unwrap();
        assert_eq!(frame.directional_light_count, 2);
        assert_eq!(frame.shadows.admitted_lights, 2);
        assert_eq!(ctx.int(properties::DIRECTIONAL_LIGHT_COUNT), Some(2));

        let data = ctx.vector_array(properties::DIRECTIONAL_LIGHT_SHADOW_DATA).unwrap();
        assert_eq!(data[0].y, 0.0);
        assert_eq!(data[1].y, 4.0);
        assert_eq!(data[1].x, 0.8);

        let colors = ctx.vector_array(properties::DIRECTIONAL_LIGHT_COLORS).unwrap();
        assert_eq!(colors[0], Vec4::new(2.0, 2.0, 2.0, 1.0));

        lighting.cleanup(&mut ctx);
        assert_eq!(ctx.live_render_targets(), 0);
    }

    #[test]
    fn extra_directional_lights_are_dropped() {
        let culling = scene(6);
        let mut ctx = HeadlessContext::new();
        let mut lighting = Lighting::new(ShadowSettings::default()).unwrap();

        let frame = lighting.setup(&culling, &culling, &mut ctx).unwrap();
        assert_eq!(frame.directional_light_count, MAX_DIRECTIONAL_LIGHTS);
        assert_eq!(ctx.int(properties::DIRECTIONAL_LIGHT_COUNT), Some(4));
    }
}
