//! Cascaded directional shadows
//!
//! Per frame:
//! 1. [`Shadows::setup`] at the start of light setup,
//! 2. a [`LightSelector`] from [`Shadows::selector`] is offered every visible
//!    directional light and finished into a [`ShadowReservation`],
//! 3. [`Shadows::render`] consumes the reservation: it acquires the atlas,
//!    plans the tile grid, builds every cascade in light-then-cascade order,
//!    and publishes the shadow uniforms,
//! 4. [`Shadows::cleanup`] after the camera finished rendering.

pub mod atlas;
pub mod cascade;
pub mod debug;
pub mod fade;
pub mod publish;
pub mod resource;
pub mod selector;
pub mod settings;

use helio_core::{HelioError, Result};

use crate::commands::{CommandBuffer, ShadowDrawSettings};
use crate::context::{RenderContext, RenderTargetAllocator};
use crate::culling::{CascadeFitter, CullingResults};

pub use atlas::AtlasLayout;
pub use cascade::{atlas_matrix, CascadeMatrixBuilder, CascadeOutput, CascadeSlice, DepthConvention};
pub use debug::{DebugOverlay, LogDebugOverlay, NoDebugOverlay};
pub use fade::{FadeFilter, FilterKeywords, DIRECTIONAL_FILTER_KEYWORDS};
pub use publish::{ShadowUniformBlock, ShadowUniforms};
pub use resource::{AtlasDescriptor, AtlasResource, AtlasState, RenderTargetHandle};
pub use selector::{LightSelector, ShadowData, ShadowReservation, ShadowedLight};
pub use settings::{DirectionalShadowSettings, FilterQuality, ShadowSettings};

/// Maximum directional lights that cast shadows in one frame.
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

const BUFFER_NAME: &str = "Shadows";

/// What the shadow pass did this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrameReport {
    pub admitted_lights: usize,
    /// `None` when nothing was admitted and only the placeholder is bound.
    pub layout: Option<AtlasLayout>,
    pub atlas: RenderTargetHandle,
}

pub struct Shadows {
    settings: ShadowSettings,
    depth: DepthConvention,
    atlas: AtlasResource,
    uniforms: ShadowUniforms,
    buffer: CommandBuffer,
    overlay: Box<dyn DebugOverlay>,
}

impl Shadows {
    /// Validates `settings`; invalid configurations fail here, never per frame.
    pub fn new(settings: ShadowSettings) -> Result<Self> {
        let settings = settings.validated()?;
        log::info!(
            "Shadows created: {}x{} atlas, {} cascades, {:?}, max distance {}",
            settings.directional.atlas_size,
            settings.directional.atlas_size,
            settings.directional.cascade_count,
            settings.directional.filter,
            settings.max_distance
        );
        Ok(Self {
            settings,
            depth: DepthConvention::default(),
            atlas: AtlasResource::new(),
            uniforms: ShadowUniforms::default(),
            buffer: CommandBuffer::new(BUFFER_NAME),
            overlay: Box::new(NoDebugOverlay),
        })
    }

    pub fn with_depth_convention(mut self, depth: DepthConvention) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_debug_overlay(mut self, overlay: Box<dyn DebugOverlay>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn depth_convention(&self) -> DepthConvention {
        self.depth
    }

    pub fn atlas_state(&self) -> AtlasState {
        self.atlas.state()
    }

    pub fn uniforms(&self) -> &ShadowUniforms {
        &self.uniforms
    }

    /// Start of a frame's light setup. Releases an atlas the previous frame
    /// failed to clean up.
    pub fn setup<A>(&mut self, allocator: &mut A)
    where
        A: RenderTargetAllocator + ?Sized,
    {
        if self.atlas.release(allocator) {
            log::warn!("shadow atlas from the previous frame was still allocated, released");
        }
        self.buffer.clear();
    }

    pub fn selector<'a>(&self, culling: &'a dyn CullingResults) -> LightSelector<'a> {
        LightSelector::new(culling, self.settings.directional.cascade_count)
    }

    /// Render the shadow atlas for the reserved lights and publish the shadow
    /// uniforms. On error the atlas acquired here is released again and no
    /// shadow uniform of this frame is published.
    ///
    /// The reservation must come from a selector with this pass's cascade
    /// count; anything else is rejected before the atlas is acquired.
    pub fn render<C>(
        &mut self,
        reservation: &ShadowReservation,
        fitter: &dyn CascadeFitter,
        ctx: &mut C,
    ) -> Result<ShadowFrameReport>
    where
        C: RenderContext + ?Sized,
    {
        let cascade_count = self.settings.directional.cascade_count;
        if reservation.cascade_count() != cascade_count {
            return Err(HelioError::InvalidState(format!(
                "reservation for {} cascades handed to a {}-cascade shadow pass",
                reservation.cascade_count(),
                cascade_count
            )));
        }

        let atlas = self.atlas.acquire(ctx, reservation.len(), self.settings.directional.atlas_size)?;

        match self.render_atlas(reservation, fitter, atlas, ctx) {
            Ok(layout) => {
                log::debug!(
                    "shadows: {} light(s), layout {:?}",
                    reservation.len(),
                    layout.map(|l| (l.split, l.tile_size))
                );
                Ok(ShadowFrameReport {
                    admitted_lights: reservation.len(),
                    layout,
                    atlas,
                })
            }
            Err(err) => {
                self.buffer.clear();
                self.atlas.release(ctx);
                Err(err)
            }
        }
    }

    fn render_atlas<C>(
        &mut self,
        reservation: &ShadowReservation,
        fitter: &dyn CascadeFitter,
        atlas: RenderTargetHandle,
        ctx: &mut C,
    ) -> Result<Option<AtlasLayout>>
    where
        C: RenderContext + ?Sized,
    {
        let directional = self.settings.directional;
        let fade = FadeFilter::encode(&self.settings);

        self.buffer.begin_sample();

        let layout = if reservation.is_empty() {
            self.uniforms.begin_frame(0, 0, directional.atlas_size, fade.distance_fade);
            None
        } else {
            let layout = AtlasLayout::plan(reservation.tile_count(), directional.atlas_size)?;
            self.uniforms.begin_frame(
                layout.tile_count,
                reservation.cascade_count(),
                directional.atlas_size,
                fade.distance_fade,
            );

            self.buffer.set_render_target(atlas);
            self.buffer.clear_depth(self.depth.clear_value());

            let builder = CascadeMatrixBuilder::new(
                fitter,
                layout,
                reservation.cascade_count(),
                directional.cascade_ratios(),
                directional.filter,
                directional.cascade_fade,
                self.depth,
            );
            for (slot, light) in reservation.lights().iter().enumerate() {
                self.render_light(&builder, light, slot, reservation.cascade_count());
            }
            self.overlay.on_atlas_rendered(&layout, atlas);
            Some(layout)
        };

        self.buffer.end_sample();
        ctx.execute_command_buffer(&mut self.buffer)?;

        // Only a submitted atlas may be bound.
        self.uniforms.publish(ctx, atlas);
        fade.apply_keywords(ctx);
        Ok(layout)
    }

    fn render_light(
        &mut self,
        builder: &CascadeMatrixBuilder<'_>,
        light: &ShadowedLight,
        slot: usize,
        cascade_count: u32,
    ) {
        self.buffer.set_depth_bias(0.0, light.slope_scale_bias);
        for cascade in 0..cascade_count {
            let output = builder.build(light, slot, cascade);

            // Cascade spheres follow the camera, so every light shares them.
            if slot == 0 {
                self.uniforms.set_cascade(cascade as usize, &output.slice);
            }
            self.uniforms.set_atlas_matrix(output.tile_index, output.atlas_matrix);

            self.buffer.set_viewport(output.viewport);
            self.buffer.set_view_projection(output.frustum.view, output.frustum.projection);
            self.buffer.draw_shadows(ShadowDrawSettings {
                visible_light_index: light.visible_light_index,
                split: output.frustum.split,
            });
            self.overlay.on_cascade(slot, cascade, &output);
        }
        self.buffer.set_depth_bias(0.0, 0.0);
    }

    /// Release the atlas. Called once the camera is done with it and when
    /// the pipeline is torn down.
    pub fn cleanup<A>(&mut self, allocator: &mut A)
    where
        A: RenderTargetAllocator + ?Sized,
    {
        self.atlas.release(allocator);
    }
}
