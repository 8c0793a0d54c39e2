//! Optional debug hooks for the shadow pass

use super::atlas::AtlasLayout;
use super::cascade::CascadeOutput;
use super::resource::RenderTargetHandle;

/// Called by the shadow pass while it renders. Editor and tooling builds
/// plug in an overlay; everything else runs with [`NoDebugOverlay`].
pub trait DebugOverlay: Send + Sync {
    fn on_cascade(&mut self, light_slot: usize, cascade_index: u32, output: &CascadeOutput) {
        let _ = (light_slot, cascade_index, output);
    }

    fn on_atlas_rendered(&mut self, layout: &AtlasLayout, atlas: RenderTargetHandle) {
        let _ = (layout, atlas);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDebugOverlay;

impl DebugOverlay for NoDebugOverlay {}

/// Logs every cascade at trace level and the atlas layout at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDebugOverlay;

impl DebugOverlay for LogDebugOverlay {
    fn on_cascade(&mut self, light_slot: usize, cascade_index: u32, output: &CascadeOutput) {
        let sphere = output.slice.culling_sphere;
        log::trace!(
            "shadow light {} cascade {} -> tile {} at ({}, {}), sphere {:?} r={:.3}",
            light_slot,
            cascade_index,
            output.tile_index,
            output.viewport.x,
            output.viewport.y,
            sphere.center,
            sphere.radius
        );
    }

    fn on_atlas_rendered(&mut self, layout: &AtlasLayout, atlas: RenderTargetHandle) {
        log::debug!(
            "shadow atlas {:?}: {} tiles, {}x{} grid of {}px",
            atlas,
            layout.tile_count,
            layout.split,
            layout.split,
            layout.tile_size
        );
    }
}
