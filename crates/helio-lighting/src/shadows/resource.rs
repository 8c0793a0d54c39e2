//! Shadow atlas render target lifetime
//!
//! `Unallocated → Allocated → Released`, and back to `Allocated` on the next
//! frame. An allocated atlas must be released before another is acquired.

use helio_core::{HelioError, Result};

use crate::context::RenderTargetAllocator;

/// Opaque handle to a host render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(pub u64);

/// Depth-only square render target used as a shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasDescriptor {
    pub label: &'static str,
    pub size: u32,
    pub depth_bits: u32,
    /// Bilinear comparison sampling, used by the PCF kernels.
    pub bilinear: bool,
}

impl AtlasDescriptor {
    pub fn shadow_atlas(size: u32) -> Self {
        Self {
            label: "Directional Shadow Atlas",
            size,
            depth_bits: 32,
            bilinear: true,
        }
    }

    /// Bound when no light casts shadows so the shading stage never samples
    /// a missing texture.
    pub fn placeholder() -> Self {
        Self {
            label: "Directional Shadow Atlas Placeholder",
            ..Self::shadow_atlas(1)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtlasState {
    #[default]
    Unallocated,
    Allocated {
        handle: RenderTargetHandle,
        size: u32,
    },
    Released,
}

#[derive(Debug, Default)]
pub struct AtlasResource {
    state: AtlasState,
}

impl AtlasResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AtlasState {
        self.state
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self.state, AtlasState::Allocated { .. })
    }

    /// Allocate the full atlas, or the 1×1 placeholder when nothing was
    /// admitted.
    pub fn acquire<A>(&mut self, allocator: &mut A, admitted_lights: usize, atlas_size: u32) -> Result<RenderTargetHandle>
    where
        A: RenderTargetAllocator + ?Sized,
    {
        if let AtlasState::Allocated { size, .. } = self.state {
            return Err(HelioError::InvalidState(format!(
                "shadow atlas ({size}x{size}) acquired twice without release"
            )));
        }

        let desc = if admitted_lights == 0 {
            AtlasDescriptor::placeholder()
        } else {
            AtlasDescriptor::shadow_atlas(atlas_size)
        };
        let handle = allocator.allocate_shadow_atlas(&desc)?;
        self.state = AtlasState::Allocated {
            handle,
            size: desc.size,
        };
        Ok(handle)
    }

    /// Returns whether anything was released.
    pub fn release<A>(&mut self, allocator: &mut A) -> bool
    where
        A: RenderTargetAllocator + ?Sized,
    {
        match self.state {
            AtlasState::Allocated { handle, .. } => {
                allocator.release(handle);
                self.state = AtlasState::Released;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessContext;

    #[test]
    fn lifecycle_walks_the_state_machine() {
        let mut ctx = HeadlessContext::new();
        let mut atlas = AtlasResource::new();
        assert_eq!(atlas.state(), AtlasState::Unallocated);

        let handle = atlas.acquire(&mut ctx, 2, 2048).unwrap();
        assert_eq!(atlas.state(), AtlasState::Allocated { handle, size: 2048 });
        assert!(atlas.acquire(&mut ctx, 2, 2048).is_err());

        assert!(atlas.release(&mut ctx));
        assert_eq!(atlas.state(), AtlasState::Released);
        assert!(!atlas.release(&mut ctx));
        assert_eq!(ctx.live_render_targets(), 0);
    }

    #[test]
    fn no_lights_gets_placeholder() {
        let mut ctx = HeadlessContext::new();
        let mut atlas = AtlasResource::new();
        let handle = atlas.acquire(&mut ctx, 0, 4096).unwrap();
        let desc = ctx.descriptor(handle).copied().unwrap();
        assert_eq!(desc.size, 1);
        assert_eq!(desc.depth_bits, 32);
        assert!(desc.bilinear);
    }

    #[test]
    fn allocation_failure_leaves_atlas_unallocated() {
        let mut ctx = HeadlessContext::new().with_max_texture_size(1024);
        let mut atlas = AtlasResource::new();
        let err = atlas.acquire(&mut ctx, 1, 2048).unwrap_err();
        assert!(matches!(err, HelioError::OutOfMemory(_)));
        assert!(!atlas.is_allocated());
    }
}
