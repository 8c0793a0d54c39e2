//! Shadow uniform publishing
//!
//! The arrays live for the lifetime of the shadow subsystem and are
//! overwritten in place each frame. Slots past the published counts keep
//! whatever an earlier frame wrote; readers must gate on the counts.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use super::cascade::CascadeSlice;
use super::resource::RenderTargetHandle;
use super::settings::{MAX_ATLAS_TILES, MAX_CASCADES};
use crate::context::UniformSink;
use crate::uniforms::properties;

#[derive(Debug, Clone)]
pub struct ShadowUniforms {
    atlas_matrices: [Mat4; MAX_ATLAS_TILES],
    culling_spheres: [Vec4; MAX_CASCADES],
    cascade_data: [Vec4; MAX_CASCADES],
    tile_count: usize,
    cascade_count: u32,
    atlas_size: Vec4,
    distance_fade: Vec4,
}

impl Default for ShadowUniforms {
    fn default() -> Self {
        Self {
            atlas_matrices: [Mat4::IDENTITY; MAX_ATLAS_TILES],
            culling_spheres: [Vec4::ZERO; MAX_CASCADES],
            cascade_data: [Vec4::ZERO; MAX_CASCADES],
            tile_count: 0,
            cascade_count: 0,
            atlas_size: Vec4::ZERO,
            distance_fade: Vec4::ZERO,
        }
    }
}

impl ShadowUniforms {
    /// Start a frame. Nothing is cleared, only the counts change.
    pub fn begin_frame(&mut self, tile_count: usize, cascade_count: u32, atlas_size: u32, distance_fade: Vec4) {
        self.tile_count = tile_count;
        self.cascade_count = cascade_count;
        self.atlas_size = Vec4::new(atlas_size as f32, 1.0 / atlas_size as f32, 0.0, 0.0);
        self.distance_fade = distance_fade;
    }

    pub fn set_atlas_matrix(&mut self, tile_index: usize, matrix: Mat4) {
        self.atlas_matrices[tile_index] = matrix;
    }

    pub fn set_cascade(&mut self, cascade_index: usize, slice: &CascadeSlice) {
        self.culling_spheres[cascade_index] = slice.culling_sphere_data();
        self.cascade_data[cascade_index] = slice.cascade_data();
    }

    pub fn atlas_matrices(&self) -> &[Mat4] {
        &self.atlas_matrices[..self.tile_count]
    }

    pub fn culling_spheres(&self) -> &[Vec4] {
        &self.culling_spheres[..self.cascade_count as usize]
    }

    pub fn cascade_data(&self) -> &[Vec4] {
        &self.cascade_data[..self.cascade_count as usize]
    }

    pub fn cascade_count(&self) -> u32 {
        self.cascade_count
    }

    pub fn distance_fade(&self) -> Vec4 {
        self.distance_fade
    }

    pub fn publish<S>(&self, sink: &mut S, atlas: RenderTargetHandle)
    where
        S: UniformSink + ?Sized,
    {
        sink.set_global_texture(properties::DIRECTIONAL_SHADOW_ATLAS, atlas);
        sink.set_global_int(properties::CASCADE_COUNT, self.cascade_count as i32);
        sink.set_global_vector_array(properties::CASCADE_CULLING_SPHERES, &self.culling_spheres);
        sink.set_global_vector_array(properties::CASCADE_DATA, &self.cascade_data);
        sink.set_global_matrix_array(properties::DIRECTIONAL_SHADOW_MATRICES, &self.atlas_matrices);
        sink.set_global_vector(properties::SHADOW_ATLAS_SIZE, self.atlas_size);
        sink.set_global_vector(properties::SHADOW_DISTANCE_FADE, self.distance_fade);
    }

    /// Same data as one uniform block, for hosts that upload a buffer
    /// instead of named globals.
    pub fn to_block(&self) -> ShadowUniformBlock {
        ShadowUniformBlock {
            atlas_matrices: self.atlas_matrices,
            culling_spheres: self.culling_spheres,
            cascade_data: self.cascade_data,
            atlas_size: self.atlas_size,
            distance_fade: self.distance_fade,
            cascade_count: self.cascade_count,
            _pad: [0; 3],
        }
    }
}

/// GPU-side layout (must match the shadow block in the lit shader).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ShadowUniformBlock {
    pub atlas_matrices: [Mat4; MAX_ATLAS_TILES],
    pub culling_spheres: [Vec4; MAX_CASCADES],
    pub cascade_data: [Vec4; MAX_CASCADES],
    pub atlas_size: Vec4,
    pub distance_fade: Vec4,
    pub cascade_count: u32,
    pub _pad: [u32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessContext;
    use glam::Vec3;
    use helio_core::Sphere;

    #[test]
    fn counts_gate_the_visible_slices() {
        let mut uniforms = ShadowUniforms::default();
        uniforms.begin_frame(8, 4, 2048, Vec4::ONE);
        assert_eq!(uniforms.atlas_matrices().len(), 8);
        assert_eq!(uniforms.culling_spheres().len(), 4);

        uniforms.begin_frame(0, 0, 2048, Vec4::ONE);
        assert!(uniforms.atlas_matrices().is_empty());
        assert!(uniforms.cascade_data().is_empty());
    }

    #[test]
    fn publish_writes_full_capacity_arrays() {
        let mut uniforms = ShadowUniforms::default();
        uniforms.begin_frame(1, 1, 1024, Vec4::new(0.01, 10.0, 5.0, 0.0));
        let slice = CascadeSlice::new(Sphere::new(Vec3::ZERO, 10.0), 1024, Default::default());
        uniforms.set_cascade(0, &slice);

        let mut ctx = HeadlessContext::new();
        uniforms.publish(&mut ctx, RenderTargetHandle(7));

        assert_eq!(ctx.int(properties::CASCADE_COUNT), Some(1));
        assert_eq!(ctx.vector_array(properties::CASCADE_DATA).map(<[_]>::len), Some(MAX_CASCADES));
        assert_eq!(
            ctx.matrix_array(properties::DIRECTIONAL_SHADOW_MATRICES).map(<[_]>::len),
            Some(MAX_ATLAS_TILES)
        );
        assert_eq!(ctx.vector(properties::SHADOW_ATLAS_SIZE), Some(Vec4::new(1024.0, 1.0 / 1024.0, 0.0, 0.0)));
        assert_eq!(ctx.texture(properties::DIRECTIONAL_SHADOW_ATLAS), Some(RenderTargetHandle(7)));
    }

    #[test]
    fn block_is_std140_sized() {
        let block = ShadowUniforms::default().to_block();
        assert_eq!(bytemuck::bytes_of(&block).len() % 16, 0);
    }
}
