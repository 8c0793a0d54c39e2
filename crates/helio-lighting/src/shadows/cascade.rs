//! Cascade matrices
//!
//! Turns each fitted cascade frustum into a single world → atlas-tile matrix
//! and derives the culling sphere and filter data the shading stage blends
//! cascades with.

use glam::{Mat4, UVec2, Vec3, Vec4};
use helio_core::{Sphere, Viewport};

use super::atlas::AtlasLayout;
use super::selector::ShadowedLight;
use super::settings::FilterQuality;
use crate::culling::{CascadeFitter, CascadeFrustum};

/// Clip-space depth direction of the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthConvention {
    /// Near maps to 0, far to 1.
    #[default]
    Standard,
    /// Near maps to 1, far to 0.
    Reversed,
}

impl DepthConvention {
    /// Depth value meaning "nothing rendered here".
    pub fn clear_value(self) -> f32 {
        match self {
            DepthConvention::Standard => 1.0,
            DepthConvention::Reversed => 0.0,
        }
    }
}

/// Map `clip_from_world` into the atlas tile at `offset` of a `split`-wide
/// grid. XY land in the tile's `[0, 1]` UV patch, Z is remapped from
/// `[-1, 1]` to `[0, 1]` without split scaling.
pub fn atlas_matrix(clip_from_world: Mat4, offset: UVec2, split: u32, depth: DepthConvention) -> Mat4 {
    let clip_from_world = match depth {
        DepthConvention::Standard => clip_from_world,
        DepthConvention::Reversed => Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0)) * clip_from_world,
    };

    let scale = 1.0 / split as f32;
    let tile_from_clip = Mat4::from_cols(
        Vec4::new(0.5 * scale, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 0.5 * scale, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 0.5, 0.0),
        Vec4::new(
            (0.5 + offset.x as f32) * scale,
            (0.5 + offset.y as f32) * scale,
            0.5,
            1.0,
        ),
    );
    tile_from_clip * clip_from_world
}

/// Culling and filter data of one cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeSlice {
    /// Fitted sphere shrunk by the filter size so filtered samples near the
    /// edge never read outside the tile.
    pub culling_sphere: Sphere,
    pub inv_sqr_radius: f32,
    pub filter_size: f32,
}

impl CascadeSlice {
    pub fn new(fitted: Sphere, tile_size: u32, filter: FilterQuality) -> Self {
        let texel_size = 2.0 * fitted.radius / tile_size as f32;
        let filter_size = texel_size * filter.texel_span();
        let culling_sphere = fitted.shrunk(filter_size);
        debug_assert!(culling_sphere.radius > 0.0, "cascade sphere collapsed");

        Self {
            culling_sphere,
            inv_sqr_radius: 1.0 / culling_sphere.radius_squared(),
            filter_size,
        }
    }

    /// `xyz` = center, `w` = squared radius.
    pub fn culling_sphere_data(&self) -> Vec4 {
        self.culling_sphere
            .center
            .extend(self.culling_sphere.radius_squared())
    }

    /// `x` = inverse squared radius, `y` = diagonal filter size.
    pub fn cascade_data(&self) -> Vec4 {
        Vec4::new(
            self.inv_sqr_radius,
            self.filter_size * std::f32::consts::SQRT_2,
            0.0,
            0.0,
        )
    }
}

/// Everything produced for one (light, cascade) tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeOutput {
    pub tile_index: usize,
    pub viewport: Viewport,
    pub frustum: CascadeFrustum,
    pub slice: CascadeSlice,
    pub atlas_matrix: Mat4,
}

pub struct CascadeMatrixBuilder<'a> {
    fitter: &'a dyn CascadeFitter,
    layout: AtlasLayout,
    cascade_count: u32,
    ratios: Vec3,
    filter: FilterQuality,
    blend_culling_factor: f32,
    depth: DepthConvention,
}

impl<'a> CascadeMatrixBuilder<'a> {
    pub fn new(
        fitter: &'a dyn CascadeFitter,
        layout: AtlasLayout,
        cascade_count: u32,
        ratios: Vec3,
        filter: FilterQuality,
        cascade_fade: f32,
        depth: DepthConvention,
    ) -> Self {
        Self {
            fitter,
            layout,
            cascade_count,
            ratios,
            filter,
            blend_culling_factor: (0.8 - cascade_fade).max(0.0),
            depth,
        }
    }

    /// Build cascade `cascade_index` of the light in reservation slot
    /// `light_slot`. Tiles are assigned `light_slot * cascade_count + cascade`.
    pub fn build(&self, light: &ShadowedLight, light_slot: usize, cascade_index: u32) -> CascadeOutput {
        let tile_index = light_slot * self.cascade_count as usize + cascade_index as usize;

        let mut frustum = self.fitter.compute_directional_cascade(
            light.visible_light_index,
            cascade_index,
            self.cascade_count,
            self.ratios,
            self.layout.tile_size,
            light.near_plane_offset,
        );
        frustum.split.cascade_blend_culling_factor = self.blend_culling_factor;

        let slice = CascadeSlice::new(frustum.split.culling_sphere, self.layout.tile_size, self.filter);
        let atlas_matrix = atlas_matrix(
            frustum.projection * frustum.view,
            self.layout.tile_offset(tile_index),
            self.layout.split,
            self.depth,
        );

        CascadeOutput {
            tile_index,
            viewport: self.layout.tile_viewport(tile_index),
            frustum,
            slice,
            atlas_matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4Swizzles;

    #[test]
    fn clip_cube_lands_in_its_tile() {
        let offset = UVec2::new(1, 0);
        let m = atlas_matrix(Mat4::IDENTITY, offset, 2, DepthConvention::Standard);

        let low = m * Vec4::new(-1.0, -1.0, -1.0, 1.0);
        let high = m * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_relative_eq!(low.xyz(), Vec3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(high.xyz(), Vec3::new(1.0, 0.5, 1.0));
    }

    #[test]
    fn reversed_depth_only_flips_z_row() {
        let clip = Mat4::orthographic_rh_gl(-3.0, 3.0, -3.0, 3.0, 0.5, 40.0)
            * Mat4::look_to_rh(Vec3::new(1.0, 10.0, 2.0), Vec3::NEG_Y, Vec3::Z);
        let standard = atlas_matrix(clip, UVec2::new(0, 1), 2, DepthConvention::Standard);
        let reversed = atlas_matrix(clip, UVec2::new(0, 1), 2, DepthConvention::Reversed);

        assert_eq!(standard.row(0), reversed.row(0));
        assert_eq!(standard.row(1), reversed.row(1));
        assert_eq!(standard.row(3), reversed.row(3));
        assert_ne!(standard.row(2), reversed.row(2));

        let world = Vec4::new(1.5, 4.0, 0.5, 1.0);
        assert_relative_eq!((standard * world).z + (reversed * world).z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn slice_radius_and_inverse_agree() {
        let slice = CascadeSlice::new(Sphere::new(Vec3::ONE, 12.0), 512, FilterQuality::Pcf5);
        let texel = 2.0 * 12.0 / 512.0;
        assert_relative_eq!(slice.filter_size, texel * 3.0);
        assert_relative_eq!(slice.culling_sphere.radius, 12.0 - texel * 3.0);
        assert_relative_eq!(slice.inv_sqr_radius * slice.culling_sphere.radius_squared(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(slice.cascade_data().y, slice.filter_size * std::f32::consts::SQRT_2);
        assert_relative_eq!(slice.culling_sphere_data().w, slice.culling_sphere.radius_squared());
    }
}
