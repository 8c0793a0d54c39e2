//! Shadow atlas tile layout
//!
//! The atlas is one square depth texture cut into a `split × split` grid.
//! Tile `i` sits at column `i % split`, row `i / split`.

use glam::UVec2;
use helio_core::{HelioError, Result, Viewport};

use super::settings::MAX_ATLAS_TILES;

/// Grid sizes the layout may pick from, smallest first.
const SPLITS: [u32; 3] = [1, 2, 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub tile_count: usize,
    pub split: u32,
    pub tile_size: u32,
}

impl AtlasLayout {
    /// Smallest split from {1, 2, 4} whose grid holds `tile_count` tiles.
    ///
    /// More than 16 tiles is a configuration error; settings validation keeps
    /// it from ever reaching this point.
    pub fn plan(tile_count: usize, atlas_size: u32) -> Result<Self> {
        let split = SPLITS
            .into_iter()
            .find(|&split| (split * split) as usize >= tile_count)
            .ok_or_else(|| {
                HelioError::InvalidConfiguration(format!(
                    "{tile_count} shadow tiles exceed the {MAX_ATLAS_TILES}-tile atlas"
                ))
            })?;

        Ok(Self {
            tile_count,
            split,
            tile_size: atlas_size / split,
        })
    }

    /// Grid cell (column, row) of a tile.
    pub fn tile_offset(&self, index: usize) -> UVec2 {
        let index = index as u32;
        UVec2::new(index % self.split, index / self.split)
    }

    /// Pixel rectangle a tile renders into.
    pub fn tile_viewport(&self, index: usize) -> Viewport {
        let offset = self.tile_offset(index) * self.tile_size;
        Viewport::with_offset(offset.x, offset.y, self.tile_size, self.tile_size)
    }

    pub fn tiles(&self) -> impl Iterator<Item = (usize, Viewport)> + '_ {
        (0..self.tile_count).map(move |i| (i, self.tile_viewport(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_smallest_fitting_grid() {
        let expected = [
            (1, 1),
            (2, 2),
            (3, 2),
            (4, 2),
            (5, 4),
            (8, 4),
            (9, 4),
            (16, 4),
        ];
        for (tiles, split) in expected {
            assert_eq!(AtlasLayout::plan(tiles, 2048).unwrap().split, split, "{tiles} tiles");
        }
    }

    #[test]
    fn single_light_four_cascades_uses_quadrants() {
        let layout = AtlasLayout::plan(4, 1024).unwrap();
        assert_eq!(layout.split, 2);
        assert_eq!(layout.tile_size, 512);
        let corners: Vec<_> = layout.tiles().map(|(_, v)| (v.x, v.y)).collect();
        assert_eq!(corners, vec![(0, 0), (512, 0), (0, 512), (512, 512)]);
    }

    #[test]
    fn overflow_is_a_configuration_error() {
        let err = AtlasLayout::plan(17, 1024).unwrap_err();
        assert!(err.is_configuration());
    }
}
