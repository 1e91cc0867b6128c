// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile pool configuration.

use kurbo::Size;

/// Sizing for tile pages and the worker pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilesConfig {
    /// Tile size in device pixels.
    pub tile_size: Size,
    /// Most tiles a single page may hold.
    pub max_tiles_per_page: usize,
    /// Most tiles a single `prepare` may claim. A request for more is
    /// refused with a warning.
    pub max_texture_allocation: usize,
    /// Number of rasterization worker threads.
    pub worker_threads: usize,
}

impl TilesConfig {
    /// Default sizing: room for a prefetch-expanded viewport at four times
    /// the tile density of a phone screen.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            tile_size: Size::new(256.0, 256.0),
            max_tiles_per_page: 225,
            max_texture_allocation: 224,
            worker_threads: 2,
        }
    }

    /// Sizing for devices with little texture memory.
    #[must_use]
    pub const fn low_memory() -> Self {
        Self {
            tile_size: Size::new(256.0, 256.0),
            max_tiles_per_page: 49,
            max_texture_allocation: 48,
            worker_threads: 1,
        }
    }

    /// Number of tiles a page keeps.
    ///
    /// Always at least one more than [`max_texture_allocation`], so a
    /// prepare that claims the whole allocation still finds a tile to steal.
    ///
    /// [`max_texture_allocation`]: Self::max_texture_allocation
    #[must_use]
    pub const fn page_capacity(&self) -> usize {
        let min = self.max_texture_allocation + 1;
        if self.max_tiles_per_page > min {
            self.max_tiles_per_page
        } else {
            min
        }
    }
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self::standard()
    }
}
