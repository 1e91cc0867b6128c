// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture handles and the rasterization capability.

use core::fmt;

use kurbo::Rect;
use mosaic_core::geometry::TileCoord;

/// Opaque handle to a texture owned by a [`TileBackend`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl fmt::Debug for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureId({})", self.0)
    }
}

/// Identifies a tile page within a [`TextureGenerator`](crate::TextureGenerator).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

/// Everything a backend needs to rasterize one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintRequest {
    /// The page the tile belongs to.
    pub page: PageId,
    /// Tile grid position.
    pub coord: TileCoord,
    /// Page scale.
    pub scale: f32,
    /// Invalidation generation the painted content will satisfy.
    pub generation: u64,
    /// The page is a low-scale prefetch page; backends may paint at reduced
    /// quality.
    pub prefetch: bool,
}

/// The raster library and GPU texture pool, as seen by tile pages.
///
/// `rasterize` runs on worker threads; `draw_tile` and `release` run on the
/// composition thread or whichever thread drops a page.
pub trait TileBackend: Send + Sync {
    /// Paints the tile described by `request` into a fresh texture.
    ///
    /// Returns `None` when no texture could be produced; the tile stays dirty
    /// and is requested again on a later prepare.
    fn rasterize(&self, request: &PaintRequest) -> Option<TextureId>;

    /// Draws `texture` into the content-space rectangle `rect`.
    fn draw_tile(&self, texture: TextureId, rect: Rect, opacity: f32);

    /// Returns a texture to the pool. Called exactly once per texture that
    /// [`rasterize`](Self::rasterize) produced.
    fn release(&self, texture: TextureId) {
        _ = texture;
    }
}
