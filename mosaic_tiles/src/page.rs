// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile pages.
//!
//! [`TilePage`] is the interface the viewport drives every frame;
//! [`TiledPage`] implements it on top of [`Tile`]s and the
//! [`TextureGenerator`] worker pool.
//!
//! Invalidations are recorded as tile ranges and applied lazily by
//! [`update_tile_dirtiness`](TilePage::update_tile_dirtiness), so a burst of
//! invalidations between two frames touches each tile once.

use std::sync::Arc;

use kurbo::{Rect, Size};
use mosaic_core::geometry::{Horizontal, ScrollDirection, TileBounds, TileCoord, Vertical};
use mosaic_core::scroll::SwapPolicy;

use crate::config::TilesConfig;
use crate::generator::TextureGenerator;
use crate::texture::PageId;
use crate::tile::Tile;

/// Which tiles a prepare claims around the requested bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Expansion {
    /// Only the requested bounds.
    #[default]
    Visible,
    /// The requested bounds outset by `x` columns and `y` rows on each side.
    Expanded {
        /// Columns added left and right.
        x: i32,
        /// Rows added above and below.
        y: i32,
    },
}

/// Tile counts accumulated since the last [`TilePage::take_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageStats {
    /// Paint operations queued.
    pub queued: u32,
    /// Tiles swapped to the front.
    pub swapped: u32,
}

/// A grid of tiles covering the content at one scale.
///
/// Every method runs on the composition thread and returns without waiting
/// for workers.
pub trait TilePage {
    /// Sets the scale tiles are painted at. Tiles assigned at another scale
    /// are repainted when next prepared.
    fn set_scale(&mut self, scale: f32);

    /// The page scale.
    fn scale(&self) -> f32;

    /// Sets the content size in content units; prepares never reach past it
    /// (or past the requested bounds, whichever is larger).
    fn set_content_size(&mut self, size: Size);

    /// Marks the page as a low-scale prefetch page.
    fn set_prefetch(&mut self, prefetch: bool);

    /// Returns `true` for a prefetch page.
    fn is_prefetch(&self) -> bool;

    /// Tells the page whether the user is scrolling; this changes paint
    /// priorities.
    fn set_scrolling(&mut self, scrolling: bool);

    /// Records a content-space invalidation from picture `generation`.
    fn invalidate(&mut self, rect: Rect, generation: u64);

    /// Applies recorded invalidations to tiles. Returns `true` if a tile
    /// inside `bounds` became dirty.
    fn update_tile_dirtiness(&mut self, bounds: TileBounds) -> bool;

    /// Claims tiles for `bounds` (grown by `expansion`) and queues paints for
    /// dirty ones. Rows are visited top to bottom; columns right to left when
    /// moving left.
    fn prepare(&mut self, direction: ScrollDirection, bounds: TileBounds, expansion: Expansion);

    /// Returns `true` if the page is at `scale` and every tile in `bounds` has
    /// current content.
    fn is_ready(&self, bounds: TileBounds, scale: f32) -> bool;

    /// Returns `true` if some tile in `bounds` has nothing to draw.
    fn has_missing_content(&self, bounds: TileBounds) -> bool;

    /// Swaps finished back textures to the front.
    ///
    /// Returns `true` if every tile in `bounds` is ready. With
    /// [`SwapPolicy::WholePage`] nothing is swapped unless that holds; with
    /// [`SwapPolicy::WhateverIsReady`] each ready tile swaps regardless.
    /// Always `false` when the page is at another scale or has unapplied
    /// invalidations it has not been prepared for.
    fn swap_buffers_if_ready(&mut self, bounds: TileBounds, scale: f32, policy: SwapPolicy)
    -> bool;

    /// Draws the front textures of tiles inside `bounds`.
    fn draw(&mut self, opacity: f32, bounds: TileBounds);

    /// Releases every texture.
    fn discard_textures(&mut self);

    /// Drops queued paints for this page.
    fn cancel_pending_paints(&mut self);

    /// Returns and resets the tile counters.
    fn take_stats(&mut self) -> PageStats {
        PageStats::default()
    }
}

/// Paint priority for a tile; lower values are painted first.
///
/// While scrolling, prefetch tiles go first; otherwise they go last. Tiles
/// with nothing on screen beat stale ones, and within a page the leading edge
/// of the scroll comes first.
fn paint_priority(
    coord: TileCoord,
    area: TileBounds,
    prefetch: bool,
    scrolling: bool,
    has_front: bool,
    going_down: bool,
) -> i64 {
    let mut priority: i64 = match (prefetch, scrolling) {
        (true, true) => 0,
        (true, false) => 400_000,
        (false, _) => 200_000,
    };
    if has_front {
        priority += 50_000;
    }
    let x = i64::from(coord.x - area.left);
    let y = i64::from(coord.y - area.top);
    priority += x;
    if going_down {
        priority += 100_000 - (1 + y) * 1000;
    } else {
        priority += y * 1000;
    }
    priority
}

/// A [`TilePage`] backed by the worker pool.
///
/// Dropping a page cancels its queued paints, waits for a running one, and
/// releases every texture.
#[derive(Debug)]
pub struct TiledPage {
    id: PageId,
    config: TilesConfig,
    generator: Arc<TextureGenerator>,
    tiles: Vec<Arc<Tile>>,
    scale: f32,
    prefetch: bool,
    scrolling: bool,
    inval_tiles: Vec<TileBounds>,
    latest_generation: u64,
    prepared: bool,
    content_size: Size,
    frame: u64,
    stats: PageStats,
}

impl TiledPage {
    /// Creates an empty page painting through `generator`.
    #[must_use]
    pub fn new(generator: Arc<TextureGenerator>) -> Self {
        let config = *generator.config();
        Self {
            id: generator.register_page(),
            config,
            generator,
            tiles: Vec::new(),
            scale: 1.0,
            prefetch: false,
            scrolling: false,
            inval_tiles: Vec::new(),
            latest_generation: 0,
            prepared: false,
            content_size: Size::ZERO,
            frame: 0,
            stats: PageStats::default(),
        }
    }

    /// The page's id in the worker pool.
    #[must_use]
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Number of tiles allocated so far.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn find(&self, coord: TileCoord) -> Option<&Arc<Tile>> {
        self.tiles.iter().find(|t| t.coord() == Some(coord))
    }

    /// Finds the tile for `coord`, allocating one if the page has room or
    /// else stealing the least recently used tile outside `area`.
    fn tile_for(&mut self, coord: TileCoord, area: TileBounds) -> Option<Arc<Tile>> {
        if let Some(tile) = self.find(coord) {
            return Some(Arc::clone(tile));
        }
        if self.tiles.len() < self.config.page_capacity() {
            let tile = Arc::new(Tile::new());
            self.tiles.push(Arc::clone(&tile));
            return Some(tile);
        }
        let victim = self
            .tiles
            .iter()
            .filter(|t| t.coord().is_none_or(|c| !area.contains(c)))
            .min_by_key(|t| t.last_used())?;
        tracing::trace!(page = self.id.0, ?coord, "stealing tile");
        victim.discard_textures(&**self.generator.backend());
        Some(Arc::clone(victim))
    }

    fn prepare_row(&mut self, going_left: bool, going_down: bool, y: i32, area: TileBounds) {
        let width = area.width();
        for i in 0..width {
            let x = if going_left {
                area.left + (width - 1) - i
            } else {
                area.left + i
            };
            let coord = TileCoord::new(x, y);
            let Some(tile) = self.tile_for(coord, area) else {
                tracing::warn!(page = self.id.0, ?coord, "no tile available");
                continue;
            };
            tile.set_contents(coord, self.scale, self.frame, &**self.generator.backend());
            if tile.claim_repaint() {
                let priority = paint_priority(
                    coord,
                    area,
                    self.prefetch,
                    self.scrolling,
                    tile.has_front(),
                    going_down,
                );
                self.generator
                    .schedule(self.id, tile, priority, self.prefetch);
                self.stats.queued += 1;
            }
        }
    }

    /// The last column and row (exclusive) the content reaches at the page
    /// scale, never less than the requested bounds.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "tile counts of real content fit comfortably in i32"
    )]
    fn content_limit(&self, bounds: TileBounds) -> (i32, i32) {
        let scale = f64::from(self.scale);
        let tiles_x = (self.content_size.width * scale / self.config.tile_size.width).ceil() as i32;
        let tiles_y =
            (self.content_size.height * scale / self.config.tile_size.height).ceil() as i32;
        (tiles_x.max(bounds.right), tiles_y.max(bounds.bottom))
    }

    fn ready_tiles_in(&self, bounds: TileBounds) -> u64 {
        let count = self
            .tiles
            .iter()
            .filter(|t| t.coord().is_some_and(|c| bounds.contains(c)) && t.is_ready())
            .count();
        count as u64
    }
}

impl TilePage for TiledPage {
    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn set_content_size(&mut self, size: Size) {
        self.content_size = size;
    }

    fn set_prefetch(&mut self, prefetch: bool) {
        self.prefetch = prefetch;
    }

    fn is_prefetch(&self) -> bool {
        self.prefetch
    }

    fn set_scrolling(&mut self, scrolling: bool) {
        self.scrolling = scrolling;
    }

    fn invalidate(&mut self, rect: Rect, generation: u64) {
        let range = TileBounds::from_content_rect(rect, self.scale, self.config.tile_size);
        if !range.is_empty() {
            self.inval_tiles.push(range);
            self.prepared = false;
        }
        self.latest_generation = self.latest_generation.max(generation);
    }

    fn update_tile_dirtiness(&mut self, bounds: TileBounds) -> bool {
        let ranges = core::mem::take(&mut self.inval_tiles);
        if ranges.is_empty() {
            return false;
        }
        // Ranges apply to every tile; `bounds` only decides the result.
        let mut visible_dirty = false;
        for tile in &self.tiles {
            let Some(coord) = tile.coord() else {
                continue;
            };
            if ranges.iter().any(|r| r.contains(coord)) {
                tile.mark_dirty(self.latest_generation);
                visible_dirty |= bounds.contains(coord);
            }
        }
        visible_dirty
    }

    fn prepare(&mut self, direction: ScrollDirection, bounds: TileBounds, expansion: Expansion) {
        self.frame += 1;
        let (mut left, mut top) = (bounds.left, bounds.top);
        let (mut width, mut height) = (bounds.width(), bounds.height());
        if let Expansion::Expanded { x, y } = expansion {
            left -= x;
            width += 2 * x;
            top -= y;
            height += 2 * y;
        }

        let (max_x, max_y) = self.content_limit(bounds);
        if left < 0 {
            width += left;
            left = 0;
        }
        if top < 0 {
            height += top;
            top = 0;
        }
        width = width.min(max_x - left);
        height = height.min(max_y - top);

        let tiles = f64::from(width) * f64::from(height);
        if width < 1 || height < 1 || tiles > self.config.max_texture_allocation as f64 {
            tracing::warn!(
                page = self.id.0,
                width,
                height,
                budget = self.config.max_texture_allocation,
                "not enough tiles for this page"
            );
            return;
        }

        let area = TileBounds::new(left, top, left + width, top + height);
        let going_left = direction.horizontal == Horizontal::Left;
        let going_down = direction.vertical == Vertical::Down;
        for y in area.top..area.bottom {
            self.prepare_row(going_left, going_down, y, area);
        }
        self.prepared = true;
    }

    fn is_ready(&self, bounds: TileBounds, scale: f32) -> bool {
        self.scale == scale && self.ready_tiles_in(bounds) == bounds.tile_count()
    }

    fn has_missing_content(&self, bounds: TileBounds) -> bool {
        let present = self
            .tiles
            .iter()
            .filter(|t| t.coord().is_some_and(|c| bounds.contains(c)) && t.has_front())
            .count();
        (present as u64) < bounds.tile_count()
    }

    fn swap_buffers_if_ready(
        &mut self,
        bounds: TileBounds,
        scale: f32,
        policy: SwapPolicy,
    ) -> bool {
        if !self.inval_tiles.is_empty() && !self.prepared {
            return false;
        }
        if self.scale != scale {
            return false;
        }
        let full = self.ready_tiles_in(bounds) == bounds.tile_count();
        if policy == SwapPolicy::WholePage && !full {
            return false;
        }
        let backend = self.generator.backend();
        let mut swaps = 0;
        for tile in &self.tiles {
            if tile.swap_if_needed(&**backend) {
                swaps += 1;
            }
        }
        self.stats.swapped += swaps;
        full
    }

    fn draw(&mut self, opacity: f32, bounds: TileBounds) {
        if opacity <= 0.0 {
            return;
        }
        let backend = self.generator.backend();
        for tile in &self.tiles {
            if tile.coord().is_some_and(|c| bounds.contains(c)) {
                tile.draw(self.config.tile_size, opacity, &**backend);
            }
        }
    }

    fn discard_textures(&mut self) {
        let backend = self.generator.backend();
        for tile in &self.tiles {
            tile.discard_textures(&**backend);
        }
    }

    fn cancel_pending_paints(&mut self) {
        self.generator
            .remove_paint_operations_for_page(self.id, false);
    }

    fn take_stats(&mut self) -> PageStats {
        core::mem::take(&mut self.stats)
    }
}

impl Drop for TiledPage {
    fn drop(&mut self) {
        self.generator.remove_paint_operations_for_page(self.id, true);
        self.discard_textures();
    }
}
