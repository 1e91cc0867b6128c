// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface viewport state.
//!
//! One [`ViewportState`] exists per on-screen surface. It owns the two tile
//! pages (front at the displayed scale, back at a candidate or prefetch
//! scale), the [`ZoomManager`] and the [`ScrollState`], and derives the tile
//! bounds each frame works on. Snapshots receive it by `&mut` from the tree
//! manager; nothing else holds on to it.

use kurbo::{Point, Rect, Size};
use mosaic_core::geometry::{ScrollDirection, TileBounds};
use mosaic_core::region::Region;
use mosaic_core::scroll::ScrollState;
use mosaic_core::time::HostTime;
use mosaic_core::zoom::{ZoomConfig, ZoomManager};
use mosaic_tiles::{Expansion, PageStats, TilePage};

/// Prefetch and memory knobs for a viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportConfig {
    /// Tile size in device pixels; must match the pages' tile size.
    pub tile_size: Size,
    /// Tiles prepared beyond the visible bounds on each side.
    pub prefetch_distance: i32,
    /// The visible size is multiplied by this before deciding whether the
    /// content is large enough to prefetch along an axis.
    pub prefetch_ratio: f64,
    /// Scale of the prefetch page relative to the displayed scale.
    pub prefetch_scale_modifier: f32,
    /// Disables expansion beyond the visible bounds.
    pub minimal_memory: bool,
}

impl ViewportConfig {
    /// 256×256 tiles, one tile of prefetch, prefetch page at 0.3×.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            tile_size: Size::new(256.0, 256.0),
            prefetch_distance: 1,
            prefetch_ratio: 1.2,
            prefetch_scale_modifier: 0.3,
            minimal_memory: false,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Mutable views of the pages and zoom state, borrowed together.
#[derive(Debug)]
pub struct PagesMut<'a, P> {
    /// The page at the displayed scale.
    pub front: &'a mut P,
    /// The candidate or prefetch page.
    pub back: &'a mut P,
    /// The zoom state machine.
    pub zoom: &'a mut ZoomManager,
}

/// Two tile pages plus the zoom and scroll state of one surface.
#[derive(Debug)]
pub struct ViewportState<P> {
    config: ViewportConfig,
    pages: [P; 2],
    front: usize,
    zoom: ZoomManager,
    visible: Rect,
    previous_visible: Rect,
    viewport_bounds: TileBounds,
    direction: ScrollDirection,
    expansion: Expansion,
    is_scrolling: bool,
    scroll: ScrollState,
    swap_outstanding: bool,
    picture_generation: u64,
    content_size: Size,
    pages_swapped: bool,
}

impl<P: TilePage> ViewportState<P> {
    /// Creates a viewport with `front` displayed first.
    pub fn new(config: ViewportConfig, zoom: ZoomConfig, front: P, back: P) -> Self {
        Self {
            config,
            pages: [front, back],
            front: 0,
            zoom: ZoomManager::new(zoom),
            visible: Rect::ZERO,
            previous_visible: Rect::ZERO,
            viewport_bounds: TileBounds::EMPTY,
            direction: ScrollDirection::default(),
            expansion: Expansion::Visible,
            is_scrolling: false,
            scroll: ScrollState::NotScrolling,
            swap_outstanding: false,
            picture_generation: 0,
            content_size: Size::ZERO,
            pages_swapped: false,
        }
    }

    /// Starts a frame: records the visible rectangle, derives direction,
    /// tile bounds and expansion, then advances the scroll and zoom state
    /// machines.
    pub fn begin_frame(&mut self, now: HostTime, visible: Rect, scale: f32, content_size: Size) {
        self.previous_visible = self.visible;
        if visible != self.visible {
            self.direction = ScrollDirection::between(self.visible, visible);
            self.visible = visible;
        }
        self.viewport_bounds = TileBounds::from_content_rect(visible, scale, self.config.tile_size);
        self.expansion = self.expansion_for(content_size);
        self.scroll.on_input(self.is_scrolling, self.swap_outstanding);
        self.zoom
            .process_new_scale(now, scale, self.viewport_bounds);
    }

    fn expansion_for(&self, content_size: Size) -> Expansion {
        if self.config.minimal_memory {
            return Expansion::Visible;
        }
        let ratio = self.config.prefetch_ratio;
        let distance = self.config.prefetch_distance;
        let x = if self.visible.width() * ratio < content_size.width {
            distance
        } else {
            0
        };
        let y = if self.visible.height() * ratio < content_size.height {
            distance
        } else {
            0
        };
        if x == 0 && y == 0 {
            Expansion::Visible
        } else {
            Expansion::Expanded { x, y }
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// The page at the displayed scale.
    #[must_use]
    pub fn front(&self) -> &P {
        &self.pages[self.front]
    }

    /// The candidate or prefetch page.
    #[must_use]
    pub fn back(&self) -> &P {
        &self.pages[1 - self.front]
    }

    /// Borrows both pages and the zoom state at once.
    pub fn pages_mut(&mut self) -> PagesMut<'_, P> {
        let (first, second) = self.pages.split_at_mut(1);
        let (front, back) = if self.front == 0 {
            (&mut first[0], &mut second[0])
        } else {
            (&mut second[0], &mut first[0])
        };
        PagesMut {
            front,
            back,
            zoom: &mut self.zoom,
        }
    }

    /// The zoom state machine.
    #[must_use]
    pub fn zoom(&self) -> &ZoomManager {
        &self.zoom
    }

    /// The zoom state machine, mutably.
    pub fn zoom_mut(&mut self) -> &mut ZoomManager {
        &mut self.zoom
    }

    /// Sets the scroll input flag applied by the next frame.
    pub fn set_is_scrolling(&mut self, scrolling: bool) {
        self.is_scrolling = scrolling;
    }

    /// The scroll input flag.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    /// Where the viewport is in a scroll gesture.
    #[must_use]
    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    /// Reports this frame's swap outcome to the scroll state machine.
    pub fn finish_swap(&mut self, finished: bool) {
        self.swap_outstanding = !finished;
        self.scroll.on_swap(finished);
    }

    /// The visible content rectangle of this frame.
    #[must_use]
    pub fn visible(&self) -> Rect {
        self.visible
    }

    /// The visible content rectangle of the previous frame.
    #[must_use]
    pub fn previous_visible(&self) -> Rect {
        self.previous_visible
    }

    /// Tiles covering the visible rectangle at the frame scale.
    #[must_use]
    pub fn viewport_bounds(&self) -> TileBounds {
        self.viewport_bounds
    }

    /// Tiles the prefetch page covers at `scale`.
    #[must_use]
    pub fn prefetch_bounds(&self, scale: f32) -> TileBounds {
        let bounds = TileBounds::from_content_rect(self.visible, scale, self.config.tile_size);
        if self.config.minimal_memory {
            bounds
        } else {
            let d = self.config.prefetch_distance;
            bounds.outset(d, d)
        }
    }

    /// Scroll direction since the last change of the visible rectangle.
    #[must_use]
    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Expansion used for the front page this frame.
    #[must_use]
    pub fn expansion(&self) -> Expansion {
        self.expansion
    }

    /// Generation of the last applied invalidation.
    #[must_use]
    pub fn picture_generation(&self) -> u64 {
        self.picture_generation
    }

    /// Content size last applied to the pages.
    #[must_use]
    pub fn content_size(&self) -> Size {
        self.content_size
    }

    /// Applies content size to both pages.
    pub fn set_content_size(&mut self, size: Size) {
        self.content_size = size;
        for page in &mut self.pages {
            page.set_content_size(size);
        }
    }

    /// Records an invalidation on both pages under a new picture generation.
    /// [`Region::Full`] covers the whole content. Empty regions are ignored.
    pub fn invalidate_region(&mut self, region: &Region) {
        if region.is_empty() {
            return;
        }
        self.picture_generation += 1;
        let full = Rect::from_origin_size(Point::ORIGIN, self.content_size);
        let rects = region.resolve(full);
        for page in &mut self.pages {
            for rect in &rects {
                page.invalidate(*rect, self.picture_generation);
            }
        }
        tracing::trace!(
            generation = self.picture_generation,
            rects = rects.len(),
            "viewport invalidated"
        );
    }

    /// Swaps front and back at the end of a zoom. The old front's textures
    /// are released.
    pub fn swap_pages(&mut self) {
        self.front = 1 - self.front;
        self.zoom.swap_pages();
        self.pages[1 - self.front].discard_textures();
        self.pages_swapped = true;
        tracing::debug!(scale = self.zoom.current_scale(), "tile pages swapped");
    }

    /// Returns whether the pages swapped since the last call.
    pub fn take_pages_swapped(&mut self) -> bool {
        core::mem::take(&mut self.pages_swapped)
    }

    /// Releases every texture on both pages.
    pub fn discard_textures(&mut self) {
        for page in &mut self.pages {
            page.discard_textures();
        }
    }

    /// Drains both pages' tile counts.
    pub fn take_stats(&mut self) -> PageStats {
        let mut total = PageStats::default();
        for page in &mut self.pages {
            let stats = page.take_stats();
            total.queued = total.queued.saturating_add(stats.queued);
            total.swapped = total.swapped.saturating_add(stats.swapped);
        }
        total
    }
}
