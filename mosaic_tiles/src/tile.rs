// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single double-buffered tile.
//!
//! ```text
//!   Unpainted ──worker picks it up──► PaintingStarted ──texture──► ReadyToSwap
//!       ▲                                                              │
//!       └──────── invalidated / moved / discarded ◄── UpToDate ◄──swap─┘
//! ```
//!
//! A tile is shared between its page (composition thread) and at most one
//! queued paint operation (worker thread), so its state sits behind a
//! [`parking_lot::Mutex`]. Backend calls never run with that lock held.

use kurbo::{Rect, Size};
use mosaic_core::geometry::TileCoord;
use parking_lot::Mutex;

use crate::texture::{PageId, PaintRequest, TextureId, TileBackend};

/// Paint progress of a tile's back buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileState {
    /// The back buffer holds nothing usable.
    #[default]
    Unpainted,
    /// A worker is rasterizing the tile.
    PaintingStarted,
    /// A freshly painted back texture is waiting to be swapped to the front.
    ReadyToSwap,
    /// The front texture shows the latest painted content.
    UpToDate,
}

#[derive(Debug)]
struct TileInner {
    coord: Option<TileCoord>,
    scale: f32,
    state: TileState,
    front: Option<TextureId>,
    back: Option<TextureId>,
    painted_generation: u64,
    dirty_generation: u64,
    dirty: bool,
    repaint_pending: bool,
    last_used: u64,
}

impl TileInner {
    /// Forgets everything painted; the next prepare repaints from scratch.
    fn full_inval(&mut self) {
        self.dirty = true;
        self.state = TileState::Unpainted;
        self.painted_generation = 0;
    }
}

/// One tile of a [`TiledPage`](crate::TiledPage).
#[derive(Debug)]
pub struct Tile {
    inner: Mutex<TileInner>,
}

impl Default for Tile {
    fn default() -> Self {
        Self::new()
    }
}

impl Tile {
    /// Creates an unassigned tile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TileInner {
                coord: None,
                scale: 1.0,
                state: TileState::Unpainted,
                front: None,
                back: None,
                painted_generation: 0,
                dirty_generation: 0,
                dirty: true,
                repaint_pending: false,
                last_used: 0,
            }),
        }
    }

    /// Grid position, or `None` for a tile that was never assigned.
    #[must_use]
    pub fn coord(&self) -> Option<TileCoord> {
        self.inner.lock().coord
    }

    /// Scale the tile was last assigned.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.inner.lock().scale
    }

    /// Current paint state.
    #[must_use]
    pub fn state(&self) -> TileState {
        self.inner.lock().state
    }

    /// Frame at which the tile was last assigned by a prepare.
    #[must_use]
    pub fn last_used(&self) -> u64 {
        self.inner.lock().last_used
    }

    /// Assigns the tile to `coord` at `scale`, stamping it with `frame`.
    ///
    /// A change of position or scale invalidates the whole tile. Moving to a
    /// different position also drops both textures, since their content
    /// belongs elsewhere.
    pub fn set_contents(
        &self,
        coord: TileCoord,
        scale: f32,
        frame: u64,
        backend: &dyn TileBackend,
    ) {
        let released = {
            let mut inner = self.inner.lock();
            inner.last_used = frame;
            let moved = inner.coord != Some(coord);
            let rescaled = inner.scale != scale;
            inner.coord = Some(coord);
            inner.scale = scale;
            if moved || rescaled {
                inner.full_inval();
            }
            if moved {
                [inner.front.take(), inner.back.take()]
            } else {
                [None, None]
            }
        };
        released.into_iter().flatten().for_each(|t| backend.release(t));
    }

    /// Records an invalidation at `generation`.
    pub fn mark_dirty(&self, generation: u64) {
        let mut inner = self.inner.lock();
        inner.dirty = true;
        inner.dirty_generation = inner.dirty_generation.max(generation);
        if inner.state != TileState::PaintingStarted {
            inner.state = TileState::Unpainted;
        }
    }

    /// Returns `true` if the tile needs a repaint.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    /// Returns `true` if the last paint predates the last invalidation.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        let inner = self.inner.lock();
        inner.painted_generation < inner.dirty_generation
    }

    /// Returns `true` if a paint operation for this tile is queued or
    /// running.
    #[must_use]
    pub fn is_repaint_pending(&self) -> bool {
        self.inner.lock().repaint_pending
    }

    /// Marks a paint as pending if the tile is dirty and none is pending
    /// yet. Returns `true` when the caller should queue a paint.
    pub(crate) fn claim_repaint(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.dirty && !inner.repaint_pending && inner.coord.is_some() {
            inner.repaint_pending = true;
            true
        } else {
            false
        }
    }

    /// Clears the pending flag of a paint operation that was cancelled before
    /// it ran.
    pub(crate) fn cancel_repaint(&self) {
        self.inner.lock().repaint_pending = false;
    }

    /// Returns `true` if the tile has a front texture to draw.
    #[must_use]
    pub fn has_front(&self) -> bool {
        self.inner.lock().front.is_some()
    }

    /// Returns `true` if the tile is assigned and its painted content is
    /// current, whether or not it has been swapped to the front yet.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let inner = self.inner.lock();
        inner.coord.is_some()
            && !inner.dirty
            && matches!(inner.state, TileState::ReadyToSwap | TileState::UpToDate)
    }

    /// Snapshots the tile for a worker and moves it to
    /// [`TileState::PaintingStarted`]. Returns `None` if the tile was never
    /// assigned.
    pub(crate) fn begin_paint(&self, page: PageId, prefetch: bool) -> Option<PaintRequest> {
        let mut inner = self.inner.lock();
        let coord = inner.coord?;
        inner.state = TileState::PaintingStarted;
        inner.dirty = false;
        Some(PaintRequest {
            page,
            coord,
            scale: inner.scale,
            generation: inner.dirty_generation,
            prefetch,
        })
    }

    /// Installs the result of a paint started with [`begin_paint`].
    ///
    /// If the tile moved or changed scale while the worker was painting, the
    /// texture is released and the tile left as it is.
    ///
    /// [`begin_paint`]: Self::begin_paint
    pub(crate) fn finish_paint(
        &self,
        request: &PaintRequest,
        texture: Option<TextureId>,
        backend: &dyn TileBackend,
    ) {
        let released = {
            let mut inner = self.inner.lock();
            inner.repaint_pending = false;
            if inner.coord != Some(request.coord) || inner.scale != request.scale {
                texture
            } else if let Some(texture) = texture {
                let old_back = inner.back.replace(texture);
                inner.painted_generation = request.generation;
                inner.state = if inner.dirty {
                    TileState::Unpainted
                } else {
                    TileState::ReadyToSwap
                };
                old_back
            } else {
                inner.dirty = true;
                inner.state = TileState::Unpainted;
                None
            }
        };
        if let Some(texture) = released {
            backend.release(texture);
        }
    }

    /// Promotes a ready back texture to the front. Returns `true` if a swap
    /// happened.
    pub fn swap_if_needed(&self, backend: &dyn TileBackend) -> bool {
        let released = {
            let mut inner = self.inner.lock();
            if inner.state != TileState::ReadyToSwap {
                return false;
            }
            let back = inner.back.take();
            let old_front = core::mem::replace(&mut inner.front, back);
            inner.state = TileState::UpToDate;
            old_front
        };
        if let Some(texture) = released {
            backend.release(texture);
        }
        true
    }

    /// Draws the front texture, if any, at the tile's content rectangle.
    /// Returns `true` if something was drawn.
    pub fn draw(&self, tile_size: Size, opacity: f32, backend: &dyn TileBackend) -> bool {
        let (front, rect) = {
            let inner = self.inner.lock();
            let Some(coord) = inner.coord else {
                return false;
            };
            (inner.front, coord.content_rect(tile_size, inner.scale))
        };
        let Some(front) = front else {
            return false;
        };
        backend.draw_tile(front, rect, opacity);
        true
    }

    /// Content-space rectangle the tile covers, if assigned.
    #[must_use]
    pub fn content_rect(&self, tile_size: Size) -> Option<Rect> {
        let inner = self.inner.lock();
        inner.coord.map(|c| c.content_rect(tile_size, inner.scale))
    }

    /// Releases both textures and marks the tile for a full repaint.
    pub fn discard_textures(&self, backend: &dyn TileBackend) {
        let released = {
            let mut inner = self.inner.lock();
            inner.full_inval();
            [inner.front.take(), inner.back.take()]
        };
        released.into_iter().flatten().for_each(|t| backend.release(t));
    }
}
