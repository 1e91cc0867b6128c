// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the composition loop.
//!
//! [`TraceSink`] has one method per event; all of them default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Snapshots are identified by the `u64` generation the tree manager assigned
//! when the tree was handed over.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies.
//! - `trace-rich` (implies `trace`): gates [`TilesPaintedEvent`] and the
//!   corresponding `TraceSink` method.

use crate::scroll::ScrollState;
use crate::time::HostTime;
use crate::zoom::ScaleRequestState;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The pipeline role a snapshot was placed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeRole {
    /// On screen.
    Drawing,
    /// Being rasterized.
    Painting,
    /// Waiting for the painting tree to finish.
    Queued,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once per composed frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Host time of the frame.
    pub now: HostTime,
    /// Scale the host asked the frame to be drawn at.
    pub scale: f32,
    /// Whether another frame was requested.
    pub needs_redraw: bool,
}

/// Emitted when the layout engine hands over a new snapshot.
#[derive(Clone, Copy, Debug)]
pub struct TreeUpdateEvent {
    /// Frame counter at the time of the update.
    pub frame_index: u64,
    /// Host time of the last frame.
    pub now: HostTime,
    /// The new snapshot, or `None` when the trees were cleared.
    pub snapshot: Option<u64>,
    /// Whether all roles were reset first.
    pub brand_new: bool,
    /// Where the new snapshot landed.
    pub role: Option<TreeRole>,
    /// A queued snapshot that was superseded (its invalidations were merged
    /// into the new one).
    pub superseded: Option<u64>,
}

/// Emitted when the painting snapshot is promoted to drawing.
#[derive(Clone, Copy, Debug)]
pub struct TreeSwapEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time of the swap.
    pub now: HostTime,
    /// The snapshot now on screen.
    pub drawing: u64,
    /// The queued snapshot that started painting, if any.
    pub painting: Option<u64>,
    /// The snapshot that left the screen, if any.
    pub discarded: Option<u64>,
}

/// Emitted when the zoom request state changes.
#[derive(Clone, Copy, Debug)]
pub struct ZoomStateEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time.
    pub now: HostTime,
    /// The new state.
    pub state: ScaleRequestState,
    /// Displayed scale.
    pub current_scale: f32,
    /// Requested scale.
    pub future_scale: f32,
}

/// Emitted when the front and back tile pages swap at the end of a zoom.
#[derive(Clone, Copy, Debug)]
pub struct PageSwapEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time.
    pub now: HostTime,
    /// The scale now displayed.
    pub scale: f32,
}

/// Emitted when the scroll state changes.
#[derive(Clone, Copy, Debug)]
pub struct ScrollStateEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time.
    pub now: HostTime,
    /// The new state.
    pub state: ScrollState,
}

/// Per-frame tile rasterization counts.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct TilesPaintedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time.
    pub now: HostTime,
    /// Tiles queued for painting this frame.
    pub queued: u32,
    /// Tiles swapped to the front this frame.
    pub swapped: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the composition loop.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called once per frame.
    fn on_frame(&mut self, e: &FrameEvent) {
        _ = e;
    }

    /// Called when a snapshot is handed over.
    fn on_tree_update(&mut self, e: &TreeUpdateEvent) {
        _ = e;
    }

    /// Called when the painting snapshot is promoted.
    fn on_tree_swap(&mut self, e: &TreeSwapEvent) {
        _ = e;
    }

    /// Called when the zoom request state changes.
    fn on_zoom_state(&mut self, e: &ZoomStateEvent) {
        _ = e;
    }

    /// Called when the tile pages swap.
    fn on_page_swap(&mut self, e: &PageSwapEvent) {
        _ = e;
    }

    /// Called when the scroll state changes.
    fn on_scroll_state(&mut self, e: &ScrollStateEvent) {
        _ = e;
    }

    /// Called with per-frame tile counts (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_tiles_painted(&mut self, e: &TilesPaintedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameEvent`].
    #[inline]
    pub fn frame(&mut self, e: &FrameEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TreeUpdateEvent`].
    #[inline]
    pub fn tree_update(&mut self, e: &TreeUpdateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tree_update(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TreeSwapEvent`].
    #[inline]
    pub fn tree_swap(&mut self, e: &TreeSwapEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tree_swap(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ZoomStateEvent`].
    #[inline]
    pub fn zoom_state(&mut self, e: &ZoomStateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_zoom_state(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PageSwapEvent`].
    #[inline]
    pub fn page_swap(&mut self, e: &PageSwapEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_page_swap(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ScrollStateEvent`].
    #[inline]
    pub fn scroll_state(&mut self, e: &ScrollStateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scroll_state(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits tile counts (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn tiles_painted(&mut self, e: &TilesPaintedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_tiles_painted(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
