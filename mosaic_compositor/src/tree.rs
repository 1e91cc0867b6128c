// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capabilities a scene snapshot offers the tree manager.
//!
//! Snapshots are shared behind `Arc` between the composition thread and
//! paint workers, so every method takes `&self`. Per-viewport state is
//! passed in explicitly as `V`; a snapshot never keeps a pointer back to the
//! viewport that shows it.

use core::fmt;

use kurbo::{Rect, Size};
use mosaic_core::layer::{Canvas, LayerId, TexturesAmount};
use mosaic_core::time::HostTime;

/// Generation number the tree manager assigns to each snapshot it receives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(pub u64);

impl fmt::Debug for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotId({})", self.0)
    }
}

/// Inputs of one composed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Monotonic frame counter.
    pub index: u64,
    /// Host time of the frame.
    pub now: HostTime,
    /// The on-screen rectangle being drawn into, in device pixels.
    pub view_rect: Rect,
    /// The visible content rectangle.
    pub visible_rect: Rect,
    /// The scale the host is drawing at.
    pub scale: f32,
}

/// The thread-safe part of a snapshot: what paint workers and scroll input
/// need.
pub trait SceneContent: Send + Sync {
    /// Size of the base content in content units.
    fn content_size(&self) -> Size;

    /// Paints the snapshot's content. Called on worker threads.
    fn paint(&self, canvas: &mut dyn Canvas);

    /// Scrolls a scrollable layer. Layers that do not exist in this snapshot
    /// or do not scroll are ignored.
    fn update_scrollable_layer(&self, layer: LayerId, x: f64, y: f64) {
        _ = (layer, x, y);
    }
}

/// A scene snapshot as driven by a [`TreeManager`](crate::TreeManager) for
/// viewport context `V`.
pub trait SceneTree<V>: SceneContent {
    /// Advances animations to `now`. Returns `true` while any are running.
    fn evaluate_animations(&self, now: HostTime) -> bool {
        _ = now;
        false
    }

    /// Returns `true` if the snapshot has animations.
    fn has_animations(&self) -> bool {
        false
    }

    /// Prepares tiles for this frame. Returns `true` to request another
    /// frame.
    fn prepare(&self, viewport: &mut V, frame: &Frame) -> bool;

    /// Counts the textures the snapshot's layers need.
    fn textures_amount(&self) -> TexturesAmount {
        TexturesAmount::default()
    }

    /// Returns `true` once everything the snapshot shows is painted.
    fn is_ready(&self, viewport: &V, frame: &Frame) -> bool;

    /// Promotes painted tiles to the front.
    fn swap_tiles(&self, viewport: &mut V, frame: &Frame);

    /// Draws the snapshot. Returns `true` to request another frame.
    fn draw(&self, viewport: &mut V, frame: &Frame) -> bool;

    /// Called when the snapshot enters (`true`) or leaves (`false`) the
    /// drawing role.
    fn set_is_drawing(&self, viewport: &mut V, drawing: bool) {
        _ = (viewport, drawing);
    }

    /// Called when the snapshot starts painting. `drawing` is the snapshot
    /// on screen at that moment, if any.
    fn set_is_painting(&self, viewport: &mut V, drawing: Option<&Self>) {
        _ = (viewport, drawing);
    }

    /// Called when a queued snapshot is superseded before it painted: every
    /// invalidation it carries must move to `replacement`.
    fn merge_invals_into(&self, replacement: &Self) {
        _ = replacement;
    }
}

/// Composited layers drawn on top of the base content (the layout engine's
/// layer tree).
pub trait CompositedLayers: Send + Sync {
    /// Advances animations to `now`. Returns `true` while any are running.
    fn evaluate_animations(&self, now: HostTime) -> bool;

    /// Returns `true` if the layers have animations.
    fn has_animations(&self) -> bool;

    /// Returns `true` once every layer has its textures painted.
    fn is_ready(&self) -> bool {
        true
    }

    /// Counts the textures the layers need.
    fn textures_amount(&self) -> TexturesAmount {
        TexturesAmount::default()
    }

    /// Draws the layers at `layers_scale`. Returns `true` to request another
    /// frame.
    fn draw(&self, frame: &Frame, layers_scale: f32) -> bool;
}
