// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame compositing pipeline.
//!
//! [`Compositor`] is what the host calls once per frame. It keeps three
//! scene snapshots in flight through [`TreeManager`]:
//!
//! ```text
//!   update_with_tree ──► queued ──► painting ──is_ready──► drawing ──► screen
//!                          ▲           │
//!                          └─ superseded queued trees merge their
//!                             invalidations forward
//! ```
//!
//! and drives a [`ViewportState`] holding two tile pages (front and back),
//! the zoom state machine and the scroll state machine. [`BaseLayer`] is the
//! snapshot type that ties them together: it knows how to prepare, swap and
//! draw the viewport's pages for one tree.
//!
//! Nothing here blocks on rasterization. When content is not ready the
//! previous frame's textures stay on screen and [`Compositor::draw_gl`]
//! asks for another frame.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): forwards to `mosaic_core/trace` so
//!   [`draw_gl_traced`](Compositor::draw_gl_traced) emits events.
//! - `trace-rich` (disabled by default, implies `trace`): also reports
//!   per-frame tile counts.

pub mod base_layer;
pub mod compositor;
pub mod manager;
pub mod tree;
pub mod viewport;

pub use base_layer::BaseLayer;
pub use compositor::Compositor;
pub use manager::{DrawOutcome, TreeContent, TreeManager, TreeSwap, TreeUpdate};
pub use tree::{CompositedLayers, Frame, SceneContent, SceneTree, SnapshotId};
pub use viewport::{PagesMut, ViewportConfig, ViewportState};
