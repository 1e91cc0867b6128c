// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for tile-based layer-tree compositing.
//!
//! `mosaic_core` holds the data structures and state machines that do not
//! need threads: the layer arena the layout engine edits, the immutable
//! snapshots it hands to the compositor, tile-space geometry, and the zoom
//! and scroll state machines that decide what a frame shows. It is `no_std`
//! compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   LayerStore (layout engine) ──evaluate()──► FrameChanges.damage
//!        │
//!        └──snapshot()──► LayerTree ──► TreeManager roles (mosaic_compositor)
//!                                            │
//!   host drawGL(now, scale) ──► ZoomManager::process_new_scale()
//!                               ScrollState::on_input()
//!                                            │
//!                                            ▼
//!                               tile pages (mosaic_tiles)
//! ```
//!
//! **[`layer`]**: struct-of-arrays layer tree with generational handles,
//! dirty tracking, and depth-first drawing through the
//! [`Canvas`](layer::Canvas) capability.
//!
//! **[`dirty`]**: channel constants for `understory_dirty`.
//!
//! **[`geometry`]**: tile coordinates, tile bounds, and scroll direction.
//!
//! **[`region`]**: invalidation regions.
//!
//! **[`zoom`]**: the debounced scale-request state machine and cross-fade
//! ramps.
//!
//! **[`scroll`]**: the scroll gesture state machine and tile swap policy.
//!
//! **[`time`]**: host time in nanoseconds.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! the zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies.
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-frame tile
//!   count events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod geometry;
pub mod layer;
pub mod region;
pub mod scroll;
pub mod time;
pub mod trace;
pub mod zoom;
