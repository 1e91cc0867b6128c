// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Mosaic uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! propagate invalidation through the layer tree. Each channel represents an
//! independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`TRANSFORM`] and [`OPACITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency edges
//!   from child to parent. Marking a parent dirty marks all descendants,
//!   because draw transforms and effective opacities are inherited. Flag and
//!   scroll changes are routed through [`TRANSFORM`].
//!
//! - **Local-only**: [`CONTENT`] is marked with the default policy. Only the
//!   explicitly marked layer appears in the drain output; the invalidated
//!   area itself is kept per layer by the store.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on add/remove child and
//!   create/destroy layer.
//!
//! # Consumption
//!
//! Each [`LayerStore::evaluate`](crate::layer::LayerStore::evaluate) call
//! drains all channels and surfaces the results as
//! [`FrameChanges`](crate::layer::FrameChanges).

use understory_dirty::Channel;

/// Geometry, flags, or scroll offset changed; descendants need new draw
/// transforms.
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed; descendants need new effective opacities.
pub const OPACITY: Channel = Channel::new(1);

/// Content invalidated.
pub const CONTENT: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
