// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a node in the scene graph handed from the layout engine to
//! the compositor. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. A layer is in at most one child list; [`LayerStore::add_child`]
//!   detaches it from any previous parent first.
//! - **Local properties** set by the caller: size, position, anchor,
//!   [`matrix`](LayerStore::set_matrix),
//!   [`children matrix`](LayerStore::set_children_matrix),
//!   [`opacity`](LayerStore::set_opacity), [`content`](LayerStore::set_content),
//!   [`flags`](LayerStore::set_flags), and a scroll offset.
//! - **Computed properties** produced by [`evaluate`](LayerStore::evaluate):
//!   the draw transform (layer space to root space) and the effective
//!   opacity.
//!
//! The store is the mutable working copy. [`LayerStore::snapshot`] freezes it
//! into a [`LayerTree`], which is what the compositor shares between its
//! pipeline roles and the rasterization workers.
//!
//! # Dirty tracking
//!
//! Property mutations automatically mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)):
//!
//! - **TRANSFORM** / **OPACITY** propagate to all descendants.
//! - **CONTENT** is local-only and carries a layer-space dirty region.
//! - **TOPOLOGY** records structural changes.

mod content;
mod draw;
mod evaluate;
mod id;
mod store;
mod traverse;
mod tree;

pub use content::{LayerContent, LayerFlags, TexturesAmount};
pub use draw::Canvas;
pub use evaluate::FrameChanges;
pub use id::{INVALID, LayerId, PictureId, SurfaceId};
pub use store::LayerStore;
pub use traverse::{Ancestors, Children};
pub use tree::{DEFAULT_ANCHOR, LayerTree};
