// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer content variants and flags.

use kurbo::Size;

use super::id::{PictureId, SurfaceId};

/// What a layer draws on its own, before its children.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LayerContent {
    /// A grouping node with no content of its own.
    #[default]
    Group,
    /// Recorded drawing commands.
    Picture(PictureId),
    /// A clipping viewport onto a larger content area. Children are offset by
    /// the layer's scroll position.
    Scrollable {
        /// Size of the scrolled content; the scroll range is this minus the
        /// layer size.
        content_size: Size,
    },
    /// An external surface such as a video frame.
    Media(SurfaceId),
}

impl LayerContent {
    /// Returns `true` if drawing this layer needs a backing texture.
    #[inline]
    #[must_use]
    pub const fn needs_texture(&self) -> bool {
        !matches!(self, Self::Group)
    }
}

/// Per-layer boolean flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Position the layer against the root layer's transform instead of its
    /// parent chain (fixed-position content).
    pub inherit_from_root: bool,
}

/// Counts of layers that need textures, produced by
/// [`LayerTree::textures_amount`](super::LayerTree::textures_amount).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TexturesAmount {
    /// Every visible layer with content.
    pub full: u32,
    /// Visible fixed-position layers with content.
    pub fixed: u32,
    /// Visible scrollable layers.
    pub scrollable: u32,
}

impl TexturesAmount {
    /// Adds another tree's counts to this one.
    pub fn add(&mut self, other: &Self) {
        self.full += other.full;
        self.fixed += other.fixed;
        self.scrollable += other.scrollable;
    }
}
