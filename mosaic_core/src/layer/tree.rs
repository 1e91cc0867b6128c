// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only struct-of-arrays layer data, shared by the store and snapshots.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Size, Vec2};

use super::content::{LayerContent, LayerFlags, TexturesAmount};
use super::id::{INVALID, LayerId};
use super::traverse::{Ancestors, Children};

/// Default anchor: the center of the layer.
pub const DEFAULT_ANCHOR: Point = Point::new(0.5, 0.5);

/// Struct-of-arrays layer data.
///
/// A `LayerTree` is what a [`LayerStore`](super::LayerStore) edits and what
/// [`LayerStore::snapshot`](super::LayerStore::snapshot) hands out: a plain
/// value with no dirty-tracking state, cheap to clone and safe to share
/// across threads once frozen. Snapshots answer every read-only query
/// (transforms, traversal, drawing).
#[derive(Clone, Debug, Default)]
pub struct LayerTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties --
    pub(crate) size: Vec<Size>,
    pub(crate) position: Vec<Point>,
    pub(crate) anchor: Vec<Point>,
    pub(crate) matrix: Vec<Affine>,
    pub(crate) children_matrix: Vec<Affine>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) content: Vec<LayerContent>,
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) scroll: Vec<Vec2>,

    // -- Computed properties (written by evaluate) --
    pub(crate) draw_transform: Vec<Affine>,
    pub(crate) effective_opacity: Vec<f32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl LayerTree {
    // -- Allocation helpers --

    /// Appends a fresh slot with default properties and returns its index.
    pub(crate) fn push_slot(&mut self) -> u32 {
        let idx = self.len;
        self.len += 1;
        self.parent.push(INVALID);
        self.first_child.push(INVALID);
        self.next_sibling.push(INVALID);
        self.prev_sibling.push(INVALID);
        self.size.push(Size::ZERO);
        self.position.push(Point::ORIGIN);
        self.anchor.push(DEFAULT_ANCHOR);
        self.matrix.push(Affine::IDENTITY);
        self.children_matrix.push(Affine::IDENTITY);
        self.opacity.push(1.0);
        self.content.push(LayerContent::Group);
        self.flags.push(LayerFlags::default());
        self.scroll.push(Vec2::ZERO);
        self.draw_transform.push(Affine::IDENTITY);
        self.effective_opacity.push(1.0);
        self.generation.push(0);
        idx
    }

    /// Resets a recycled slot to default properties and bumps its generation.
    pub(crate) fn reset_slot(&mut self, idx: u32) {
        let i = idx as usize;
        self.generation[i] += 1;
        self.parent[i] = INVALID;
        self.first_child[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.size[i] = Size::ZERO;
        self.position[i] = Point::ORIGIN;
        self.anchor[i] = DEFAULT_ANCHOR;
        self.matrix[i] = Affine::IDENTITY;
        self.children_matrix[i] = Affine::IDENTITY;
        self.opacity[i] = 1.0;
        self.content[i] = LayerContent::Group;
        self.flags[i] = LayerFlags::default();
        self.scroll[i] = Vec2::ZERO;
        self.draw_transform[i] = Affine::IDENTITY;
        self.effective_opacity[i] = 1.0;
    }

    #[inline]
    pub(crate) fn handle(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    // -- Topology queries --

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator from the layer's parent up to its root.
    #[must_use]
    pub fn ancestors(&self, id: LayerId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.idx)
    }

    /// Returns the topmost ancestor of a layer (the layer itself if it has
    /// no parent).
    #[must_use]
    pub fn root_of(&self, id: LayerId) -> LayerId {
        self.validate(id);
        self.handle(self.root_index(id.idx))
    }

    /// Returns the live layers that have no parent, in slot order.
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx))
            .map(|idx| self.handle(idx))
            .collect()
    }

    pub(crate) fn root_index(&self, mut idx: u32) -> u32 {
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        idx
    }

    // -- Property getters --

    /// Returns the layer's size.
    #[must_use]
    pub fn size(&self, id: LayerId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns the layer's position relative to its parent.
    #[must_use]
    pub fn position(&self, id: LayerId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Returns the layer's anchor point as a fraction of its size.
    #[must_use]
    pub fn anchor(&self, id: LayerId) -> Point {
        self.validate(id);
        self.anchor[id.idx as usize]
    }

    /// Returns the layer's own transform matrix (applied about the anchor).
    #[must_use]
    pub fn matrix(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.matrix[id.idx as usize]
    }

    /// Returns the matrix applied to the layer's children.
    #[must_use]
    pub fn children_matrix(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.children_matrix[id.idx as usize]
    }

    /// Returns the layer's own opacity.
    #[must_use]
    pub fn opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns what the layer draws.
    #[must_use]
    pub fn content(&self, id: LayerId) -> LayerContent {
        self.validate(id);
        self.content[id.idx as usize]
    }

    /// Returns the layer's flags.
    #[must_use]
    pub fn flags(&self, id: LayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the scroll offset of a scrollable layer (zero otherwise).
    #[must_use]
    pub fn scroll_offset(&self, id: LayerId) -> Vec2 {
        self.validate(id);
        self.scroll[id.idx as usize]
    }

    /// Returns the transform from the layer's space to its root's space.
    ///
    /// Only valid after [`LayerStore::evaluate`](super::LayerStore::evaluate).
    #[must_use]
    pub fn draw_transform(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.draw_transform[id.idx as usize]
    }

    /// Returns the product of the opacities from the root down to the layer.
    ///
    /// Only valid after [`LayerStore::evaluate`](super::LayerStore::evaluate).
    #[must_use]
    pub fn effective_opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.effective_opacity[id.idx as usize]
    }

    // -- Transforms --

    /// Returns the layer's transform relative to its parent:
    /// `translate(position) · translate(anchor·size) · matrix · translate(-anchor·size)`.
    #[must_use]
    pub fn local_transform(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.local_transform_at(id.idx)
    }

    pub(crate) fn local_transform_at(&self, idx: u32) -> Affine {
        let i = idx as usize;
        let size = self.size[i];
        let anchor = self.anchor[i];
        let pivot = Vec2::new(anchor.x * size.width, anchor.y * size.height);
        Affine::translate(self.position[i].to_vec2())
            * Affine::translate(pivot)
            * self.matrix[i]
            * Affine::translate(-pivot)
    }

    /// Returns the transform applied between a layer and its children:
    /// the children matrix, followed by the scroll offset for scrollable
    /// layers.
    #[must_use]
    pub fn children_transform(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.children_transform_at(id.idx)
    }

    pub(crate) fn children_transform_at(&self, idx: u32) -> Affine {
        let i = idx as usize;
        self.children_matrix[i] * Affine::translate(-self.scroll[i])
    }

    /// Maps the layer's local space into `ancestor`'s space (the root's when
    /// `ancestor` is `None`).
    ///
    /// The walk composes every intermediate ancestor's local and children
    /// transforms; `ancestor`'s own transform is not included. Layers flagged
    /// [`inherit_from_root`](LayerFlags::inherit_from_root) skip the walk and
    /// use the root's matrix directly.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale or `ancestor` is not an ancestor of `id`.
    /// In debug builds, also panics if `id` inherits from the root and an
    /// ancestor is given; release builds ignore the ancestor in that case.
    #[must_use]
    pub fn local_to_ancestor(&self, id: LayerId, ancestor: Option<LayerId>) -> Affine {
        self.validate(id);
        if let Some(a) = ancestor {
            self.validate(a);
            if a == id {
                return Affine::IDENTITY;
            }
        }

        let local = self.local_transform_at(id.idx);
        if self.flags[id.idx as usize].inherit_from_root {
            debug_assert!(
                ancestor.is_none(),
                "fixed-position layer {id:?} cannot be mapped to an ancestor"
            );
            let root = self.root_index(id.idx);
            return self.matrix[root as usize] * local;
        }

        let stop = ancestor.map_or(INVALID, |a| a.idx);
        let mut transform = local;
        let mut idx = id.idx;
        while self.parent[idx as usize] != stop {
            idx = self.parent[idx as usize];
            assert!(idx != INVALID, "{ancestor:?} is not an ancestor of {id:?}");
            let step = self.local_transform_at(idx) * self.children_transform_at(idx);
            transform = step * transform;
        }
        transform
    }

    /// Returns the layer's bounds in its own space.
    #[must_use]
    pub fn local_bounds(&self, id: LayerId) -> Rect {
        self.validate(id);
        Rect::from_origin_size(Point::ORIGIN, self.size[id.idx as usize])
    }

    // -- Scrolling --

    /// Scrolls a scrollable layer, clamping to its scroll range.
    ///
    /// Returns `false` (and does nothing) for layers that are not
    /// [`LayerContent::Scrollable`].
    pub fn scroll_to(&mut self, id: LayerId, x: f64, y: f64) -> bool {
        self.validate(id);
        let i = id.idx as usize;
        let LayerContent::Scrollable { content_size } = self.content[i] else {
            return false;
        };
        let max_x = (content_size.width - self.size[i].width).max(0.0);
        let max_y = (content_size.height - self.size[i].height).max(0.0);
        self.scroll[i] = Vec2::new(x.clamp(0.0, max_x), y.clamp(0.0, max_y));
        true
    }

    // -- Texture accounting --

    /// Counts the layers under `root` that need a texture, skipping subtrees
    /// whose accumulated opacity is zero (they are never drawn).
    #[must_use]
    pub fn textures_amount(&self, root: LayerId) -> TexturesAmount {
        self.validate(root);
        let mut amount = TexturesAmount::default();
        self.count_textures(root.idx, 1.0, &mut amount);
        amount
    }

    fn count_textures(&self, idx: u32, opacity: f32, amount: &mut TexturesAmount) {
        let i = idx as usize;
        let opacity = opacity * self.opacity[i];
        if opacity <= 0.0 {
            return;
        }
        let content = self.content[i];
        if content.needs_texture() {
            amount.full += 1;
            if self.flags[i].inherit_from_root {
                amount.fixed += 1;
            }
            if matches!(content, LayerContent::Scrollable { .. }) {
                amount.scrollable += 1;
            }
        }
        let mut child = self.first_child[i];
        while child != INVALID {
            self.count_textures(child, opacity, amount);
            child = self.next_sibling[child as usize];
        }
    }
}
