// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutable layer storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::content::{LayerContent, LayerFlags};
use super::id::{INVALID, LayerId};
use super::traverse::Children;
use super::tree::LayerTree;
use crate::dirty;
use crate::region::Region;

/// The layout engine's working copy of the layer tree.
///
/// Layers are addressed by [`LayerId`] handles. Internally each layer
/// occupies a slot in the parallel arrays of a [`LayerTree`]; destroyed layers
/// are recycled via a free list and generation counters reject stale handles.
///
/// Every mutation marks a dirty channel (see [`dirty`](crate::dirty)).
/// [`evaluate`](Self::evaluate) drains the channels, refreshes the computed
/// draw transforms, and reports the damaged area. [`snapshot`](Self::snapshot)
/// then freezes the current state into an immutable [`LayerTree`] that can be
/// handed to the compositor while the store keeps changing.
#[derive(Debug)]
pub struct LayerStore {
    pub(crate) tree: LayerTree,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    /// Layer-local rectangles invalidated since the last evaluate.
    pub(crate) dirty_region: Vec<Region>,
    /// Root-space bounds as of the last evaluate.
    pub(crate) last_bounds: Vec<Rect>,
    /// Damage from layers destroyed since the last evaluate.
    pub(crate) pending_damage: Region,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: LayerTree::default(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            dirty_region: Vec::new(),
            last_bounds: Vec::new(),
            pending_damage: Region::Empty,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    /// Returns the live tree for read-only queries.
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &LayerTree {
        &self.tree
    }

    /// Freezes the current state into an immutable snapshot.
    ///
    /// Call [`evaluate`](Self::evaluate) first so the snapshot carries fresh
    /// draw transforms.
    #[must_use]
    pub fn snapshot(&self) -> LayerTree {
        self.tree.clone()
    }

    // -- Allocation API --

    /// Creates a new detached layer and returns its handle.
    ///
    /// The layer starts with zero size, a centered anchor, identity
    /// matrices, full opacity, and no content.
    pub fn create_layer(&mut self) -> LayerId {
        let idx = if let Some(idx) = self.tree.free_list.pop() {
            self.tree.reset_slot(idx);
            self.dirty_region[idx as usize] = Region::Empty;
            self.last_bounds[idx as usize] = Rect::ZERO;
            idx
        } else {
            self.dirty_region.push(Region::Empty);
            self.last_bounds.push(Rect::ZERO);
            self.tree.push_slot()
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.tree.handle(idx)
    }

    /// Destroys a layer, freeing its slot for reuse. The area it last
    /// covered is reported as damage by the next evaluate.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.tree.validate(id);
        let idx = id.idx;
        assert!(
            self.tree.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        if self.tree.parent[idx as usize] != INVALID {
            let p = self.tree.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }

        self.dirty.remove_key(idx);
        self.pending_damage
            .union_rect(self.last_bounds[idx as usize]);

        // Bump generation so old handles immediately fail validation.
        self.tree.generation[idx as usize] += 1;
        self.tree.free_list.push(idx);
        self.pending_removed.push(idx);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        self.tree.is_alive(id)
    }

    // -- Topology API --

    /// Appends `child` to `parent`'s children.
    ///
    /// A child that already has a parent is detached from it first, so a
    /// layer is always in at most one child list.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `parent` is `child` or one of
    /// its descendants.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        self.tree.validate(parent);
        self.tree.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            p != c && !self.tree.ancestors(parent).any(|a| a.idx == c),
            "cannot add {child:?} under its own descendant {parent:?}"
        );

        if self.tree.parent[c as usize] != INVALID {
            self.detach_index(c);
        }

        self.tree.parent[c as usize] = p;
        self.tree.prev_sibling[c as usize] = INVALID;
        self.tree.next_sibling[c as usize] = INVALID;

        if self.tree.first_child[p as usize] == INVALID {
            self.tree.first_child[p as usize] = c;
        } else {
            let mut last = self.tree.first_child[p as usize];
            while self.tree.next_sibling[last as usize] != INVALID {
                last = self.tree.next_sibling[last as usize];
            }
            self.tree.next_sibling[last as usize] = c;
            self.tree.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for inherited channels.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its parent's child list. The layer stays alive
    /// as a detached root. Does nothing if it has no parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn detach_from_parent(&mut self, child: LayerId) {
        self.tree.validate(child);
        if self.tree.parent[child.idx as usize] != INVALID {
            self.detach_index(child.idx);
            self.mark_subtree_inherited_dirty(child.idx);
        }
    }

    /// Detaches every child of `parent`, preserving nothing of the child
    /// list.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_children(&mut self, parent: LayerId) {
        self.tree.validate(parent);
        while self.tree.first_child[parent.idx as usize] != INVALID {
            let c = self.tree.first_child[parent.idx as usize];
            self.detach_index(c);
            self.mark_subtree_inherited_dirty(c);
        }
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.tree.parent(id)
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.tree.children(id)
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the layer's size. Affects the anchor pivot, so the transform
    /// channel is marked along with content.
    pub fn set_size(&mut self, id: LayerId, size: Size) {
        self.tree.validate(id);
        self.tree.size[id.idx as usize] = size;
        self.dirty_region[id.idx as usize] = Region::Full;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the layer's position relative to its parent.
    pub fn set_position(&mut self, id: LayerId, position: Point) {
        self.tree.validate(id);
        self.tree.position[id.idx as usize] = position;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the anchor point, as a fraction of the layer's size.
    pub fn set_anchor(&mut self, id: LayerId, anchor: Point) {
        self.tree.validate(id);
        self.tree.anchor[id.idx as usize] = anchor;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the layer's own matrix, applied about the anchor point.
    pub fn set_matrix(&mut self, id: LayerId, matrix: Affine) {
        self.tree.validate(id);
        self.tree.matrix[id.idx as usize] = matrix;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the matrix applied to the layer's children.
    pub fn set_children_matrix(&mut self, id: LayerId, matrix: Affine) {
        self.tree.validate(id);
        self.tree.children_matrix[id.idx as usize] = matrix;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the layer's opacity.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.tree.validate(id);
        self.tree.opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Replaces what the layer draws; the whole layer is invalidated.
    pub fn set_content(&mut self, id: LayerId, content: LayerContent) {
        self.tree.validate(id);
        self.tree.content[id.idx as usize] = content;
        self.dirty_region[id.idx as usize] = Region::Full;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the layer's flags.
    pub fn set_flags(&mut self, id: LayerId, flags: LayerFlags) {
        self.tree.validate(id);
        self.tree.flags[id.idx as usize] = flags;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Scrolls a scrollable layer. Returns `false` for other layers.
    pub fn scroll_to(&mut self, id: LayerId, x: f64, y: f64) -> bool {
        let scrolled = self.tree.scroll_to(id, x, y);
        if scrolled {
            self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
        }
        scrolled
    }

    /// Invalidates part of a layer's content, in the layer's own space.
    pub fn mark_as_dirty(&mut self, id: LayerId, rect: Rect) {
        self.tree.validate(id);
        self.dirty_region[id.idx as usize].union_rect(rect);
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Returns `true` if the layer has content invalidated since the last
    /// evaluate.
    #[must_use]
    pub fn is_dirty(&self, id: LayerId) -> bool {
        self.tree.validate(id);
        !self.dirty_region[id.idx as usize].is_empty()
    }

    // -- Internal helpers --

    /// Unlinks `idx` from its parent and drops the dependency edges.
    fn detach_index(&mut self, idx: u32) {
        let p = self.tree.parent[idx as usize];
        self.unlink_from_parent(idx);
        self.dirty.remove_dependency(idx, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(idx, p, dirty::OPACITY);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let tree = &mut self.tree;
        let p = tree.parent[idx as usize];
        let prev = tree.prev_sibling[idx as usize];
        let next = tree.next_sibling[idx as usize];

        if prev != INVALID {
            tree.next_sibling[prev as usize] = next;
        } else {
            tree.first_child[p as usize] = next;
        }
        if next != INVALID {
            tree.prev_sibling[next as usize] = prev;
        }

        tree.parent[idx as usize] = INVALID;
        tree.prev_sibling[idx as usize] = INVALID;
        tree.next_sibling[idx as usize] = INVALID;
    }

    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
    }
}
