// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and damage computation.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **TRANSFORM**: recompute each affected layer's draw transform
//!    (`parent_draw · parent_children · local`, or `root.matrix · local` for
//!    fixed-position layers).
//! 2. **OPACITY**: recompute effective opacity as
//!    `parent_effective · opacity`.
//! 3. **CONTENT**: collect layers with invalidated content.
//! 4. **TOPOLOGY**: drain; reported as a flag only.
//!
//! Every changed layer contributes the union of its previous and current
//! root-space bounds to [`FrameChanges::damage`], which is what the
//! compositor needs to invalidate the tiles of the next snapshot.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};

use super::id::INVALID;
use super::store::LayerStore;
use crate::dirty;
use crate::region::Region;

/// The set of changes produced by a single [`LayerStore::evaluate`] call.
///
/// Index lists hold raw slot indices (see [`LayerId::index`](super::LayerId::index)).
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Layers whose draw transform was recomputed.
    pub transforms: Vec<u32>,
    /// Layers whose effective opacity was recomputed.
    pub opacities: Vec<u32>,
    /// Layers whose content was invalidated.
    pub content: Vec<u32>,
    /// Layers created since the last evaluate.
    pub added: Vec<u32>,
    /// Layers destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether any parent/child link changed.
    pub topology_changed: bool,
    /// Root-space area whose pixels changed.
    pub damage: Region,
}

impl FrameChanges {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
            && self.damage.is_empty()
    }
}

impl LayerStore {
    /// Evaluates the layer tree, recomputing dirty properties and returning
    /// the set of changes.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges {
            damage: self.pending_damage.take(),
            ..FrameChanges::default()
        };

        // Drain TRANSFORM: parents are yielded before children.
        changes.transforms = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &changes.transforms {
            let draw = self.compute_draw_transform(idx);
            self.tree.draw_transform[idx as usize] = draw;
        }

        // Drain OPACITY.
        changes.opacities = self
            .dirty
            .drain(dirty::OPACITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &changes.opacities {
            let parent = self.tree.parent[idx as usize];
            let inherited = if parent != INVALID {
                self.tree.effective_opacity[parent as usize]
            } else {
                1.0
            };
            self.tree.effective_opacity[idx as usize] =
                inherited * self.tree.opacity[idx as usize];
        }

        // Drain CONTENT.
        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();

        // Drain TOPOLOGY.
        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // Geometry or opacity changes repaint the old and new footprint.
        for &idx in changes.transforms.iter().chain(&changes.opacities) {
            let bounds = self.root_bounds(idx);
            changes.damage.union_rect(self.last_bounds[idx as usize]);
            changes.damage.union_rect(bounds);
            self.last_bounds[idx as usize] = bounds;
        }

        // Content changes repaint only what was marked.
        for &idx in &changes.content {
            let i = idx as usize;
            let local = Rect::from_origin_size(Point::ORIGIN, self.tree.size[i]);
            let draw = self.tree.draw_transform[i];
            for rect in self.dirty_region[i].take().resolve(local) {
                changes.damage.union_rect(draw.transform_rect_bbox(rect));
            }
        }

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
        changes
    }

    fn compute_draw_transform(&self, idx: u32) -> Affine {
        let tree = &self.tree;
        let local = tree.local_transform_at(idx);
        let parent = tree.parent[idx as usize];
        if parent == INVALID {
            return local;
        }
        if tree.flags[idx as usize].inherit_from_root {
            let root = tree.root_index(idx);
            return tree.matrix[root as usize] * local;
        }
        tree.draw_transform[parent as usize] * tree.children_transform_at(parent) * local
    }

    fn root_bounds(&self, idx: u32) -> Rect {
        let i = idx as usize;
        let local = Rect::from_origin_size(Point::ORIGIN, self.tree.size[i]);
        self.tree.draw_transform[i].transform_rect_bbox(local)
    }
}
