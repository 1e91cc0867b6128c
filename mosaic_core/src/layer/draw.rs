// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first drawing through the [`Canvas`] capability.

use kurbo::{Affine, Size};

use super::content::LayerContent;
use super::id::{INVALID, LayerId};
use super::tree::LayerTree;

/// A drawing target supplied by the raster library.
///
/// The canvas keeps a current transform and a save/restore stack. Layer
/// drawing only ever concatenates onto the current transform, except for
/// fixed-position layers, which replace it with their root's matrix.
pub trait Canvas {
    /// Pushes the current transform.
    fn save(&mut self);

    /// Pops the transform pushed by the matching [`save`](Self::save).
    fn restore(&mut self);

    /// Post-multiplies the current transform.
    fn concat(&mut self, transform: Affine);

    /// Replaces the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Draws a layer's own content in the current transform's space.
    fn draw_layer(&mut self, id: LayerId, content: &LayerContent, size: Size, opacity: f32);
}

impl LayerTree {
    /// Draws `id` and its subtree into `canvas`.
    ///
    /// `opacity` is the accumulated opacity of the layers above `id`. When
    /// the product with the layer's own opacity is `<= 0` the whole subtree
    /// is skipped: nothing is saved, drawn, or visited.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn draw(&self, id: LayerId, canvas: &mut dyn Canvas, opacity: f32) {
        self.validate(id);
        self.draw_at(id.idx, canvas, opacity);
    }

    fn draw_at(&self, idx: u32, canvas: &mut dyn Canvas, opacity: f32) {
        let i = idx as usize;
        let opacity = opacity * self.opacity[i];
        if opacity <= 0.0 {
            return;
        }

        canvas.save();
        if self.flags[i].inherit_from_root && self.parent[i] != INVALID {
            let root = self.root_index(idx);
            canvas.set_transform(self.matrix[root as usize]);
        }
        canvas.concat(self.local_transform_at(idx));
        canvas.draw_layer(self.handle(idx), &self.content[i], self.size[i], opacity);

        let mut child = self.first_child[i];
        if child != INVALID {
            canvas.concat(self.children_transform_at(idx));
            while child != INVALID {
                self.draw_at(child, canvas, opacity);
                child = self.next_sibling[child as usize];
            }
        }
        canvas.restore();
    }
}
