// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The three-role snapshot pipeline.
//!
//! A [`TreeManager`] holds up to three snapshots:
//!
//! - **drawing**: on screen,
//! - **painting**: being rasterized, promoted once it reports ready,
//! - **queued**: the newest snapshot, waiting for the painter to finish.
//!
//! Role assignments live behind one `parking_lot::Mutex` shared with
//! [`TreeContent`], the handle paint workers use to reach the snapshot they
//! should rasterize. The lock is held only while slots are read or
//! reassigned; every callback on [`SceneTree`] runs with it released.

use core::fmt;
use std::sync::Arc;

use kurbo::Size;
use mosaic_core::layer::{Canvas, LayerId, TexturesAmount};
use mosaic_core::trace::TreeRole;
use parking_lot::Mutex;

use crate::tree::{Frame, SceneContent, SceneTree, SnapshotId};

struct Slot<T> {
    id: SnapshotId,
    tree: Arc<T>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tree: Arc::clone(&self.tree),
        }
    }
}

struct Roles<T> {
    drawing: Option<Slot<T>>,
    painting: Option<Slot<T>>,
    queued: Option<Slot<T>>,
}

impl<T> Roles<T> {
    fn current(&self) -> Option<&Slot<T>> {
        self.painting.as_ref().or(self.drawing.as_ref())
    }
}

/// What [`TreeManager::update_with_tree`] did with a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeUpdate {
    /// Id assigned to the snapshot, `None` when the trees were cleared.
    pub snapshot: Option<SnapshotId>,
    /// Where the snapshot landed.
    pub role: Option<TreeRole>,
    /// A queued snapshot that was superseded.
    pub superseded: Option<SnapshotId>,
}

/// A promotion of the painting snapshot to drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeSwap {
    /// The snapshot now on screen.
    pub drawing: SnapshotId,
    /// The queued snapshot that started painting, if any.
    pub painting: Option<SnapshotId>,
    /// The snapshot that left the screen, if any.
    pub discarded: Option<SnapshotId>,
}

/// Result of [`TreeManager::draw_gl`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawOutcome {
    /// Another frame must be scheduled.
    pub needs_redraw: bool,
    /// Set when the painting snapshot was promoted this frame.
    pub swap: Option<TreeSwap>,
    /// Whether the newly promoted snapshot has animations.
    pub new_tree_has_animations: bool,
    /// Textures needed by the prepared snapshot.
    pub textures: TexturesAmount,
}

/// Owns the drawing, painting and queued snapshots.
pub struct TreeManager<T> {
    roles: Arc<Mutex<Roles<T>>>,
    next_id: u64,
    fast_swap: bool,
}

impl<T> fmt::Debug for TreeManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles = self.roles.lock();
        f.debug_struct("TreeManager")
            .field("drawing", &roles.drawing.as_ref().map(|s| s.id))
            .field("painting", &roles.painting.as_ref().map(|s| s.id))
            .field("queued", &roles.queued.as_ref().map(|s| s.id))
            .field("fast_swap", &self.fast_swap)
            .finish()
    }
}

impl<T> Default for TreeManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeManager<T> {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: Arc::new(Mutex::new(Roles {
                drawing: None,
                painting: None,
                queued: None,
            })),
            next_id: 1,
            fast_swap: false,
        }
    }

    /// Id of the snapshot on screen.
    #[must_use]
    pub fn drawing_id(&self) -> Option<SnapshotId> {
        self.roles.lock().drawing.as_ref().map(|s| s.id)
    }

    /// Id of the snapshot being painted.
    #[must_use]
    pub fn painting_id(&self) -> Option<SnapshotId> {
        self.roles.lock().painting.as_ref().map(|s| s.id)
    }

    /// Id of the queued snapshot.
    #[must_use]
    pub fn queued_id(&self) -> Option<SnapshotId> {
        self.roles.lock().queued.as_ref().map(|s| s.id)
    }

    /// The snapshot on screen.
    #[must_use]
    pub fn drawing(&self) -> Option<Arc<T>> {
        self.roles.lock().drawing.as_ref().map(|s| Arc::clone(&s.tree))
    }

    /// Returns `true` while fast-swap mode is active.
    #[must_use]
    pub fn is_fast_swap(&self) -> bool {
        self.fast_swap
    }

    /// Returns a handle paint workers use to reach the current snapshot.
    #[must_use]
    pub fn content(&self) -> TreeContent<T> {
        TreeContent {
            roles: Arc::clone(&self.roles),
        }
    }

    fn allocate_id(&mut self) -> SnapshotId {
        let id = SnapshotId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl<T: SceneContent> TreeManager<T> {
    /// Size of the painting snapshot's content, else the drawing snapshot's,
    /// else zero.
    #[must_use]
    pub fn base_content_size(&self) -> Size {
        self.roles
            .lock()
            .current()
            .map_or(Size::ZERO, |s| s.tree.content_size())
    }

    /// Scrolls a scrollable layer in every held snapshot.
    pub fn update_scrollable_layer(&self, layer: LayerId, x: f64, y: f64) {
        let trees: Vec<Arc<T>> = {
            let roles = self.roles.lock();
            [&roles.queued, &roles.painting, &roles.drawing]
                .into_iter()
                .flatten()
                .map(|s| Arc::clone(&s.tree))
                .collect()
        };
        for tree in trees {
            tree.update_scrollable_layer(layer, x, y);
        }
    }

    /// Drops every snapshot. The drawing and painting snapshots are told they
    /// no longer draw.
    pub fn clear<V>(&mut self, viewport: &mut V)
    where
        T: SceneTree<V>,
    {
        let (drawing, painting) = {
            let mut roles = self.roles.lock();
            roles.queued = None;
            (roles.drawing.take(), roles.painting.take())
        };
        for slot in [drawing, painting].into_iter().flatten() {
            slot.tree.set_is_drawing(viewport, false);
        }
    }

    /// Hands over a new snapshot.
    ///
    /// - `None` clears every role.
    /// - `brand_new` clears every role, then the snapshot starts painting.
    /// - Otherwise the snapshot starts painting if nothing is painting or
    ///   queued, and is queued if something is. A queued snapshot it replaces
    ///   merges its invalidations into it first.
    pub fn update_with_tree<V>(
        &mut self,
        tree: Option<Arc<T>>,
        brand_new: bool,
        viewport: &mut V,
    ) -> TreeUpdate
    where
        T: SceneTree<V>,
    {
        let Some(tree) = tree else {
            self.clear(viewport);
            tracing::debug!("trees cleared");
            return TreeUpdate {
                snapshot: None,
                role: None,
                superseded: None,
            };
        };
        let slot = Slot {
            id: self.allocate_id(),
            tree,
        };
        let mut update = TreeUpdate {
            snapshot: Some(slot.id),
            role: Some(TreeRole::Painting),
            superseded: None,
        };

        if brand_new {
            self.clear(viewport);
            self.roles.lock().painting = Some(slot.clone());
            slot.tree.set_is_painting(viewport, None);
            tracing::debug!(snapshot = slot.id.0, "brand new tree painting");
            return update;
        }

        let (busy, superseded) = {
            let roles = self.roles.lock();
            (
                roles.painting.is_some() || roles.queued.is_some(),
                roles.queued.clone(),
            )
        };
        if busy {
            if let Some(old) = superseded {
                old.tree.merge_invals_into(&slot.tree);
                update.superseded = Some(old.id);
            }
            self.roles.lock().queued = Some(slot);
            update.role = Some(TreeRole::Queued);
            tracing::debug!(
                snapshot = ?update.snapshot,
                superseded = ?update.superseded,
                "tree queued"
            );
            return update;
        }

        let drawing = {
            let mut roles = self.roles.lock();
            roles.painting = Some(slot.clone());
            roles.drawing.clone()
        };
        slot.tree
            .set_is_painting(viewport, drawing.as_ref().map(|d| &*d.tree));
        tracing::debug!(snapshot = slot.id.0, "tree painting");
        update
    }

    /// Promotes painting to drawing and queued to painting. Callers check the
    /// painting snapshot's readiness first.
    fn swap<V>(&mut self, viewport: &mut V) -> Option<TreeSwap>
    where
        T: SceneTree<V>,
    {
        let (discarded, drawing, painting) = {
            let mut roles = self.roles.lock();
            let promoted = roles.painting.take()?;
            let discarded = roles.drawing.replace(promoted.clone());
            roles.painting = roles.queued.take();
            (discarded, promoted, roles.painting.clone())
        };

        if let Some(old) = &discarded {
            old.tree.set_is_drawing(viewport, false);
        }
        drawing.tree.set_is_drawing(viewport, true);
        if let Some(next) = &painting {
            next.tree.set_is_painting(viewport, Some(&*drawing.tree));
        }

        let swap = TreeSwap {
            drawing: drawing.id,
            painting: painting.map(|s| s.id),
            discarded: discarded.map(|s| s.id),
        };
        tracing::debug!(?swap, "trees swapped");
        Some(swap)
    }

    /// Composes one frame.
    ///
    /// The painting snapshot (or the drawing one, when nothing paints) is
    /// prepared, and promoted if it now reports ready. The drawing snapshot
    /// then swaps tiles and draws. Another frame is requested while a
    /// snapshot is still painting, while the drawing snapshot is not ready,
    /// or when prepare, animations or draw ask for one.
    ///
    /// `enter_fast_swap` lets the drawing snapshot swap tiles every frame
    /// until it is fully ready; it is set while the user scrolls.
    pub fn draw_gl<V>(
        &mut self,
        viewport: &mut V,
        frame: &Frame,
        enter_fast_swap: bool,
    ) -> DrawOutcome
    where
        T: SceneTree<V>,
    {
        self.fast_swap |= enter_fast_swap;
        let mut outcome = DrawOutcome::default();
        let mut ret = false;

        let (painting, drawing) = {
            let roles = self.roles.lock();
            (roles.painting.clone(), roles.drawing.clone())
        };

        if let Some(painting) = painting {
            ret |= painting.tree.evaluate_animations(frame.now);
            ret |= painting.tree.prepare(viewport, frame);
            outcome.textures = painting.tree.textures_amount();
            if painting.tree.is_ready(viewport, frame) {
                outcome.swap = self.swap(viewport);
                outcome.new_tree_has_animations = painting.tree.has_animations();
            }
        } else if let Some(drawing) = &drawing {
            ret |= drawing.tree.prepare(viewport, frame);
            outcome.textures = drawing.tree.textures_amount();
        }

        let (drawing, still_painting) = {
            let roles = self.roles.lock();
            (roles.drawing.clone(), roles.painting.is_some())
        };

        if let Some(drawing) = drawing {
            let swapped = outcome.swap.is_some();
            let drawing_ready = swapped || drawing.tree.is_ready(viewport, frame);

            if swapped || self.fast_swap || (drawing_ready && !still_painting) {
                drawing.tree.swap_tiles(viewport, frame);
            }

            if drawing_ready {
                self.fast_swap = false;
            } else {
                ret = true;
            }

            ret |= drawing.tree.evaluate_animations(frame.now);
            ret |= drawing.tree.draw(viewport, frame);
        }

        outcome.needs_redraw = ret || still_painting;
        outcome
    }
}

/// Shared read access to the snapshot paint workers should rasterize.
pub struct TreeContent<T> {
    roles: Arc<Mutex<Roles<T>>>,
}

impl<T> Clone for TreeContent<T> {
    fn clone(&self) -> Self {
        Self {
            roles: Arc::clone(&self.roles),
        }
    }
}

impl<T> fmt::Debug for TreeContent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeContent").finish_non_exhaustive()
    }
}

impl<T: SceneContent> TreeContent<T> {
    /// The painting snapshot, or the drawing snapshot when nothing paints.
    #[must_use]
    pub fn current(&self) -> Option<Arc<T>> {
        self.roles.lock().current().map(|s| Arc::clone(&s.tree))
    }

    /// Paints the current snapshot into `canvas`. Returns `false` when there
    /// is no snapshot.
    ///
    /// The role lock is released before painting starts.
    pub fn draw_canvas(&self, canvas: &mut dyn Canvas) -> bool {
        let Some(tree) = self.current() else {
            return false;
        };
        tree.paint(canvas);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use kurbo::{Affine, Rect};
    use mosaic_core::layer::{LayerContent, LayerStore};
    use mosaic_core::time::HostTime;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Signal {
        Drawing(u32, bool),
        Painting(u32, Option<u32>),
    }

    #[derive(Default)]
    struct Log {
        signals: Vec<Signal>,
    }

    struct TestTree {
        name: u32,
        ready: AtomicBool,
        ready_checks: AtomicU32,
        tile_swaps: AtomicU32,
        scrolled: AtomicU32,
        invals: Mutex<Vec<Rect>>,
        /// Looked up from `merge_invals_into`, as a paint worker would.
        content: Mutex<Option<TreeContent<TestTree>>>,
        merged_while_painting: Mutex<Option<u32>>,
    }

    impl TestTree {
        fn new(name: u32) -> Arc<Self> {
            Arc::new(Self {
                name,
                ready: AtomicBool::new(false),
                ready_checks: AtomicU32::new(0),
                tile_swaps: AtomicU32::new(0),
                scrolled: AtomicU32::new(0),
                invals: Mutex::new(Vec::new()),
                content: Mutex::new(None),
                merged_while_painting: Mutex::new(None),
            })
        }

        fn with_inval(name: u32, rect: Rect) -> Arc<Self> {
            let tree = Self::new(name);
            tree.invals.lock().push(rect);
            tree
        }

        fn set_ready(&self) {
            self.ready.store(true, Ordering::SeqCst);
        }
    }

    impl SceneContent for TestTree {
        fn content_size(&self) -> Size {
            Size::new(f64::from(self.name) * 100.0, 50.0)
        }

        fn paint(&self, canvas: &mut dyn Canvas) {
            canvas.draw_layer(
                some_layer(),
                &LayerContent::Group,
                self.content_size(),
                1.0,
            );
        }

        fn update_scrollable_layer(&self, _: LayerId, _: f64, _: f64) {
            self.scrolled.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl SceneTree<Log> for TestTree {
        fn prepare(&self, _: &mut Log, _: &Frame) -> bool {
            false
        }

        fn is_ready(&self, _: &Log, _: &Frame) -> bool {
            self.ready_checks.fetch_add(1, Ordering::SeqCst);
            self.ready.load(Ordering::SeqCst)
        }

        fn swap_tiles(&self, _: &mut Log, _: &Frame) {
            self.tile_swaps.fetch_add(1, Ordering::SeqCst);
        }

        fn draw(&self, _: &mut Log, _: &Frame) -> bool {
            false
        }

        fn set_is_drawing(&self, log: &mut Log, drawing: bool) {
            log.signals.push(Signal::Drawing(self.name, drawing));
        }

        fn set_is_painting(&self, log: &mut Log, drawing: Option<&Self>) {
            log.signals
                .push(Signal::Painting(self.name, drawing.map(|d| d.name)));
        }

        fn merge_invals_into(&self, replacement: &Self) {
            let mine = self.invals.lock().clone();
            replacement.invals.lock().extend(mine);
            if let Some(content) = self.content.lock().as_ref() {
                *self.merged_while_painting.lock() = content.current().map(|t| t.name);
            }
        }
    }

    fn some_layer() -> LayerId {
        LayerStore::new().create_layer()
    }

    fn frame(index: u64) -> Frame {
        Frame {
            index,
            now: HostTime::from_millis(16 * index),
            view_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            visible_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            scale: 1.0,
        }
    }

    #[test]
    fn ready_brand_new_tree_settles_after_one_frame() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let tree = TestTree::new(1);
        tree.set_ready();

        let update = manager.update_with_tree(Some(Arc::clone(&tree)), true, &mut log);
        assert_eq!(update.role, Some(TreeRole::Painting));
        assert_eq!(log.signals, [Signal::Painting(1, None)]);

        let outcome = manager.draw_gl(&mut log, &frame(1), false);
        assert!(outcome.swap.is_some(), "ready tree is promoted");
        assert!(!outcome.needs_redraw, "nothing left to do");
        assert_eq!(manager.drawing_id(), update.snapshot);
        assert_eq!(manager.painting_id(), None);
        assert_eq!(tree.tile_swaps.load(Ordering::SeqCst), 1);

        let outcome = manager.draw_gl(&mut log, &frame(2), false);
        assert!(!outcome.needs_redraw, "idle frame stays idle");
        assert!(outcome.swap.is_none(), "no second swap");
    }

    #[test]
    fn never_ready_trees_keep_requesting_frames() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        manager.update_with_tree(Some(TestTree::new(1)), false, &mut log);
        manager.update_with_tree(Some(TestTree::new(2)), false, &mut log);

        for i in 0..5 {
            let outcome = manager.draw_gl(&mut log, &frame(i), false);
            assert!(outcome.needs_redraw, "frame {i} must redraw");
            assert!(outcome.swap.is_none(), "nothing was ready");
        }
    }

    #[test]
    fn superseded_queued_tree_forwards_invalidations() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(50.0, 50.0, 60.0, 60.0);
        let c = Rect::new(90.0, 0.0, 95.0, 5.0);

        let t1 = TestTree::new(1);
        manager.update_with_tree(Some(Arc::clone(&t1)), false, &mut log);
        let t2 = TestTree::with_inval(2, a);
        let u2 = manager.update_with_tree(Some(t2), false, &mut log);
        assert_eq!(u2.role, Some(TreeRole::Queued));
        let t3 = TestTree::with_inval(3, b);
        let u3 = manager.update_with_tree(Some(Arc::clone(&t3)), false, &mut log);
        assert_eq!(u3.superseded, u2.snapshot);
        let t4 = TestTree::with_inval(4, c);
        manager.update_with_tree(Some(Arc::clone(&t4)), false, &mut log);

        let invals = t4.invals.lock().clone();
        assert!(invals.contains(&a), "first superseded tree's inval survives");
        assert!(invals.contains(&b), "second superseded tree's inval survives");
        assert!(invals.contains(&c), "own inval kept");

        t1.set_ready();
        let outcome = manager.draw_gl(&mut log, &frame(1), false);
        let swap = outcome.swap.expect("t1 promoted");
        assert_eq!(swap.painting, manager.painting_id());
        assert_eq!(manager.queued_id(), None);
        assert_eq!(
            log.signals.last(),
            Some(&Signal::Painting(4, Some(1))),
            "queued tree starts painting against the new drawing tree"
        );
    }

    #[test]
    fn merge_runs_without_the_role_lock() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        manager.update_with_tree(Some(TestTree::new(1)), false, &mut log);
        let queued = TestTree::new(2);
        *queued.content.lock() = Some(manager.content());
        manager.update_with_tree(Some(Arc::clone(&queued)), false, &mut log);

        let update = manager.update_with_tree(Some(TestTree::new(3)), false, &mut log);
        assert_eq!(update.role, Some(TreeRole::Queued), "replacement queued");
        assert_eq!(
            *queued.merged_while_painting.lock(),
            Some(1),
            "the merge could read the painting tree"
        );
        assert_eq!(manager.queued_id(), update.snapshot, "replacement installed");
        queued.content.lock().take();
    }

    #[test]
    fn only_one_tree_paints_at_a_time() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let first = manager.update_with_tree(Some(TestTree::new(1)), false, &mut log);
        for name in 2..6 {
            manager.update_with_tree(Some(TestTree::new(name)), false, &mut log);
            assert_eq!(manager.painting_id(), first.snapshot, "painter unchanged");
        }
        let painting_signals = log
            .signals
            .iter()
            .filter(|s| matches!(s, Signal::Painting(..)))
            .count();
        assert_eq!(painting_signals, 1, "a single tree started painting");
    }

    #[test]
    fn swap_waits_for_observed_readiness() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let tree = TestTree::new(1);
        manager.update_with_tree(Some(Arc::clone(&tree)), false, &mut log);

        for i in 0..3 {
            let outcome = manager.draw_gl(&mut log, &frame(i), false);
            assert!(outcome.swap.is_none(), "not ready in frame {i}");
            assert_eq!(manager.drawing_id(), None);
        }
        assert_eq!(tree.ready_checks.load(Ordering::SeqCst), 3);

        tree.set_ready();
        let outcome = manager.draw_gl(&mut log, &frame(3), false);
        assert!(outcome.swap.is_some(), "promoted once ready");
        assert_eq!(tree.ready_checks.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn swap_signals_roles_in_order() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let t1 = TestTree::new(1);
        t1.set_ready();
        manager.update_with_tree(Some(t1), false, &mut log);
        manager.draw_gl(&mut log, &frame(1), false);

        let t2 = TestTree::new(2);
        t2.set_ready();
        manager.update_with_tree(Some(t2), false, &mut log);
        let outcome = manager.draw_gl(&mut log, &frame(2), false);
        let swap = outcome.swap.expect("t2 promoted");
        assert!(swap.discarded.is_some(), "t1 left the screen");

        assert_eq!(
            log.signals,
            [
                Signal::Painting(1, None),
                Signal::Drawing(1, true),
                Signal::Painting(2, Some(1)),
                Signal::Drawing(1, false),
                Signal::Drawing(2, true),
            ]
        );
    }

    #[test]
    fn fast_swap_swaps_unready_drawing_tiles() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let t1 = TestTree::new(1);
        t1.set_ready();
        manager.update_with_tree(Some(Arc::clone(&t1)), false, &mut log);
        manager.draw_gl(&mut log, &frame(1), false);
        assert_eq!(t1.tile_swaps.load(Ordering::SeqCst), 1);

        manager.update_with_tree(Some(TestTree::new(2)), false, &mut log);
        manager.draw_gl(&mut log, &frame(2), false);
        assert_eq!(
            t1.tile_swaps.load(Ordering::SeqCst),
            1,
            "no tile swaps on screen while another tree paints"
        );

        manager.draw_gl(&mut log, &frame(3), true);
        assert_eq!(t1.tile_swaps.load(Ordering::SeqCst), 2, "fast swap forces it");
        assert!(!manager.is_fast_swap(), "ready drawing tree leaves fast swap");
    }

    #[test]
    fn brand_new_clears_every_role() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let t1 = TestTree::new(1);
        t1.set_ready();
        manager.update_with_tree(Some(t1), false, &mut log);
        manager.draw_gl(&mut log, &frame(1), false);
        manager.update_with_tree(Some(TestTree::new(2)), false, &mut log);
        manager.update_with_tree(Some(TestTree::new(3)), false, &mut log);

        log.signals.clear();
        let update = manager.update_with_tree(Some(TestTree::new(4)), true, &mut log);
        assert_eq!(manager.drawing_id(), None);
        assert_eq!(manager.queued_id(), None);
        assert_eq!(manager.painting_id(), update.snapshot);
        assert_eq!(
            log.signals,
            [
                Signal::Drawing(1, false),
                Signal::Drawing(2, false),
                Signal::Painting(4, None),
            ]
        );

        let cleared = manager.update_with_tree(None, false, &mut log);
        assert_eq!(cleared.snapshot, None);
        assert_eq!(manager.painting_id(), None);
    }

    #[test]
    fn scroll_updates_reach_every_role() {
        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let t1 = TestTree::new(1);
        t1.set_ready();
        let t2 = TestTree::new(2);
        let t3 = TestTree::new(3);
        manager.update_with_tree(Some(Arc::clone(&t1)), false, &mut log);
        manager.draw_gl(&mut log, &frame(1), false);
        manager.update_with_tree(Some(Arc::clone(&t2)), false, &mut log);
        manager.update_with_tree(Some(Arc::clone(&t3)), false, &mut log);

        manager.update_scrollable_layer(some_layer(), 0.0, 10.0);
        for tree in [&t1, &t2, &t3] {
            assert_eq!(tree.scrolled.load(Ordering::SeqCst), 1, "tree {}", tree.name);
        }
    }

    #[test]
    fn workers_paint_the_painting_tree_first() {
        struct Sizes(Vec<Size>);
        impl Canvas for Sizes {
            fn save(&mut self) {}
            fn restore(&mut self) {}
            fn concat(&mut self, _: Affine) {}
            fn set_transform(&mut self, _: Affine) {}
            fn draw_layer(&mut self, _: LayerId, _: &LayerContent, size: Size, _: f32) {
                self.0.push(size);
            }
        }

        let mut manager = TreeManager::new();
        let mut log = Log::default();
        let content = manager.content();
        let mut canvas = Sizes(Vec::new());
        assert!(!content.draw_canvas(&mut canvas), "nothing to paint yet");

        let t1 = TestTree::new(1);
        t1.set_ready();
        manager.update_with_tree(Some(t1), false, &mut log);
        manager.draw_gl(&mut log, &frame(1), false);
        assert!(content.draw_canvas(&mut canvas), "drawing tree painted");

        manager.update_with_tree(Some(TestTree::new(2)), false, &mut log);
        assert!(content.draw_canvas(&mut canvas), "painting tree painted");
        assert_eq!(
            canvas.0,
            [Size::new(100.0, 50.0), Size::new(200.0, 50.0)]
        );
        assert_eq!(manager.base_content_size(), Size::new(200.0, 50.0));
    }
}
