// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root snapshot type: base content drawn through tile pages, with
//! composited layers on top.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kurbo::Size;
use mosaic_core::layer::{Canvas, LayerContent, LayerId, LayerTree, TexturesAmount};
use mosaic_core::region::Region;
use mosaic_core::scroll::SwapPolicy;
use mosaic_core::time::HostTime;
use mosaic_tiles::{Expansion, TilePage};
use parking_lot::{Mutex, RwLock};

use crate::tree::{CompositedLayers, Frame, SceneContent, SceneTree};
use crate::viewport::ViewportState;

/// One snapshot of the page: a frozen [`LayerTree`] for the base content,
/// optional composited layers, and the invalidations it carries until it
/// starts painting.
pub struct BaseLayer {
    tree: RwLock<Arc<LayerTree>>,
    content_size: Size,
    composited: Option<Arc<dyn CompositedLayers>>,
    inval: Mutex<Region>,
    drawing: AtomicBool,
}

impl fmt::Debug for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseLayer")
            .field("content_size", &self.content_size)
            .field("composited", &self.composited.is_some())
            .field("inval", &*self.inval.lock())
            .field("drawing", &self.drawing.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl BaseLayer {
    /// Creates a snapshot of `tree` whose base content is `content_size`.
    #[must_use]
    pub fn new(tree: LayerTree, content_size: Size) -> Self {
        Self {
            tree: RwLock::new(Arc::new(tree)),
            content_size,
            composited: None,
            inval: Mutex::new(Region::Empty),
            drawing: AtomicBool::new(false),
        }
    }

    /// Attaches composited layers drawn over the base content.
    #[must_use]
    pub fn with_composited(mut self, layers: Arc<dyn CompositedLayers>) -> Self {
        self.composited = Some(layers);
        self
    }

    /// Adds to the region this snapshot invalidates when it starts painting.
    pub fn mark_as_dirty(&self, region: &Region) {
        self.inval.lock().merge(region);
    }

    /// The region this snapshot will invalidate.
    #[must_use]
    pub fn inval_region(&self) -> Region {
        self.inval.lock().clone()
    }

    /// The layer tree, as last scrolled.
    #[must_use]
    pub fn tree(&self) -> Arc<LayerTree> {
        Arc::clone(&self.tree.read())
    }

    /// Returns `true` while this snapshot is on screen.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.drawing.load(Ordering::Acquire)
    }
}

impl SceneContent for BaseLayer {
    fn content_size(&self) -> Size {
        self.content_size
    }

    fn paint(&self, canvas: &mut dyn Canvas) {
        let tree = self.tree();
        for root in tree.roots() {
            tree.draw(root, canvas, 1.0);
        }
    }

    /// Scrolls copy-on-write: workers still painting from the previous tree
    /// keep their copy.
    fn update_scrollable_layer(&self, layer: LayerId, x: f64, y: f64) {
        let mut tree = self.tree.write();
        if !tree.is_alive(layer) {
            return;
        }
        if !matches!(tree.content(layer), LayerContent::Scrollable { .. }) {
            return;
        }
        Arc::make_mut(&mut *tree).scroll_to(layer, x, y);
    }
}

impl<P: TilePage> SceneTree<ViewportState<P>> for BaseLayer {
    fn evaluate_animations(&self, now: HostTime) -> bool {
        self.composited
            .as_ref()
            .is_some_and(|c| c.evaluate_animations(now))
    }

    fn has_animations(&self) -> bool {
        self.composited.as_ref().is_some_and(|c| c.has_animations())
    }

    fn textures_amount(&self) -> TexturesAmount {
        let tree = self.tree();
        let mut amount = TexturesAmount::default();
        for root in tree.roots() {
            amount.add(&tree.textures_amount(root));
        }
        if let Some(composited) = &self.composited {
            amount.add(&composited.textures_amount());
        }
        amount
    }

    fn prepare(&self, vs: &mut ViewportState<P>, frame: &Frame) -> bool {
        let scrolling = vs.is_scrolling();
        let direction = vs.direction();
        let expansion = vs.expansion();
        let bounds = vs.viewport_bounds();
        let prefetch_scale = vs.zoom().current_scale() * vs.config().prefetch_scale_modifier;
        let prefetch_bounds = vs.prefetch_bounds(prefetch_scale);

        let pages = vs.pages_mut();
        let current = pages.zoom.current_scale();
        let prepare_next = pages.zoom.need_prepare_next_page();

        pages.front.set_scale(current);
        pages.front.set_scrolling(scrolling);
        pages.back.set_scrolling(scrolling);

        if prepare_next {
            pages.back.set_prefetch(false);
            pages.back.set_scale(frame.scale);
            pages.zoom.set_future_viewport(bounds);
            pages.back.update_tile_dirtiness(bounds);
            pages.back.prepare(direction, bounds, Expansion::Visible);
            pages.front.cancel_pending_paints();
        } else {
            pages.back.set_prefetch(true);
            pages.back.set_scale(prefetch_scale);
            pages.back.update_tile_dirtiness(prefetch_bounds);
            pages.back.prepare(direction, prefetch_bounds, Expansion::Visible);
        }

        if pages.zoom.did_fire_request() {
            let future = pages.zoom.future_scale();
            if pages
                .back
                .swap_buffers_if_ready(bounds, future, SwapPolicy::WholePage)
            {
                pages.zoom.set_received_request();
                tracing::debug!(scale = future, "zoom page received");
            }
        }

        let pre_zoom = pages.zoom.pre_zoom_bounds();
        pages.front.update_tile_dirtiness(pre_zoom);
        if !prepare_next || pages.front.is_ready(pre_zoom, current) {
            pages.front.prepare(direction, pre_zoom, expansion);
        }
        false
    }

    fn is_ready(&self, vs: &ViewportState<P>, _: &Frame) -> bool {
        let zoom = vs.zoom();
        !zoom.is_zooming()
            && vs.front().is_ready(zoom.pre_zoom_bounds(), zoom.current_scale())
            && self.composited.as_ref().is_none_or(|c| c.is_ready())
    }

    fn swap_tiles(&self, vs: &mut ViewportState<P>, _: &Frame) {
        if vs.zoom().is_zooming() {
            return;
        }
        let policy = vs.scroll_state().swap_policy();
        let prefetch_bounds = vs.prefetch_bounds(vs.back().scale());
        let pages = vs.pages_mut();
        let pre_zoom = pages.zoom.pre_zoom_bounds();
        let current = pages.zoom.current_scale();
        let finished = pages.front.swap_buffers_if_ready(pre_zoom, current, policy);
        if pages.back.is_prefetch() {
            let scale = pages.back.scale();
            pages
                .back
                .swap_buffers_if_ready(prefetch_bounds, scale, SwapPolicy::WhateverIsReady);
        }
        vs.finish_swap(finished);
    }

    fn draw(&self, vs: &mut ViewportState<P>, frame: &Frame) -> bool {
        let scroll_active = vs.scroll_state().is_active();
        let prefetch_bounds = vs.prefetch_bounds(vs.back().scale());
        let pages = vs.pages_mut();
        let pre_zoom = pages.zoom.pre_zoom_bounds();
        let current = pages.zoom.current_scale();

        let mut front_opacity = 1.0;
        let mut do_swap = false;
        if pages.zoom.did_receive_request() {
            let transition = pages.zoom.process_transition(frame.now, frame.scale);
            let future_viewport = pages.zoom.future_viewport();
            pages.back.draw(transition.back_opacity, future_viewport);
            front_opacity = transition.front_opacity;
            do_swap = transition.do_swap;
        } else if pages.back.is_prefetch() && pages.front.has_missing_content(pre_zoom) {
            pages.back.draw(1.0, prefetch_bounds);
        }
        pages.front.draw(front_opacity, pre_zoom);

        let mut needs_redraw =
            pages.zoom.is_zooming() || scroll_active || !pages.front.is_ready(pre_zoom, current);

        if do_swap {
            pages.zoom.set_current_scale(frame.scale);
            vs.swap_pages();
        }

        if let Some(composited) = &self.composited {
            needs_redraw |= composited.draw(frame, vs.zoom().layers_scale());
        }
        needs_redraw
    }

    fn set_is_drawing(&self, _: &mut ViewportState<P>, drawing: bool) {
        self.drawing.store(drawing, Ordering::Release);
    }

    fn set_is_painting(&self, vs: &mut ViewportState<P>, _: Option<&Self>) {
        let region = self.inval.lock().take();
        let previous = vs.content_size();
        vs.set_content_size(Size::new(
            self.content_size.width.max(previous.width),
            self.content_size.height.max(previous.height),
        ));
        vs.invalidate_region(&region);
        vs.set_content_size(self.content_size);
    }

    fn merge_invals_into(&self, replacement: &Self) {
        let mine = self.inval.lock().clone();
        replacement.inval.lock().merge(&mine);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Affine, Rect};
    use mosaic_core::geometry::TileBounds;
    use mosaic_core::layer::{LayerStore, PictureId};
    use mosaic_core::scroll::ScrollState;
    use mosaic_core::zoom::ScaleRequestState;

    use super::*;
    use crate::viewport::tests::{ScriptedPage, scripted_viewport};

    fn frame(index: u64, millis: u64, scale: f32) -> Frame {
        Frame {
            index,
            now: HostTime::from_millis(millis),
            view_rect: Rect::new(0.0, 0.0, 512.0, 512.0),
            visible_rect: Rect::new(0.0, 0.0, 512.0, 512.0),
            scale,
        }
    }

    fn base_layer() -> (BaseLayer, LayerId) {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        store.set_size(root, Size::new(1000.0, 4000.0));
        let scroller = store.create_layer();
        store.set_size(scroller, Size::new(200.0, 200.0));
        store.set_content(
            scroller,
            LayerContent::Scrollable {
                content_size: Size::new(200.0, 800.0),
            },
        );
        store.add_child(root, scroller);
        let picture = store.create_layer();
        store.set_content(picture, LayerContent::Picture(PictureId(3)));
        store.set_size(picture, Size::new(200.0, 800.0));
        store.add_child(scroller, picture);
        store.evaluate();
        (
            BaseLayer::new(store.snapshot(), Size::new(1000.0, 4000.0)),
            scroller,
        )
    }

    fn run_frame(layer: &BaseLayer, vs: &mut ViewportState<ScriptedPage>, f: &Frame) -> bool {
        vs.begin_frame(f.now, f.visible_rect, f.scale, layer.content_size());
        let mut redraw = SceneTree::prepare(layer, vs, f);
        if SceneTree::is_ready(layer, vs, f) {
            SceneTree::swap_tiles(layer, vs, f);
        }
        redraw |= SceneTree::draw(layer, vs, f);
        redraw
    }

    #[test]
    fn painting_applies_pending_invalidations() {
        let (layer, _) = base_layer();
        let mut vs = scripted_viewport();
        layer.mark_as_dirty(&Region::from_rect(Rect::new(0.0, 0.0, 50.0, 50.0)));
        layer.mark_as_dirty(&Region::from_rect(Rect::new(100.0, 0.0, 150.0, 50.0)));

        SceneTree::set_is_painting(&layer, &mut vs, None);
        assert!(layer.inval_region().is_empty(), "invals consumed");
        assert_eq!(vs.front().invals.len(), 2);
        assert_eq!(vs.picture_generation(), 1);
        assert_eq!(vs.content_size(), Size::new(1000.0, 4000.0));
    }

    #[test]
    fn superseded_layer_merges_invalidations() {
        let (old, _) = base_layer();
        let (new, _) = base_layer();
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        old.mark_as_dirty(&Region::from_rect(a));
        new.mark_as_dirty(&Region::from_rect(b));
        SceneTree::<ViewportState<ScriptedPage>>::merge_invals_into(&old, &new);
        assert_eq!(new.inval_region().rects(), &[b, a]);

        old.mark_as_dirty(&Region::Full);
        SceneTree::<ViewportState<ScriptedPage>>::merge_invals_into(&old, &new);
        assert!(new.inval_region().is_full(), "full inval wins");
    }

    #[test]
    fn idle_frame_prefetches_the_back_page() {
        let (layer, _) = base_layer();
        let mut vs = scripted_viewport();
        let f = frame(1, 0, 1.0);
        run_frame(&layer, &mut vs, &f);

        assert!(vs.back().prefetch, "back page prefetches");
        assert!((vs.back().scale - 0.3).abs() < 1e-6, "prefetch at reduced scale");
        assert_eq!(vs.back().prepares.len(), 1, "one back prepare per frame");
        assert_eq!(
            vs.front().prepares,
            [(TileBounds::new(0, 0, 2, 2), Expansion::Expanded { x: 1, y: 1 })]
        );
    }

    #[test]
    fn unready_front_requests_redraw() {
        let (layer, _) = base_layer();
        let mut vs = scripted_viewport();
        assert!(run_frame(&layer, &mut vs, &frame(1, 0, 1.0)), "tiles missing");

        vs.pages_mut().front.ready = true;
        assert!(!run_frame(&layer, &mut vs, &frame(2, 16, 1.0)), "settled");
        assert_eq!(vs.front().swaps, [SwapPolicy::WholePage]);
    }

    #[test]
    fn prefetch_page_fills_missing_content() {
        let (layer, _) = base_layer();
        let mut vs = scripted_viewport();
        vs.pages_mut().front.missing_content = true;
        run_frame(&layer, &mut vs, &frame(1, 0, 1.0));
        assert_eq!(vs.back().draws.len(), 1, "prefetch drawn under the front");
        assert_eq!(vs.front().draws.len(), 1);
    }

    #[test]
    fn scroll_gesture_waits_for_a_whole_page_swap() {
        let (layer, _) = base_layer();
        let mut vs = scripted_viewport();
        vs.set_is_scrolling(true);
        assert!(run_frame(&layer, &mut vs, &frame(1, 0, 1.0)), "scrolling redraws");
        assert_eq!(vs.scroll_state(), ScrollState::Scrolling);
        assert_eq!(vs.front().swaps.last(), Some(&SwapPolicy::WhateverIsReady));

        vs.set_is_scrolling(false);
        for i in 2..5 {
            assert!(run_frame(&layer, &mut vs, &frame(i, i * 16, 1.0)), "waiting");
            assert_eq!(vs.scroll_state(), ScrollState::ScrollingFinishPaint);
        }

        vs.pages_mut().front.ready = true;
        run_frame(&layer, &mut vs, &frame(5, 80, 1.0));
        assert_eq!(vs.scroll_state(), ScrollState::NotScrolling);
        assert_eq!(vs.front().swaps.last(), Some(&SwapPolicy::WholePage));
        assert!(!run_frame(&layer, &mut vs, &frame(6, 96, 1.0)), "gesture over");
    }

    #[test]
    fn zoom_fades_to_the_new_page_and_swaps() {
        let (layer, _) = base_layer();
        let mut vs = scripted_viewport();
        vs.pages_mut().front.ready = true;
        assert!(!run_frame(&layer, &mut vs, &frame(1, 0, 1.0)), "idle at 1.0");

        // Pinch to 2.0: request armed, fires after the initial delay.
        assert!(run_frame(&layer, &mut vs, &frame(2, 100, 2.0)), "zooming");
        assert_eq!(vs.zoom().state(), ScaleRequestState::WillScheduleRequest);
        assert!(!vs.back().prefetch, "back page serves the zoom");
        assert_eq!(vs.back().scale, 2.0);

        run_frame(&layer, &mut vs, &frame(3, 400, 2.0));
        assert_eq!(vs.zoom().state(), ScaleRequestState::RequestNewScale);
        assert!(vs.front().cancels > 0, "front paints cancelled");

        vs.pages_mut().back.ready = true;
        run_frame(&layer, &mut vs, &frame(4, 420, 2.0));
        assert_eq!(vs.zoom().state(), ScaleRequestState::ReceivedNewScale);
        assert!(!vs.back().draws.is_empty(), "new page drawn");

        run_frame(&layer, &mut vs, &frame(5, 470, 2.0));
        let (fade, _) = *vs.front().draws.last().expect("front drawn");
        assert!(
            (fade - 0.5).abs() < 1e-3,
            "front half faded out while zooming in, got {fade}"
        );

        assert!(run_frame(&layer, &mut vs, &frame(6, 600, 2.0)), "last fade frame");
        assert_eq!(vs.zoom().state(), ScaleRequestState::NoRequest);
        assert_eq!(vs.zoom().current_scale(), 2.0);
        assert_eq!(vs.front().scale, 2.0, "new page is in front");
        assert!(vs.take_pages_swapped(), "pages swapped");
        assert_eq!(vs.back().discards, 1, "old page released");

        assert!(!run_frame(&layer, &mut vs, &frame(7, 616, 2.0)), "settled at 2.0");
    }

    #[test]
    fn zooming_blocks_readiness() {
        let (layer, _) = base_layer();
        let mut vs = scripted_viewport();
        vs.pages_mut().front.ready = true;
        run_frame(&layer, &mut vs, &frame(1, 0, 1.0));
        let f = frame(2, 100, 1.5);
        vs.begin_frame(f.now, f.visible_rect, f.scale, layer.content_size());
        assert!(!SceneTree::is_ready(&layer, &vs, &f), "not ready mid-zoom");
    }

    #[test]
    fn scrolling_a_layer_copies_the_tree() {
        let (layer, scroller) = base_layer();
        let before = layer.tree();
        layer.update_scrollable_layer(scroller, 0.0, 300.0);
        let after = layer.tree();
        assert_eq!(before.scroll_offset(scroller).y, 0.0, "old copy untouched");
        assert_eq!(after.scroll_offset(scroller).y, 300.0);

        let root = after.roots()[0];
        layer.update_scrollable_layer(root, 0.0, 50.0);
        assert_eq!(
            layer.tree().scroll_offset(root).y,
            0.0,
            "non-scrollable layers ignore scrolls"
        );
    }

    #[test]
    fn paint_draws_every_root() {
        struct Count(u32, Vec<Affine>);
        impl Canvas for Count {
            fn save(&mut self) {}
            fn restore(&mut self) {}
            fn concat(&mut self, t: Affine) {
                self.1.push(t);
            }
            fn set_transform(&mut self, _: Affine) {}
            fn draw_layer(&mut self, _: LayerId, _: &LayerContent, _: Size, _: f32) {
                self.0 += 1;
            }
        }
        let (layer, _) = base_layer();
        let mut canvas = Count(0, Vec::new());
        layer.paint(&mut canvas);
        assert_eq!(canvas.0, 3, "root, scroller and picture");
        let amount = SceneTree::<ViewportState<ScriptedPage>>::textures_amount(&layer);
        assert_eq!(amount.scrollable, 1);
    }
}
