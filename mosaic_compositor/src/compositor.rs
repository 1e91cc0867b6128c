// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host-facing entry point.

use std::sync::Arc;

use kurbo::Rect;
use mosaic_core::layer::LayerId;
use mosaic_core::region::Region;
use mosaic_core::scroll::ScrollState;
use mosaic_core::time::HostTime;
use mosaic_core::trace::{
    FrameEvent, PageSwapEvent, ScrollStateEvent, Tracer, TreeSwapEvent, TreeUpdateEvent,
    ZoomStateEvent,
};
use mosaic_core::zoom::{ScaleRequestState, ZoomConfig};
use mosaic_tiles::TilePage;

use crate::base_layer::BaseLayer;
use crate::manager::{TreeContent, TreeManager, TreeUpdate};
use crate::tree::Frame;
use crate::viewport::{ViewportConfig, ViewportState};

/// Composes frames for one on-screen surface.
///
/// The host calls [`draw_gl`](Self::draw_gl) once per frame and schedules
/// another frame whenever it returns `true`. The layout engine hands over
/// snapshots with [`set_base_layer`](Self::set_base_layer) or
/// [`update_with_tree`](Self::update_with_tree).
#[derive(Debug)]
pub struct Compositor<P> {
    viewport: ViewportState<P>,
    trees: TreeManager<BaseLayer>,
    frame_index: u64,
    last_now: HostTime,
    zoom_state: ScaleRequestState,
    scroll_state: ScrollState,
}

impl<P: TilePage> Compositor<P> {
    /// Creates a compositor drawing through `front` and `back`.
    pub fn new(config: ViewportConfig, zoom: ZoomConfig, front: P, back: P) -> Self {
        Self {
            viewport: ViewportState::new(config, zoom, front, back),
            trees: TreeManager::new(),
            frame_index: 0,
            last_now: HostTime(0),
            zoom_state: ScaleRequestState::NoRequest,
            scroll_state: ScrollState::NotScrolling,
        }
    }

    /// The viewport state.
    #[must_use]
    pub fn viewport(&self) -> &ViewportState<P> {
        &self.viewport
    }

    /// The viewport state, mutably.
    pub fn viewport_mut(&mut self) -> &mut ViewportState<P> {
        &mut self.viewport
    }

    /// The snapshot pipeline.
    #[must_use]
    pub fn trees(&self) -> &TreeManager<BaseLayer> {
        &self.trees
    }

    /// Number of frames composed so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Handle for paint workers; see [`TreeContent::draw_canvas`].
    #[must_use]
    pub fn content(&self) -> TreeContent<BaseLayer> {
        self.trees.content()
    }

    /// Composes one frame. Returns `true` if another frame is needed.
    pub fn draw_gl(
        &mut self,
        now: HostTime,
        view_rect: Rect,
        visible_rect: Rect,
        scale: f32,
    ) -> bool {
        self.draw_gl_traced(now, view_rect, visible_rect, scale, &mut Tracer::none())
    }

    /// [`draw_gl`](Self::draw_gl), reporting what happened to `tracer`.
    pub fn draw_gl_traced(
        &mut self,
        now: HostTime,
        view_rect: Rect,
        visible_rect: Rect,
        scale: f32,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        self.frame_index += 1;
        self.last_now = now;
        let frame = Frame {
            index: self.frame_index,
            now,
            view_rect,
            visible_rect,
            scale,
        };

        let content_size = self.trees.base_content_size();
        self.viewport
            .begin_frame(now, visible_rect, scale, content_size);
        let fast_swap = self.viewport.is_scrolling();
        let outcome = self.trees.draw_gl(&mut self.viewport, &frame, fast_swap);

        if let Some(swap) = outcome.swap {
            tracer.tree_swap(&TreeSwapEvent {
                frame_index: self.frame_index,
                now,
                drawing: swap.drawing.0,
                painting: swap.painting.map(|s| s.0),
                discarded: swap.discarded.map(|s| s.0),
            });
        }

        let zoom = self.viewport.zoom();
        if zoom.state() != self.zoom_state {
            self.zoom_state = zoom.state();
            tracing::debug!(state = ?self.zoom_state, "zoom state changed");
            tracer.zoom_state(&ZoomStateEvent {
                frame_index: self.frame_index,
                now,
                state: self.zoom_state,
                current_scale: zoom.current_scale(),
                future_scale: zoom.future_scale(),
            });
        }

        let scroll = self.viewport.scroll_state();
        if scroll != self.scroll_state {
            self.scroll_state = scroll;
            tracer.scroll_state(&ScrollStateEvent {
                frame_index: self.frame_index,
                now,
                state: scroll,
            });
        }

        if self.viewport.take_pages_swapped() {
            tracer.page_swap(&PageSwapEvent {
                frame_index: self.frame_index,
                now,
                scale: self.viewport.zoom().current_scale(),
            });
        }

        let stats = self.viewport.take_stats();
        #[cfg(feature = "trace-rich")]
        tracer.tiles_painted(&mosaic_core::trace::TilesPaintedEvent {
            frame_index: self.frame_index,
            now,
            queued: stats.queued,
            swapped: stats.swapped,
        });

        tracing::trace!(
            frame = self.frame_index,
            queued = stats.queued,
            swapped = stats.swapped,
            needs_redraw = outcome.needs_redraw,
            "frame composed"
        );
        tracer.frame(&FrameEvent {
            frame_index: self.frame_index,
            now,
            scale,
            needs_redraw: outcome.needs_redraw,
        });
        outcome.needs_redraw
    }

    /// Hands over a snapshot; see [`TreeManager::update_with_tree`].
    pub fn update_with_tree(
        &mut self,
        tree: Option<Arc<BaseLayer>>,
        brand_new: bool,
    ) -> TreeUpdate {
        self.update_with_tree_traced(tree, brand_new, &mut Tracer::none())
    }

    /// [`update_with_tree`](Self::update_with_tree), reporting to `tracer`.
    pub fn update_with_tree_traced(
        &mut self,
        tree: Option<Arc<BaseLayer>>,
        brand_new: bool,
        tracer: &mut Tracer<'_>,
    ) -> TreeUpdate {
        let update = self
            .trees
            .update_with_tree(tree, brand_new, &mut self.viewport);
        tracer.tree_update(&TreeUpdateEvent {
            frame_index: self.frame_index,
            now: self.last_now,
            snapshot: update.snapshot.map(|s| s.0),
            brand_new,
            role: update.role,
            superseded: update.superseded.map(|s| s.0),
        });
        update
    }

    /// Hands over a new base layer invalidating `inval`.
    ///
    /// `None` clears the pipeline. The first picture after a layout resets
    /// every role and repaints everything from scratch.
    pub fn set_base_layer(
        &mut self,
        layer: Option<BaseLayer>,
        inval: &Region,
        is_picture_after_first_layout: bool,
    ) -> TreeUpdate {
        if layer.is_none() || is_picture_after_first_layout {
            self.viewport.discard_textures();
        }
        let layer = layer.map(|layer| {
            layer.mark_as_dirty(inval);
            if is_picture_after_first_layout {
                layer.mark_as_dirty(&Region::Full);
            }
            Arc::new(layer)
        });
        self.update_with_tree(layer, is_picture_after_first_layout)
    }

    /// Scrolls a scrollable layer in every held snapshot.
    pub fn update_scrollable_layer(&self, layer: LayerId, x: f64, y: f64) {
        self.trees.update_scrollable_layer(layer, x, y);
    }

    /// Invalidates content directly on the tile pages, outside any snapshot
    /// hand-over.
    pub fn invalidate(&mut self, region: &Region) {
        self.viewport.invalidate_region(region);
    }

    /// Invalidates all content.
    pub fn full_inval(&mut self) {
        self.invalidate(&Region::Full);
    }

    /// Sets the scroll input flag for the following frames.
    pub fn set_is_scrolling(&mut self, scrolling: bool) {
        self.viewport.set_is_scrolling(scrolling);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    use kurbo::{Affine, Size};
    use mosaic_core::layer::{Canvas, LayerContent, LayerStore, PictureId};
    use mosaic_tiles::{
        PaintRequest, TextureGenerator, TextureId, TileBackend, TiledPage, TilesConfig,
    };
    use parking_lot::Mutex;

    use super::*;
    use crate::viewport::tests::ScriptedPage;

    const VIEW: Rect = Rect::new(0.0, 0.0, 512.0, 512.0);

    fn picture_layer(size: Size) -> BaseLayer {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        store.set_size(root, size);
        store.set_content(root, LayerContent::Picture(PictureId(1)));
        store.evaluate();
        BaseLayer::new(store.snapshot(), size)
    }

    fn scripted() -> Compositor<ScriptedPage> {
        Compositor::new(
            ViewportConfig::standard(),
            ZoomConfig::standard(),
            ScriptedPage::named("a"),
            ScriptedPage::named("b"),
        )
    }

    fn ms(millis: u64) -> HostTime {
        HostTime::from_millis(millis)
    }

    #[test]
    fn empty_compositor_is_idle() {
        let mut compositor = scripted();
        assert!(!compositor.draw_gl(ms(0), VIEW, VIEW, 1.0), "nothing to draw");
        assert_eq!(compositor.frame_index(), 1);
    }

    #[test]
    fn first_layout_resets_and_repaints_everything() {
        let mut compositor = scripted();
        let update = compositor.set_base_layer(
            Some(picture_layer(Size::new(512.0, 512.0))),
            &Region::Empty,
            true,
        );
        assert_eq!(compositor.trees().painting_id(), update.snapshot);
        assert_eq!(compositor.viewport().front().discards, 1);
        let full = compositor
            .viewport()
            .front()
            .invals
            .last()
            .map(|(rect, _)| *rect);
        assert_eq!(full, Some(VIEW), "whole content invalidated");

        compositor.set_base_layer(None, &Region::Empty, false);
        assert_eq!(compositor.trees().painting_id(), None);
        assert_eq!(compositor.viewport().front().discards, 2);
    }

    #[test]
    fn queued_layer_invalidations_reach_the_pages() {
        let mut compositor = scripted();
        compositor.set_base_layer(
            Some(picture_layer(Size::new(512.0, 512.0))),
            &Region::Empty,
            true,
        );
        let a = Rect::new(0.0, 0.0, 20.0, 20.0);
        let b = Rect::new(300.0, 300.0, 320.0, 320.0);
        compositor.set_base_layer(
            Some(picture_layer(Size::new(512.0, 512.0))),
            &Region::from_rect(a),
            false,
        );
        let update = compositor.set_base_layer(
            Some(picture_layer(Size::new(512.0, 512.0))),
            &Region::from_rect(b),
            false,
        );
        assert!(update.superseded.is_some(), "middle layer superseded");

        compositor.viewport_mut().pages_mut().front.ready = true;
        assert!(compositor.draw_gl(ms(0), VIEW, VIEW, 1.0), "queued tree pending");
        let invals: Vec<Rect> = compositor
            .viewport()
            .front()
            .invals
            .iter()
            .map(|(r, _)| *r)
            .collect();
        assert!(invals.contains(&a), "superseded inval applied");
        assert!(invals.contains(&b), "own inval applied");
    }

    #[test]
    fn scroll_release_keeps_drawing_until_swap() {
        let mut compositor = scripted();
        compositor.set_base_layer(
            Some(picture_layer(Size::new(512.0, 2048.0))),
            &Region::Empty,
            true,
        );
        compositor.viewport_mut().pages_mut().front.ready = true;
        assert!(!compositor.draw_gl(ms(0), VIEW, VIEW, 1.0), "settled");

        compositor.set_is_scrolling(true);
        compositor.viewport_mut().pages_mut().front.ready = false;
        let scrolled = VIEW + kurbo::Vec2::new(0.0, 100.0);
        assert!(compositor.draw_gl(ms(16), VIEW, scrolled, 1.0));
        assert_eq!(compositor.viewport().scroll_state(), ScrollState::Scrolling);

        compositor.set_is_scrolling(false);
        assert!(compositor.draw_gl(ms(32), VIEW, scrolled, 1.0));
        assert_eq!(
            compositor.viewport().scroll_state(),
            ScrollState::ScrollingFinishPaint
        );

        compositor.viewport_mut().pages_mut().front.ready = true;
        compositor.draw_gl(ms(48), VIEW, scrolled, 1.0);
        assert_eq!(compositor.viewport().scroll_state(), ScrollState::NotScrolling);
        assert!(!compositor.draw_gl(ms(64), VIEW, scrolled, 1.0), "settled again");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_sees_pipeline_events() {
        use mosaic_core::trace::{TraceSink, TreeRole};

        #[derive(Default)]
        struct Sink {
            updates: Vec<Option<TreeRole>>,
            swaps: Vec<u64>,
            zoom: Vec<ScaleRequestState>,
            frames: u32,
        }
        impl TraceSink for Sink {
            fn on_frame(&mut self, _: &FrameEvent) {
                self.frames += 1;
            }
            fn on_tree_update(&mut self, e: &TreeUpdateEvent) {
                self.updates.push(e.role);
            }
            fn on_tree_swap(&mut self, e: &TreeSwapEvent) {
                self.swaps.push(e.drawing);
            }
            fn on_zoom_state(&mut self, e: &ZoomStateEvent) {
                self.zoom.push(e.state);
            }
        }

        let mut sink = Sink::default();
        let mut compositor = scripted();
        compositor.viewport_mut().pages_mut().front.ready = true;
        {
            let mut tracer = Tracer::new(&mut sink);
            let layer = Arc::new(picture_layer(Size::new(512.0, 512.0)));
            compositor.update_with_tree_traced(Some(layer), false, &mut tracer);
            compositor.draw_gl_traced(ms(0), VIEW, VIEW, 1.0, &mut tracer);
            compositor.draw_gl_traced(ms(100), VIEW, VIEW, 2.0, &mut tracer);
        }
        assert_eq!(sink.updates, [Some(TreeRole::Painting)]);
        assert_eq!(sink.swaps, [1]);
        assert_eq!(sink.zoom, [ScaleRequestState::WillScheduleRequest]);
        assert_eq!(sink.frames, 2);
    }

    /// Rasterizes by painting the current snapshot, like a real backend.
    #[derive(Default)]
    struct ContentBackend {
        content: Mutex<Option<TreeContent<BaseLayer>>>,
        next: AtomicU64,
        painted_layers: AtomicU32,
        drawn: Mutex<Vec<(Rect, f32)>>,
    }

    struct LayerCounter(u32);

    impl Canvas for LayerCounter {
        fn save(&mut self) {}
        fn restore(&mut self) {}
        fn concat(&mut self, _: Affine) {}
        fn set_transform(&mut self, _: Affine) {}
        fn draw_layer(&mut self, _: LayerId, _: &LayerContent, _: Size, _: f32) {
            self.0 += 1;
        }
    }

    impl TileBackend for ContentBackend {
        fn rasterize(&self, _: &PaintRequest) -> Option<TextureId> {
            let content = self.content.lock().clone()?;
            let mut canvas = LayerCounter(0);
            if !content.draw_canvas(&mut canvas) {
                return None;
            }
            self.painted_layers.fetch_add(canvas.0, Ordering::SeqCst);
            Some(TextureId(self.next.fetch_add(1, Ordering::SeqCst) + 1))
        }

        fn draw_tile(&self, _: TextureId, rect: Rect, opacity: f32) {
            self.drawn.lock().push((rect, opacity));
        }
    }

    #[test]
    fn tiles_painted_by_workers_reach_the_screen() {
        let backend = Arc::new(ContentBackend::default());
        let generator = Arc::new(
            TextureGenerator::new(TilesConfig::standard(), backend.clone())
                .expect("workers start"),
        );
        let mut compositor = Compositor::new(
            ViewportConfig::standard(),
            ZoomConfig::standard(),
            TiledPage::new(Arc::clone(&generator)),
            TiledPage::new(Arc::clone(&generator)),
        );
        *backend.content.lock() = Some(compositor.content());

        compositor.set_base_layer(
            Some(picture_layer(Size::new(512.0, 512.0))),
            &Region::Empty,
            true,
        );
        assert!(compositor.draw_gl(ms(0), VIEW, VIEW, 1.0), "tiles queued");
        generator.wait_idle();
        assert!(
            !compositor.draw_gl(ms(16), VIEW, VIEW, 1.0),
            "painted tree promoted and settled"
        );
        assert!(compositor.trees().drawing_id().is_some(), "tree on screen");
        assert!(backend.painted_layers.load(Ordering::SeqCst) > 0);
        {
            let drawn = backend.drawn.lock();
            assert_eq!(drawn.len(), 4, "2x2 tiles drawn");
            assert!(drawn.iter().all(|(_, o)| *o == 1.0), "fully opaque");
        }

        let dirty = Rect::new(0.0, 0.0, 100.0, 100.0);
        let update = compositor.set_base_layer(
            Some(picture_layer(Size::new(512.0, 512.0))),
            &Region::from_rect(dirty),
            false,
        );
        assert_eq!(update.role, Some(mosaic_core::trace::TreeRole::Painting));
        assert!(compositor.draw_gl(ms(32), VIEW, VIEW, 1.0), "repaint pending");
        generator.wait_idle();
        assert!(!compositor.draw_gl(ms(48), VIEW, VIEW, 1.0), "repaint swapped in");
        assert_eq!(compositor.trees().drawing_id(), update.snapshot);
    }
}
