// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scale-transition state machine.
//!
//! During a pinch gesture the host passes a new scale every frame. Asking
//! the rasterizer for a new tile page on every change would waste all of its
//! work, so [`ZoomManager`] debounces: a request is only fired once the scale
//! has held still for a while.
//!
//! ```text
//!   NoRequest ──► WillScheduleRequest ──► RequestNewScale ──► ReceivedNewScale
//!       ▲                (timer)            (back page ready)        │
//!       └──────────────────────── swap_pages() ──────────────────────┘
//! ```
//!
//! Once the back page has been painted at the new scale the two pages
//! cross-fade for a short, asymmetric transition (zoom-out fades are twice as
//! long as zoom-in fades) before the pages swap roles.
//!
//! The displayed scale ([`current_scale`](ZoomManager::current_scale)) only
//! flips at the end of the transition, through
//! [`set_current_scale`](ZoomManager::set_current_scale). Until then only the
//! [`layers_scale`](ZoomManager::layers_scale) moves.

use crate::geometry::TileBounds;
use crate::time::{Duration, HostTime};

/// Timing constants for zoom debouncing and cross-fades.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoomConfig {
    /// Delay between the first scale change and the request.
    pub update_initial_delay: Duration,
    /// Delay the request is pushed out by when the scale keeps changing.
    pub update_delay: Duration,
    /// Length of the zoom-in cross-fade.
    pub zoom_in_duration: Duration,
    /// Length of the zoom-out cross-fade.
    pub zoom_out_duration: Duration,
}

impl ZoomConfig {
    /// 300 ms initial debounce, 100 ms re-debounce, 100 ms zoom-in and
    /// 200 ms zoom-out transitions.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            update_initial_delay: Duration::from_millis(300),
            update_delay: Duration::from_millis(100),
            zoom_in_duration: Duration::from_millis(100),
            zoom_out_duration: Duration::from_millis(200),
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Where a scale change is in its request lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScaleRequestState {
    /// The displayed scale is the requested scale.
    #[default]
    NoRequest,
    /// A request is armed and waiting for its timer.
    WillScheduleRequest,
    /// The timer fired; the back page is being painted at the future scale.
    RequestNewScale,
    /// The back page is ready; the cross-fade is running.
    ReceivedNewScale,
}

/// Whether the viewport is mid-zoom this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ZoomActivity {
    /// No scale request is active.
    #[default]
    Idle,
    /// A scale request is active.
    Zooming,
}

/// Page opacities for one frame of a cross-fade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    /// The transition finished; the pages should swap now.
    pub do_swap: bool,
    /// Opacity of the back (new-scale) page.
    pub back_opacity: f32,
    /// Opacity of the front (old-scale) page.
    pub front_opacity: f32,
}

/// Per-viewport zoom state.
#[derive(Clone, Debug)]
pub struct ZoomManager {
    config: ZoomConfig,
    state: ScaleRequestState,
    current_scale: Option<f32>,
    future_scale: Option<f32>,
    update_time: Option<HostTime>,
    transition_end: Option<HostTime>,
    pre_zoom_bounds: TileBounds,
    future_viewport: TileBounds,
    activity: ZoomActivity,
    prepare_next_page: bool,
}

impl Default for ZoomManager {
    fn default() -> Self {
        Self::new(ZoomConfig::standard())
    }
}

impl ZoomManager {
    /// Creates an idle zoom manager. The first processed frame adopts its
    /// scale as the current scale.
    #[must_use]
    pub fn new(config: ZoomConfig) -> Self {
        Self {
            config,
            state: ScaleRequestState::NoRequest,
            current_scale: None,
            future_scale: None,
            update_time: None,
            transition_end: None,
            pre_zoom_bounds: TileBounds::EMPTY,
            future_viewport: TileBounds::EMPTY,
            activity: ZoomActivity::Idle,
            prepare_next_page: false,
        }
    }

    /// Returns the timing constants.
    #[must_use]
    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Returns the request state.
    #[must_use]
    pub fn state(&self) -> ScaleRequestState {
        self.state
    }

    /// Returns the displayed scale (1.0 before the first frame).
    #[must_use]
    pub fn current_scale(&self) -> f32 {
        self.current_scale.unwrap_or(1.0)
    }

    /// Sets the displayed scale; called when a transition completes.
    pub fn set_current_scale(&mut self, scale: f32) {
        self.current_scale = Some(scale);
    }

    /// Returns the requested scale, or the displayed scale when nothing was
    /// ever requested.
    #[must_use]
    pub fn future_scale(&self) -> f32 {
        self.future_scale.unwrap_or_else(|| self.current_scale())
    }

    /// Returns the scale composited layers should be drawn at: the future
    /// scale once its page has been received, the displayed scale otherwise.
    #[must_use]
    pub fn layers_scale(&self) -> f32 {
        if self.state == ScaleRequestState::ReceivedNewScale {
            self.future_scale()
        } else {
            self.current_scale()
        }
    }

    /// Returns when the pending request fires, if one is armed.
    #[must_use]
    pub fn update_time(&self) -> Option<HostTime> {
        self.update_time
    }

    /// Returns the tile bounds that were visible before the zoom started.
    #[must_use]
    pub fn pre_zoom_bounds(&self) -> TileBounds {
        self.pre_zoom_bounds
    }

    /// Returns the tile bounds recorded with the pending request.
    #[must_use]
    pub fn future_viewport(&self) -> TileBounds {
        self.future_viewport
    }

    /// Records the viewport the back page is being prepared for.
    pub fn set_future_viewport(&mut self, bounds: TileBounds) {
        self.future_viewport = bounds;
    }

    /// Debounces a scale request.
    ///
    /// - Nothing armed: arm the timer at `now + update_initial_delay`.
    /// - Armed, scale changed: push the timer to `now + update_delay`.
    /// - Armed, same scale, timer reached: fire ([`ScaleRequestState::RequestNewScale`]).
    /// - Otherwise nothing changes.
    pub fn schedule_update(&mut self, now: HostTime, viewport: TileBounds, scale: f32) {
        let Some(fire_at) = self.update_time else {
            self.state = ScaleRequestState::WillScheduleRequest;
            self.update_time = Some(now.saturating_add(self.config.update_initial_delay));
            self.future_scale = Some(scale);
            self.future_viewport = viewport;
            return;
        };

        if self.future_scale != Some(scale) {
            self.update_time = Some(now.saturating_add(self.config.update_delay));
            self.future_scale = Some(scale);
            self.future_viewport = viewport;
        } else if now >= fire_at {
            self.state = ScaleRequestState::RequestNewScale;
            self.update_time = None;
        }
    }

    /// Advances the state machine for a frame drawn at `scale` with
    /// `viewport` visible.
    pub fn process_new_scale(&mut self, now: HostTime, scale: f32, viewport: TileBounds) {
        self.prepare_next_page = false;
        self.activity = ZoomActivity::Idle;
        let current = *self.current_scale.get_or_insert(scale);

        if scale == current || self.pre_zoom_bounds.is_empty() {
            self.pre_zoom_bounds = viewport;
        }

        let pending = self.future_scale != Some(scale);
        if (current != scale && (self.state == ScaleRequestState::NoRequest || pending))
            || self.state == ScaleRequestState::WillScheduleRequest
        {
            self.schedule_update(now, viewport, scale);
            if self.state == ScaleRequestState::RequestNewScale {
                self.prepare_next_page = true;
            }
        }

        if matches!(
            self.state,
            ScaleRequestState::RequestNewScale | ScaleRequestState::ReceivedNewScale
        ) && self.future_viewport != viewport
        {
            self.prepare_next_page = true;
        }

        if self.state != ScaleRequestState::NoRequest {
            self.prepare_next_page = true;
            self.activity = ZoomActivity::Zooming;
        }
    }

    /// Returns `true` if the back page must be prepared this frame.
    #[must_use]
    pub fn need_prepare_next_page(&self) -> bool {
        self.prepare_next_page
    }

    /// Returns this frame's zoom activity.
    #[must_use]
    pub fn activity(&self) -> ZoomActivity {
        self.activity
    }

    /// Returns `true` while a scale request is active.
    #[must_use]
    pub fn is_zooming(&self) -> bool {
        self.activity == ZoomActivity::Zooming
    }

    /// Returns `true` once the request timer has fired.
    #[must_use]
    pub fn did_fire_request(&self) -> bool {
        self.state == ScaleRequestState::RequestNewScale
    }

    /// Returns `true` once the back page is ready at the future scale.
    #[must_use]
    pub fn did_receive_request(&self) -> bool {
        self.state == ScaleRequestState::ReceivedNewScale
    }

    /// Marks the back page as ready; the cross-fade starts.
    pub fn set_received_request(&mut self) {
        self.state = ScaleRequestState::ReceivedNewScale;
    }

    /// Resets to [`ScaleRequestState::NoRequest`]. Returns whether a request
    /// was active.
    pub fn swap_pages(&mut self) -> bool {
        let reset = self.state != ScaleRequestState::NoRequest;
        self.state = ScaleRequestState::NoRequest;
        reset
    }

    /// Returns the front page's opacity during a zoom-in fade.
    ///
    /// The first call latches the transition end time.
    pub fn zoom_in_transparency(&mut self, now: HostTime) -> f32 {
        let duration = self.config.zoom_in_duration;
        self.ramp(now, duration)
    }

    /// Returns the complement of the back page's opacity during a zoom-out
    /// fade.
    ///
    /// The first call latches the transition end time.
    pub fn zoom_out_transparency(&mut self, now: HostTime) -> f32 {
        let duration = self.config.zoom_out_duration;
        self.ramp(now, duration)
    }

    /// Computes the page opacities for a frame of the cross-fade towards
    /// `scale`.
    pub fn process_transition(&mut self, now: HostTime, scale: f32) -> Transition {
        let mut transition = Transition {
            do_swap: false,
            back_opacity: 1.0,
            front_opacity: 1.0,
        };
        let zoom_out = scale < self.current_scale();
        if zoom_out {
            transition.back_opacity = 1.0 - self.zoom_out_transparency(now);
        } else {
            transition.front_opacity = self.zoom_in_transparency(now);
        }

        let end = self.transition_end(now, zoom_out);
        if now > end {
            self.transition_end = None;
            transition.do_swap = true;
        }
        transition
    }

    fn transition_end(&mut self, now: HostTime, zoom_out: bool) -> HostTime {
        let duration = if zoom_out {
            self.config.zoom_out_duration
        } else {
            self.config.zoom_in_duration
        };
        *self
            .transition_end
            .get_or_insert_with(|| now.saturating_add(duration))
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "opacity only needs f32 precision"
    )]
    fn ramp(&mut self, now: HostTime, duration: Duration) -> f32 {
        let end = *self
            .transition_end
            .get_or_insert_with(|| now.saturating_add(duration));
        let secs = duration.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (now.seconds_until(end) / secs).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> HostTime {
        HostTime::from_millis(millis)
    }

    const VP: TileBounds = TileBounds::new(0, 0, 4, 4);

    #[test]
    fn first_call_arms_initial_delay() {
        let mut zoom = ZoomManager::default();
        zoom.schedule_update(ms(1000), VP, 2.0);
        assert_eq!(zoom.state(), ScaleRequestState::WillScheduleRequest);
        assert_eq!(zoom.update_time(), Some(ms(1300)));
        assert!((zoom.future_scale() - 2.0).abs() < f32::EPSILON);
        assert_eq!(zoom.future_viewport(), VP);
    }

    #[test]
    fn unchanged_scale_keeps_fire_time() {
        let mut zoom = ZoomManager::default();
        zoom.schedule_update(ms(0), VP, 2.0);
        for t in [10, 50, 120, 299] {
            zoom.schedule_update(ms(t), VP, 2.0);
            assert_eq!(zoom.update_time(), Some(ms(300)), "fire time stable at {t} ms");
            assert_eq!(zoom.state(), ScaleRequestState::WillScheduleRequest);
        }
    }

    #[test]
    fn changed_scale_pushes_fire_time() {
        let mut zoom = ZoomManager::default();
        zoom.schedule_update(ms(0), VP, 2.0);
        zoom.schedule_update(ms(50), VP, 3.0);
        assert_eq!(zoom.update_time(), Some(ms(150)));
        assert!((zoom.future_scale() - 3.0).abs() < f32::EPSILON);

        zoom.schedule_update(ms(400), VP, 3.5);
        assert_eq!(zoom.update_time(), Some(ms(500)), "late change still re-debounces");
    }

    #[test]
    fn pinch_settles_then_fires() {
        let mut zoom = ZoomManager::default();
        zoom.schedule_update(ms(0), VP, 2.0);
        zoom.schedule_update(ms(50), VP, 3.0);
        assert_eq!(zoom.update_time(), Some(ms(150)));
        assert!((zoom.future_scale() - 3.0).abs() < f32::EPSILON);

        zoom.schedule_update(ms(149), VP, 3.0);
        assert_eq!(zoom.state(), ScaleRequestState::WillScheduleRequest);
        zoom.schedule_update(ms(150), VP, 3.0);
        assert_eq!(zoom.state(), ScaleRequestState::RequestNewScale);
        assert_eq!(zoom.update_time(), None, "firing clears the timer");
    }

    #[test]
    fn first_frame_adopts_scale() {
        let mut zoom = ZoomManager::default();
        zoom.process_new_scale(ms(0), 1.5, VP);
        assert!((zoom.current_scale() - 1.5).abs() < f32::EPSILON);
        assert!(!zoom.is_zooming());
        assert!(!zoom.need_prepare_next_page());
        assert_eq!(zoom.pre_zoom_bounds(), VP);
    }

    #[test]
    fn frames_drive_the_full_cycle() {
        let mut zoom = ZoomManager::default();
        zoom.process_new_scale(ms(0), 1.0, VP);

        zoom.process_new_scale(ms(16), 2.0, VP);
        assert!(zoom.is_zooming());
        assert!(zoom.need_prepare_next_page());
        assert_eq!(zoom.state(), ScaleRequestState::WillScheduleRequest);
        assert!((zoom.current_scale() - 1.0).abs() < f32::EPSILON, "display scale holds");

        zoom.process_new_scale(ms(400), 2.0, VP);
        assert!(zoom.did_fire_request());
        assert!((zoom.layers_scale() - 1.0).abs() < f32::EPSILON);

        zoom.set_received_request();
        assert!((zoom.layers_scale() - 2.0).abs() < f32::EPSILON);

        let start = zoom.process_transition(ms(420), 2.0);
        assert!(!start.do_swap);
        assert!((start.front_opacity - 1.0).abs() < 1e-6);
        assert!((start.back_opacity - 1.0).abs() < f32::EPSILON);

        let done = zoom.process_transition(ms(521), 2.0);
        assert!(done.do_swap, "swap once the 100 ms fade elapsed");
        assert!(done.front_opacity.abs() < f32::EPSILON);

        zoom.set_current_scale(2.0);
        assert!(zoom.swap_pages());
        assert!(!zoom.swap_pages(), "second reset reports nothing active");
        zoom.process_new_scale(ms(540), 2.0, VP);
        assert!(!zoom.is_zooming());
    }

    #[test]
    fn zoom_out_fades_back_page_in() {
        let mut zoom = ZoomManager::default();
        zoom.set_current_scale(2.0);
        let t0 = zoom.process_transition(ms(0), 1.0);
        assert!(t0.back_opacity.abs() < 1e-6);
        let mid = zoom.process_transition(ms(100), 1.0);
        assert!((mid.back_opacity - 0.5).abs() < 1e-6);
        assert!((mid.front_opacity - 1.0).abs() < f32::EPSILON);
        assert!(!mid.do_swap);
        assert!(zoom.process_transition(ms(201), 1.0).do_swap);
    }

    #[test]
    fn transparency_ramps_are_monotonic_and_bounded() {
        let mut zoom_in = ZoomManager::default();
        let mut zoom_out = ZoomManager::default();
        let mut last_in = f32::INFINITY;
        let mut last_out = f32::INFINITY;
        for t in (0..400).step_by(7) {
            let a = zoom_in.zoom_in_transparency(ms(t));
            let b = zoom_out.zoom_out_transparency(ms(t));
            assert!((0.0..=1.0).contains(&a), "zoom-in value {a} in range");
            assert!((0.0..=1.0).contains(&b), "zoom-out value {b} in range");
            assert!(a <= last_in, "zoom-in ramp never increases");
            assert!(b <= last_out, "zoom-out ramp never increases");
            last_in = a;
            last_out = b;
        }
        assert!(last_in.abs() < f32::EPSILON);
        assert!(last_out.abs() < f32::EPSILON);
    }

    #[test]
    fn moving_viewport_during_request_prepares() {
        let mut zoom = ZoomManager::default();
        zoom.process_new_scale(ms(0), 1.0, VP);
        zoom.process_new_scale(ms(10), 2.0, VP);
        zoom.process_new_scale(ms(400), 2.0, VP);
        assert!(zoom.did_fire_request());

        let moved = TileBounds::new(0, 2, 4, 6);
        zoom.process_new_scale(ms(420), 2.0, moved);
        assert!(zoom.need_prepare_next_page());
    }
}
