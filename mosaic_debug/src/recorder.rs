// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends each event to a
//! `Vec<u8>` as a one-byte tag followed by fixed-size little-endian fields.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`]. Decoding
//! stops at the first unknown tag or truncated record.

use mosaic_core::scroll::ScrollState;
use mosaic_core::time::HostTime;
use mosaic_core::trace::{
    FrameEvent, PageSwapEvent, ScrollStateEvent, TilesPaintedEvent, TraceSink, TreeRole,
    TreeSwapEvent, TreeUpdateEvent, ZoomStateEvent,
};
use mosaic_core::zoom::ScaleRequestState;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME: u8 = 1;
const TAG_TREE_UPDATE: u8 = 2;
const TAG_TREE_SWAP: u8 = 3;
const TAG_ZOOM_STATE: u8 = 4;
const TAG_PAGE_SWAP: u8 = 5;
const TAG_SCROLL_STATE: u8 = 6;
const TAG_TILES_PAINTED: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
    events: usize,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Drops everything recorded so far, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.events = 0;
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8, frame_index: u64, now: HostTime) {
        self.events += 1;
        self.write_u8(tag);
        self.write_u64(frame_index);
        self.write_u64(now.nanos());
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        self.write_bool(v.is_some());
        self.write_u64(v.unwrap_or(0));
    }

    fn write_role(&mut self, role: Option<TreeRole>) {
        self.write_u8(match role {
            None => 0,
            Some(TreeRole::Drawing) => 1,
            Some(TreeRole::Painting) => 2,
            Some(TreeRole::Queued) => 3,
        });
    }

    fn write_zoom_state(&mut self, s: ScaleRequestState) {
        self.write_u8(match s {
            ScaleRequestState::NoRequest => 0,
            ScaleRequestState::WillScheduleRequest => 1,
            ScaleRequestState::RequestNewScale => 2,
            ScaleRequestState::ReceivedNewScale => 3,
        });
    }

    fn write_scroll_state(&mut self, s: ScrollState) {
        self.write_u8(match s {
            ScrollState::NotScrolling => 0,
            ScrollState::Scrolling => 1,
            ScrollState::ScrollingFinishPaint => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame(&mut self, e: &FrameEvent) {
        self.begin(TAG_FRAME, e.frame_index, e.now);
        self.write_f32(e.scale);
        self.write_bool(e.needs_redraw);
    }

    fn on_tree_update(&mut self, e: &TreeUpdateEvent) {
        self.begin(TAG_TREE_UPDATE, e.frame_index, e.now);
        self.write_option_u64(e.snapshot);
        self.write_bool(e.brand_new);
        self.write_role(e.role);
        self.write_option_u64(e.superseded);
    }

    fn on_tree_swap(&mut self, e: &TreeSwapEvent) {
        self.begin(TAG_TREE_SWAP, e.frame_index, e.now);
        self.write_u64(e.drawing);
        self.write_option_u64(e.painting);
        self.write_option_u64(e.discarded);
    }

    fn on_zoom_state(&mut self, e: &ZoomStateEvent) {
        self.begin(TAG_ZOOM_STATE, e.frame_index, e.now);
        self.write_zoom_state(e.state);
        self.write_f32(e.current_scale);
        self.write_f32(e.future_scale);
    }

    fn on_page_swap(&mut self, e: &PageSwapEvent) {
        self.begin(TAG_PAGE_SWAP, e.frame_index, e.now);
        self.write_f32(e.scale);
    }

    fn on_scroll_state(&mut self, e: &ScrollStateEvent) {
        self.begin(TAG_SCROLL_STATE, e.frame_index, e.now);
        self.write_scroll_state(e.state);
    }

    fn on_tiles_painted(&mut self, e: &TilesPaintedEvent) {
        self.begin(TAG_TILES_PAINTED, e.frame_index, e.now);
        self.write_u32(e.queued);
        self.write_u32(e.swapped);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`FrameEvent`].
    Frame(FrameEvent),
    /// A [`TreeUpdateEvent`].
    TreeUpdate(TreeUpdateEvent),
    /// A [`TreeSwapEvent`].
    TreeSwap(TreeSwapEvent),
    /// A [`ZoomStateEvent`].
    ZoomState(ZoomStateEvent),
    /// A [`PageSwapEvent`].
    PageSwap(PageSwapEvent),
    /// A [`ScrollStateEvent`].
    ScrollState(ScrollStateEvent),
    /// A [`TilesPaintedEvent`].
    TilesPainted(TilesPaintedEvent),
}

impl RecordedEvent {
    /// Frame counter the event was emitted on.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::Frame(e) => e.frame_index,
            Self::TreeUpdate(e) => e.frame_index,
            Self::TreeSwap(e) => e.frame_index,
            Self::ZoomState(e) => e.frame_index,
            Self::PageSwap(e) => e.frame_index,
            Self::ScrollState(e) => e.frame_index,
            Self::TilesPainted(e) => e.frame_index,
        }
    }

    /// Host time the event was emitted at.
    #[must_use]
    pub fn now(&self) -> HostTime {
        match self {
            Self::Frame(e) => e.now,
            Self::TreeUpdate(e) => e.now,
            Self::TreeSwap(e) => e.now,
            Self::ZoomState(e) => e.now,
            Self::PageSwap(e) => e.now,
            Self::ScrollState(e) => e.now,
            Self::TilesPainted(e) => e.now,
        }
    }

    /// Replays the event into a sink.
    pub fn dispatch(&self, sink: &mut dyn TraceSink) {
        match self {
            Self::Frame(e) => sink.on_frame(e),
            Self::TreeUpdate(e) => sink.on_tree_update(e),
            Self::TreeSwap(e) => sink.on_tree_swap(e),
            Self::ZoomState(e) => sink.on_zoom_state(e),
            Self::PageSwap(e) => sink.on_page_swap(e),
            Self::ScrollState(e) => sink.on_scroll_state(e),
            Self::TilesPainted(e) => sink.on_tiles_painted(e),
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes: [u8; N] = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f32(&mut self) -> Option<f32> {
        self.read_u32().map(f32::from_bits)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_bool()?;
        let val = self.read_u64()?;
        Some(present.then_some(val))
    }

    fn read_role(&mut self) -> Option<Option<TreeRole>> {
        Some(match self.read_u8()? {
            0 => None,
            1 => Some(TreeRole::Drawing),
            2 => Some(TreeRole::Painting),
            3 => Some(TreeRole::Queued),
            _ => return None,
        })
    }

    fn read_zoom_state(&mut self) -> Option<ScaleRequestState> {
        Some(match self.read_u8()? {
            0 => ScaleRequestState::NoRequest,
            1 => ScaleRequestState::WillScheduleRequest,
            2 => ScaleRequestState::RequestNewScale,
            3 => ScaleRequestState::ReceivedNewScale,
            _ => return None,
        })
    }

    fn read_scroll_state(&mut self) -> Option<ScrollState> {
        Some(match self.read_u8()? {
            0 => ScrollState::NotScrolling,
            1 => ScrollState::Scrolling,
            2 => ScrollState::ScrollingFinishPaint,
            _ => return None,
        })
    }

    fn decode_record(&mut self, tag: u8) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let now = HostTime(self.read_u64()?);
        Some(match tag {
            TAG_FRAME => RecordedEvent::Frame(FrameEvent {
                frame_index,
                now,
                scale: self.read_f32()?,
                needs_redraw: self.read_bool()?,
            }),
            TAG_TREE_UPDATE => RecordedEvent::TreeUpdate(TreeUpdateEvent {
                frame_index,
                now,
                snapshot: self.read_option_u64()?,
                brand_new: self.read_bool()?,
                role: self.read_role()?,
                superseded: self.read_option_u64()?,
            }),
            TAG_TREE_SWAP => RecordedEvent::TreeSwap(TreeSwapEvent {
                frame_index,
                now,
                drawing: self.read_u64()?,
                painting: self.read_option_u64()?,
                discarded: self.read_option_u64()?,
            }),
            TAG_ZOOM_STATE => RecordedEvent::ZoomState(ZoomStateEvent {
                frame_index,
                now,
                state: self.read_zoom_state()?,
                current_scale: self.read_f32()?,
                future_scale: self.read_f32()?,
            }),
            TAG_PAGE_SWAP => RecordedEvent::PageSwap(PageSwapEvent {
                frame_index,
                now,
                scale: self.read_f32()?,
            }),
            TAG_SCROLL_STATE => RecordedEvent::ScrollState(ScrollStateEvent {
                frame_index,
                now,
                state: self.read_scroll_state()?,
            }),
            TAG_TILES_PAINTED => RecordedEvent::TilesPainted(TilesPaintedEvent {
                frame_index,
                now,
                queued: self.read_u32()?,
                swapped: self.read_u32()?,
            }),
            _ => return None,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let event = self.decode_record(tag);
        if event.is_none() {
            // Unknown or truncated record: nothing after it can be trusted.
            self.pos = self.data.len();
        }
        event
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record_session() -> RecorderSink {
        let mut rec = RecorderSink::new();
        rec.on_tree_update(&TreeUpdateEvent {
            frame_index: 0,
            now: HostTime::from_millis(0),
            snapshot: Some(1),
            brand_new: true,
            role: Some(TreeRole::Painting),
            superseded: None,
        });
        rec.on_frame(&FrameEvent {
            frame_index: 0,
            now: HostTime::from_millis(0),
            scale: 1.0,
            needs_redraw: true,
        });
        rec.on_tree_swap(&TreeSwapEvent {
            frame_index: 1,
            now: HostTime::from_millis(16),
            drawing: 1,
            painting: None,
            discarded: None,
        });
        rec.on_zoom_state(&ZoomStateEvent {
            frame_index: 2,
            now: HostTime::from_millis(32),
            state: ScaleRequestState::WillScheduleRequest,
            current_scale: 1.0,
            future_scale: 2.0,
        });
        rec.on_tiles_painted(&TilesPaintedEvent {
            frame_index: 2,
            now: HostTime::from_millis(32),
            queued: 6,
            swapped: 4,
        });
        rec
    }

    #[test]
    fn session_decodes_in_order_with_fields_intact() {
        let rec = record_session();
        assert_eq!(rec.len(), 5, "every callback records one event");

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5, "all records decode");

        match &events[0] {
            RecordedEvent::TreeUpdate(e) => {
                assert_eq!(e.snapshot, Some(1), "snapshot id survives");
                assert!(e.brand_new, "brand_new flag survives");
                assert_eq!(e.role, Some(TreeRole::Painting), "role survives");
                assert_eq!(e.superseded, None, "absent superseded stays absent");
            }
            other => panic!("expected TreeUpdate, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::TreeSwap(e) => {
                assert_eq!(e.drawing, 1, "drawing id survives");
                assert_eq!(e.painting, None, "no follow-up painter");
            }
            other => panic!("expected TreeSwap, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::ZoomState(e) => {
                assert_eq!(
                    e.state,
                    ScaleRequestState::WillScheduleRequest,
                    "zoom state survives"
                );
                assert_eq!(e.future_scale, 2.0, "f32 fields are bit-exact");
            }
            other => panic!("expected ZoomState, got {other:?}"),
        }
        match &events[4] {
            RecordedEvent::TilesPainted(e) => {
                assert_eq!((e.queued, e.swapped), (6, 4), "tile counts survive");
            }
            other => panic!("expected TilesPainted, got {other:?}"),
        }
        assert_eq!(events[2].now(), HostTime::from_millis(16), "timestamp kept");
        assert_eq!(events[3].frame_index(), 2, "frame index kept");
    }

    #[test]
    fn truncated_recording_stops_at_last_whole_record() {
        let rec = record_session();
        let bytes = rec.as_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 4, "the cut record is dropped");
    }

    #[test]
    fn unknown_tag_ends_decoding() {
        let mut bytes = record_session().into_bytes();
        let first_len = 1 + 8 + 8 + 9 + 1 + 1 + 9;
        bytes.insert(first_len, 0xEE);
        let events: Vec<_> = decode(&bytes).collect();
        assert_eq!(events.len(), 1, "decoding stops at the foreign tag");
    }

    #[test]
    fn dispatch_replays_into_another_sink() {
        #[derive(Default)]
        struct Counter {
            frames: u32,
            scroll: Vec<ScrollState>,
        }
        impl TraceSink for Counter {
            fn on_frame(&mut self, _: &FrameEvent) {
                self.frames += 1;
            }
            fn on_scroll_state(&mut self, e: &ScrollStateEvent) {
                self.scroll.push(e.state);
            }
        }

        let mut rec = record_session();
        rec.on_scroll_state(&ScrollStateEvent {
            frame_index: 3,
            now: HostTime::from_millis(48),
            state: ScrollState::ScrollingFinishPaint,
        });

        let mut counter = Counter::default();
        for event in decode(rec.as_bytes()) {
            event.dispatch(&mut counter);
        }
        assert_eq!(counter.frames, 1, "one frame replayed");
        assert_eq!(
            counter.scroll,
            [ScrollState::ScrollingFinishPaint],
            "scroll state replayed"
        );
    }

    #[test]
    fn clear_resets_the_buffer() {
        let mut rec = record_session();
        rec.clear();
        assert!(rec.is_empty(), "no events after clear");
        assert_eq!(decode(rec.as_bytes()).count(), 0, "nothing decodes");
    }
}
