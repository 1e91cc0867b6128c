// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::io::Write;

use mosaic_core::time::HostTime;
use mosaic_core::trace::{
    FrameEvent, PageSwapEvent, ScrollStateEvent, TilesPaintedEvent, TraceSink, TreeSwapEvent,
    TreeUpdateEvent, ZoomStateEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    quiet_frames: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("quiet_frames", &self.quiet_frames)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            quiet_frames: false,
        }
    }

    /// Skips frame lines that did not request another frame.
    ///
    /// An idle compositor still ticks on every host frame; this keeps the
    /// output down to frames where something was in flight.
    #[must_use]
    pub fn quiet_idle_frames(mut self) -> Self {
        self.quiet_frames = true;
        self
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.nanos() as f64 / 1_000_000.0
}

fn id(v: Option<u64>) -> String {
    v.map_or_else(|| "-".to_owned(), |v| format!("#{v}"))
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame(&mut self, e: &FrameEvent) {
        if self.quiet_frames && !e.needs_redraw {
            return;
        }
        let redraw = if e.needs_redraw { "redraw" } else { "idle" };
        let _ = writeln!(
            self.writer,
            "[frame] frame={} at {:.1}ms scale={:.2} {redraw}",
            e.frame_index,
            ms(e.now),
            e.scale,
        );
    }

    fn on_tree_update(&mut self, e: &TreeUpdateEvent) {
        let role = e.role.map_or("cleared".to_owned(), |r| format!("{r:?}"));
        let _ = writeln!(
            self.writer,
            "[tree] frame={} snapshot={} role={role} brand_new={} superseded={}",
            e.frame_index,
            id(e.snapshot),
            e.brand_new,
            id(e.superseded),
        );
    }

    fn on_tree_swap(&mut self, e: &TreeSwapEvent) {
        let _ = writeln!(
            self.writer,
            "[swap] frame={} at {:.1}ms drawing=#{} painting={} discarded={}",
            e.frame_index,
            ms(e.now),
            e.drawing,
            id(e.painting),
            id(e.discarded),
        );
    }

    fn on_zoom_state(&mut self, e: &ZoomStateEvent) {
        let _ = writeln!(
            self.writer,
            "[zoom] frame={} at {:.1}ms {:?} {:.2} -> {:.2}",
            e.frame_index,
            ms(e.now),
            e.state,
            e.current_scale,
            e.future_scale,
        );
    }

    fn on_page_swap(&mut self, e: &PageSwapEvent) {
        let _ = writeln!(
            self.writer,
            "[pages] frame={} at {:.1}ms front scale={:.2}",
            e.frame_index,
            ms(e.now),
            e.scale,
        );
    }

    fn on_scroll_state(&mut self, e: &ScrollStateEvent) {
        let _ = writeln!(
            self.writer,
            "[scroll] frame={} at {:.1}ms {:?}",
            e.frame_index,
            ms(e.now),
            e.state,
        );
    }

    fn on_tiles_painted(&mut self, e: &TilesPaintedEvent) {
        let _ = writeln!(
            self.writer,
            "[tiles] frame={} queued={} swapped={}",
            e.frame_index, e.queued, e.swapped,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::trace::TreeRole;

    fn frame(index: u64, needs_redraw: bool) -> FrameEvent {
        FrameEvent {
            frame_index: index,
            now: HostTime::from_millis(16 * index),
            scale: 1.5,
            needs_redraw,
        }
    }

    #[test]
    fn frame_line_shows_time_and_scale() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame(&frame(2, true));
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[frame] frame=2"), "got: {output}");
        assert!(output.contains("at 32.0ms"), "got: {output}");
        assert!(output.contains("scale=1.50 redraw"), "got: {output}");
    }

    #[test]
    fn tree_update_names_role_and_superseded_snapshot() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_tree_update(&TreeUpdateEvent {
            frame_index: 4,
            now: HostTime(0),
            snapshot: Some(7),
            brand_new: false,
            role: Some(TreeRole::Queued),
            superseded: Some(6),
        });
        sink.on_tree_update(&TreeUpdateEvent {
            frame_index: 5,
            now: HostTime(0),
            snapshot: None,
            brand_new: false,
            role: None,
            superseded: None,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2, "one line per event: {output}");
        assert!(
            lines[0].contains("snapshot=#7 role=Queued"),
            "got: {}",
            lines[0]
        );
        assert!(lines[0].contains("superseded=#6"), "got: {}", lines[0]);
        assert!(
            lines[1].contains("snapshot=- role=cleared"),
            "got: {}",
            lines[1]
        );
    }

    #[test]
    fn quiet_mode_skips_idle_frames() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).quiet_idle_frames();
        sink.on_frame(&frame(0, true));
        sink.on_frame(&frame(1, false));
        sink.on_frame(&frame(2, false));
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 1, "only the busy frame: {output}");
    }
}
