// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each concern gets its own track: frames on thread 0, tree hand-overs and
//! swaps on thread 1, zoom on thread 2, scroll on thread 3. A zoom request is
//! drawn as a span from the first state that leaves `NoRequest` until it
//! returns there; a scroll gesture likewise spans from `Scrolling` until
//! `NotScrolling`. Spans still open at the end of the recording are closed at
//! the last recorded timestamp.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use mosaic_core::scroll::ScrollState;
use mosaic_core::time::HostTime;
use mosaic_core::zoom::ScaleRequestState;

use crate::recorder::{RecordedEvent, decode};

const TID_FRAMES: u32 = 0;
const TID_TREES: u32 = 1;
const TID_ZOOM: u32 = 2;
const TID_SCROLL: u32 = 3;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events = trace_events(bytes);
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

/// Converts a recording into trace event objects without serializing them.
#[must_use]
pub fn trace_events(bytes: &[u8]) -> Vec<Value> {
    let mut events: Vec<Value> = Vec::new();
    let mut zooming = false;
    let mut scrolling = false;
    let mut last = HostTime(0);

    for recorded in decode(bytes) {
        last = last.max(recorded.now());
        match recorded {
            RecordedEvent::Frame(e) => {
                events.push(instant(
                    "Frame",
                    "Frame",
                    e.now,
                    TID_FRAMES,
                    json!({
                        "frame_index": e.frame_index,
                        "scale": e.scale,
                        "needs_redraw": e.needs_redraw,
                    }),
                ));
            }
            RecordedEvent::TreeUpdate(e) => {
                events.push(instant(
                    "TreeUpdate",
                    "Tree",
                    e.now,
                    TID_TREES,
                    json!({
                        "frame_index": e.frame_index,
                        "snapshot": e.snapshot,
                        "brand_new": e.brand_new,
                        "role": e.role.map(|r| format!("{r:?}")),
                        "superseded": e.superseded,
                    }),
                ));
            }
            RecordedEvent::TreeSwap(e) => {
                events.push(instant(
                    "TreeSwap",
                    "Tree",
                    e.now,
                    TID_TREES,
                    json!({
                        "frame_index": e.frame_index,
                        "drawing": e.drawing,
                        "painting": e.painting,
                        "discarded": e.discarded,
                    }),
                ));
            }
            RecordedEvent::ZoomState(e) => {
                let active = e.state != ScaleRequestState::NoRequest;
                if active && !zooming {
                    let args = json!({ "from": e.current_scale, "to": e.future_scale });
                    events.push(span("B", "Zoom", e.now, TID_ZOOM, args));
                }
                events.push(instant(
                    &format!("{:?}", e.state),
                    "Zoom",
                    e.now,
                    TID_ZOOM,
                    json!({
                        "frame_index": e.frame_index,
                        "current_scale": e.current_scale,
                        "future_scale": e.future_scale,
                    }),
                ));
                if !active && zooming {
                    events.push(span("E", "Zoom", e.now, TID_ZOOM, json!({})));
                }
                zooming = active;
            }
            RecordedEvent::PageSwap(e) => {
                events.push(instant(
                    "PageSwap",
                    "Zoom",
                    e.now,
                    TID_ZOOM,
                    json!({
                        "frame_index": e.frame_index,
                        "scale": e.scale,
                    }),
                ));
            }
            RecordedEvent::ScrollState(e) => {
                let active = e.state != ScrollState::NotScrolling;
                if active && !scrolling {
                    events.push(span("B", "Scroll", e.now, TID_SCROLL, json!({})));
                }
                events.push(instant(
                    &format!("{:?}", e.state),
                    "Scroll",
                    e.now,
                    TID_SCROLL,
                    json!({ "frame_index": e.frame_index }),
                ));
                if !active && scrolling {
                    events.push(span("E", "Scroll", e.now, TID_SCROLL, json!({})));
                }
                scrolling = active;
            }
            RecordedEvent::TilesPainted(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Tiles",
                    "cat": "Tiles",
                    "ts": micros(e.now),
                    "pid": 0,
                    "tid": TID_FRAMES,
                    "args": {
                        "queued": e.queued,
                        "swapped": e.swapped,
                    }
                }));
            }
        }
    }

    if zooming {
        events.push(span("E", "Zoom", last, TID_ZOOM, json!({})));
    }
    if scrolling {
        events.push(span("E", "Scroll", last, TID_SCROLL, json!({})));
    }
    events
}

fn instant(name: &str, cat: &str, now: HostTime, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": micros(now),
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

fn span(ph: &str, name: &str, now: HostTime, tid: u32, args: Value) -> Value {
    json!({
        "ph": ph,
        "name": name,
        "cat": name,
        "ts": micros(now),
        "pid": 0,
        "tid": tid,
        "args": args,
    })
}

fn micros(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}
