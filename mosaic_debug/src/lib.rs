// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for the mosaic
//! composition loop.
//!
//! Every type here implements or consumes
//! [`TraceSink`](mosaic_core::trace::TraceSink):
//!
//! - [`pretty::PrettyPrintSink`] writes one line per event.
//! - [`recorder::RecorderSink`] encodes events into a compact binary buffer,
//!   and [`recorder::decode`] plays them back.
//! - [`chrome::export`] turns a recording into Chrome Trace Event Format JSON,
//!   with zoom and scroll gestures shown as spans.

pub mod chrome;
pub mod pretty;
pub mod recorder;
