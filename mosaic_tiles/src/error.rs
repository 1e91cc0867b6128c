// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors from starting the tile worker pool.

use std::io;

use thiserror::Error;

/// Errors returned by [`TextureGenerator::new`](crate::TextureGenerator::new).
#[derive(Error, Debug)]
pub enum TilesError {
    /// The operating system refused to start a worker thread.
    #[error("failed to spawn tile worker")]
    SpawnWorker(#[source] io::Error),
    /// The configuration asked for zero worker threads.
    #[error("tile worker pool needs at least one thread")]
    NoWorkers,
}
