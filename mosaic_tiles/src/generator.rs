// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rasterization worker pool.
//!
//! [`TextureGenerator`] owns a fixed set of named worker threads that pull
//! paint operations from a shared queue. The operation with the lowest
//! priority value runs first; equal priorities run in submission order.
//!
//! One [`Condvar`] carries every wake-up: new work for idle workers, and
//! "an operation finished" for threads blocked in
//! [`remove_paint_operations_for_page`](TextureGenerator::remove_paint_operations_for_page)
//! or [`wait_idle`](TextureGenerator::wait_idle).
//!
//! Lock order is queue, then tile. Workers release the queue lock before
//! touching a tile or calling the backend.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::config::TilesConfig;
use crate::error::TilesError;
use crate::texture::{PageId, TileBackend};
use crate::tile::Tile;

/// A queued request to paint one tile.
#[derive(Debug)]
pub(crate) struct PaintOperation {
    pub(crate) page: PageId,
    pub(crate) tile: Arc<Tile>,
    pub(crate) priority: i64,
    pub(crate) prefetch: bool,
    seq: u64,
}

impl PaintOperation {
    fn run(&self, backend: &dyn TileBackend) {
        let Some(request) = self.tile.begin_paint(self.page, self.prefetch) else {
            self.tile.cancel_repaint();
            return;
        };
        // A panicking backend counts as a failed paint so the worker and its
        // `running` entry survive.
        let texture = panic::catch_unwind(AssertUnwindSafe(|| backend.rasterize(&request)))
            .unwrap_or_else(|_| {
                tracing::warn!(
                    page = request.page.0,
                    x = request.coord.x,
                    y = request.coord.y,
                    "tile rasterization panicked"
                );
                None
            });
        tracing::trace!(
            page = request.page.0,
            x = request.coord.x,
            y = request.coord.y,
            painted = texture.is_some(),
            "tile painted"
        );
        self.tile.finish_paint(&request, texture, backend);
    }
}

#[derive(Debug, Default)]
struct Queue {
    ops: Vec<PaintOperation>,
    /// Pages with an operation currently executing, one entry per worker.
    running: Vec<PageId>,
    next_seq: u64,
    shutdown: bool,
}

impl Queue {
    fn push(&mut self, page: PageId, tile: Arc<Tile>, priority: i64, prefetch: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ops.push(PaintOperation {
            page,
            tile,
            priority,
            prefetch,
            seq,
        });
    }

    /// Removes the operation with the lowest `(priority, seq)`.
    fn pop_next(&mut self) -> Option<PaintOperation> {
        let idx = self
            .ops
            .iter()
            .enumerate()
            .min_by_key(|(_, op)| (op.priority, op.seq))
            .map(|(idx, _)| idx)?;
        Some(self.ops.remove(idx))
    }

    fn is_idle(&self) -> bool {
        self.ops.is_empty() && self.running.is_empty()
    }
}

struct Shared {
    queue: Mutex<Queue>,
    cond: Condvar,
    backend: Arc<dyn TileBackend>,
}

impl Shared {
    fn worker_loop(&self) {
        let mut queue = self.queue.lock();
        loop {
            if queue.shutdown {
                return;
            }
            let Some(op) = queue.pop_next() else {
                self.cond.wait(&mut queue);
                continue;
            };
            queue.running.push(op.page);
            MutexGuard::unlocked(&mut queue, || op.run(&*self.backend));
            if let Some(idx) = queue.running.iter().position(|p| *p == op.page) {
                queue.running.swap_remove(idx);
            }
            self.cond.notify_all();
        }
    }
}

/// The tile rasterization worker pool.
///
/// Dropping the generator stops the workers (queued operations are
/// discarded) and joins them.
pub struct TextureGenerator {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    config: TilesConfig,
    next_page: AtomicU32,
}

impl fmt::Debug for TextureGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.shared.queue.lock();
        f.debug_struct("TextureGenerator")
            .field("workers", &self.workers.len())
            .field("queued", &queue.ops.len())
            .field("running", &queue.running)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TextureGenerator {
    /// Starts `config.worker_threads` workers painting through `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`TilesError::NoWorkers`] if the configuration asks for zero
    /// threads, or [`TilesError::SpawnWorker`] if a thread cannot be started.
    /// Workers started before the failure are stopped again.
    pub fn new(config: TilesConfig, backend: Arc<dyn TileBackend>) -> Result<Self, TilesError> {
        if config.worker_threads == 0 {
            return Err(TilesError::NoWorkers);
        }
        let mut generator = Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue::default()),
                cond: Condvar::new(),
                backend,
            }),
            workers: Vec::with_capacity(config.worker_threads),
            config,
            next_page: AtomicU32::new(0),
        };
        for i in 0..config.worker_threads {
            let shared = Arc::clone(&generator.shared);
            let handle = thread::Builder::new()
                .name(format!("mosaic-tiles-{i}"))
                .spawn(move || shared.worker_loop())
                .map_err(TilesError::SpawnWorker)?;
            generator.workers.push(handle);
        }
        tracing::debug!(workers = config.worker_threads, "tile workers started");
        Ok(generator)
    }

    /// The configuration the pool was started with.
    #[must_use]
    pub fn config(&self) -> &TilesConfig {
        &self.config
    }

    /// The backend workers paint through.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn TileBackend> {
        &self.shared.backend
    }

    /// Allocates an id for a new page.
    pub fn register_page(&self) -> PageId {
        PageId(self.next_page.fetch_add(1, Ordering::Relaxed))
    }

    /// Queues a paint of `tile` for `page`. Lower `priority` runs first.
    pub(crate) fn schedule(&self, page: PageId, tile: Arc<Tile>, priority: i64, prefetch: bool) {
        let mut queue = self.shared.queue.lock();
        queue.push(page, tile, priority, prefetch);
        self.shared.cond.notify_all();
    }

    /// Number of operations waiting to run.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().ops.len()
    }

    /// Drops every queued operation for `page` and clears the pending flag on
    /// its tiles so a later prepare can queue them again.
    ///
    /// With `wait`, also blocks until no operation for `page` is running.
    /// Returns the number of operations removed.
    pub fn remove_paint_operations_for_page(&self, page: PageId, wait: bool) -> usize {
        let mut queue = self.shared.queue.lock();
        let before = queue.ops.len();
        queue.ops.retain(|op| {
            if op.page == page {
                op.tile.cancel_repaint();
                false
            } else {
                true
            }
        });
        let removed = before - queue.ops.len();
        if wait {
            while queue.running.contains(&page) {
                self.shared.cond.wait(&mut queue);
            }
        }
        if removed > 0 {
            tracing::debug!(page = page.0, removed, "cancelled paint operations");
        }
        removed
    }

    /// Blocks until the queue is empty and no worker is painting.
    pub fn wait_idle(&self) {
        let mut queue = self.shared.queue.lock();
        while !queue.is_idle() {
            self.shared.cond.wait(&mut queue);
        }
    }
}

impl Drop for TextureGenerator {
    fn drop(&mut self) {
        {
            let mut queue = self.shared.queue.lock();
            queue.shutdown = true;
            queue.ops.clear();
            self.shared.cond.notify_all();
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("tile worker panicked");
            }
        }
    }
}
