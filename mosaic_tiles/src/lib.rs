// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile pages and the rasterization worker pool.
//!
//! A [`TiledPage`] covers the content area at one scale with a grid of
//! [`Tile`]s. Each frame the composition thread calls
//! [`prepare`](TilePage::prepare) to claim tiles for the visible (or
//! expanded) area and queue paint work, then
//! [`swap_buffers_if_ready`](TilePage::swap_buffers_if_ready) to promote
//! finished back textures, then [`draw`](TilePage::draw). Nothing on that
//! path blocks on a worker.
//!
//! ```text
//!   TiledPage::prepare ──schedule──► TextureGenerator queue
//!                                          │ lowest priority first
//!                                          ▼
//!                                  worker: TileBackend::rasterize
//!                                          │
//!   TiledPage::swap_buffers_if_ready ◄─────┘ back texture ready
//! ```
//!
//! Rasterization and texture storage live behind [`TileBackend`], so this
//! crate never touches a raster library or GPU API.

pub mod config;
pub mod error;
pub mod generator;
pub mod page;
pub mod texture;
pub mod tile;

pub use config::TilesConfig;
pub use error::TilesError;
pub use generator::TextureGenerator;
pub use page::{Expansion, PageStats, TilePage, TiledPage};
pub use texture::{PageId, PaintRequest, TextureId, TileBackend};
pub use tile::{Tile, TileState};
