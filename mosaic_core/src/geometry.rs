// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile-space geometry.
//!
//! Content is rasterized into a grid of fixed-size tiles. A tile at
//! [`TileCoord`] `(x, y)` covers the content rectangle
//! `[x·w/s, (x+1)·w/s) × [y·h/s, (y+1)·h/s)` where `w × h` is the tile size in
//! pixels and `s` the page scale. [`TileBounds`] is a half-open rectangle of
//! such coordinates.

use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Rect, Size};

/// The grid position of a single tile.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileCoord {
    /// Creates a tile coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the content-space rectangle this tile covers at `scale`.
    #[must_use]
    pub fn content_rect(self, tile_size: Size, scale: f32) -> Rect {
        let w = tile_size.width / f64::from(scale);
        let h = tile_size.height / f64::from(scale);
        let x0 = f64::from(self.x) * w;
        let y0 = f64::from(self.y) * h;
        Rect::new(x0, y0, x0 + w, y0 + h)
    }
}

impl fmt::Debug for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileCoord({}, {})", self.x, self.y)
    }
}

/// A half-open rectangle of tile coordinates: `left <= x < right`,
/// `top <= y < bottom`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileBounds {
    /// First column.
    pub left: i32,
    /// First row.
    pub top: i32,
    /// One past the last column.
    pub right: i32,
    /// One past the last row.
    pub bottom: i32,
}

impl TileBounds {
    /// Bounds containing no tiles.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Creates bounds from edges.
    #[inline]
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Returns the tiles touched by a content-space rectangle at `scale`.
    ///
    /// Leading edges round down and trailing edges round up, so any tile
    /// partially covered by `rect` is included.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "tile indices of on-screen content fit comfortably in i32"
    )]
    pub fn from_content_rect(rect: Rect, scale: f32, tile_size: Size) -> Self {
        let inv_w = f64::from(scale) / tile_size.width;
        let inv_h = f64::from(scale) / tile_size.height;
        Self {
            left: (rect.x0 * inv_w).floor() as i32,
            top: (rect.y0 * inv_h).floor() as i32,
            right: (rect.x1 * inv_w).ceil() as i32,
            bottom: (rect.y1 * inv_h).ceil() as i32,
        }
    }

    /// Returns `true` if the bounds contain no tiles.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Number of columns (zero when empty).
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        if self.right > self.left {
            self.right - self.left
        } else {
            0
        }
    }

    /// Number of rows (zero when empty).
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        if self.bottom > self.top {
            self.bottom - self.top
        } else {
            0
        }
    }

    /// Number of tiles covered.
    #[must_use]
    pub const fn tile_count(&self) -> u64 {
        self.width().unsigned_abs() as u64 * self.height().unsigned_abs() as u64
    }

    /// Returns `true` if `coord` lies inside the bounds.
    #[inline]
    #[must_use]
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.x >= self.left && coord.x < self.right && coord.y >= self.top && coord.y < self.bottom
    }

    /// Returns the overlap of two bounds (possibly empty).
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }

    /// Returns `true` if the two bounds share at least one tile.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Grows the bounds by `dx` columns and `dy` rows on every side.
    #[must_use]
    pub const fn outset(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left - dx,
            top: self.top - dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Iterates the covered coordinates row by row, left to right.
    #[must_use]
    pub fn iter(&self) -> TileIter {
        TileIter {
            bounds: *self,
            next: TileCoord::new(self.left, self.top),
        }
    }
}

impl fmt::Debug for TileBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TileBounds([{}, {}) x [{}, {}))",
            self.left, self.right, self.top, self.bottom
        )
    }
}

/// Row-major iterator over the coordinates of a [`TileBounds`].
#[derive(Clone, Debug)]
pub struct TileIter {
    bounds: TileBounds,
    next: TileCoord,
}

impl Iterator for TileIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        if self.bounds.is_empty() || self.next.y >= self.bounds.bottom {
            return None;
        }
        let out = self.next;
        self.next.x += 1;
        if self.next.x >= self.bounds.right {
            self.next.x = self.bounds.left;
            self.next.y += 1;
        }
        Some(out)
    }
}

/// Vertical scroll direction since the previous frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Vertical {
    /// Content moving up the screen (viewport moving down), or stationary.
    #[default]
    Down,
    /// Viewport moving up.
    Up,
}

/// Horizontal scroll direction since the previous frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Horizontal {
    /// Viewport moving right.
    #[default]
    Right,
    /// Viewport moving left, or stationary.
    Left,
}

/// Direction hints used to order tile preparation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScrollDirection {
    /// Vertical component.
    pub vertical: Vertical,
    /// Horizontal component.
    pub horizontal: Horizontal,
}

impl ScrollDirection {
    /// Derives the direction of travel from the previous to the current
    /// viewport. A stationary axis reports [`Vertical::Down`] and
    /// [`Horizontal::Left`].
    #[must_use]
    pub fn between(previous: Rect, current: Rect) -> Self {
        Self {
            vertical: if previous.y0 - current.y0 <= 0.0 {
                Vertical::Down
            } else {
                Vertical::Up
            },
            horizontal: if previous.x0 - current.x0 >= 0.0 {
                Horizontal::Left
            } else {
                Horizontal::Right
            },
        }
    }
}
