// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation regions in content space.

use alloc::vec::Vec;

use kurbo::Rect;

/// A set of content-space areas whose rasterized pixels are out of date.
///
/// The representation is a plain list of rectangles: merging appends rather
/// than computing an exact union, so a rectangle that was ever added stays
/// visible in [`rects`](Self::rects) until the region is cleared. Tile pages
/// only need to know which tiles a region touches, for which overlap is
/// harmless.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Region {
    /// Nothing is invalid.
    #[default]
    Empty,
    /// The listed rectangles are invalid.
    Rects(Vec<Rect>),
    /// All content is invalid.
    Full,
}

impl Region {
    /// Creates a region covering a single rectangle.
    ///
    /// Rectangles with zero area produce [`Region::Empty`].
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::Empty;
        region.union_rect(rect);
        region
    }

    /// Returns `true` if nothing is invalid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if everything is invalid.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Adds a rectangle to the region.
    pub fn union_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        if rect.area() <= 0.0 {
            return;
        }
        match self {
            Self::Full => {}
            Self::Empty => *self = Self::Rects(alloc::vec![rect]),
            Self::Rects(rects) => rects.push(rect),
        }
    }

    /// Merges another region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::Full, _) | (_, Self::Empty) => {}
            (_, Self::Full) => *self = Self::Full,
            (Self::Empty, _) => *self = other.clone(),
            (Self::Rects(a), Self::Rects(b)) => a.extend_from_slice(b),
        }
    }

    /// Resets the region to [`Region::Empty`], returning the previous value.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Returns the explicit rectangles (empty for `Empty` and `Full`).
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        match self {
            Self::Rects(rects) => rects,
            Self::Empty | Self::Full => &[],
        }
    }

    /// Returns the rectangles to repaint, with `Full` resolved to `full`.
    #[must_use]
    pub fn resolve(&self, full: Rect) -> Vec<Rect> {
        match self {
            Self::Empty => Vec::new(),
            Self::Rects(rects) => rects.clone(),
            Self::Full => alloc::vec![full],
        }
    }

    /// Returns `true` if any part of the region overlaps `rect`.
    #[must_use]
    pub fn intersects(&self, rect: Rect) -> bool {
        match self {
            Self::Empty => false,
            Self::Full => true,
            Self::Rects(rects) => rects.iter().any(|r| r.overlaps(rect)),
        }
    }

    /// Returns `true` if every area of `other` is covered by a single
    /// rectangle of `self`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        match (self, other) {
            (_, Self::Empty) | (Self::Full, _) => true,
            (_, Self::Full) | (Self::Empty, _) => false,
            (Self::Rects(mine), Self::Rects(theirs)) => theirs
                .iter()
                .all(|t| mine.iter().any(|m| m.union(*t) == *m)),
        }
    }
}
