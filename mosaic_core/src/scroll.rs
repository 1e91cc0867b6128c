// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll state machine.
//!
//! ```text
//!   NotScrolling ──input──► Scrolling ──input stops──► ScrollingFinishPaint
//!        ▲   ▲                    │     (swap outstanding)        │
//!        │   └── input stops ─────┘                               │
//!        │       (last swap complete)                             │
//!        └──────────────── whole-page swap succeeded ─────────────┘
//! ```
//!
//! While scrolling, tiles are swapped in as soon as they are individually
//! ready so the page keeps moving. If the last swap left tiles behind when
//! the finger lifts, the viewport stays in
//! [`ScrollState::ScrollingFinishPaint`] until a whole-page swap succeeds, so
//! the screen never settles on a half-updated tile set.

/// How a tile page may swap its back buffers to the front.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SwapPolicy {
    /// Swap only when every tile in the bounds is ready.
    #[default]
    WholePage,
    /// Swap every tile that is individually ready.
    WhateverIsReady,
}

/// Where the viewport is in a scroll gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollState {
    /// No gesture in progress.
    #[default]
    NotScrolling,
    /// Input reports active scrolling.
    Scrolling,
    /// Input stopped; waiting for a whole-page swap.
    ScrollingFinishPaint,
}

impl ScrollState {
    /// Applies this frame's scroll input flag. `swap_outstanding` is `true`
    /// when the most recent swap left some viewport tiles unswapped.
    pub fn on_input(&mut self, scrolling: bool, swap_outstanding: bool) {
        *self = match (*self, scrolling) {
            (_, true) => Self::Scrolling,
            (Self::Scrolling, false) if swap_outstanding => Self::ScrollingFinishPaint,
            (Self::Scrolling, false) => Self::NotScrolling,
            (state, false) => state,
        };
    }

    /// Applies the outcome of this frame's tile swap. `finished` is `true`
    /// when every tile in the viewport was swapped.
    pub fn on_swap(&mut self, finished: bool) {
        if *self == Self::ScrollingFinishPaint && finished {
            *self = Self::NotScrolling;
        }
    }

    /// Returns the swap policy for the current state.
    #[must_use]
    pub fn swap_policy(self) -> SwapPolicy {
        match self {
            Self::Scrolling => SwapPolicy::WhateverIsReady,
            Self::NotScrolling | Self::ScrollingFinishPaint => SwapPolicy::WholePage,
        }
    }

    /// Returns `true` unless the gesture is fully over.
    #[must_use]
    pub fn is_active(self) -> bool {
        self != Self::NotScrolling
    }
}
