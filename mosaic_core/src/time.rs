// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time.
//!
//! [`HostTime`] is a point on the composition thread's monotonic clock,
//! measured in nanoseconds from an arbitrary origin chosen by the host.
//! [`Duration`] is a span in the same unit.
//!
//! Zoom debouncing and cross-fade ramps are expressed against these types so
//! that the state machines stay deterministic under test: the host passes
//! `now` into every per-frame call instead of the core reading a clock.

use core::fmt;
use core::ops::{Add, Sub};

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// A point in time, in nanoseconds on the host's monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Creates a time from a millisecond value.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * NANOS_PER_MILLI)
    }

    /// Creates a time from fractional seconds, saturating at zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "sub-nanosecond precision is discarded"
    )]
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs <= 0.0 {
            Self(0)
        } else {
            Self((secs * NANOS_PER_SEC) as u64)
        }
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns this time in fractional seconds.
    #[inline]
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    /// Returns the signed number of seconds from `self` until `later`.
    ///
    /// Negative when `later` is already in the past.
    #[inline]
    #[must_use]
    pub fn seconds_until(self, later: Self) -> f64 {
        if later.0 >= self.0 {
            (later.0 - self.0) as f64 / NANOS_PER_SEC
        } else {
            -((self.0 - later.0) as f64 / NANOS_PER_SEC)
        }
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Saturating addition of a duration.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}ns)", self.0)
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// The zero duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * NANOS_PER_MILLI)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns this duration in fractional seconds.
    #[inline]
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}ns)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_and_seconds_agree() {
        assert_eq!(HostTime::from_millis(150), HostTime::from_secs_f64(0.15));
        assert!((Duration::from_millis(300).as_secs_f64() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn seconds_until_is_signed() {
        let a = HostTime::from_millis(100);
        let b = HostTime::from_millis(250);
        assert!((a.seconds_until(b) - 0.15).abs() < 1e-9);
        assert!((b.seconds_until(a) + 0.15).abs() < 1e-9);
    }

    #[test]
    fn negative_seconds_clamp_to_origin() {
        assert_eq!(HostTime::from_secs_f64(-3.0), HostTime(0));
    }

    #[test]
    fn saturating_ops() {
        let t = HostTime(u64::MAX - 1);
        assert_eq!(t.saturating_add(Duration(10)), HostTime(u64::MAX));
        assert_eq!(t.checked_add(Duration(10)), None);
        assert_eq!(
            HostTime(5).saturating_duration_since(HostTime(9)),
            Duration::ZERO
        );
        assert_eq!(Duration(3).saturating_sub(Duration(7)), Duration::ZERO);
    }
}
