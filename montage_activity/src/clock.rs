// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host time sources.
//!
//! The scheduler never reads time on its own; the host passes the current time
//! into every tick. These types are a convenience for hosts and tests.

use core::cell::Cell;

/// A monotonic millisecond time source.
pub trait Clock {
    /// Current time in milliseconds. Successive calls never go backwards.
    fn now_millis(&self) -> i64;
}

/// A clock that only moves when told to.
///
/// ```rust
/// use montage_activity::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(16);
/// assert_eq!(clock.now_millis(), 1_016);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds.
    pub fn new(start: i64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock forward by `millis`. Negative values are ignored.
    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis.max(0));
    }

    /// Jump to `millis` if it is not earlier than the current reading.
    pub fn set(&self, millis: i64) {
        self.now.set(self.now.get().max(millis));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}

/// Wall clock backed by [`std::time::Instant`], reading milliseconds since creation.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Create a clock whose zero is now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}
