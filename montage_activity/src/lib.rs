// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Montage Activity: time-interval activities and a frame-driven scheduler.
//!
//! An *activity* is a task bound to a window of time on a single clock. While the
//! window is open the scheduler *steps* the activity, handing it the elapsed time
//! and a fraction-complete in `[0, 1]`. What a step does is up to the caller: the
//! scheduler is generic over a payload `K` and reports lifecycle events to a
//! visitor closure instead of invoking polymorphic objects.
//!
//! - [`Activity`]: a detached activity under construction (duration, step rate,
//!   start time, loop count, payload).
//! - [`Scheduler`]: the live set of activities, stepped by [`Scheduler::process`].
//! - [`ActivityEvent`]: what the visitor sees (`Started`, `Stepped`, `Finished`).
//! - [`Interpolation`]: shaping of the raw fraction (direction, slow-in/slow-out).
//! - [`Clock`]: host time source; [`ManualClock`] for tests and simulations.
//!
//! ## Lifecycle
//!
//! Activities move `Pending → Active → Finished`. An activity added without an
//! explicit start time starts at the next tick, so its first step is at fraction
//! `0`. A looping activity goes back to `Pending` at the end of each iteration
//! with its start time shifted forward by whole durations, so repeated loops
//! never drift, and the next iteration begins in the same tick. Finished activities are
//! dropped from the scheduler and their [`ActivityId`] becomes stale.
//!
//! Durations are in milliseconds. A duration of `0` is a one-shot activity that
//! steps once at fraction `1.0`. A negative duration is indefinite: it steps on
//! every due tick until [`Scheduler::terminate`] or [`Scheduler::remove`].
//!
//! ## Example
//!
//! ```rust
//! use montage_activity::{Activity, ActivityEvent, Outcome, Scheduler};
//!
//! let mut scheduler = Scheduler::new();
//! let fade = scheduler.add(Activity::new(100, "fade").starting_at(0).with_step_rate(0));
//!
//! let mut fractions = Vec::new();
//! for now in [0, 50, 100] {
//!     scheduler.process(now, |_, _, event| {
//!         if let ActivityEvent::Stepped(step) = event {
//!             fractions.push(step.fraction);
//!         }
//!         Outcome::Continue
//!     });
//! }
//!
//! assert_eq!(fractions, [0.0, 0.5, 1.0]);
//! assert!(!scheduler.is_alive(fade));
//! ```
//!
//! ## Determinism
//!
//! Activities are always stepped in insertion order, so two activities writing
//! the same property with coinciding windows produce the same result every run.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod activity;
mod clock;
mod interpolation;
mod scheduler;

pub use activity::{
    Activity, ActivityEvent, ActivityId, ActivityState, ActivityStep, DEFAULT_STEP_RATE,
    StartTime,
};
#[cfg(feature = "std")]
pub use clock::SystemClock;
pub use clock::{Clock, ManualClock};
pub use interpolation::{Interpolation, InterpolationMode, lerp};
pub use scheduler::{Outcome, Scheduler, TickSummary};
