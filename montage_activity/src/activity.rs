// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Activity identifiers, timing parameters, and the events reported while stepping.

/// Step rate used when none is given: one step every 20 ms at most.
pub const DEFAULT_STEP_RATE: i64 = 20;

/// Identifier for a scheduled activity (generational).
///
/// An id becomes stale once its activity finishes or is removed; a later
/// activity reusing the same slot gets a higher generation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActivityId(pub(crate) u32, pub(crate) u32);

impl ActivityId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Where an activity sits in its lifecycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ActivityState {
    /// Scheduled, waiting for its start time (also between loop iterations).
    Pending,
    /// Inside its time window and being stepped.
    Active,
    /// Done, removed, or never scheduled by this scheduler. Stale ids report this state.
    Finished,
}

/// How the start time of an activity is chosen when it is added to a scheduler.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StartTime {
    /// The time of the first tick after the activity is added.
    Now,
    /// An absolute time on the scheduler's clock.
    At(i64),
    /// Right after another activity's window: `start + max(duration, 0)` of the
    /// referenced activity, resolved once as soon as that start is known.
    After(ActivityId),
}

/// A single step handed to the visitor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActivityStep {
    /// Milliseconds since the start of the current iteration. For finite
    /// activities this is always within `[0, duration]`.
    pub elapsed: i64,
    /// Fraction complete in `[0, 1]`. Always `1.0` for zero and negative durations.
    pub fraction: f64,
    /// Loop iteration, starting at `0`.
    pub iteration: u32,
}

/// Lifecycle notifications delivered by [`Scheduler::process`](crate::Scheduler::process).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ActivityEvent {
    /// The activity entered its window. Emitted once per loop iteration, before
    /// the first step of that iteration.
    Started {
        /// Loop iteration, starting at `0`.
        iteration: u32,
        /// Start time of this iteration.
        start_time: i64,
    },
    /// The activity was stepped.
    Stepped(ActivityStep),
    /// The activity is done (last iteration ended, or termination was requested).
    Finished,
}

/// A detached activity: timing parameters plus a payload.
///
/// Invalid parameters are clamped rather than rejected, so building an
/// activity never fails inside a render loop:
/// - a negative step rate becomes `0` (step on every tick);
/// - a loop count below `-1` becomes `0` (run once).
#[derive(Clone, Debug)]
pub struct Activity<K> {
    pub(crate) duration: i64,
    pub(crate) step_rate: i64,
    pub(crate) start: StartTime,
    pub(crate) loop_count: i32,
    pub(crate) payload: K,
}

impl<K> Activity<K> {
    /// Create an activity with the given duration (ms) and payload.
    ///
    /// Defaults: [`DEFAULT_STEP_RATE`], [`StartTime::Now`], no looping.
    pub fn new(duration: i64, payload: K) -> Self {
        Self {
            duration,
            step_rate: DEFAULT_STEP_RATE,
            start: StartTime::Now,
            loop_count: 0,
            payload,
        }
    }

    /// Create an indefinite activity that steps every `step_rate` ms until terminated.
    pub fn indefinite(step_rate: i64, payload: K) -> Self {
        Self::new(-1, payload).with_step_rate(step_rate)
    }

    /// Set the minimum interval between two steps.
    pub fn with_step_rate(mut self, step_rate: i64) -> Self {
        if step_rate < 0 {
            tracing::warn!(step_rate, "negative activity step rate clamped to 0");
            self.step_rate = 0;
        } else {
            self.step_rate = step_rate;
        }
        self
    }

    /// Set the number of extra iterations: `-1` loops forever, `0` runs once,
    /// `n` repeats `n` more times.
    pub fn with_loop_count(mut self, loop_count: i32) -> Self {
        if loop_count < -1 {
            tracing::warn!(loop_count, "invalid activity loop count clamped to 0");
            self.loop_count = 0;
        } else {
            self.loop_count = loop_count;
        }
        self
    }

    /// Start at an absolute time on the scheduler's clock.
    pub fn starting_at(mut self, start_time: i64) -> Self {
        self.start = StartTime::At(start_time);
        self
    }

    /// Start right after `other` finishes its window.
    ///
    /// The start time is resolved when this activity is added to the scheduler,
    /// or at the next tick if `other` is itself waiting for one. If `other` is
    /// no longer scheduled by then, this activity starts at the next tick.
    pub fn start_after(mut self, other: ActivityId) -> Self {
        self.start = StartTime::After(other);
        self
    }

    /// Duration in milliseconds.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Minimum interval between steps in milliseconds.
    pub fn step_rate(&self) -> i64 {
        self.step_rate
    }

    /// How the start time will be resolved.
    pub fn start(&self) -> StartTime {
        self.start
    }

    /// Extra iterations after the first (`-1` for infinite).
    pub fn loop_count(&self) -> i32 {
        self.loop_count
    }

    /// The payload.
    pub fn payload(&self) -> &K {
        &self.payload
    }
}
