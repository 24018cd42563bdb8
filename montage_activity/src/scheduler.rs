// Copyright 2025 the Montage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The activity scheduler: live set, per-tick stepping, and start-time resolution.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::activity::{
    Activity, ActivityEvent, ActivityId, ActivityState, ActivityStep, StartTime,
};

/// What the visitor wants done with an activity after handling an event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Outcome {
    /// Keep going.
    Continue,
    /// Drop the activity now, without a `Finished` event.
    Cancel,
}

/// What happened during one [`Scheduler::process`] call.
#[derive(Clone, Debug, Default)]
pub struct TickSummary {
    /// Number of `Stepped` events delivered.
    pub stepped: usize,
    /// Activities that went from `Pending` to `Active`, in processing order.
    pub started: SmallVec<[ActivityId; 4]>,
    /// Activities that finished, in processing order.
    pub finished: SmallVec<[ActivityId; 4]>,
    /// Activities dropped because the visitor returned [`Outcome::Cancel`].
    pub cancelled: SmallVec<[ActivityId; 4]>,
}

impl TickSummary {
    /// Returns true if nothing started, stepped, finished, or was cancelled.
    pub fn is_idle(&self) -> bool {
        self.stepped == 0
            && self.started.is_empty()
            && self.finished.is_empty()
            && self.cancelled.is_empty()
    }
}

/// How far an entry's start time is resolved.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Anchor {
    /// `start_time` holds the start of the current iteration.
    Fixed,
    /// Starts at the time of the next [`Scheduler::process`] call.
    NextTick,
    /// Starts when the referenced activity's window ends, once that is known.
    After(ActivityId),
}

/// What a start-after referent currently tells us about its end.
enum Referent {
    Ends(i64),
    Unresolved,
    Gone,
}

#[derive(Clone, Debug)]
struct Entry<K> {
    generation: u32,
    duration: i64,
    step_rate: i64,
    anchor: Anchor,
    /// Meaningful only when `anchor` is [`Anchor::Fixed`].
    start_time: i64,
    /// Remaining extra iterations; `-1` is infinite.
    loops_remaining: i32,
    iteration: u32,
    state: ActivityState,
    next_step_time: i64,
    terminate_requested: bool,
    payload: K,
}

impl<K> Entry<K> {
    /// End of the current window, or `None` for indefinite activities.
    fn stop_time(&self) -> Option<i64> {
        (self.duration >= 0).then(|| self.start_time + self.duration)
    }

    fn fix_start(&mut self, start_time: i64) {
        self.anchor = Anchor::Fixed;
        self.start_time = start_time;
        self.next_step_time = start_time;
    }

    /// Move to the next iteration after the window ending at or before `now`.
    ///
    /// Windows that passed entirely between two ticks are skipped, up to the
    /// remaining loop count, so the new start stays a whole number of
    /// durations after the old one.
    fn rearm(&mut self, now: i64) {
        let skip = if self.duration > 0 {
            let windows = ((now - self.start_time) / self.duration).max(1);
            if self.loops_remaining > 0 {
                windows.min(i64::from(self.loops_remaining))
            } else {
                windows
            }
        } else {
            1
        };
        if self.loops_remaining > 0 {
            self.loops_remaining =
                i32::try_from(i64::from(self.loops_remaining) - skip).unwrap_or(0);
        }
        let start_time = if self.duration > 0 {
            self.start_time + skip * self.duration
        } else {
            now
        };
        self.fix_start(start_time);
        self.iteration = self
            .iteration
            .saturating_add(u32::try_from(skip).unwrap_or(u32::MAX));
        self.state = ActivityState::Pending;
    }
}

enum Disposition {
    Keep,
    Drop,
}

/// Frame-driven activity scheduler.
///
/// The host owns the scheduler and calls [`Scheduler::process`] once per tick
/// with the current time. Activities are stepped in insertion order. Nothing
/// here reads a clock or spawns a thread.
///
/// ```rust
/// use montage_activity::{Activity, ActivityState, Outcome, Scheduler};
///
/// let mut scheduler = Scheduler::new();
/// let first = scheduler.add(Activity::new(5_000, 'a').starting_at(0));
/// let second = scheduler.add(Activity::new(5_000, 'b').start_after(first));
/// assert_eq!(scheduler.start_time(second), Some(5_000));
///
/// scheduler.process(5_000, |_, _, _| Outcome::Continue);
/// assert_eq!(scheduler.state(first), ActivityState::Finished);
/// assert_eq!(scheduler.state(second), ActivityState::Active);
/// ```
pub struct Scheduler<K> {
    /// slots
    entries: Vec<Option<Entry<K>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// live ids in insertion order
    order: Vec<ActivityId>,
    current_time: i64,
}

impl<K> core::fmt::Debug for Scheduler<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("live", &self.order.len())
            .field("free_list", &self.free_list.len())
            .field("current_time", &self.current_time)
            .finish_non_exhaustive()
    }
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Scheduler<K> {
    /// Create an empty scheduler whose current time is `0`.
    pub fn new() -> Self {
        Self::with_time(0)
    }

    /// Create an empty scheduler whose current time is `now`.
    pub fn with_time(now: i64) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            order: Vec::new(),
            current_time: now,
        }
    }

    /// Time passed to the most recent [`Scheduler::process`] call (or set explicitly).
    pub fn current_time(&self) -> i64 {
        self.current_time
    }

    /// Set the current time without stepping anything.
    pub fn set_current_time(&mut self, now: i64) {
        self.current_time = now;
    }

    /// Number of live activities.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no activity is scheduled.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live ids in stepping order.
    pub fn ids(&self) -> &[ActivityId] {
        &self.order
    }

    /// Schedule an activity and return its id.
    ///
    /// The start time is resolved once:
    /// - [`StartTime::Now`] becomes the time of the next [`Scheduler::process`]
    ///   call, so the first step is always at fraction `0`;
    /// - [`StartTime::After`] becomes the referenced activity's start plus its
    ///   duration (negative durations count as `0`), as soon as that start is
    ///   known; if the referent is no longer live, the activity starts at the
    ///   next tick.
    ///
    /// [`Scheduler::start_time`] returns `None` until the start is resolved.
    pub fn add(&mut self, activity: Activity<K>) -> ActivityId {
        let (anchor, start_time) = match activity.start {
            StartTime::Now => (Anchor::NextTick, self.current_time),
            StartTime::At(t) => (Anchor::Fixed, t),
            StartTime::After(other) => self.anchor_after(other),
        };
        let entry = Entry {
            generation: 0,
            duration: activity.duration,
            step_rate: activity.step_rate,
            anchor,
            start_time,
            loops_remaining: activity.loop_count,
            iteration: 0,
            state: ActivityState::Pending,
            next_step_time: start_time,
            terminate_requested: false,
            payload: activity.payload,
        };
        let id = self.alloc(entry);
        self.order.push(id);
        tracing::debug!(?id, ?anchor, duration = activity.duration, "activity scheduled");
        id
    }

    fn anchor_after(&self, other: ActivityId) -> (Anchor, i64) {
        match self.referent(other) {
            Referent::Ends(t) => (Anchor::Fixed, t),
            Referent::Unresolved => (Anchor::After(other), self.current_time),
            Referent::Gone => {
                tracing::debug!(
                    ?other,
                    "start-after target is not scheduled; starting next tick"
                );
                (Anchor::NextTick, self.current_time)
            }
        }
    }

    fn alloc(&mut self, mut entry: Entry<K>) -> ActivityId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            entry.generation = generation;
            self.entries[idx] = Some(entry);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ActivityId uses 32-bit indices by design."
            )]
            ActivityId::new(idx as u32, generation)
        } else {
            let generation = 1_u32;
            entry.generation = generation;
            self.entries.push(Some(entry));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ActivityId uses 32-bit indices by design."
            )]
            ActivityId::new((self.entries.len() - 1) as u32, generation)
        }
    }

    fn free(&mut self, id: ActivityId) -> Option<K> {
        let entry = self.entries.get_mut(id.idx())?.take()?;
        self.free_list.push(id.idx());
        Some(entry.payload)
    }

    /// Returns true if `id` refers to a scheduled activity.
    pub fn is_alive(&self, id: ActivityId) -> bool {
        self.entry(id).is_some()
    }

    fn entry(&self, id: ActivityId) -> Option<&Entry<K>> {
        self.entries
            .get(id.idx())
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.1)
    }

    fn entry_mut(&mut self, id: ActivityId) -> Option<&mut Entry<K>> {
        self.entries
            .get_mut(id.idx())
            .and_then(|e| e.as_mut())
            .filter(|e| e.generation == id.1)
    }

    fn referent(&self, id: ActivityId) -> Referent {
        match self.entry(id) {
            Some(e) if e.anchor == Anchor::Fixed => {
                Referent::Ends(e.start_time + e.duration.max(0))
            }
            Some(_) => Referent::Unresolved,
            None => Referent::Gone,
        }
    }

    /// Lifecycle state; stale ids report [`ActivityState::Finished`].
    pub fn state(&self, id: ActivityId) -> ActivityState {
        self.entry(id)
            .map(|e| e.state)
            .unwrap_or(ActivityState::Finished)
    }

    /// Start time of the current iteration, if live and resolved.
    pub fn start_time(&self, id: ActivityId) -> Option<i64> {
        self.entry(id)
            .filter(|e| e.anchor == Anchor::Fixed)
            .map(|e| e.start_time)
    }

    /// Duration, if live.
    pub fn duration(&self, id: ActivityId) -> Option<i64> {
        self.entry(id).map(|e| e.duration)
    }

    /// Payload, if live.
    pub fn payload(&self, id: ActivityId) -> Option<&K> {
        self.entry(id).map(|e| &e.payload)
    }

    /// Mutable payload, if live.
    pub fn payload_mut(&mut self, id: ActivityId) -> Option<&mut K> {
        self.entry_mut(id).map(|e| &mut e.payload)
    }

    /// Move a pending activity to a new start time.
    ///
    /// Returns false if `id` is stale or already active.
    pub fn set_start_time(&mut self, id: ActivityId, start_time: i64) -> bool {
        match self.entry_mut(id) {
            Some(e) if e.state == ActivityState::Pending => {
                e.fix_start(start_time);
                true
            }
            _ => false,
        }
    }

    /// Make pending activity `id` start when `other` ends.
    ///
    /// The start time is computed now, or at the next tick if `other` has not
    /// resolved its own start yet; later changes to `other` do not move `id`.
    /// If `other` is stale, `id` starts at the next tick. Returns false if `id`
    /// is stale or already active.
    pub fn start_after(&mut self, id: ActivityId, other: ActivityId) -> bool {
        let (anchor, start_time) = self.anchor_after(other);
        match self.entry_mut(id) {
            Some(e) if e.state == ActivityState::Pending => {
                e.fix_start(start_time);
                e.anchor = anchor;
                true
            }
            _ => false,
        }
    }

    /// Fix the start of every entry still waiting on `now` or on a referent.
    fn resolve_starts(&mut self, now: i64) {
        for &id in &self.order {
            if let Some(e) = self.entries.get_mut(id.idx()).and_then(|e| e.as_mut())
                && e.anchor == Anchor::NextTick
            {
                e.fix_start(now);
            }
        }
        loop {
            let mut resolved = Vec::new();
            let mut waiting = false;
            for &id in &self.order {
                let Some(Anchor::After(other)) = self.entry(id).map(|e| e.anchor) else {
                    continue;
                };
                match self.referent(other) {
                    Referent::Ends(t) => resolved.push((id, t)),
                    Referent::Gone => resolved.push((id, now)),
                    Referent::Unresolved => waiting = true,
                }
            }
            let progressed = !resolved.is_empty();
            for (id, start_time) in resolved {
                if let Some(e) = self.entry_mut(id) {
                    e.fix_start(start_time);
                }
            }
            if !waiting {
                break;
            }
            if !progressed {
                // Only cycles are left.
                for i in 0..self.order.len() {
                    let id = self.order[i];
                    if let Some(e) = self.entry_mut(id)
                        && matches!(e.anchor, Anchor::After(_))
                    {
                        tracing::warn!(?id, "start-after cycle; starting now");
                        e.fix_start(now);
                    }
                }
                break;
            }
        }
    }

    /// Ask an activity to finish at the next tick.
    ///
    /// The visitor receives [`ActivityEvent::Finished`] without a further step.
    /// This is how indefinite activities are normally ended. Returns false if
    /// `id` is stale.
    pub fn terminate(&mut self, id: ActivityId) -> bool {
        match self.entry_mut(id) {
            Some(e) => {
                e.terminate_requested = true;
                true
            }
            None => false,
        }
    }

    /// Unschedule an activity immediately, without events, returning its payload.
    pub fn remove(&mut self, id: ActivityId) -> Option<K> {
        if !self.is_alive(id) {
            return None;
        }
        self.order.retain(|o| *o != id);
        tracing::debug!(?id, "activity removed");
        self.free(id)
    }

    /// Unschedule every activity for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(ActivityId, &K) -> bool) {
        let order = core::mem::take(&mut self.order);
        let mut kept = Vec::with_capacity(order.len());
        for id in order {
            let keep_it = self.entry(id).is_some_and(|e| keep(id, &e.payload));
            if keep_it {
                kept.push(id);
            } else {
                tracing::debug!(?id, "activity removed");
                self.free(id);
            }
        }
        self.order = kept;
    }

    /// Remove every activity.
    pub fn clear(&mut self) {
        for id in core::mem::take(&mut self.order) {
            self.free(id);
        }
    }

    /// Milliseconds until some activity needs a tick, or `None` if nothing is scheduled.
    ///
    /// Hosts that drive ticks from a timer can sleep this long.
    pub fn time_until_next_step(&self, now: i64) -> Option<i64> {
        self.order
            .iter()
            .filter_map(|id| self.entry(*id))
            .map(|e| {
                if e.terminate_requested || e.anchor != Anchor::Fixed {
                    0
                } else {
                    match e.state {
                        ActivityState::Pending => e.start_time - now,
                        _ => {
                            let due = e.stop_time().map_or(e.next_step_time, |stop| {
                                e.next_step_time.min(stop)
                            });
                            due - now
                        }
                    }
                }
                .max(0)
            })
            .min()
    }

    /// Advance to `now` and step every due activity, in insertion order.
    ///
    /// Start times that were waiting for a tick are resolved first. Then, for
    /// each live activity:
    /// 1. A pending activity whose start time has been reached becomes active
    ///    and reports [`ActivityEvent::Started`].
    /// 2. An active activity is stepped on the first tick of an iteration, when
    ///    its step rate has elapsed since the previous step, or when its window
    ///    has ended. Elapsed time is clamped to `[0, duration]`.
    /// 3. When the window has ended, the activity either re-arms for its next
    ///    iteration with `start += duration`, or reports
    ///    [`ActivityEvent::Finished`] and is dropped.
    ///
    /// A re-armed iteration whose start has been reached begins in the same
    /// call, so every iteration gets its own first step. Windows that passed
    /// entirely between two calls are skipped. A zero-duration loop runs one
    /// iteration per call. Activities that start after another finishes in the
    /// same call are activated in that same call when their start time has
    /// been reached.
    pub fn process<F>(&mut self, now: i64, mut visit: F) -> TickSummary
    where
        F: FnMut(ActivityId, &mut K, ActivityEvent) -> Outcome,
    {
        self.current_time = now;
        self.resolve_starts(now);
        let mut summary = TickSummary::default();
        let order = core::mem::take(&mut self.order);
        let mut kept = Vec::with_capacity(order.len());
        for id in order {
            match self.process_one(id, now, &mut visit, &mut summary) {
                Disposition::Keep => kept.push(id),
                Disposition::Drop => {
                    self.free(id);
                }
            }
        }
        self.order = kept;
        if !summary.is_idle() {
            tracing::trace!(
                now,
                stepped = summary.stepped,
                started = summary.started.len(),
                finished = summary.finished.len(),
                "activities processed"
            );
        }
        summary
    }

    fn process_one<F>(
        &mut self,
        id: ActivityId,
        now: i64,
        visit: &mut F,
        summary: &mut TickSummary,
    ) -> Disposition
    where
        F: FnMut(ActivityId, &mut K, ActivityEvent) -> Outcome,
    {
        let Some(entry) = self.entry_mut(id) else {
            return Disposition::Drop;
        };

        if entry.terminate_requested {
            entry.state = ActivityState::Finished;
            visit(id, &mut entry.payload, ActivityEvent::Finished);
            summary.finished.push(id);
            tracing::debug!(?id, "activity terminated");
            return Disposition::Drop;
        }

        loop {
            if entry.state == ActivityState::Pending {
                if now < entry.start_time {
                    return Disposition::Keep;
                }
                entry.state = ActivityState::Active;
                entry.next_step_time = entry.start_time;
                summary.started.push(id);
                tracing::debug!(?id, iteration = entry.iteration, "activity started");
                let started = ActivityEvent::Started {
                    iteration: entry.iteration,
                    start_time: entry.start_time,
                };
                if visit(id, &mut entry.payload, started) == Outcome::Cancel {
                    summary.cancelled.push(id);
                    return Disposition::Drop;
                }
            }

            let ended = entry.stop_time().is_some_and(|stop| now >= stop);
            if ended || now >= entry.next_step_time {
                let raw_elapsed = now - entry.start_time;
                let (elapsed, fraction) = if entry.duration > 0 {
                    let elapsed = raw_elapsed.clamp(0, entry.duration);
                    #[allow(
                        clippy::cast_precision_loss,
                        reason = "Millisecond durations are far below 2^52."
                    )]
                    let fraction = elapsed as f64 / entry.duration as f64;
                    (elapsed, fraction)
                } else if entry.duration == 0 {
                    (0, 1.0)
                } else {
                    (raw_elapsed.max(0), 1.0)
                };
                entry.next_step_time = now + entry.step_rate;
                summary.stepped += 1;
                let step = ActivityStep {
                    elapsed,
                    fraction,
                    iteration: entry.iteration,
                };
                if visit(id, &mut entry.payload, ActivityEvent::Stepped(step)) == Outcome::Cancel {
                    summary.cancelled.push(id);
                    return Disposition::Drop;
                }
            }

            if !ended {
                return Disposition::Keep;
            }

            if entry.loops_remaining != 0 {
                entry.rearm(now);
                if entry.duration == 0 {
                    return Disposition::Keep;
                }
                continue;
            }

            entry.state = ActivityState::Finished;
            visit(id, &mut entry.payload, ActivityEvent::Finished);
            summary.finished.push(id);
            tracing::debug!(?id, "activity finished");
            return Disposition::Drop;
        }
    }
}
