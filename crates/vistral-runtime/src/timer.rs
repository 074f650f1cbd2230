#![forbid(unsafe_code)]

//! Deterministic timer queue.
//!
//! The queue is the runtime's only source of scheduled work. It never reads a
//! clock: callers pass `now` in, which is what lets the simulator drive it
//! with manual time.
//!
//! # Invariants
//!
//! 1. Timers pop in `(due, id)` order, so equal deadlines fire in the order
//!    they were scheduled.
//! 2. A cancelled timer never pops.
//! 3. A one-shot timer pops at most once; an interval timer re-arms at
//!    `due + period` and coalesces missed periods instead of bursting.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Handle returned by [`TimerQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// When a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Once, after the delay.
    Once(Duration),
    /// Repeatedly, first after one period.
    Every(Duration),
    /// Once per display refresh, at the queue's frame interval.
    Frame,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    /// The deadline that was reached. Messages are stamped with this, not
    /// with the (possibly later) wall time at which the loop noticed.
    pub due: Duration,
    /// Whether the timer is still scheduled after this fire.
    pub repeats: bool,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: Duration,
    period: Option<Duration>,
}

/// Shortest accepted interval; keeps a zero period from spinning forever.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Ordered set of pending timers.
#[derive(Debug, Clone)]
pub struct TimerQueue {
    next_id: u64,
    frame_interval: Duration,
    entries: HashMap<TimerId, Entry>,
    order: BTreeSet<(Duration, TimerId)>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    /// About 60 frames per second.
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    pub fn new() -> Self {
        Self::with_frame_interval(Self::DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            next_id: 0,
            frame_interval: frame_interval.max(MIN_PERIOD),
            entries: HashMap::new(),
            order: BTreeSet::new(),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Schedule a timer relative to `now`.
    pub fn schedule(&mut self, now: Duration, schedule: Schedule) -> TimerId {
        let (delay, period) = match schedule {
            Schedule::Once(delay) => (delay, None),
            Schedule::Every(period) => {
                let period = period.max(MIN_PERIOD);
                (period, Some(period))
            }
            Schedule::Frame => (self.frame_interval, Some(self.frame_interval)),
        };
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = now.saturating_add(delay);
        self.entries.insert(id, Entry { due, period });
        self.order.insert((due, id));
        tracing::trace!(
            target: "vistral.timer",
            timer = id.0,
            due_ms = due.as_millis() as u64,
            repeating = period.is_some(),
            "timer scheduled"
        );
        id
    }

    /// Cancel a timer. Returns `false` if it was unknown or already spent.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                self.order.remove(&(entry.due, id));
                tracing::trace!(target: "vistral.timer", timer = id.0, "timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.order.first().map(|&(due, _)| due)
    }

    /// Pop the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Fired> {
        let &(due, id) = self.order.first()?;
        if due > now {
            return None;
        }
        self.order.pop_first();
        let entry = self.entries.get_mut(&id)?;

        match entry.period {
            Some(period) => {
                let mut next = due.saturating_add(period);
                if next <= now {
                    // Fell behind by more than a period: skip to the first slot after `now`.
                    let behind = (now - due).as_nanos();
                    let skipped = behind / period.as_nanos();
                    next = due + period.saturating_mul((skipped + 1) as u32);
                }
                entry.due = next;
                self.order.insert((next, id));
                Some(Fired {
                    id,
                    due,
                    repeats: true,
                })
            }
            None => {
                self.entries.remove(&id);
                Some(Fired {
                    id,
                    due,
                    repeats: false,
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
