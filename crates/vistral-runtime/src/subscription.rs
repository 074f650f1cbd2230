#![forbid(unsafe_code)]

//! Declarative timer subscriptions.
//!
//! A model never starts or stops timers itself. It *declares* which timers
//! should exist right now, and the runtime makes the timer queue match:
//!
//! 1. `Model::subscriptions()` returns the declared set.
//! 2. After `init()` and after every `update()`, [`SubscriptionManager::reconcile`]
//!    compares it with the running set by [`SubId`].
//! 3. New ids are scheduled, unchanged ids keep their timer, and ids that
//!    disappeared are cancelled on the spot.
//! 4. Fired timers are turned back into messages by [`SubscriptionManager::dispatch`].
//!
//! Because reconciliation happens before the next timer is popped, a model
//! that stops declaring a subscription can never receive another message
//! from it.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::timer::{Fired, Schedule, TimerId, TimerQueue};

/// Identity of a subscription across update cycles.
///
/// Two declarations with the same id are the same subscription: the running
/// timer is kept. Encode anything that should restart the timer into the id.
pub type SubId = u64;

/// A declared source of timed messages.
pub trait Subscription<M> {
    fn id(&self) -> SubId;

    fn schedule(&self) -> Schedule;

    /// Build the message for a fire at `now` (time since program start).
    fn message(&self, now: Duration) -> M;
}

type MakeMsg<M> = Box<dyn Fn(Duration) -> M>;

/// Fires every `interval`, first one interval after it starts.
pub struct Every<M> {
    id: SubId,
    interval: Duration,
    make_msg: MakeMsg<M>,
}

impl<M> Every<M> {
    /// Id derived from the interval, so two `Every`s with different periods never collide.
    pub fn new(interval: Duration, make_msg: impl Fn(Duration) -> M + 'static) -> Self {
        let id = interval.as_nanos() as u64 ^ 0x5449_434B;
        Self::with_id(id, interval, make_msg)
    }

    pub fn with_id(
        id: SubId,
        interval: Duration,
        make_msg: impl Fn(Duration) -> M + 'static,
    ) -> Self {
        Self {
            id,
            interval,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M> Subscription<M> for Every<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn schedule(&self) -> Schedule {
        Schedule::Every(self.interval)
    }

    fn message(&self, now: Duration) -> M {
        (self.make_msg)(now)
    }
}

/// Fires once, `delay` after it starts. Stays spent while still declared.
pub struct After<M> {
    id: SubId,
    delay: Duration,
    make_msg: MakeMsg<M>,
}

impl<M> After<M> {
    pub fn new(delay: Duration, make_msg: impl Fn(Duration) -> M + 'static) -> Self {
        let id = delay.as_nanos() as u64 ^ 0x4146_5452;
        Self::with_id(id, delay, make_msg)
    }

    pub fn with_id(id: SubId, delay: Duration, make_msg: impl Fn(Duration) -> M + 'static) -> Self {
        Self {
            id,
            delay,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M> Subscription<M> for After<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn schedule(&self) -> Schedule {
        Schedule::Once(self.delay)
    }

    fn message(&self, now: Duration) -> M {
        (self.make_msg)(now)
    }
}

/// Fires once per display refresh.
pub struct AnimationFrame<M> {
    id: SubId,
    make_msg: MakeMsg<M>,
}

impl<M> AnimationFrame<M> {
    pub fn new(make_msg: impl Fn(Duration) -> M + 'static) -> Self {
        Self::with_id(0x4652_414D, make_msg)
    }

    pub fn with_id(id: SubId, make_msg: impl Fn(Duration) -> M + 'static) -> Self {
        Self {
            id,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M> Subscription<M> for AnimationFrame<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn message(&self, now: Duration) -> M {
        (self.make_msg)(now)
    }
}

/// A subscription whose messages are wrapped by `f`.
pub struct Mapped<A, B> {
    inner: Box<dyn Subscription<A>>,
    f: fn(A) -> B,
}

impl<A, B> Subscription<B> for Mapped<A, B> {
    fn id(&self) -> SubId {
        self.inner.id()
    }

    fn schedule(&self) -> Schedule {
        self.inner.schedule()
    }

    fn message(&self, now: Duration) -> B {
        (self.f)(self.inner.message(now))
    }
}

/// Lift a component's subscriptions into its parent's message type.
pub fn map<A: 'static, B: 'static>(
    subs: Vec<Box<dyn Subscription<A>>>,
    f: fn(A) -> B,
) -> Vec<Box<dyn Subscription<B>>> {
    subs.into_iter()
        .map(|inner| Box::new(Mapped { inner, f }) as Box<dyn Subscription<B>>)
        .collect()
}

struct ActiveSub<M> {
    sub: Box<dyn Subscription<M>>,
    /// `None` once a one-shot has fired.
    timer: Option<TimerId>,
}

/// What a reconcile pass changed, ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub started: Vec<SubId>,
    pub stopped: Vec<SubId>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }
}

/// Tracks running subscriptions and their timers.
pub struct SubscriptionManager<M> {
    active: HashMap<SubId, ActiveSub<M>>,
    by_timer: HashMap<TimerId, SubId>,
}

impl<M> Default for SubscriptionManager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> SubscriptionManager<M> {
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
            by_timer: HashMap::new(),
        }
    }

    /// Make the running set match `declared`.
    pub fn reconcile(
        &mut self,
        declared: Vec<Box<dyn Subscription<M>>>,
        queue: &mut TimerQueue,
        now: Duration,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut seen = HashSet::with_capacity(declared.len());

        for sub in declared {
            let id = sub.id();
            if !seen.insert(id) {
                tracing::warn!(target: "vistral.runtime", sub_id = id, "duplicate subscription id ignored");
                continue;
            }
            match self.active.get_mut(&id) {
                // Same identity: keep the timer, take the fresh message factory.
                Some(running) => running.sub = sub,
                None => {
                    let timer = queue.schedule(now, sub.schedule());
                    self.by_timer.insert(timer, id);
                    self.active.insert(
                        id,
                        ActiveSub {
                            sub,
                            timer: Some(timer),
                        },
                    );
                    report.started.push(id);
                }
            }
        }

        let stale: Vec<SubId> = self
            .active
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();
        for id in stale {
            self.stop(id, queue);
            report.stopped.push(id);
        }

        report.started.sort_unstable();
        report.stopped.sort_unstable();
        if !report.is_empty() {
            tracing::debug!(
                target: "vistral.runtime",
                started = ?report.started,
                stopped = ?report.stopped,
                running = self.active.len(),
                "subscriptions reconciled"
            );
        }
        report
    }

    fn stop(&mut self, id: SubId, queue: &mut TimerQueue) {
        if let Some(running) = self.active.remove(&id)
            && let Some(timer) = running.timer
        {
            queue.cancel(timer);
            self.by_timer.remove(&timer);
        }
    }

    /// Message for a fired timer, or `None` if no running subscription owns it.
    pub fn dispatch(&mut self, fired: Fired) -> Option<M> {
        let id = *self.by_timer.get(&fired.id)?;
        if !fired.repeats {
            self.by_timer.remove(&fired.id);
        }
        let running = self.active.get_mut(&id)?;
        if !fired.repeats {
            running.timer = None;
        }
        Some(running.sub.message(fired.due))
    }

    /// Cancel every running subscription.
    pub fn stop_all(&mut self, queue: &mut TimerQueue) -> Vec<SubId> {
        let mut ids: Vec<SubId> = self.active.keys().copied().collect();
        ids.sort_unstable();
        for &id in &ids {
            self.stop(id, queue);
        }
        ids
    }

    /// Running ids, ascending.
    pub fn active_ids(&self) -> Vec<SubId> {
        let mut ids: Vec<SubId> = self.active.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        Tick(Duration),
        Once,
    }

    fn every(id: SubId, period: u64) -> Box<dyn Subscription<Msg>> {
        Box::new(Every::with_id(id, ms(period), Msg::Tick))
    }

    fn drain(mgr: &mut SubscriptionManager<Msg>, q: &mut TimerQueue, until: Duration) -> Vec<Msg> {
        let mut out = Vec::new();
        while let Some(next) = q.next_deadline().filter(|d| *d <= until) {
            while let Some(fired) = q.pop_due(next) {
                out.extend(mgr.dispatch(fired));
            }
        }
        out
    }

    #[test]
    fn every_ids_differ_by_interval() {
        let a = Every::new(ms(100), Msg::Tick);
        let b = Every::new(ms(200), Msg::Tick);
        assert_ne!(a.id(), b.id());
        assert_ne!(After::new(ms(100), |_| Msg::Once).id(), a.id());
    }

    #[test]
    fn reconcile_starts_keeps_and_stops() {
        let mut q = TimerQueue::new();
        let mut mgr = SubscriptionManager::new();

        let report = mgr.reconcile(vec![every(1, 10), every(2, 20)], &mut q, ms(0));
        assert_eq!(report.started, vec![1, 2]);
        assert_eq!(q.len(), 2);

        let report = mgr.reconcile(vec![every(1, 10), every(2, 20)], &mut q, ms(5));
        assert!(report.is_empty());
        assert_eq!(q.len(), 2);

        let report = mgr.reconcile(vec![every(2, 20)], &mut q, ms(5));
        assert_eq!(report.stopped, vec![1]);
        assert_eq!(q.len(), 1);
        assert_eq!(mgr.active_ids(), vec![2]);
    }

    #[test]
    fn kept_subscription_does_not_restart_its_timer() {
        let mut q = TimerQueue::new();
        let mut mgr = SubscriptionManager::new();
        mgr.reconcile(vec![every(1, 10)], &mut q, ms(0));
        mgr.reconcile(vec![every(1, 10)], &mut q, ms(7));
        assert_eq!(q.next_deadline(), Some(ms(10)));
    }

    #[test]
    fn stopped_subscription_never_delivers() {
        let mut q = TimerQueue::new();
        let mut mgr = SubscriptionManager::new();
        mgr.reconcile(vec![every(1, 10)], &mut q, ms(0));
        assert_eq!(drain(&mut mgr, &mut q, ms(20)), vec![Msg::Tick(ms(10)), Msg::Tick(ms(20))]);
        mgr.reconcile(vec![], &mut q, ms(20));
        assert!(drain(&mut mgr, &mut q, ms(1_000)).is_empty());
        assert!(q.is_empty());
    }

    #[test]
    fn one_shot_stays_spent_while_declared() {
        let mut q = TimerQueue::new();
        let mut mgr = SubscriptionManager::new();
        let once = || -> Box<dyn Subscription<Msg>> { Box::new(After::with_id(9, ms(30), |_| Msg::Once)) };
        mgr.reconcile(vec![once()], &mut q, ms(0));
        assert_eq!(drain(&mut mgr, &mut q, ms(100)), vec![Msg::Once]);
        let report = mgr.reconcile(vec![once()], &mut q, ms(100));
        assert!(report.is_empty());
        assert!(q.is_empty());
        // Undeclare, then declare again: a fresh one-shot.
        mgr.reconcile(vec![], &mut q, ms(100));
        mgr.reconcile(vec![once()], &mut q, ms(100));
        assert_eq!(q.next_deadline(), Some(ms(130)));
    }

    #[test]
    fn duplicate_ids_schedule_once() {
        let mut q = TimerQueue::new();
        let mut mgr = SubscriptionManager::new();
        mgr.reconcile(vec![every(4, 10), every(4, 10)], &mut q, ms(0));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn mapped_wraps_messages_and_keeps_identity() {
        #[derive(Debug, PartialEq)]
        struct Outer(Msg);
        let subs = map(vec![every(3, 10)], Outer);
        assert_eq!(subs[0].id(), 3);
        assert_eq!(subs[0].schedule(), Schedule::Every(ms(10)));
        assert_eq!(subs[0].message(ms(10)), Outer(Msg::Tick(ms(10))));
    }

    #[test]
    fn stop_all_cancels_timers() {
        let mut q = TimerQueue::new();
        let mut mgr = SubscriptionManager::new();
        mgr.reconcile(vec![every(1, 10), every(2, 10)], &mut q, ms(0));
        assert_eq!(mgr.stop_all(&mut q), vec![1, 2]);
        assert!(mgr.is_empty());
        assert!(q.is_empty());
    }

    #[test]
    fn animation_frame_uses_frame_schedule() {
        let frame = AnimationFrame::new(Msg::Tick);
        assert_eq!(frame.schedule(), Schedule::Frame);
    }
}
