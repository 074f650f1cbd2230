#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] without a terminal and with a manual
//! clock. Time only moves when the test calls [`advance`](ProgramSimulator::advance),
//! and it moves deadline by deadline: every timer that falls inside the
//! window fires at its own due time, in `(due, id)` order, with the
//! subscription set reconciled after each message.
//!
//! # Example
//!
//! ```ignore
//! use vistral_runtime::simulator::ProgramSimulator;
//!
//! let mut sim = ProgramSimulator::new(Ticker::default());
//! sim.init();
//! sim.advance(Duration::from_millis(2_500));
//! assert_eq!(sim.model().ticks, 2);
//!
//! let buf = sim.capture_frame(80, 24);
//! assert!(buf.contains_text("ticks: 2"));
//! ```

use std::time::Duration;

use vistral_core::event::Event;
use vistral_render::buffer::Buffer;
use vistral_render::frame::Frame;

use crate::clock::{Clock, ManualClock};
use crate::program::{Cmd, Model};
use crate::subscription::{ReconcileReport, SubId, SubscriptionManager};
use crate::timer::TimerQueue;

/// Record of a command that was executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    None,
    Quit,
    /// Message fed back to the model (not stored).
    Msg,
    Batch(usize),
    Log(String),
}

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    model: M,
    clock: ManualClock,
    timers: TimerQueue,
    subs: SubscriptionManager<M::Message>,
    frames: Vec<Buffer>,
    command_log: Vec<CmdRecord>,
    reconciles: Vec<(Duration, ReconcileReport)>,
    logs: Vec<String>,
    running: bool,
}

impl<M: Model> ProgramSimulator<M> {
    /// Create a simulator. The model is not initialized until [`init`](Self::init).
    pub fn new(model: M) -> Self {
        Self::with_frame_interval(model, TimerQueue::DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(model: M, frame_interval: Duration) -> Self {
        Self {
            model,
            clock: ManualClock::new(),
            timers: TimerQueue::with_frame_interval(frame_interval),
            subs: SubscriptionManager::new(),
            frames: Vec::new(),
            command_log: Vec::new(),
            reconciles: Vec::new(),
            logs: Vec::new(),
            running: true,
        }
    }

    /// Call `Model::init()`, execute its commands and start its subscriptions.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.reconcile();
    }

    /// Feed terminal events through `From<Event>` and `update`.
    pub fn inject_events(&mut self, events: &[Event]) {
        for event in events {
            if !self.running {
                break;
            }
            self.apply(M::Message::from(event.clone()));
        }
    }

    pub fn inject_event(&mut self, event: Event) {
        self.inject_events(&[event]);
    }

    /// Send a message directly to `update`.
    pub fn send(&mut self, msg: M::Message) {
        if self.running {
            self.apply(msg);
        }
    }

    /// Move the clock forward by `dt`, firing every timer due on the way.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.clock.now().saturating_add(dt);
        self.advance_to(target);
    }

    /// Move the clock to `target` (no-op if it is in the past).
    pub fn advance_to(&mut self, target: Duration) {
        while self.running {
            let Some(deadline) = self.timers.next_deadline().filter(|d| *d <= target) else {
                break;
            };
            self.clock.set(deadline);
            while self.running
                && let Some(fired) = self.timers.pop_due(deadline)
            {
                if let Some(msg) = self.subs.dispatch(fired) {
                    self.apply(msg);
                }
            }
        }
        self.clock.set(target);
    }

    /// Current simulated time since start.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Render the model at the given size and keep the buffer.
    pub fn capture_frame(&mut self, width: u16, height: u16) -> &Buffer {
        let mut frame = Frame::new(width, height);
        self.model.view(&mut frame);
        self.frames.push(frame.into_buffer());
        &self.frames[self.frames.len() - 1]
    }

    pub fn frames(&self) -> &[Buffer] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Buffer> {
        self.frames.last()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// `false` once a `Cmd::Quit` has executed.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Lines emitted via `Cmd::Log`.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Every non-empty reconcile pass, stamped with the simulated time.
    pub fn reconcile_log(&self) -> &[(Duration, ReconcileReport)] {
        &self.reconciles
    }

    /// Ids of the running subscriptions, ascending.
    pub fn active_subscriptions(&self) -> Vec<SubId> {
        self.subs.active_ids()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    fn apply(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
        self.reconcile();
    }

    fn reconcile(&mut self) {
        if !self.running {
            self.subs.stop_all(&mut self.timers);
            return;
        }
        let declared = self.model.subscriptions();
        let now = self.clock.now();
        let report = self.subs.reconcile(declared, &mut self.timers, now);
        if !report.is_empty() {
            self.reconciles.push((now, report));
        }
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => self.command_log.push(CmdRecord::None),
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{After, AnimationFrame, Every, Subscription};
    use vistral_core::event::KeyCode;
    use vistral_render::cell::Cell;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[derive(Default)]
    struct Ticker {
        ticks: Vec<Duration>,
        frames: usize,
        animating: bool,
        armed: bool,
        fired_once: Option<Duration>,
        ticking: bool,
    }

    #[derive(Debug)]
    enum Msg {
        Tick(Duration),
        Frame,
        Once(Duration),
        Toggle,
        Animate,
        Quit,
        Noop,
    }

    impl From<Event> for Msg {
        fn from(event: Event) -> Self {
            match event {
                Event::Key(k) if k.is_char('t') => Msg::Toggle,
                Event::Key(k) if k.is_char('a') => Msg::Animate,
                Event::Key(k) if k.is_char('q') => Msg::Quit,
                _ => Msg::Noop,
            }
        }
    }

    impl Model for Ticker {
        type Message = Msg;

        fn init(&mut self) -> Cmd<Msg> {
            self.ticking = true;
            Cmd::log("ready")
        }

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Tick(at) => {
                    self.ticks.push(at);
                    Cmd::none()
                }
                Msg::Frame => {
                    self.frames += 1;
                    if self.frames >= 3 {
                        self.animating = false;
                    }
                    Cmd::none()
                }
                Msg::Once(at) => {
                    self.fired_once = Some(at);
                    Cmd::none()
                }
                Msg::Toggle => {
                    self.ticking = !self.ticking;
                    Cmd::none()
                }
                Msg::Animate => {
                    self.animating = true;
                    self.armed = true;
                    Cmd::none()
                }
                Msg::Quit => Cmd::quit(),
                Msg::Noop => Cmd::none(),
            }
        }

        fn view(&self, frame: &mut Frame) {
            for (i, ch) in format!("ticks: {}", self.ticks.len()).chars().enumerate() {
                frame.buffer.set(i as u16, 0, Cell::from_char(ch));
            }
        }

        fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
            let mut subs: Vec<Box<dyn Subscription<Msg>>> = Vec::new();
            if self.ticking {
                subs.push(Box::new(Every::with_id(1, ms(1_000), Msg::Tick)));
            }
            if self.animating {
                subs.push(Box::new(AnimationFrame::with_id(2, |_| Msg::Frame)));
            }
            if self.armed {
                subs.push(Box::new(After::with_id(3, ms(100), Msg::Once)));
            }
            subs
        }
    }

    fn sim() -> ProgramSimulator<Ticker> {
        let mut sim = ProgramSimulator::new(Ticker::default());
        sim.init();
        sim
    }

    #[test]
    fn init_starts_subscriptions_and_logs() {
        let sim = sim();
        assert_eq!(sim.active_subscriptions(), vec![1]);
        assert_eq!(sim.logs(), ["ready".to_string()]);
        assert_eq!(sim.next_deadline(), Some(ms(1_000)));
    }

    #[test]
    fn advance_stamps_messages_with_due_time() {
        let mut sim = sim();
        sim.advance(ms(3_500));
        assert_eq!(sim.model().ticks, vec![ms(1_000), ms(2_000), ms(3_000)]);
        assert_eq!(sim.now(), ms(3_500));
    }

    #[test]
    fn advancing_in_small_steps_matches_one_big_step() {
        let mut a = sim();
        a.advance(ms(5_000));
        let mut b = sim();
        for _ in 0..50 {
            b.advance(ms(100));
        }
        assert_eq!(a.model().ticks, b.model().ticks);
    }

    #[test]
    fn undeclared_subscription_stops_immediately() {
        let mut sim = sim();
        sim.advance(ms(1_500));
        sim.inject_event(Event::key(KeyCode::Char('t')));
        assert!(sim.active_subscriptions().is_empty());
        assert_eq!(sim.pending_timers(), 0);
        sim.advance(ms(10_000));
        assert_eq!(sim.model().ticks, vec![ms(1_000)]);
    }

    #[test]
    fn animation_frame_stops_itself() {
        let mut sim = sim();
        sim.inject_event(Event::key(KeyCode::Char('a')));
        sim.advance(ms(200));
        assert_eq!(sim.model().frames, 3);
        assert_eq!(sim.model().fired_once, Some(ms(100)));
        // Spent one-shot stays registered, but holds no timer.
        assert_eq!(sim.active_subscriptions(), vec![1, 3]);
        assert_eq!(sim.pending_timers(), 1);
    }

    #[test]
    fn quit_stops_time_and_subscriptions() {
        let mut sim = sim();
        sim.inject_event(Event::key(KeyCode::Char('q')));
        assert!(!sim.is_running());
        assert!(sim.active_subscriptions().is_empty());
        sim.advance(ms(5_000));
        assert!(sim.model().ticks.is_empty());
        assert!(sim.command_log().contains(&CmdRecord::Quit));
    }

    #[test]
    fn capture_frame_renders_view() {
        let mut sim = sim();
        sim.advance(ms(2_000));
        let buf = sim.capture_frame(20, 2);
        assert!(buf.contains_text("ticks: 2"));
        assert_eq!(sim.frame_count(), 1);
    }

    #[test]
    fn reconcile_log_records_changes() {
        let mut sim = sim();
        sim.advance(ms(250));
        sim.inject_event(Event::key(KeyCode::Char('t')));
        let log = sim.reconcile_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].1.started, vec![1]);
        assert_eq!(log[1].0, ms(250));
        assert_eq!(log[1].1.stopped, vec![1]);
    }
}
