#![forbid(unsafe_code)]

//! Model/update/view and the terminal event loop.
//!
//! The loop is single-threaded. Each iteration:
//!
//! 1. Render if anything changed since the last frame.
//! 2. Wait for input, but never past the next timer deadline.
//! 3. Turn input into a message and run `update`.
//! 4. Pop every timer that came due and run `update` for each.
//!
//! After every `update` the declared subscriptions are reconciled before the
//! next message is processed, so a timer the model stopped declaring can no
//! longer reach it.

use std::io;
use std::time::Duration;

use vistral_core::event::Event;
use vistral_core::terminal_session::{SessionOptions, TerminalSession};
use vistral_render::frame::Frame;
use vistral_render::presenter::Presenter;

use crate::clock::{Clock, MonotonicClock};
use crate::error::{Error, Result};
use crate::subscription::{Subscription, SubscriptionManager};
use crate::timer::TimerQueue;

/// The application: state plus how it reacts and renders.
pub trait Model: Sized {
    /// Messages that drive `update`. Terminal events convert into it.
    type Message: From<Event> + 'static;

    /// Called once before the first frame.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    fn view(&self, frame: &mut Frame);

    /// The timers that should be running right now.
    ///
    /// Consulted after `init()` and after every `update()`. Ids missing from
    /// the returned set are stopped; an empty vec stops everything.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }
}

/// Side effects returned from `init` and `update`.
pub enum Cmd<M> {
    None,
    Quit,
    /// Feed a message straight back into `update`.
    Msg(M),
    /// Run in order, stopping early on `Quit`.
    Batch(Vec<Cmd<M>>),
    /// Record a line in the application log.
    Log(String),
}

impl<M> Default for Cmd<M> {
    fn default() -> Self {
        Self::None
    }
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
        }
    }
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn log(text: impl Into<String>) -> Self {
        Self::Log(text.into())
    }

    /// Combine commands, dropping no-ops. Collapses to a single command when possible.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Stable name for tracing.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Msg(_) => "Msg",
            Self::Batch(_) => "Batch",
            Self::Log(_) => "Log",
        }
    }

    /// Wrap a child component's command into the parent's message type.
    pub fn map<N>(self, f: fn(M) -> N) -> Cmd<N> {
        match self {
            Self::None => Cmd::None,
            Self::Quit => Cmd::Quit,
            Self::Msg(m) => Cmd::Msg(f(m)),
            Self::Batch(cmds) => Cmd::Batch(cmds.into_iter().map(|c| c.map(f)).collect()),
            Self::Log(text) => Cmd::Log(text),
        }
    }
}

/// Runtime knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Period of `AnimationFrame` subscriptions.
    pub frame_interval: Duration,
    /// Longest input wait when no timer is pending.
    pub idle_poll: Duration,
    pub alt_screen: bool,
    /// Smallest usable terminal, (columns, rows).
    pub min_size: (u16, u16),
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            frame_interval: TimerQueue::DEFAULT_FRAME_INTERVAL,
            idle_poll: Duration::from_millis(250),
            alt_screen: true,
            min_size: (40, 12),
        }
    }
}

/// Drives a [`Model`] against the real terminal.
pub struct Program<M: Model> {
    model: M,
    config: ProgramConfig,
    clock: MonotonicClock,
    timers: TimerQueue,
    subs: SubscriptionManager<M::Message>,
    running: bool,
    dirty: bool,
    size: (u16, u16),
}

impl<M: Model> Program<M> {
    pub fn new(model: M) -> Self {
        Self::with_config(model, ProgramConfig::default())
    }

    pub fn with_config(model: M, config: ProgramConfig) -> Self {
        Self {
            model,
            config,
            clock: MonotonicClock::new(),
            timers: TimerQueue::with_frame_interval(config.frame_interval),
            subs: SubscriptionManager::new(),
            running: true,
            dirty: true,
            size: (0, 0),
        }
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Run until the model quits or the process is asked to terminate.
    ///
    /// The terminal is restored on every exit path, including errors.
    pub fn run(mut self) -> Result<M> {
        let session = TerminalSession::new(SessionOptions {
            alternate_screen: self.config.alt_screen,
            focus_events: true,
        })?;

        let (width, height) = session.size()?;
        let (min_width, min_height) = self.config.min_size;
        if width < min_width || height < min_height {
            return Err(Error::TerminalTooSmall {
                width,
                height,
                min_width,
                min_height,
            });
        }
        self.size = (width, height);

        let _span = tracing::info_span!(target: "vistral.runtime", "program").entered();
        tracing::info!(target: "vistral.runtime", width, height, "program started");

        let mut presenter = Presenter::new(io::stdout());
        let cmd = self.model.init();
        self.execute(cmd);
        self.reconcile();
        self.handle(M::Message::from(Event::Resize { width, height }));

        while self.running {
            if session.termination_requested() {
                tracing::info!(target: "vistral.runtime", "termination signal received");
                break;
            }
            if self.dirty {
                self.render(&mut presenter)?;
            }

            let now = self.clock.now();
            let timeout = self
                .timers
                .next_deadline()
                .map_or(self.config.idle_poll, |due| due.saturating_sub(now))
                .min(self.config.idle_poll);

            if session.poll_event(timeout)?
                && let Some(event) = session.read_event()?
            {
                if let Event::Resize { width, height } = event {
                    self.size = (width, height);
                    presenter.invalidate();
                }
                self.handle(M::Message::from(event));
            }

            let now = self.clock.now();
            while self.running
                && let Some(fired) = self.timers.pop_due(now)
            {
                if let Some(msg) = self.subs.dispatch(fired) {
                    self.handle(msg);
                }
            }
        }

        let stopped = self.subs.stop_all(&mut self.timers);
        tracing::info!(
            target: "vistral.runtime",
            stopped = stopped.len(),
            "program stopped"
        );
        drop(presenter);
        drop(session);
        Ok(self.model)
    }

    fn handle(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.execute(cmd);
        self.reconcile();
        self.dirty = true;
    }

    fn execute(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(m) => {
                let cmd = self.model.update(m);
                self.execute(cmd);
            }
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Log(text) => tracing::info!(target: "vistral.app", "{text}"),
        }
    }

    fn reconcile(&mut self) {
        let declared = self.model.subscriptions();
        let now = self.clock.now();
        self.subs.reconcile(declared, &mut self.timers, now);
    }

    fn render(&mut self, presenter: &mut Presenter<io::Stdout>) -> Result<()> {
        let mut frame = Frame::new(self.size.0, self.size.1);
        self.model.view(&mut frame);
        presenter.present(&frame.buffer)?;
        match frame.cursor_position {
            Some((x, y)) => presenter.show_cursor_at(x, y)?,
            None => presenter.hide_cursor()?,
        }
        self.dirty = false;
        Ok(())
    }
}
