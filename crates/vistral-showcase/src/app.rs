#![forbid(unsafe_code)]

//! Main application model, message routing, and screen navigation.
//!
//! [`AppModel`] implements the Elm architecture via [`Model`]. It owns the
//! four screens, routes events to the current one, handles global
//! keybindings, and renders the chrome (sidebar, status bar, help overlay).
//!
//! Only the current screen is active. Switching deactivates the old screen
//! before the new one is reinitialized, and only the current screen's
//! subscriptions are declared, so the old screen's timers are cancelled by
//! the reconcile that follows the switch.

use std::time::Duration;

use serde_json::json;
use tracing::info;
use vistral_core::event::{Event, KeyCode};
use vistral_core::geometry::Rect;
use vistral_render::frame::Frame;
use vistral_runtime::subscription::map;
use vistral_runtime::{After, Cmd, Model, Subscription};

use crate::chrome;
use crate::diagnostics;
use crate::rng::SeededRng;
use crate::screens::axis_stream::{AxisMsg, AxisStream};
use crate::screens::frame_snapshots::{FrameMsg, FrameSnapshots};
use crate::screens::home::{Home, HomeMsg};
use crate::screens::key_updates::{KeyMsg, KeyUpdates};
use crate::screens::{HelpEntry, Screen, screen_meta, sub_id};
use crate::theme;

// ---------------------------------------------------------------------------
// ScreenId
// ---------------------------------------------------------------------------

/// Identifies which screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    /// Grammar layers and the connector curve.
    Home,
    /// Case 1: streaming particles.
    Axis,
    /// Case 2: snapshots.
    Frame,
    /// Case 3: mutable per-key state.
    Key,
}

impl ScreenId {
    /// All screens in display order.
    pub const ALL: &[ScreenId] = &[Self::Home, Self::Axis, Self::Frame, Self::Key];

    /// 0-based index in the ALL array.
    pub const fn index(self) -> usize {
        match self {
            Self::Home => 0,
            Self::Axis => 1,
            Self::Frame => 2,
            Self::Key => 3,
        }
    }

    /// Next screen (wraps around).
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous screen (wraps around).
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn title(self) -> &'static str {
        screen_meta(self).title
    }

    /// 1-based screen number, as used by the number keys and `--screen`.
    pub fn from_number(n: u16) -> Option<Self> {
        let idx = usize::from(n).checked_sub(1)?;
        Self::ALL.get(idx).copied()
    }

    /// Map number key to screen: '1'..='4'.
    pub fn from_number_key(ch: char) -> Option<Self> {
        let n = ch.to_digit(10)?;
        Self::from_number(n as u16)
    }
}

// ---------------------------------------------------------------------------
// ScreenStates
// ---------------------------------------------------------------------------

/// Holds the state for every screen.
#[derive(Debug, Clone)]
pub struct ScreenStates {
    pub home: Home,
    pub axis: AxisStream,
    pub frame: FrameSnapshots,
    pub key: KeyUpdates,
}

impl ScreenStates {
    /// Each randomized screen gets its own stream forked from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = SeededRng::new(seed);
        Self {
            home: Home::new(),
            axis: AxisStream::new(rng.fork(1).next_u64()),
            frame: FrameSnapshots::new(),
            key: KeyUpdates::new(rng.fork(2).next_u64()),
        }
    }

    fn activate(&mut self, id: ScreenId) -> Cmd<AppMsg> {
        match id {
            ScreenId::Home => self.home.activate().map(AppMsg::Home),
            ScreenId::Axis => self.axis.activate().map(AppMsg::Axis),
            ScreenId::Frame => self.frame.activate().map(AppMsg::Frame),
            ScreenId::Key => self.key.activate().map(AppMsg::Key),
        }
    }

    fn deactivate(&mut self, id: ScreenId) {
        match id {
            ScreenId::Home => self.home.deactivate(),
            ScreenId::Axis => self.axis.deactivate(),
            ScreenId::Frame => self.frame.deactivate(),
            ScreenId::Key => self.key.deactivate(),
        }
    }

    fn resize(&mut self, id: ScreenId, area: Rect) -> Cmd<AppMsg> {
        match id {
            ScreenId::Home => self.home.resize(area).map(AppMsg::Home),
            ScreenId::Axis => self.axis.resize(area).map(AppMsg::Axis),
            ScreenId::Frame => self.frame.resize(area).map(AppMsg::Frame),
            ScreenId::Key => self.key.resize(area).map(AppMsg::Key),
        }
    }

    /// Forward an event to the screen identified by `id`.
    fn update(&mut self, id: ScreenId, event: &Event) -> Cmd<AppMsg> {
        match id {
            ScreenId::Home => self.home.update(event).map(AppMsg::Home),
            ScreenId::Axis => self.axis.update(event).map(AppMsg::Axis),
            ScreenId::Frame => self.frame.update(event).map(AppMsg::Frame),
            ScreenId::Key => self.key.update(event).map(AppMsg::Key),
        }
    }

    fn view(&self, id: ScreenId, frame: &mut Frame, area: Rect) {
        match id {
            ScreenId::Home => self.home.view(frame, area),
            ScreenId::Axis => self.axis.view(frame, area),
            ScreenId::Frame => self.frame.view(frame, area),
            ScreenId::Key => self.key.view(frame, area),
        }
    }

    fn subscriptions(&self, id: ScreenId) -> Vec<Box<dyn Subscription<AppMsg>>> {
        match id {
            ScreenId::Home => map(self.home.subscriptions(), AppMsg::Home),
            ScreenId::Axis => map(self.axis.subscriptions(), AppMsg::Axis),
            ScreenId::Frame => map(self.frame.subscriptions(), AppMsg::Frame),
            ScreenId::Key => map(self.key.subscriptions(), AppMsg::Key),
        }
    }

    fn keybindings(&self, id: ScreenId) -> Vec<HelpEntry> {
        match id {
            ScreenId::Home => self.home.keybindings(),
            ScreenId::Axis => self.axis.keybindings(),
            ScreenId::Frame => self.frame.keybindings(),
            ScreenId::Key => self.key.keybindings(),
        }
    }

    /// Whether screen `id` currently considers itself active.
    pub fn is_active(&self, id: ScreenId) -> bool {
        match id {
            ScreenId::Home => self.home.is_active(),
            ScreenId::Axis => self.axis.is_active(),
            ScreenId::Frame => self.frame.is_active(),
            ScreenId::Key => self.key.is_active(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppMsg
// ---------------------------------------------------------------------------

/// Top-level application message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMsg {
    /// A raw terminal event forwarded to the current screen.
    ScreenEvent(Event),
    SwitchScreen(ScreenId),
    NextScreen,
    PrevScreen,
    ToggleHelp,
    Resize {
        width: u16,
        height: u16,
    },
    Home(HomeMsg),
    Axis(AxisMsg),
    Frame(FrameMsg),
    Key(KeyMsg),
    Quit,
}

impl From<Event> for AppMsg {
    fn from(event: Event) -> Self {
        if let Event::Resize { width, height } = event {
            return Self::Resize { width, height };
        }

        Self::ScreenEvent(event)
    }
}

// ---------------------------------------------------------------------------
// AppModel
// ---------------------------------------------------------------------------

/// Size assumed until the first resize arrives.
pub const DEFAULT_SIZE: (u16, u16) = (120, 36);

const EXIT_SUB: u8 = 0xFF;

/// Top-level application state.
pub struct AppModel {
    pub current_screen: ScreenId,
    pub screens: ScreenStates,
    pub help_visible: bool,
    /// Quit automatically after this long; 0 disables.
    pub exit_after_ms: u64,
    /// Terminal size, (columns, rows).
    pub size: (u16, u16),
    switches: u64,
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new(0)
    }
}

impl AppModel {
    pub fn new(seed: u64) -> Self {
        Self {
            current_screen: ScreenId::Home,
            screens: ScreenStates::new(seed),
            help_visible: false,
            exit_after_ms: 0,
            size: DEFAULT_SIZE,
            switches: 0,
        }
    }

    #[must_use]
    pub fn with_start_screen(mut self, id: ScreenId) -> Self {
        self.current_screen = id;
        self
    }

    #[must_use]
    pub fn with_exit_after_ms(mut self, ms: u64) -> Self {
        self.exit_after_ms = ms;
        self
    }

    /// Number of completed screen switches.
    pub fn switch_count(&self) -> u64 {
        self.switches
    }

    fn full_area(&self) -> Rect {
        Rect::from_size(self.size.0, self.size.1)
    }

    /// Area handed to the current screen.
    pub fn content_area(&self) -> Rect {
        chrome::layout(self.full_area()).content
    }

    fn switch_to(&mut self, id: ScreenId) -> Cmd<AppMsg> {
        let from = self.current_screen;
        if id == from {
            return Cmd::none();
        }
        self.screens.deactivate(from);
        self.current_screen = id;
        self.switches += 1;
        info!(
            target: "vistral.app",
            from = from.title(),
            to = id.title(),
            "screen switch"
        );
        diagnostics::emit_jsonl(
            "screen_switch",
            json!({ "from": from.title(), "to": id.title(), "seq": self.switches }),
        );
        let activated = self.screens.activate(id);
        let resized = self.screens.resize(id, self.content_area());
        Cmd::batch(vec![activated, resized])
    }

    fn handle_event(&mut self, event: Event) -> Cmd<AppMsg> {
        let Event::Key(key) = &event else {
            return self.screens.update(self.current_screen, &event);
        };
        if !key.is_press() {
            return Cmd::none();
        }
        if self.help_visible && matches!(key.code, KeyCode::Escape | KeyCode::Char('?')) {
            self.help_visible = false;
            return Cmd::none();
        }
        if key.ctrl() && key.is_char('c') {
            return Cmd::msg(AppMsg::Quit);
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Escape => Cmd::msg(AppMsg::Quit),
            KeyCode::Char('?') => Cmd::msg(AppMsg::ToggleHelp),
            KeyCode::Tab => Cmd::msg(AppMsg::NextScreen),
            KeyCode::BackTab => Cmd::msg(AppMsg::PrevScreen),
            KeyCode::Char(ch) => match ScreenId::from_number_key(ch) {
                Some(id) => Cmd::msg(AppMsg::SwitchScreen(id)),
                None => self.screens.update(self.current_screen, &event),
            },
            _ => self.screens.update(self.current_screen, &event),
        }
    }
}

impl Model for AppModel {
    type Message = AppMsg;

    fn init(&mut self) -> Cmd<AppMsg> {
        info!(
            target: "vistral.app",
            screen = self.current_screen.title(),
            "showcase started"
        );
        let activated = self.screens.activate(self.current_screen);
        let resized = self
            .screens
            .resize(self.current_screen, self.content_area());
        Cmd::batch(vec![activated, resized])
    }

    fn update(&mut self, msg: AppMsg) -> Cmd<AppMsg> {
        match msg {
            AppMsg::Quit => {
                info!(target: "vistral.app", "quit requested");
                self.screens.deactivate(self.current_screen);
                Cmd::quit()
            }
            AppMsg::ScreenEvent(event) => self.handle_event(event),
            AppMsg::SwitchScreen(id) => self.switch_to(id),
            AppMsg::NextScreen => self.switch_to(self.current_screen.next()),
            AppMsg::PrevScreen => self.switch_to(self.current_screen.prev()),
            AppMsg::ToggleHelp => {
                self.help_visible = !self.help_visible;
                Cmd::none()
            }
            AppMsg::Resize { width, height } => {
                self.size = (width, height);
                self.screens
                    .resize(self.current_screen, self.content_area())
            }
            AppMsg::Home(m) => self.screens.home.handle(m).map(AppMsg::Home),
            AppMsg::Axis(m) => self.screens.axis.handle(m).map(AppMsg::Axis),
            AppMsg::Frame(m) => self.screens.frame.handle(m).map(AppMsg::Frame),
            AppMsg::Key(m) => self.screens.key.handle(m).map(AppMsg::Key),
        }
    }

    fn view(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.buffer.fill(area, theme::fill(theme::bg::DEEP));
        let layout = chrome::layout(area);
        if let Some(sidebar) = layout.sidebar {
            chrome::render_sidebar(self.current_screen, frame, sidebar);
        }
        self.screens.view(self.current_screen, frame, layout.content);
        chrome::render_status_bar(self.current_screen, frame, layout.status);
        if self.help_visible {
            let bindings = self.screens.keybindings(self.current_screen);
            chrome::render_help_overlay(self.current_screen, &bindings, frame, area);
        }
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<AppMsg>>> {
        let mut subs = self.screens.subscriptions(self.current_screen);
        if self.exit_after_ms > 0 {
            subs.push(Box::new(After::with_id(
                sub_id(EXIT_SUB, 0, 0),
                Duration::from_millis(self.exit_after_ms),
                |_| AppMsg::Quit,
            )));
        }
        subs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
