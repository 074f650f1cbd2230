#![forbid(unsafe_code)]

//! Terminal session lifecycle guard.
//!
//! [`TerminalSession`] enters raw mode (and optionally the alternate screen)
//! on construction and restores the terminal on drop, in reverse order:
//!
//! 1. Disable focus events (if enabled)
//! 2. Show cursor
//! 3. Leave alternate screen (if entered)
//! 4. Exit raw mode
//! 5. Flush stdout
//!
//! With `panic = "abort"` drop does not run on panic, so SIGINT/SIGTERM are
//! routed to a flag the event loop polls instead of killing the process
//! mid-frame.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::event::Event;

/// What the session should switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Use the alternate screen buffer.
    pub alternate_screen: bool,
    /// Report focus gained/lost.
    pub focus_events: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            focus_events: true,
        }
    }
}

/// RAII guard over terminal modes.
#[derive(Debug)]
pub struct TerminalSession {
    options: SessionOptions,
    alternate_screen_enabled: bool,
    focus_events_enabled: bool,
    terminate: Arc<AtomicBool>,
}

impl TerminalSession {
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        let mut session = Self {
            options,
            alternate_screen_enabled: false,
            focus_events_enabled: false,
            terminate: Arc::new(AtomicBool::new(false)),
        };

        let mut stdout = io::stdout();
        if options.alternate_screen {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
            session.alternate_screen_enabled = true;
        }
        if options.focus_events {
            crossterm::execute!(stdout, crossterm::event::EnableFocusChange)?;
            session.focus_events_enabled = true;
        }
        crossterm::execute!(stdout, crossterm::cursor::Hide)?;

        #[cfg(unix)]
        for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&session.terminate))?;
        }

        crate::debug!(
            target: "vistral.session",
            alternate_screen = options.alternate_screen,
            "terminal session started"
        );
        Ok(session)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Current terminal size in cells.
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    /// Wait up to `timeout` for input. Returns `true` if an event is ready.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<bool> {
        crossterm::event::poll(timeout)
    }

    /// Read one event; `None` for events the runtime ignores.
    pub fn read_event(&self) -> io::Result<Option<Event>> {
        crossterm::event::read().map(Event::from_crossterm)
    }

    /// Whether SIGINT/SIGTERM arrived since the session started.
    pub fn termination_requested(&self) -> bool {
        self.terminate.load(Ordering::Relaxed)
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();
        if self.focus_events_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableFocusChange);
            self.focus_events_enabled = false;
        }
        let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
        if self.alternate_screen_enabled {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
        }
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}
