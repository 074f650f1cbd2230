#![forbid(unsafe_code)]

//! Screen modules for the showcase.
//!
//! Each screen implements the [`Screen`] trait. The app forwards terminal
//! events to the current screen only, and only the current screen's
//! subscriptions are declared, so a screen that is not on display has no
//! timers at all.
//!
//! # Activation
//!
//! Switching away calls [`Screen::deactivate`]; switching back calls
//! [`Screen::activate`], which must rebuild the screen's state from scratch
//! before any timer is declared. Every activation bumps a generation counter
//! that is folded into the screen's subscription ids and stamped on its
//! timer messages, so a message from an earlier activation is recognizably
//! stale and dropped.

pub mod axis_stream;
pub mod frame_snapshots;
pub mod home;
pub mod key_updates;

use vistral_core::event::Event;
use vistral_core::geometry::Rect;
use vistral_render::frame::Frame;
use vistral_runtime::{Cmd, SubId, Subscription};

use crate::app::ScreenId;

/// Registry metadata describing a screen.
#[derive(Debug, Clone, Copy)]
pub struct ScreenMeta {
    pub id: ScreenId,
    pub title: &'static str,
    /// Second line of the navigation entry.
    pub sub_label: &'static str,
    pub hotkey: &'static str,
}

/// Single source of truth for screen order and labels.
pub const SCREEN_REGISTRY: &[ScreenMeta] = &[
    ScreenMeta {
        id: ScreenId::Home,
        title: "Home",
        sub_label: "Overview",
        hotkey: "1",
    },
    ScreenMeta {
        id: ScreenId::Axis,
        title: "Axis Binding",
        sub_label: "Case 1: Stream",
        hotkey: "2",
    },
    ScreenMeta {
        id: ScreenId::Frame,
        title: "Frame Binding",
        sub_label: "Case 2: Snapshots",
        hotkey: "3",
    },
    ScreenMeta {
        id: ScreenId::Key,
        title: "Key-based Updates",
        sub_label: "Case 3: Mutable State",
        hotkey: "4",
    },
];

/// Metadata for `id`.
pub fn screen_meta(id: ScreenId) -> &'static ScreenMeta {
    // The registry lists every ScreenId in declaration order.
    &SCREEN_REGISTRY[id.index()]
}

/// A help overlay entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpEntry {
    /// Key label (e.g. "Space", "c").
    pub key: &'static str,
    pub action: &'static str,
}

/// Build a subscription id unique to one screen, one activation and one slot.
///
/// Layout: 8 bits screen, 28 bits generation, 28 bits slot.
pub const fn sub_id(screen: u8, generation: u64, slot: u64) -> SubId {
    ((screen as u64) << 56) | ((generation & 0x0FFF_FFFF) << 28) | (slot & 0x0FFF_FFFF)
}

/// Trait for showcase screens.
pub trait Screen {
    /// Message type for this screen (wrapped by the top-level `AppMsg`).
    type Message: 'static;

    /// Handle a terminal event while this screen is current.
    fn update(&mut self, event: &Event) -> Cmd<Self::Message>;

    /// Handle one of the screen's own timer messages.
    fn handle(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Render into `area`.
    fn view(&self, frame: &mut Frame, area: Rect);

    /// The screen became the active view. Reinitializes all state.
    fn activate(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// The screen stopped being the active view. Drops anything in flight.
    fn deactivate(&mut self) {}

    /// The content area changed size.
    fn resize(&mut self, _area: Rect) -> Cmd<Self::Message> {
        Cmd::none()
    }

    fn is_active(&self) -> bool;

    /// Timers this screen needs right now. Empty while inactive.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }

    /// Keybindings specific to this screen for the help overlay.
    fn keybindings(&self) -> Vec<HelpEntry> {
        vec![]
    }

    /// Title shown in the heading and status bar.
    fn title(&self) -> &'static str;

    /// Short name for narrow layouts.
    fn tab_label(&self) -> &'static str {
        self.title()
    }
}
