#![forbid(unsafe_code)]

//! Key binding: a fixed set of entities whose latest value is mutated in place.
//!
//! Every cycle has two phases:
//!
//! 1. **Announce** (every [`CADENCE`]): the next key in round-robin order gets
//!    a random value, shown as the pending "Update Event" bubble.
//! 2. **Commit** ([`COMMIT_DELAY`] later): the value lands in that key's row,
//!    the row is highlighted and every other highlight is cleared.
//!
//! The commit timer is keyed by its cycle, so it only exists while its own
//! update is pending. Deactivation drops the pending update, which removes
//! the commit subscription before it can fire.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};
use vistral_core::event::Event;
use vistral_core::geometry::{Rect, Sides};
use vistral_render::cell::StyleFlags;
use vistral_render::drawing::{BorderChars, Draw};
use vistral_render::frame::Frame;
use vistral_runtime::{After, Cmd, Every, Subscription};

use super::{Screen, sub_id};
use crate::diagnostics;
use crate::rng::SeededRng;
use crate::theme::{self, accent, bg, fg};

const SUB_SCREEN: u8 = 4;

/// Entity keys, in announce order.
pub const KEYS: [&str; 3] = ["CPU_USAGE", "MEM_USAGE", "NET_IO"];

const INITIAL_VALUES: [u64; 3] = [45, 62, 120];

/// Time between announces.
pub const CADENCE: Duration = Duration::from_millis(2000);

/// Time from announce to commit.
pub const COMMIT_DELAY: Duration = Duration::from_millis(800);

/// Announced values fall in `[VALUE_MIN, VALUE_MAX)`.
pub const VALUE_MIN: u64 = 10;
pub const VALUE_MAX: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRow {
    pub key: &'static str,
    pub value: u64,
    /// `None` until the first commit after activation.
    pub last_updated: Option<Duration>,
    pub highlight: bool,
}

impl EntityRow {
    /// Short id column: the key's first three characters.
    pub fn short_id(&self) -> String {
        let head: String = self.key.chars().take(3).collect();
        format!("{head}...")
    }
}

/// An announced value waiting for its commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingUpdate {
    pub key: &'static str,
    pub value: u64,
    pub cycle: u64,
    pub announced_at: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMsg {
    Announce { generation: u64, now: Duration },
    Commit { generation: u64, cycle: u64, now: Duration },
}

#[derive(Debug, Clone)]
pub struct KeyUpdates {
    rows: Vec<EntityRow>,
    pending: Option<PendingUpdate>,
    step: u64,
    commits: u64,
    active: bool,
    generation: u64,
    seed: u64,
    rng: SeededRng,
}

fn initial_rows() -> Vec<EntityRow> {
    KEYS.iter()
        .zip(INITIAL_VALUES)
        .map(|(&key, value)| EntityRow {
            key,
            value,
            last_updated: None,
            highlight: false,
        })
        .collect()
}

impl KeyUpdates {
    pub fn new(seed: u64) -> Self {
        Self {
            rows: initial_rows(),
            pending: None,
            step: 0,
            commits: 0,
            active: false,
            generation: 0,
            seed,
            rng: SeededRng::new(seed),
        }
    }

    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    pub fn pending(&self) -> Option<&PendingUpdate> {
        self.pending.as_ref()
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn highlighted(&self) -> Option<&EntityRow> {
        self.rows.iter().find(|r| r.highlight)
    }

    /// Start a cycle: pick the next key and a value.
    pub fn announce(&mut self, now: Duration) -> &PendingUpdate {
        let key = KEYS[(self.step % KEYS.len() as u64) as usize];
        let value = self.rng.next_range(VALUE_MIN, VALUE_MAX);
        let cycle = self.step;
        self.step += 1;
        debug!(target: "vistral.key", key, value, cycle, "update announced");
        self.pending.insert(PendingUpdate {
            key,
            value,
            cycle,
            announced_at: now,
        })
    }

    /// Land the pending update of `cycle`. Anything else is ignored.
    pub fn commit(&mut self, cycle: u64, now: Duration) -> Option<PendingUpdate> {
        let pending = self.pending.take_if(|p| p.cycle == cycle)?;
        for row in &mut self.rows {
            if row.key == pending.key {
                row.value = pending.value;
                row.last_updated = Some(now);
                row.highlight = true;
            } else {
                row.highlight = false;
            }
        }
        self.commits += 1;
        Some(pending)
    }

    fn reset(&mut self) {
        self.rows = initial_rows();
        self.pending = None;
        self.step = 0;
        self.commits = 0;
    }

    fn render_bubble(&self, frame: &mut Frame, area: Rect) {
        let buf = &mut frame.buffer;
        let Some(p) = &self.pending else {
            buf.print_text_clipped(
                area.x,
                area.y + 1,
                "Waiting for the next event...",
                theme::dim(),
                area.right(),
            );
            return;
        };
        let body = format!("{} → {}", p.key, p.value);
        let width = (body.chars().count() as u16 + 6).max(20).min(area.width);
        let bubble = Rect::new(area.x, area.y, width, area.height.min(3));
        buf.draw_box(
            bubble,
            BorderChars::ROUNDED,
            theme::text().with_fg(accent::PRIMARY),
            theme::fill(bg::SURFACE),
        );
        buf.print_text_clipped(
            bubble.x + 2,
            bubble.y,
            " Update Event ",
            theme::emphasis(),
            bubble.right(),
        );
        buf.print_text_clipped(
            bubble.x + 2,
            bubble.y + 1,
            &body,
            theme::text(),
            bubble.right().saturating_sub(1),
        );
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let buf = &mut frame.buffer;
        buf.draw_box(
            area,
            BorderChars::ROUNDED,
            theme::border(),
            theme::fill(bg::SURFACE),
        );
        buf.print_text_clipped(
            area.x + 2,
            area.y,
            " Current State ",
            theme::heading(),
            area.right(),
        );
        let inner = area.inner(Sides::new(1, 2, 1, 2));
        if inner.height < 2 || inner.width < 20 {
            return;
        }
        let cols = [inner.x, inner.x + 9, inner.x + 22, inner.x + 31];
        let header = ["ID", "KEY", "VALUE", "UPDATED"];
        for (x, label) in cols.iter().zip(header) {
            buf.print_text_clipped(*x, inner.y, label, theme::dim(), inner.right());
        }

        for (i, row) in self.rows.iter().enumerate() {
            let y = inner.y + 1 + i as u16;
            if y >= inner.bottom() {
                break;
            }
            let (key_style, value_style) = if row.highlight {
                buf.fill(Rect::new(inner.x, y, inner.width, 1), theme::fill(bg::HIGHLIGHT));
                (
                    theme::text()
                        .with_fg(accent::PRIMARY_LIGHT)
                        .with_flags(StyleFlags::BOLD),
                    theme::emphasis(),
                )
            } else {
                (theme::text(), theme::text().with_fg(fg::SECONDARY))
            };
            let updated = match (row.highlight, row.last_updated) {
                (true, _) => "just now".to_string(),
                (false, Some(t)) => format!("t+{:.1}s", t.as_secs_f64()),
                (false, None) => "-".to_string(),
            };
            buf.print_text_clipped(cols[0], y, &row.short_id(), theme::muted(), inner.right());
            buf.print_text_clipped(cols[1], y, row.key, key_style, inner.right());
            buf.print_text_clipped(cols[2], y, &row.value.to_string(), value_style, inner.right());
            buf.print_text_clipped(cols[3], y, &updated, theme::muted(), inner.right());
        }
    }
}

impl Screen for KeyUpdates {
    type Message = KeyMsg;

    fn update(&mut self, _event: &Event) -> Cmd<KeyMsg> {
        Cmd::none()
    }

    fn handle(&mut self, msg: KeyMsg) -> Cmd<KeyMsg> {
        match msg {
            KeyMsg::Announce { generation, now } => {
                if !self.active || generation != self.generation {
                    debug!(target: "vistral.key", generation, "stale announce dropped");
                    return Cmd::none();
                }
                self.announce(now);
                Cmd::none()
            }
            KeyMsg::Commit {
                generation,
                cycle,
                now,
            } => {
                if !self.active || generation != self.generation {
                    debug!(target: "vistral.key", generation, cycle, "stale commit dropped");
                    return Cmd::none();
                }
                let Some(p) = self.commit(cycle, now) else {
                    return Cmd::none();
                };
                let latency = now.saturating_sub(p.announced_at);
                info!(
                    target: "vistral.key",
                    key = p.key,
                    value = p.value,
                    cycle,
                    latency_ms = latency.as_millis() as u64,
                    "update committed"
                );
                diagnostics::emit_jsonl(
                    "key_commit",
                    json!({
                        "key": p.key,
                        "value": p.value,
                        "cycle": cycle,
                        "at_ms": now.as_millis() as u64,
                    }),
                );
                Cmd::log(format!("{} = {}", p.key, p.value))
            }
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        if area.is_empty() {
            return;
        }
        frame.buffer.push_scissor(area);
        let buf = &mut frame.buffer;
        buf.print_text(
            area.x,
            area.y,
            "Key-based Updates",
            theme::heading().with_fg(accent::PRIMARY_LIGHT),
        );
        buf.print_text_clipped(
            area.x,
            area.y + 1,
            "Latest value maintained per entity key.",
            theme::muted(),
            area.right(),
        );

        let (_, body) = area.split_top(3);
        let (bubble, rest) = body.split_top(4);
        self.render_bubble(frame, bubble);

        let table_height = (KEYS.len() as u16 + 4).min(rest.height);
        let (table, below) = rest.split_top(table_height);
        let table = Rect::new(table.x, table.y, table.width.min(56), table.height);
        self.render_table(frame, table);
        if below.height > 0 {
            frame.buffer.print_text_clipped(
                below.x + 1,
                below.y,
                "Mutating state in-place",
                theme::dim().with_flags(StyleFlags::ITALIC),
                below.right(),
            );
        }
        frame.buffer.pop_scissor();
    }

    fn activate(&mut self) -> Cmd<KeyMsg> {
        self.generation += 1;
        self.active = true;
        self.reset();
        self.rng = SeededRng::new(self.seed).fork(self.generation);
        debug!(target: "vistral.key", generation = self.generation, "activated");
        Cmd::none()
    }

    fn deactivate(&mut self) {
        self.active = false;
        if let Some(p) = self.pending.take() {
            debug!(target: "vistral.key", cycle = p.cycle, "pending update dropped");
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<KeyMsg>>> {
        if !self.active {
            return vec![];
        }
        let generation = self.generation;
        let mut subs: Vec<Box<dyn Subscription<KeyMsg>>> = vec![Box::new(Every::with_id(
            sub_id(SUB_SCREEN, generation, 0),
            CADENCE,
            move |now| KeyMsg::Announce { generation, now },
        ))];
        if let Some(p) = &self.pending {
            let cycle = p.cycle;
            subs.push(Box::new(After::with_id(
                sub_id(SUB_SCREEN, generation, cycle + 1),
                COMMIT_DELAY,
                move |now| KeyMsg::Commit {
                    generation,
                    cycle,
                    now,
                },
            )));
        }
        subs
    }

    fn title(&self) -> &'static str {
        "Key-based Updates"
    }

    fn tab_label(&self) -> &'static str {
        "Keys"
    }
}
