#![forbid(unsafe_code)]

//! Frame binding: time as a sequence of complete snapshots.
//!
//! A single logical time `t` advances every [`CADENCE`]. Three cards show
//! the frames for `t`, `t + 1` and `t + 2`; each holds three points placed
//! by [`position`], which is a pure function of time and point index.
//!
//! The newest card fades in after every tick. The fade runs on display
//! frames, and that subscription only exists while a fade is running.

use std::time::Duration;

use tracing::debug;
use vistral_core::animation::{Animation, Fade, ease_out};
use vistral_core::event::{Event, KeyCode};
use vistral_core::geometry::{PointF, Rect, Sides};
use vistral_render::braille::{BraillePainter, DOTS_X, DOTS_Y};
use vistral_render::cell::{PackedRgba, StyleFlags};
use vistral_render::drawing::{BorderChars, Draw};
use vistral_render::frame::Frame;
use vistral_runtime::{AnimationFrame, Cmd, Every, Subscription};

use super::{HelpEntry, Screen, sub_id};
use crate::theme::{self, accent, bg, fg};

const SUB_SCREEN: u8 = 3;

/// Time between logical ticks.
pub const CADENCE: Duration = Duration::from_millis(2000);

/// Fade-in of the newest snapshot.
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// Snapshots shown at once.
pub const FRAME_COUNT: u64 = 3;

/// Points per snapshot.
pub const POINT_COUNT: usize = 3;

/// Orbit center and radius, in percent of the canvas.
pub const CENTER: f64 = 50.0;
pub const RADIUS: f64 = 30.0;

/// Where point `index` sits at logical time `t`, in percent coordinates.
pub fn position(t: u64, index: usize) -> PointF {
    let angle = t as f64 * 0.5 + index as f64 * 2.0;
    PointF::new(CENTER + RADIUS * angle.cos(), CENTER + RADIUS * angle.sin())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotPoint {
    pub index: usize,
    pub pos: PointF,
    pub color: PackedRgba,
}

/// One complete frame of the visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: u64,
    pub points: Vec<SnapshotPoint>,
}

impl Snapshot {
    pub fn at(time: u64) -> Self {
        let points = (0..POINT_COUNT)
            .map(|index| SnapshotPoint {
                index,
                pos: position(time, index),
                color: accent::SNAPSHOT[index % accent::SNAPSHOT.len()],
            })
            .collect();
        Self { time, points }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameMsg {
    Tick { generation: u64, now: Duration },
    /// Display frame while the fade runs.
    FadeFrame { generation: u64, now: Duration },
}

#[derive(Debug, Clone)]
pub struct FrameSnapshots {
    base_time: u64,
    fade: Option<Fade>,
    fade_clock: Duration,
    active: bool,
    generation: u64,
}

impl Default for FrameSnapshots {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSnapshots {
    pub fn new() -> Self {
        Self {
            base_time: 0,
            fade: None,
            fade_clock: Duration::ZERO,
            active: false,
            generation: 0,
        }
    }

    pub fn base_time(&self) -> u64 {
        self.base_time
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The frames on display, oldest first.
    pub fn frames(&self) -> Vec<Snapshot> {
        (0..FRAME_COUNT)
            .map(|offset| Snapshot::at(self.base_time + offset))
            .collect()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Opacity of the newest card.
    pub fn newest_opacity(&self) -> f32 {
        self.fade.as_ref().map_or(1.0, Fade::value)
    }

    /// Advance logical time by one and start the fade-in.
    pub fn tick(&mut self, now: Duration) {
        self.base_time += 1;
        self.fade = Some(Fade::new(FADE_DURATION).easing(ease_out));
        self.fade_clock = now;
        debug!(target: "vistral.frame", time = self.base_time, "tick");
    }

    /// Back to time zero. The cadence keeps running.
    pub fn reset(&mut self) {
        self.base_time = 0;
        self.fade = None;
        debug!(target: "vistral.frame", "reset");
    }

    fn advance_fade(&mut self, now: Duration) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };
        fade.tick(now.saturating_sub(self.fade_clock));
        self.fade_clock = now;
        if fade.is_complete() {
            self.fade = None;
        }
    }

    fn render_card(&self, frame: &mut Frame, card: Rect, snapshot: &Snapshot, newest: bool) {
        let buf = &mut frame.buffer;
        let border = if newest {
            theme::text().with_fg(accent::SNAPSHOT[0])
        } else {
            theme::border()
        };
        buf.draw_box(card, BorderChars::ROUNDED, border, theme::fill(bg::SURFACE));
        let inner = card.inner(Sides::new(1, 1, 1, 1));
        if inner.width < 8 || inner.height < 3 {
            return;
        }
        let label = format!("T = {}", snapshot.time);
        buf.print_text_clipped(inner.x + 1, inner.y, &label, theme::heading(), inner.right());
        let badge = theme::text()
            .with_fg(fg::SECONDARY)
            .with_bg(bg::RAISED)
            .with_flags(StyleFlags::BOLD);
        buf.print_text_right(
            inner.right().saturating_sub(1),
            inner.y,
            " SNAPSHOT ",
            badge,
            inner.x + 1,
        );

        let (_, canvas) = inner.split_top(1);
        let mut painter = BraillePainter::for_area(canvas);
        let (w, h) = painter.size();
        painter.ellipse(
            f64::from(w) * CENTER / 100.0,
            f64::from(h) * CENTER / 100.0,
            f64::from(w) * RADIUS / 100.0,
            f64::from(h) * RADIUS / 100.0,
            3,
            Some(fg::DISABLED),
        );
        painter.render(canvas, buf, theme::dim());

        for point in &snapshot.points {
            let col = (point.pos.x / 100.0 * f64::from(canvas.width * DOTS_X)) as u16 / DOTS_X;
            let row = (point.pos.y / 100.0 * f64::from(canvas.height * DOTS_Y)) as u16 / DOTS_Y;
            let cell = theme::text().with_fg(point.color).with_char('◆');
            buf.set(canvas.x + col, canvas.y + row, cell);
        }
    }
}

impl Screen for FrameSnapshots {
    type Message = FrameMsg;

    fn update(&mut self, event: &Event) -> Cmd<FrameMsg> {
        if let Event::Key(key) = event
            && key.code == KeyCode::Char('r')
        {
            self.reset();
        }
        Cmd::none()
    }

    fn handle(&mut self, msg: FrameMsg) -> Cmd<FrameMsg> {
        let (generation, now) = match msg {
            FrameMsg::Tick { generation, now } | FrameMsg::FadeFrame { generation, now } => {
                (generation, now)
            }
        };
        if !self.active || generation != self.generation {
            debug!(target: "vistral.frame", generation, "stale message dropped");
            return Cmd::none();
        }
        match msg {
            FrameMsg::Tick { .. } => self.tick(now),
            FrameMsg::FadeFrame { .. } => self.advance_fade(now),
        }
        Cmd::none()
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        if area.is_empty() {
            return;
        }
        frame.buffer.push_scissor(area);
        let heading = theme::heading().with_fg(accent::SNAPSHOT[1]);
        frame.buffer.print_text(area.x, area.y, "Frame Binding", heading);
        frame.buffer.print_text_clipped(
            area.x,
            area.y + 1,
            "Time controls playback of complete snapshots.",
            theme::muted(),
            area.right(),
        );

        let (_, body) = area.split_top(3);
        let (cards_area, footer) = body.split_bottom(1);
        let card_height = cards_area.height.min(cards_area.width / 3 / 2 + 3).max(6);
        let (cards_row, _) = cards_area.split_top(card_height);
        let frames = self.frames();
        let last = frames.len().saturating_sub(1);
        for (i, (card, snapshot)) in cards_row
            .columns(FRAME_COUNT as u16, theme::spacing::SM)
            .into_iter()
            .zip(&frames)
            .enumerate()
        {
            let newest = i == last;
            if newest && self.is_fading() {
                frame.buffer.push_opacity(self.newest_opacity());
                self.render_card(frame, card, snapshot, newest);
                frame.buffer.pop_opacity();
            } else {
                self.render_card(frame, card, snapshot, newest);
            }
        }

        frame.buffer.print_text_clipped(
            footer.x,
            footer.y,
            "Each snapshot replaces the whole view.  r: reset",
            theme::dim(),
            footer.right(),
        );
        frame.buffer.pop_scissor();
    }

    fn activate(&mut self) -> Cmd<FrameMsg> {
        self.generation += 1;
        self.active = true;
        self.base_time = 0;
        self.fade = None;
        debug!(target: "vistral.frame", generation = self.generation, "activated");
        Cmd::none()
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.fade = None;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<FrameMsg>>> {
        if !self.active {
            return vec![];
        }
        let generation = self.generation;
        let mut subs: Vec<Box<dyn Subscription<FrameMsg>>> = vec![Box::new(Every::with_id(
            sub_id(SUB_SCREEN, generation, 0),
            CADENCE,
            move |now| FrameMsg::Tick { generation, now },
        ))];
        if self.is_fading() {
            subs.push(Box::new(AnimationFrame::with_id(
                sub_id(SUB_SCREEN, generation, 1),
                move |now| FrameMsg::FadeFrame { generation, now },
            )));
        }
        subs
    }

    fn keybindings(&self) -> Vec<HelpEntry> {
        vec![HelpEntry {
            key: "r",
            action: "Reset logical time to 0",
        }]
    }

    fn title(&self) -> &'static str {
        "Frame Binding"
    }

    fn tab_label(&self) -> &'static str {
        "Snapshots"
    }
}
