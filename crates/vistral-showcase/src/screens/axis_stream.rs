#![forbid(unsafe_code)]

//! Axis binding: a stream of particles sliding through a time window.
//!
//! Particles enter at the right edge, move left a fixed step every display
//! frame and are dropped once they leave the window on the left. Positions
//! are percentages of the plot, so the stream looks the same at any size.
//!
//! Each frame moves first and spawns second, so a particle spawned this
//! frame has not moved yet.

use std::time::Duration;

use tracing::{debug, trace};
use vistral_core::animation::{Animation, Pulse};
use vistral_core::event::{Event, KeyCode};
use vistral_core::geometry::{Rect, Sides};
use vistral_render::cell::PackedRgba;
use vistral_render::drawing::{BorderChars, Draw, text_width};
use vistral_render::frame::Frame;
use vistral_runtime::{AnimationFrame, Cmd, Subscription};

use super::{HelpEntry, Screen, sub_id};
use crate::rng::SeededRng;
use crate::theme::{self, accent, bg, fg};

const SUB_SCREEN: u8 = 2;

/// Leftward movement per frame, in percent of the plot width.
pub const STEP: f64 = 0.15;

/// Spawn when strictly more than this has passed since the last spawn.
pub const SPAWN_INTERVAL: Duration = Duration::from_millis(800);

/// Where new particles enter.
pub const SPAWN_X: f64 = 105.0;

/// Particles at or left of this are dropped.
pub const EXIT_X: f64 = -5.0;

/// Particles left of this fade out toward the window edge.
const FADE_X: f64 = 10.0;

/// Position of the "now" cursor, in percent.
const NOW_CURSOR: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Unique within one activation of the panel.
    pub id: u64,
    /// Percent of plot width.
    pub x: f64,
    /// Percent of plot height.
    pub y: f64,
    pub color: PackedRgba,
}

impl Particle {
    /// Opacity for rendering: linear in `x` below the fade band, then opaque.
    pub fn opacity(&self) -> f32 {
        if self.x < FADE_X {
            (self.x / FADE_X).clamp(0.0, 1.0) as f32
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisMsg {
    /// One display frame at `now`.
    Frame { generation: u64, now: Duration },
}

#[derive(Debug, Clone)]
pub struct AxisStream {
    particles: Vec<Particle>,
    last_spawn: Option<Duration>,
    next_id: u64,
    spawned: u64,
    paused: bool,
    active: bool,
    generation: u64,
    seed: u64,
    rng: SeededRng,
    pulse: Pulse,
    last_frame: Option<Duration>,
}

impl AxisStream {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            last_spawn: None,
            next_id: 0,
            spawned: 0,
            paused: false,
            active: false,
            generation: 0,
            seed,
            rng: SeededRng::new(seed),
            pulse: Pulse::new(1.0),
            last_frame: None,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Particles spawned since activation.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn last_spawn(&self) -> Option<Duration> {
        self.last_spawn
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance one frame: move, drop what left the window, maybe spawn.
    pub fn advance_frame(&mut self, now: Duration) {
        if self.paused {
            return;
        }
        if let Some(last) = self.last_frame {
            self.pulse.tick(now.saturating_sub(last));
        }
        self.last_frame = Some(now);

        for p in &mut self.particles {
            p.x -= STEP;
        }
        let before = self.particles.len();
        self.particles.retain(|p| p.x > EXIT_X);
        let dropped = before - self.particles.len();
        if dropped > 0 {
            trace!(target: "vistral.axis", dropped, "particles left the window");
        }

        let due = self
            .last_spawn
            .is_none_or(|last| now.saturating_sub(last) > SPAWN_INTERVAL);
        if due {
            self.spawn(now);
        }
    }

    fn spawn(&mut self, now: Duration) {
        let y = 20.0 + self.rng.next_f64() * 60.0;
        let color = self
            .rng
            .pick(&accent::STREAM)
            .copied()
            .unwrap_or(accent::SKY);
        let id = self.next_id;
        self.next_id += 1;
        self.spawned += 1;
        self.particles.push(Particle {
            id,
            x: SPAWN_X,
            y,
            color,
        });
        self.last_spawn = Some(now);
        trace!(target: "vistral.axis", id, now_ms = now.as_millis() as u64, "particle spawned");
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        // Resume from the current state: no catch-up for the paused time.
        self.last_frame = None;
        debug!(target: "vistral.axis", paused = self.paused, "pause toggled");
    }

    pub fn clear(&mut self) {
        let cleared = self.particles.len();
        self.particles.clear();
        debug!(target: "vistral.axis", cleared, "stream cleared");
    }

    fn render_canvas(&self, frame: &mut Frame, canvas: Rect) {
        let buf = &mut frame.buffer;
        buf.draw_box(
            canvas,
            BorderChars::ROUNDED,
            theme::border(),
            theme::fill(bg::BASE),
        );
        let inner = canvas.inner(Sides::new(1, 2, 1, 2));
        if inner.height < 3 || inner.width < 10 {
            return;
        }
        buf.print_text(inner.x, inner.y, "Past (t-5min)", theme::dim());
        buf.print_text_right(inner.right(), inner.y, "Live (t-now)", theme::dim(), inner.x);

        let (_, plot) = inner.split_top(1);
        let grid = theme::text().with_fg(fg::GRID);
        for pct in [25u16, 50, 75] {
            let x = plot.x + (u32::from(plot.width) * u32::from(pct) / 100) as u16;
            buf.draw_vertical_line(x, plot.y, plot.height, grid.with_char('┊'));
        }
        let cursor_x = plot.x + to_cells(NOW_CURSOR, plot.width).unwrap_or(0);
        buf.draw_vertical_line(
            cursor_x,
            plot.y,
            plot.height,
            theme::text().with_fg(accent::SKY).with_char('┆'),
        );

        buf.push_scissor(plot);
        for p in &self.particles {
            let (Some(dx), Some(dy)) = (to_cells(p.x, plot.width), to_cells(p.y, plot.height))
            else {
                continue;
            };
            let dot = theme::text().with_fg(p.color).with_char('●');
            buf.push_opacity(p.opacity());
            buf.set(plot.x + dx, plot.y + dy, dot);
            buf.pop_opacity();
        }
        buf.pop_scissor();
    }

    fn render_footer(&self, frame: &mut Frame, row: Rect) {
        let buf = &mut frame.buffer;
        buf.print_text_clipped(row.x, row.y, "← Exiting Window", theme::dim(), row.right());

        // Pulse between muted and full sky.
        let glow = 0.4 + 0.6 * self.pulse.value();
        let incoming = theme::text().with_fg(accent::SKY.with_opacity(glow).over(bg::DEEP));
        let label = "Incoming Stream →";
        let status = if self.paused {
            "PAUSED".to_string()
        } else {
            format!("{} live", self.particles.len())
        };
        buf.print_text_right(row.right(), row.y, label, incoming, row.x);
        let label_start = row.right().saturating_sub(text_width(label));
        let status_style = if self.paused {
            theme::emphasis()
        } else {
            theme::muted()
        };
        let mid = row.x + row.width.saturating_sub(text_width(&status)) / 2;
        if mid + text_width(&status) < label_start {
            buf.print_text(mid, row.y, &status, status_style);
        }
    }
}

/// Map a percentage onto `0..extent` cells; `None` when outside.
fn to_cells(pct: f64, extent: u16) -> Option<u16> {
    let cell = (pct / 100.0 * f64::from(extent)).floor();
    (cell >= 0.0 && cell < f64::from(extent)).then_some(cell as u16)
}

impl Screen for AxisStream {
    type Message = AxisMsg;

    fn update(&mut self, event: &Event) -> Cmd<AxisMsg> {
        let Event::Key(key) = event else {
            return Cmd::none();
        };
        match key.code {
            KeyCode::Char(' ' | 'p') => self.toggle_pause(),
            KeyCode::Char('c') => self.clear(),
            _ => {}
        }
        Cmd::none()
    }

    fn handle(&mut self, msg: AxisMsg) -> Cmd<AxisMsg> {
        match msg {
            AxisMsg::Frame { generation, now } => {
                if !self.active || generation != self.generation {
                    debug!(target: "vistral.axis", generation, "stale frame dropped");
                    return Cmd::none();
                }
                self.advance_frame(now);
            }
        }
        Cmd::none()
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        if area.is_empty() {
            return;
        }
        let buf = &mut frame.buffer;
        buf.push_scissor(area);
        buf.print_text(area.x, area.y, "Axis Binding", theme::heading().with_fg(accent::SKY));
        buf.print_text_clipped(
            area.x,
            area.y + 1,
            "Time mapped to a visual axis with sliding window.",
            theme::muted(),
            area.right(),
        );
        let (_, body) = area.split_top(3);
        let (canvas, footer) = body.split_bottom(2);
        self.render_canvas(frame, canvas);
        let (footer_row, _) = footer.split_top(1);
        self.render_footer(frame, footer_row.inner(Sides::horizontal(1)));
        frame.buffer.pop_scissor();
    }

    fn activate(&mut self) -> Cmd<AxisMsg> {
        self.generation += 1;
        self.active = true;
        self.particles.clear();
        self.last_spawn = None;
        self.last_frame = None;
        self.next_id = 0;
        self.spawned = 0;
        self.paused = false;
        self.pulse.reset();
        self.rng = SeededRng::new(self.seed).fork(self.generation);
        debug!(target: "vistral.axis", generation = self.generation, "activated");
        Cmd::none()
    }

    fn deactivate(&mut self) {
        self.active = false;
        debug!(
            target: "vistral.axis",
            generation = self.generation,
            live = self.particles.len(),
            "deactivated"
        );
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<AxisMsg>>> {
        if !self.active || self.paused {
            return vec![];
        }
        let generation = self.generation;
        vec![Box::new(AnimationFrame::with_id(
            sub_id(SUB_SCREEN, generation, 0),
            move |now| AxisMsg::Frame { generation, now },
        ))]
    }

    fn keybindings(&self) -> Vec<HelpEntry> {
        vec![
            HelpEntry {
                key: "Space / p",
                action: "Pause or resume the stream",
            },
            HelpEntry {
                key: "c",
                action: "Clear all particles",
            },
        ]
    }

    fn title(&self) -> &'static str {
        "Axis Binding"
    }

    fn tab_label(&self) -> &'static str {
        "Stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn active() -> AxisStream {
        let mut axis = AxisStream::new(7);
        axis.activate();
        axis
    }

    #[test]
    fn first_frame_spawns_at_right_edge() {
        let mut axis = active();
        axis.advance_frame(ms(16));
        let p = axis.particles()[0];
        assert_eq!(p.x, SPAWN_X);
        assert!((20.0..80.0).contains(&p.y));
        assert!(accent::STREAM.contains(&p.color));
    }

    #[test]
    fn spawn_needs_strictly_more_than_interval() {
        let mut axis = active();
        axis.advance_frame(ms(0));
        axis.advance_frame(ms(800));
        assert_eq!(axis.spawned(), 1);
        axis.advance_frame(ms(801));
        assert_eq!(axis.spawned(), 2);
    }

    #[test]
    fn move_happens_before_spawn() {
        let mut axis = active();
        axis.advance_frame(ms(0));
        axis.advance_frame(ms(900));
        let xs: Vec<f64> = axis.particles().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![SPAWN_X - STEP, SPAWN_X]);
    }

    #[test]
    fn particles_leave_past_exit() {
        let mut axis = active();
        axis.advance_frame(ms(0));
        axis.particles[0].x = EXIT_X + STEP / 2.0;
        axis.advance_frame(ms(16));
        assert!(axis.particles().iter().all(|p| p.x > EXIT_X));
        assert!(axis.particles().iter().all(|p| p.id != 0));
    }

    #[test]
    fn pause_freezes_and_drops_subscription() {
        let mut axis = active();
        axis.advance_frame(ms(0));
        axis.toggle_pause();
        assert!(axis.subscriptions().is_empty());
        axis.advance_frame(ms(5_000));
        assert_eq!(axis.particles()[0].x, SPAWN_X);
        axis.toggle_pause();
        assert_eq!(axis.subscriptions().len(), 1);
    }

    #[test]
    fn clear_works_while_paused() {
        let mut axis = active();
        axis.advance_frame(ms(0));
        axis.toggle_pause();
        axis.update(&Event::key(KeyCode::Char('c')));
        assert!(axis.particles().is_empty());
        assert!(axis.is_paused());
    }

    #[test]
    fn stale_frame_is_dropped() {
        let mut axis = active();
        let old = axis.generation();
        axis.deactivate();
        axis.activate();
        axis.handle(AxisMsg::Frame {
            generation: old,
            now: ms(16),
        });
        assert!(axis.particles().is_empty());
    }

    #[test]
    fn fade_band_opacity() {
        let p = |x| Particle {
            id: 0,
            x,
            y: 50.0,
            color: accent::SKY,
        };
        assert_eq!(p(50.0).opacity(), 1.0);
        assert_eq!(p(5.0).opacity(), 0.5);
        assert_eq!(p(-2.0).opacity(), 0.0);
    }

    #[test]
    fn view_draws_labels() {
        let mut axis = active();
        axis.advance_frame(ms(0));
        let mut frame = Frame::new(80, 24);
        axis.view(&mut frame, Rect::from_size(80, 24));
        let buf = &frame.buffer;
        assert!(buf.contains_text("Past (t-5min)"));
        assert!(buf.contains_text("Live (t-now)"));
        assert!(buf.contains_text("Exiting Window"));
        assert!(buf.contains_text("Incoming Stream →"));
        assert!(buf.contains_text("┆"));
    }
}
