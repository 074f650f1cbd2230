#![forbid(unsafe_code)]

//! Home screen: the grammar-of-graphics layer stack and the new layer card,
//! joined by a connector curve.
//!
//! The curve is recomputed, never patched: every redraw clears the painter
//! and rasterizes the connector again from the current [`HomeLayout`]. The
//! first draw waits a short settle delay after activation. Any viewport
//! resize while active redraws at once, settled or not.
//!
//! # Diagnostic Logging
//!
//! - `vistral.home` debug: redraws and skipped draws (an anchor was not laid out)
//! - JSONL `connector_redraw` with the SVG path when `VISTRAL_JSONL=1`

use std::time::Duration;

use serde_json::json;
use tracing::debug;
use vistral_core::event::Event;
use vistral_core::geometry::{BoundingBox, Rect};
use vistral_render::braille::{BraillePainter, DOTS_X, DOTS_Y};
use vistral_render::cell::StyleFlags;
use vistral_render::drawing::{BorderChars, Draw};
use vistral_render::frame::Frame;
use vistral_runtime::{After, Cmd, Subscription};

use super::{Screen, sub_id};
use crate::chrome::wrap;
use crate::connector::{Anchor, ConnectorLine, LayoutProvider};
use crate::diagnostics;
use crate::theme::{self, accent, bg, fg};

const SUB_SCREEN: u8 = 1;

/// Delay before the first connector draw after activation.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Narrower content areas stack the columns and hide the connector.
pub const STACK_BELOW: u16 = 72;

/// Curve resolution when rasterizing.
const CURVE_SEGMENTS: usize = 48;

const INTRO: &str = "Temporal Binding introduces streaming data capabilities to the Grammar of \
                     Graphics, enabling new dynamic visualizations that evolve over time.";

/// The grammar layers, bottom of the stack first.
pub const LAYERS: [(&str, &str); 8] = [
    ("01", "Data"),
    ("02", "Aesthetics"),
    ("03", "Geometries"),
    ("04", "Facets"),
    ("05", "Statistics"),
    ("06", "Coordinates"),
    ("07", "Temporal Binding"),
    ("08", "Theme"),
];

/// Index into [`LAYERS`] of the connector's source.
pub const SOURCE_LAYER: usize = 6;

const CARD_TITLE: &str = "Temporal Binding";
const CARD_BADGE: &str = "NEW LAYER";
const CARD_DESC: &str = "Defines when data appears, is, and disappears on the canvas.";

const BINDING_KINDS: [(&str, &str); 3] = [
    ("Axis-Bound", "Time mapped to a visual axis with sliding window."),
    ("Frame-Bound", "Time controls playback of complete snapshots."),
    ("Key-Bound", "Latest value maintained per entity key."),
];

/// Widest a layer row gets, so the curve has room to travel.
const LAYER_MAX_WIDTH: u16 = 30;

/// Where everything on the home screen goes, as a pure function of the area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    pub area: Rect,
    pub title: Rect,
    pub intro: Rect,
    /// Columns stacked vertically; the drawing surface is hidden.
    pub stacked: bool,
    /// One row per entry in [`LAYERS`]. Rows past the bottom are kept but
    /// count as not laid out.
    pub layers: Vec<Rect>,
    pub card: Rect,
}

impl HomeLayout {
    pub fn compute(area: Rect) -> Self {
        let stacked = area.width < STACK_BELOW;
        let title = Rect::new(area.x, area.y, area.width, 2);
        let intro_width = area.width.min(72);
        let intro_lines = wrap(INTRO, intro_width).len() as u16;
        let intro = Rect::new(area.x, area.y.saturating_add(3), intro_width, intro_lines);
        let body_y = intro.bottom().saturating_add(1);
        let body_height = area.bottom().saturating_sub(body_y);

        // Layer rows start under the "GRAMMAR LAYERS" label.
        let layers_top = body_y.saturating_add(2);
        let pitch = if !stacked && body_height >= 2 + 2 * LAYERS.len() as u16 {
            2
        } else {
            1
        };

        let (layer_x, layer_width, card) = if stacked {
            let layer_width = area.width.min(LAYER_MAX_WIDTH);
            let card_y = layers_top + pitch * LAYERS.len() as u16 + 1;
            let card = Rect::new(area.x, card_y, area.width, Self::card_height(area.width));
            (area.x, layer_width, card)
        } else {
            let left_width = (area.width as u32 * 35 / 100) as u16;
            let right_width = (area.width as u32 * 60 / 100) as u16;
            let card = Rect::new(
                area.right() - right_width,
                body_y.saturating_add(1),
                right_width,
                Self::card_height(right_width),
            );
            (area.x, left_width.min(LAYER_MAX_WIDTH), card)
        };

        let layers = (0..LAYERS.len() as u16)
            .map(|i| Rect::new(layer_x, layers_top + i * pitch, layer_width, 1))
            .collect();

        Self {
            area,
            title,
            intro,
            stacked,
            layers,
            card,
        }
    }

    fn card_height(width: u16) -> u16 {
        let desc_lines = wrap(CARD_DESC, width.saturating_sub(4)).len() as u16;
        // Border, title, description, blank, three kinds with a gap between.
        2 + 1 + desc_lines + 1 + 3 * 2 + 2
    }

    /// Area the connector is drawn on, when shown.
    pub fn surface(&self) -> Option<Rect> {
        (!self.stacked).then_some(self.area)
    }

    fn is_laid_out(&self, rect: Rect) -> bool {
        !rect.is_empty() && rect.bottom() <= self.area.bottom()
    }
}

impl LayoutProvider for HomeLayout {
    fn bounding_box(&self, anchor: Anchor) -> Option<BoundingBox> {
        match anchor {
            Anchor::Surface => self.surface().map(BoundingBox::from),
            Anchor::Source => {
                let row = *self.layers.get(SOURCE_LAYER)?;
                self.is_laid_out(row).then(|| BoundingBox::from(row))
            }
            Anchor::Target => {
                let port = Rect::new(
                    self.card.x,
                    self.card.y.saturating_add(2),
                    self.card.width,
                    self.card.height.saturating_sub(2),
                );
                (self.card.height > 3 && port.y < self.area.bottom())
                    .then(|| BoundingBox::from(port))
            }
        }
    }
}

/// Home screen messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeMsg {
    /// The settle delay after activation elapsed.
    Settled { generation: u64 },
}

/// A rasterized connector and the surface it was computed for.
#[derive(Debug, Clone)]
struct DrawnConnector {
    surface: Rect,
    line: ConnectorLine,
    painter: BraillePainter,
}

/// Home screen state.
#[derive(Debug, Clone, Default)]
pub struct Home {
    active: bool,
    generation: u64,
    settled: bool,
    /// Set by the first resize after activation, which only delivers the layout.
    sized: bool,
    area: Rect,
    connector: Option<DrawnConnector>,
    redraws: u64,
}

impl Home {
    pub fn new() -> Self {
        Self::default()
    }

    /// The curve currently on screen, if any.
    pub fn connector(&self) -> Option<&ConnectorLine> {
        self.connector.as_ref().map(|c| &c.line)
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// How many times the connector was rasterized.
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clear the previous curve, then draw a new one if every anchor is laid out.
    fn redraw(&mut self) {
        self.connector = None;
        let layout = HomeLayout::compute(self.area);
        let (Some(surface), Some(line)) = (layout.surface(), ConnectorLine::from_layout(&layout))
        else {
            debug!(
                target: "vistral.home",
                width = self.area.width,
                height = self.area.height,
                "connector skipped: anchor not laid out"
            );
            return;
        };

        let mut painter = BraillePainter::for_area(surface);
        let dots: Vec<(i32, i32)> = line
            .sample(CURVE_SEGMENTS)
            .into_iter()
            .map(|p| {
                (
                    (p.x * f64::from(DOTS_X)).round() as i32,
                    (p.y * f64::from(DOTS_Y)).round() as i32,
                )
            })
            .collect();
        for pair in dots.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            painter.line(x0, y0, x1, y1, Some(accent::PRIMARY));
        }

        self.redraws += 1;
        let path = line.to_svg_path();
        debug!(target: "vistral.home", redraws = self.redraws, path = %path, "connector redrawn");
        diagnostics::emit_jsonl(
            "connector_redraw",
            json!({
                "generation": self.generation,
                "width": surface.width,
                "height": surface.height,
                "path": path,
            }),
        );
        self.connector = Some(DrawnConnector {
            surface,
            line,
            painter,
        });
    }

    fn render_header(&self, frame: &mut Frame, layout: &HomeLayout) {
        let buf = &mut frame.buffer;
        let t = layout.title;
        let x = buf.print_text_clipped(t.x, t.y, "Extending the ", theme::heading(), t.right());
        buf.print_text_clipped(x, t.y, "Grammar of Graphics", theme::emphasis(), t.right());
        let x = buf.print_text_clipped(t.x, t.y + 1, "with ", theme::heading(), t.right());
        buf.print_text_clipped(x, t.y + 1, "Temporal Binding", theme::emphasis(), t.right());

        let intro_style = theme::text().with_fg(fg::SECONDARY);
        for (i, line) in wrap(INTRO, layout.intro.width).iter().enumerate() {
            buf.print_text_clipped(
                layout.intro.x,
                layout.intro.y + i as u16,
                line,
                intro_style,
                layout.intro.right(),
            );
        }
    }

    fn render_layers(&self, frame: &mut Frame, layout: &HomeLayout) {
        let buf = &mut frame.buffer;
        let Some(first) = layout.layers.first() else {
            return;
        };
        buf.print_text_clipped(
            first.x,
            first.y.saturating_sub(2),
            "GRAMMAR LAYERS",
            theme::dim(),
            first.right(),
        );
        for (i, (&row, (num, name))) in layout.layers.iter().zip(LAYERS).enumerate() {
            let (fill, num_style, name_style) = if i == SOURCE_LAYER {
                (bg::SOURCE, theme::emphasis(), theme::emphasis())
            } else {
                (bg::SURFACE, theme::dim(), theme::text())
            };
            buf.fill(row, theme::fill(fill));
            if i == SOURCE_LAYER {
                buf.set(row.x, row.y, theme::text().with_fg(accent::PRIMARY).with_char('▌'));
            }
            let x = buf.print_text_clipped(row.x + 2, row.y, num, num_style, row.right());
            buf.print_text_clipped(x + 2, row.y, name, name_style, row.right());
        }
    }

    fn render_card(&self, frame: &mut Frame, layout: &HomeLayout) {
        let card = layout.card;
        let buf = &mut frame.buffer;
        buf.draw_box(
            card,
            BorderChars::ROUNDED,
            theme::text().with_fg(accent::PRIMARY),
            theme::fill(bg::SURFACE),
        );
        let inner = Rect::new(
            card.x + 2,
            card.y + 1,
            card.width.saturating_sub(4),
            card.height.saturating_sub(2),
        );
        if inner.is_empty() {
            return;
        }
        let mut y = inner.y;
        let x = buf.print_text_clipped(inner.x, y, CARD_TITLE, theme::heading(), inner.right());
        let badge = theme::text()
            .with_fg(accent::PRIMARY_LIGHT)
            .with_bg(bg::HIGHLIGHT)
            .with_flags(StyleFlags::BOLD);
        buf.print_text_clipped(x + 2, y, &format!(" {CARD_BADGE} "), badge, inner.right());
        y += 1;

        let desc_style = theme::text().with_fg(fg::SECONDARY);
        for line in wrap(CARD_DESC, inner.width) {
            buf.print_text_clipped(inner.x, y, &line, desc_style, inner.right());
            y += 1;
        }
        y += 1;

        for (name, desc) in BINDING_KINDS {
            if y >= inner.bottom() {
                break;
            }
            buf.set(inner.x, y, theme::text().with_fg(accent::PRIMARY).with_char('▸'));
            buf.print_text_clipped(inner.x + 2, y, name, theme::heading(), inner.right());
            buf.print_text_clipped(inner.x + 2, y + 1, desc, theme::muted(), inner.right());
            y += 3;
        }
    }

    fn render_connector(&self, frame: &mut Frame, surface: Rect) {
        let Some(drawn) = self.connector.as_ref().filter(|c| c.surface == surface) else {
            return;
        };
        drawn.painter.render(
            surface,
            &mut frame.buffer,
            theme::text().with_fg(accent::PRIMARY),
        );
    }

    fn render_endpoints(&self, frame: &mut Frame, surface: Rect) {
        let Some(drawn) = self.connector.as_ref().filter(|c| c.surface == surface) else {
            return;
        };
        let marker = theme::text().with_fg(accent::MAGENTA).with_char('●');
        for p in [drawn.line.start, drawn.line.end] {
            let x = surface.x.saturating_add(p.x.floor().max(0.0) as u16);
            let y = surface.y.saturating_add(p.y.floor().max(0.0) as u16);
            frame.buffer.set(x, y, marker);
        }
    }
}

impl Screen for Home {
    type Message = HomeMsg;

    fn update(&mut self, _event: &Event) -> Cmd<HomeMsg> {
        Cmd::none()
    }

    fn handle(&mut self, msg: HomeMsg) -> Cmd<HomeMsg> {
        match msg {
            HomeMsg::Settled { generation } => {
                if !self.active || generation != self.generation {
                    debug!(target: "vistral.home", generation, "stale settle dropped");
                    return Cmd::none();
                }
                self.settled = true;
                self.redraw();
            }
        }
        Cmd::none()
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        let layout = HomeLayout::compute(area);
        frame.buffer.push_scissor(area);
        // Curve first so the panels cover its ends; endpoint markers last.
        if let Some(surface) = layout.surface() {
            self.render_connector(frame, surface);
        }
        self.render_header(frame, &layout);
        self.render_layers(frame, &layout);
        self.render_card(frame, &layout);
        if let Some(surface) = layout.surface() {
            self.render_endpoints(frame, surface);
        }
        frame.buffer.pop_scissor();
    }

    fn activate(&mut self) -> Cmd<HomeMsg> {
        self.generation += 1;
        self.active = true;
        self.settled = false;
        self.sized = false;
        self.connector = None;
        debug!(target: "vistral.home", generation = self.generation, "activated");
        Cmd::none()
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.settled = false;
        self.connector = None;
    }

    fn resize(&mut self, area: Rect) -> Cmd<HomeMsg> {
        let changed = area != self.area;
        self.area = area;
        if !self.active {
            return Cmd::none();
        }
        if !self.sized {
            self.sized = true;
            return Cmd::none();
        }
        if changed {
            self.redraw();
        }
        Cmd::none()
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<HomeMsg>>> {
        if !self.active || self.settled {
            return vec![];
        }
        let generation = self.generation;
        vec![Box::new(After::with_id(
            sub_id(SUB_SCREEN, generation, 0),
            SETTLE_DELAY,
            move |_| HomeMsg::Settled { generation },
        ))]
    }

    fn title(&self) -> &'static str {
        "Home"
    }

    fn tab_label(&self) -> &'static str {
        "Overview"
    }
}
