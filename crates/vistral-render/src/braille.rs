#![forbid(unsafe_code)]

//! Sub-cell plotting with Unicode braille patterns.
//!
//! Each terminal cell is a 2 x 4 grid of dots (U+2800..U+28FF). A
//! [`BraillePainter`] accumulates dots in its own coordinate space and
//! [`BraillePainter::render`] folds them into cells of a [`Buffer`].

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedRgba};
use vistral_core::geometry::Rect;

/// Dots per cell, horizontally.
pub const DOTS_X: u16 = 2;
/// Dots per cell, vertically.
pub const DOTS_Y: u16 = 4;

// Bit for the dot at (column, row) within a cell.
const DOT_BITS: [[u8; 4]; 2] = [[0, 1, 2, 6], [3, 4, 5, 7]];

#[derive(Debug, Clone)]
pub struct BraillePainter {
    width: u16,
    height: u16,
    pixels: Vec<bool>,
    colors: Vec<Option<PackedRgba>>,
}

impl BraillePainter {
    /// Painter with the given size in dots.
    pub fn new(width: u16, height: u16) -> Self {
        let len = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            pixels: vec![false; len],
            colors: vec![None; len],
        }
    }

    /// Painter covering `area` at full braille resolution.
    pub fn for_area(area: Rect) -> Self {
        Self::new(
            area.width.saturating_mul(DOTS_X),
            area.height.saturating_mul(DOTS_Y),
        )
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
        self.colors.fill(None);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return None;
        }
        Some(y as usize * usize::from(self.width) + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.pixels[i])
    }

    /// Set a dot. Off-canvas dots are ignored.
    pub fn point(&mut self, x: i32, y: i32, color: Option<PackedRgba>) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = true;
            if color.is_some() {
                self.colors[i] = color;
            }
        }
    }

    /// Bresenham line between two dots, inclusive.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Option<PackedRgba>) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut cx, mut cy) = (x0, y0);
        loop {
            self.point(cx, cy, color);
            if cx == x1 && cy == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                cx += sx;
            }
            if e2 <= dx {
                err += dx;
                cy += sy;
            }
        }
    }

    /// Ellipse outline, every `stride`-th step plotted (1 = solid).
    ///
    /// Terminal cells are taller than wide, so callers pass separate radii to
    /// get something that reads as a circle.
    pub fn ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        stride: usize,
        color: Option<PackedRgba>,
    ) {
        let steps = ((rx.max(ry) * 8.0).ceil() as usize).max(8);
        for i in (0..steps).step_by(stride.max(1)) {
            let a = i as f64 / steps as f64 * std::f64::consts::TAU;
            let x = (cx + rx * a.cos()).round() as i32;
            let y = (cy + ry * a.sin()).round() as i32;
            self.point(x, y, color);
        }
    }

    /// Glyph and first color for the cell whose top-left dot is (px, py).
    fn cell_at(&self, px: i32, py: i32) -> Option<(char, Option<PackedRgba>)> {
        let mut bits = 0u32;
        let mut color = None;
        for (col, rows) in DOT_BITS.iter().enumerate() {
            for (row, bit) in rows.iter().enumerate() {
                let (x, y) = (px + col as i32, py + row as i32);
                if let Some(i) = self.index(x, y)
                    && self.pixels[i]
                {
                    bits |= 1 << bit;
                    color = color.or(self.colors[i]);
                }
            }
        }
        if bits == 0 {
            return None;
        }
        char::from_u32(0x2800 + bits).map(|ch| (ch, color))
    }

    /// Draw into `buf` with the painter's origin at `area`'s top-left.
    ///
    /// Empty cells are left untouched. Per-dot color wins over `base.fg`.
    pub fn render(&self, area: Rect, buf: &mut Buffer, base: Cell) {
        let cols = area.width.min(self.width.div_ceil(DOTS_X));
        let rows = area.height.min(self.height.div_ceil(DOTS_Y));
        for cy in 0..rows {
            for cx in 0..cols {
                let Some((ch, color)) =
                    self.cell_at(i32::from(cx * DOTS_X), i32::from(cy * DOTS_Y))
                else {
                    continue;
                };
                let cell = base.with_char(ch).with_fg(color.unwrap_or(base.fg));
                buf.set(area.x + cx, area.y + cy, cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_dot_maps_to_pattern() {
        let mut p = BraillePainter::new(2, 4);
        p.point(0, 0, None);
        assert_eq!(p.cell_at(0, 0).map(|(c, _)| c), Some('\u{2801}'));
        p.point(1, 3, None);
        assert_eq!(p.cell_at(0, 0).map(|(c, _)| c), Some('\u{2881}'));
    }

    #[test]
    fn off_canvas_points_ignored() {
        let mut p = BraillePainter::new(4, 4);
        p.point(-1, 0, None);
        p.point(4, 0, None);
        assert!(!p.get(-1, 0));
        assert!(p.cell_at(0, 0).is_none());
    }

    #[test]
    fn line_hits_both_endpoints() {
        let mut p = BraillePainter::new(20, 12);
        p.line(0, 0, 19, 11, None);
        assert!(p.get(0, 0));
        assert!(p.get(19, 11));
        p.line(19, 0, 0, 0, None);
        assert!((0..20).all(|x| p.get(x, 0)));
    }

    #[test]
    fn render_skips_empty_cells_and_applies_color() {
        let red = PackedRgba::rgb(255, 0, 0);
        let mut p = BraillePainter::for_area(Rect::from_size(3, 1));
        p.point(2, 1, Some(red));
        let mut buf = Buffer::new(3, 1);
        buf.set(0, 0, Cell::from_char('x'));
        p.render(Rect::from_size(3, 1), &mut buf, Cell::default());
        assert_eq!(buf.get(0, 0).map(|c| c.ch), Some('x'));
        let cell = buf.get(1, 0).copied().unwrap_or_default();
        assert_eq!(cell.ch, '\u{2802}');
        assert_eq!(cell.fg, red);
    }

    #[test]
    fn ellipse_stays_near_radius() {
        let mut p = BraillePainter::new(40, 40);
        p.ellipse(20.0, 20.0, 10.0, 10.0, 1, None);
        assert!(p.get(30, 20));
        assert!(p.get(10, 20));
        assert!(!p.get(20, 20));
    }
}
