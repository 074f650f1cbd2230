#![forbid(unsafe_code)]

//! Drawing primitives on top of `Buffer::set()`.
//!
//! Everything here goes through `set`, so scissor and opacity apply.

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedRgba};
use unicode_width::UnicodeWidthChar;
use vistral_core::geometry::Rect;

/// Glyphs for a rectangular border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderChars {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl BorderChars {
    pub const SQUARE: Self = Self {
        top_left: '┌',
        top_right: '┐',
        bottom_left: '└',
        bottom_right: '┘',
        horizontal: '─',
        vertical: '│',
    };

    pub const ROUNDED: Self = Self {
        top_left: '╭',
        top_right: '╮',
        bottom_left: '╰',
        bottom_right: '╯',
        horizontal: '─',
        vertical: '│',
    };

    /// Dashed edges with rounded corners.
    pub const DASHED: Self = Self {
        top_left: '╭',
        top_right: '╮',
        bottom_left: '╰',
        bottom_right: '╯',
        horizontal: '┄',
        vertical: '┆',
    };

    pub const HEAVY: Self = Self {
        top_left: '┏',
        top_right: '┓',
        bottom_left: '┗',
        bottom_right: '┛',
        horizontal: '━',
        vertical: '┃',
    };
}

/// Extension trait for drawing on a [`Buffer`].
pub trait Draw {
    fn draw_horizontal_line(&mut self, x: u16, y: u16, width: u16, cell: Cell);

    fn draw_vertical_line(&mut self, x: u16, y: u16, height: u16, cell: Cell);

    /// Print `text` starting at (x, y), stopping at the buffer edge.
    ///
    /// Only the character changes; colors and flags come from `base`.
    /// Returns the column after the last printed character.
    fn print_text(&mut self, x: u16, y: u16, text: &str, base: Cell) -> u16;

    /// Like [`Draw::print_text`] but stops at `max_x` (exclusive).
    fn print_text_clipped(&mut self, x: u16, y: u16, text: &str, base: Cell, max_x: u16) -> u16;

    /// Print `text` so it ends at `right` (exclusive). Clipped on the left at `min_x`.
    fn print_text_right(&mut self, right: u16, y: u16, text: &str, base: Cell, min_x: u16) -> u16;

    /// Border drawn on the outermost cells of `rect`.
    fn draw_border(&mut self, rect: Rect, chars: BorderChars, base: Cell);

    /// Fill the interior, then draw the border.
    fn draw_box(&mut self, rect: Rect, chars: BorderChars, border: Cell, fill: Cell);

    /// Recolor cells in `rect` without touching their characters.
    fn paint_area(&mut self, rect: Rect, fg: Option<PackedRgba>, bg: Option<PackedRgba>);
}

/// Display width of `text` in cells.
pub fn text_width(text: &str) -> u16 {
    text.chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0) as u16)
        .sum()
}

impl Draw for Buffer {
    fn draw_horizontal_line(&mut self, x: u16, y: u16, width: u16, cell: Cell) {
        for i in 0..width {
            self.set(x.saturating_add(i), y, cell);
        }
    }

    fn draw_vertical_line(&mut self, x: u16, y: u16, height: u16, cell: Cell) {
        for i in 0..height {
            self.set(x, y.saturating_add(i), cell);
        }
    }

    fn print_text(&mut self, x: u16, y: u16, text: &str, base: Cell) -> u16 {
        self.print_text_clipped(x, y, text, base, self.width())
    }

    fn print_text_clipped(&mut self, x: u16, y: u16, text: &str, base: Cell, max_x: u16) -> u16 {
        let mut cx = x;
        for c in text.chars() {
            let width = UnicodeWidthChar::width(c).unwrap_or(0) as u16;
            if width == 0 {
                continue;
            }
            if cx.saturating_add(width) > max_x {
                break;
            }
            self.set(cx, y, base.with_char(c));
            cx = cx.saturating_add(width);
        }
        cx
    }

    fn print_text_right(&mut self, right: u16, y: u16, text: &str, base: Cell, min_x: u16) -> u16 {
        let start = right.saturating_sub(text_width(text)).max(min_x);
        self.print_text_clipped(start, y, text, base, right)
    }

    fn draw_border(&mut self, rect: Rect, chars: BorderChars, base: Cell) {
        if rect.is_empty() {
            return;
        }
        let (left, top) = (rect.x, rect.y);
        let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);

        self.draw_horizontal_line(left, top, rect.width, base.with_char(chars.horizontal));
        if rect.height > 1 {
            self.draw_horizontal_line(left, bottom, rect.width, base.with_char(chars.horizontal));
        }
        if rect.height > 2 {
            let v = base.with_char(chars.vertical);
            self.draw_vertical_line(left, top + 1, rect.height - 2, v);
            if rect.width > 1 {
                self.draw_vertical_line(right, top + 1, rect.height - 2, v);
            }
        }

        self.set(left, top, base.with_char(chars.top_left));
        if rect.width > 1 {
            self.set(right, top, base.with_char(chars.top_right));
        }
        if rect.height > 1 {
            self.set(left, bottom, base.with_char(chars.bottom_left));
        }
        if rect.width > 1 && rect.height > 1 {
            self.set(right, bottom, base.with_char(chars.bottom_right));
        }
    }

    fn draw_box(&mut self, rect: Rect, chars: BorderChars, border: Cell, fill: Cell) {
        if rect.is_empty() {
            return;
        }
        if rect.width > 2 && rect.height > 2 {
            self.fill(
                Rect::new(rect.x + 1, rect.y + 1, rect.width - 2, rect.height - 2),
                fill,
            );
        }
        self.draw_border(rect, chars, border);
    }

    fn paint_area(&mut self, rect: Rect, fg: Option<PackedRgba>, bg: Option<PackedRgba>) {
        let Some(clipped) = self.current_scissor().intersection_opt(&rect) else {
            return;
        };
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                if let Some(cell) = self.get_mut(x, y) {
                    if let Some(fg) = fg {
                        cell.fg = fg;
                    }
                    if let Some(bg) = bg {
                        cell.bg = bg;
                    }
                }
            }
        }
    }
}
