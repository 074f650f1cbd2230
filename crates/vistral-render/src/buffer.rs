#![forbid(unsafe_code)]

//! Buffer grid storage.
//!
//! The `Buffer` is a row-major grid of [`Cell`]s with a scissor stack for
//! clipping and an opacity stack for fading whole regions.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`
//! 2. Width and height never change after creation
//! 3. Pushing a scissor never widens the current clip
//! 4. Both stacks always hold at least one element

use crate::cell::{Cell, PackedRgba};
use unicode_width::UnicodeWidthChar;
use vistral_core::geometry::Rect;

/// A 2D grid of terminal cells.
///
/// ```
/// use vistral_render::buffer::Buffer;
/// use vistral_render::cell::Cell;
///
/// let mut buffer = Buffer::new(4, 1);
/// buffer.set(0, 0, Cell::from_char('H'));
/// buffer.set(1, 0, Cell::from_char('i'));
/// assert_eq!(buffer.row_text(0), "Hi");
/// ```
#[derive(Debug, Clone)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    scissor_stack: Vec<Rect>,
    opacity_stack: Vec<f32>,
}

impl Buffer {
    /// Blank buffer. Zero-sized buffers are allowed and ignore every write.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
            scissor_stack: vec![Rect::from_size(width, height)],
            opacity_stack: vec![1.0],
        }
    }

    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub const fn area(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        self.index(x, y).map(|i| &mut self.cells[i])
    }

    /// Write a cell at (x, y).
    ///
    /// - Skips writes outside the buffer or the current scissor.
    /// - Applies the current opacity to both colors.
    /// - Composites translucent colors over what is already there, so a
    ///   half-transparent foreground blends with the existing background.
    /// - Wide characters are written whole or not at all.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let width = UnicodeWidthChar::width(cell.ch).unwrap_or(1).max(1) as u16;
        let scissor = self.current_scissor();
        for dx in 0..width {
            let cx = x.saturating_add(dx);
            if self.index(cx, y).is_none() || !scissor.contains(cx, y) {
                return;
            }
        }
        let Some(idx) = self.index(x, y) else {
            return;
        };

        let opacity = self.current_opacity();
        let (fg, bg) = if opacity < 1.0 {
            (cell.fg.with_opacity(opacity), cell.bg.with_opacity(opacity))
        } else {
            (cell.fg, cell.bg)
        };
        let existing_bg = self.cells[idx].bg;
        let bg = bg.over(existing_bg);
        let fg = if fg.is_opaque() { fg } else { fg.over(bg) };

        self.cells[idx] = Cell { fg, bg, ..cell };
        for dx in 1..width {
            if let Some(tail) = self.index(x + dx, y) {
                self.cells[tail] = Cell::CONTINUATION;
            }
        }
    }

    /// Fill `rect` (clipped) with `cell`.
    pub fn fill(&mut self, rect: Rect, cell: Cell) {
        let Some(clipped) = self.current_scissor().intersection_opt(&rect) else {
            return;
        };
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.set(x, y, cell);
            }
        }
    }

    /// Reset every cell to the default blank cell.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Restrict writes to `rect` intersected with the current clip.
    pub fn push_scissor(&mut self, rect: Rect) {
        let clipped = self
            .current_scissor()
            .intersection_opt(&rect)
            .unwrap_or_default();
        self.scissor_stack.push(clipped);
    }

    /// Pop the innermost clip. The base clip is never removed.
    pub fn pop_scissor(&mut self) {
        if self.scissor_stack.len() > 1 {
            self.scissor_stack.pop();
        }
    }

    pub fn current_scissor(&self) -> Rect {
        self.scissor_stack
            .last()
            .copied()
            .unwrap_or_else(|| self.area())
    }

    /// Multiply subsequent writes' alpha by `opacity`.
    pub fn push_opacity(&mut self, opacity: f32) {
        let combined = self.current_opacity() * opacity.clamp(0.0, 1.0);
        self.opacity_stack.push(combined);
    }

    pub fn pop_opacity(&mut self) {
        if self.opacity_stack.len() > 1 {
            self.opacity_stack.pop();
        }
    }

    pub fn current_opacity(&self) -> f32 {
        self.opacity_stack.last().copied().unwrap_or(1.0)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Characters of row `y` with trailing spaces trimmed.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        let row: String = self.cells[start..start + usize::from(self.width)]
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect();
        row.trim_end().to_string()
    }

    /// Whole buffer as text, one line per row.
    pub fn to_plain_text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True if any row contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row_text(y).contains(needle))
    }

    /// Compare cell contents, ignoring clip and opacity state.
    pub fn content_eq(&self, other: &Buffer) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }

    /// Background color at (x, y), or transparent when out of bounds.
    pub fn bg_at(&self, x: u16, y: u16) -> PackedRgba {
        self.get(x, y).map_or(PackedRgba::TRANSPARENT, |c| c.bg)
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.content_eq(other)
    }
}

impl Eq for Buffer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut buf = Buffer::new(3, 2);
        buf.set(3, 0, Cell::from_char('x'));
        buf.set(0, 2, Cell::from_char('x'));
        assert_eq!(buf.to_plain_text(), "\n");
    }

    #[test]
    fn zero_sized_buffer_is_inert() {
        let mut buf = Buffer::new(0, 0);
        buf.set(0, 0, Cell::from_char('x'));
        buf.fill(Rect::from_size(5, 5), Cell::from_char('y'));
        assert!(buf.cells().is_empty());
        assert_eq!(buf.to_plain_text(), "");
    }

    #[test]
    fn scissor_clips_and_nests() {
        let mut buf = Buffer::new(6, 1);
        buf.push_scissor(Rect::new(1, 0, 3, 1));
        buf.push_scissor(Rect::new(2, 0, 10, 1));
        assert_eq!(buf.current_scissor(), Rect::new(2, 0, 2, 1));
        buf.fill(Rect::from_size(6, 1), Cell::from_char('#'));
        assert_eq!(buf.row_text(0), "  ##");
        buf.pop_scissor();
        buf.pop_scissor();
        buf.pop_scissor();
        assert_eq!(buf.current_scissor(), buf.area());
    }

    #[test]
    fn translucent_fg_blends_with_background() {
        let mut buf = Buffer::new(1, 1);
        buf.set(0, 0, Cell::default().with_bg(PackedRgba::BLACK));
        buf.push_opacity(0.5);
        buf.set(0, 0, Cell::from_char('o').with_fg(PackedRgba::WHITE));
        buf.pop_opacity();
        let cell = buf.get(0, 0).copied().unwrap_or_default();
        assert_eq!(cell.ch, 'o');
        assert!(cell.fg.is_opaque());
        assert!((120..=135).contains(&cell.fg.r()));
        assert_eq!(cell.bg, PackedRgba::BLACK);
    }

    #[test]
    fn wide_char_marks_continuation() {
        let mut buf = Buffer::new(3, 1);
        buf.set(0, 0, Cell::from_char('界'));
        assert!(buf.get(1, 0).is_some_and(Cell::is_continuation));
        assert_eq!(buf.row_text(0), "界");
        // No room for the tail: nothing is written.
        buf.set(2, 0, Cell::from_char('界'));
        assert_eq!(buf.get(2, 0).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn contains_text_scans_rows() {
        let mut buf = Buffer::new(5, 2);
        for (i, ch) in "abc".chars().enumerate() {
            buf.set(i as u16, 1, Cell::from_char(ch));
        }
        assert!(buf.contains_text("abc"));
        assert!(!buf.contains_text("abd"));
    }
}
