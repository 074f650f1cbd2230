#![forbid(unsafe_code)]

//! Presenter: diffed, state-tracked terminal output.
//!
//! Only cells that changed since the last frame are written. Style changes are
//! emitted when the next cell's style differs from the one already active, and
//! the cursor is positioned once per [`ChangeRun`](crate::diff::ChangeRun).
//! Everything is queued into a buffered writer and flushed once per frame.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedRgba, StyleFlags};
use crate::diff::BufferDiff;

const BUFFER_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellStyle {
    fg: PackedRgba,
    bg: PackedRgba,
    flags: StyleFlags,
}

impl CellStyle {
    fn of(cell: &Cell) -> Self {
        Self {
            fg: cell.fg,
            bg: cell.bg,
            flags: cell.flags,
        }
    }
}

fn to_color(color: PackedRgba) -> Color {
    if color.a() == 0 {
        Color::Reset
    } else {
        Color::Rgb {
            r: color.r(),
            g: color.g(),
            b: color.b(),
        }
    }
}

/// Writes buffers to a terminal, diffing against the previously presented frame.
pub struct Presenter<W: Write> {
    writer: BufWriter<W>,
    previous: Option<Buffer>,
    current_style: Option<CellStyle>,
}

impl<W: Write> Presenter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            previous: None,
            current_style: None,
        }
    }

    /// Forget the last frame so the next `present` repaints everything.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Present `buffer`, returning the number of cells written.
    pub fn present(&mut self, buffer: &Buffer) -> io::Result<usize> {
        let diff = match &self.previous {
            Some(prev) => BufferDiff::compute(prev, buffer),
            None => {
                queue!(self.writer, Clear(ClearType::All))?;
                BufferDiff::full(buffer)
            }
        };

        if !diff.is_empty() {
            queue!(self.writer, BeginSynchronizedUpdate)?;
            for run in diff.runs() {
                queue!(self.writer, MoveTo(run.x0, run.y))?;
                for x in run.x0..=run.x1 {
                    if let Some(cell) = buffer.get(x, run.y) {
                        self.emit_cell(cell)?;
                    }
                }
            }
            queue!(self.writer, SetAttribute(Attribute::Reset))?;
            self.current_style = None;
            queue!(self.writer, EndSynchronizedUpdate)?;
        }
        vistral_core::trace!(
            target: "vistral.render",
            changes = diff.len(),
            "frame presented"
        );

        self.writer.flush()?;
        self.previous = Some(buffer.clone());
        Ok(diff.len())
    }

    fn emit_cell(&mut self, cell: &Cell) -> io::Result<()> {
        // Wide heads already advanced the terminal cursor past this cell.
        if cell.is_continuation() {
            return Ok(());
        }
        let style = CellStyle::of(cell);
        if self.current_style != Some(style) {
            self.apply_style(style)?;
        }
        queue!(self.writer, Print(cell.ch))
    }

    fn apply_style(&mut self, style: CellStyle) -> io::Result<()> {
        if self.current_style.map(|s| s.flags) != Some(style.flags) {
            queue!(self.writer, SetAttribute(Attribute::Reset))?;
            for (flag, attr) in [
                (StyleFlags::BOLD, Attribute::Bold),
                (StyleFlags::DIM, Attribute::Dim),
                (StyleFlags::ITALIC, Attribute::Italic),
                (StyleFlags::UNDERLINE, Attribute::Underlined),
                (StyleFlags::REVERSE, Attribute::Reverse),
            ] {
                if style.flags.contains(flag) {
                    queue!(self.writer, SetAttribute(attr))?;
                }
            }
            // Reset cleared the colors too.
            self.current_style = None;
        }
        if self.current_style.map(|s| s.fg) != Some(style.fg) {
            queue!(self.writer, SetForegroundColor(to_color(style.fg)))?;
        }
        if self.current_style.map(|s| s.bg) != Some(style.bg) {
            queue!(self.writer, SetBackgroundColor(to_color(style.bg)))?;
        }
        self.current_style = Some(style);
        Ok(())
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        queue!(self.writer, Hide)?;
        self.writer.flush()
    }

    /// Show the cursor at (x, y).
    pub fn show_cursor_at(&mut self, x: u16, y: u16) -> io::Result<()> {
        queue!(self.writer, MoveTo(x, y), Show)?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn first_frame_writes_every_cell() {
        let mut presenter = Presenter::new(Vec::new());
        let buf = Buffer::new(4, 2);
        assert_eq!(presenter.present(&buf).ok(), Some(8));
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut presenter = Presenter::new(Vec::new());
        let buf = Buffer::new(4, 2);
        presenter.present(&buf).ok();
        assert_eq!(presenter.present(&buf).ok(), Some(0));
    }

    #[test]
    fn changed_cell_is_printed() {
        let mut presenter = Presenter::new(Vec::new());
        let mut buf = Buffer::new(4, 1);
        presenter.present(&buf).ok();
        buf.set(2, 0, Cell::from_char('Z').with_fg(PackedRgba::rgb(1, 2, 3)));
        assert_eq!(presenter.present(&buf).ok(), Some(1));
        let out = presenter.into_inner().map(|b| text_of(&b)).unwrap_or_default();
        assert!(out.contains('Z'));
        assert!(out.contains("38;2;1;2;3"), "missing truecolor fg in {out:?}");
    }

    #[test]
    fn invalidate_forces_full_repaint() {
        let mut presenter = Presenter::new(Vec::new());
        let buf = Buffer::new(3, 1);
        presenter.present(&buf).ok();
        presenter.invalidate();
        assert_eq!(presenter.present(&buf).ok(), Some(3));
    }
}
