#![forbid(unsafe_code)]

//! Shared UI chrome: navigation sidebar, status bar, and help overlay.

use unicode_width::UnicodeWidthChar;
use vistral_core::geometry::{Rect, Sides};
use vistral_render::buffer::Buffer;
use vistral_render::cell::StyleFlags;
use vistral_render::drawing::{BorderChars, Draw, text_width};
use vistral_render::frame::Frame;

use crate::app::ScreenId;
use crate::screens::{HelpEntry, SCREEN_REGISTRY};
use crate::theme::{self, accent, bg, fg};

/// Sidebar width in columns, border included.
pub const SIDEBAR_WIDTH: u16 = 26;

/// Below this width the sidebar is dropped.
pub const SIDEBAR_MIN_AREA_WIDTH: u16 = 60;

/// Where the chrome puts things.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeLayout {
    pub sidebar: Option<Rect>,
    /// Area handed to the current screen.
    pub content: Rect,
    pub status: Rect,
}

/// Split the full terminal area into sidebar, content, and status bar.
pub fn layout(area: Rect) -> ChromeLayout {
    let (main, status) = area.split_bottom(1);
    let (sidebar, rest) = if main.width >= SIDEBAR_MIN_AREA_WIDTH {
        let (side, rest) = main.split_left(SIDEBAR_WIDTH);
        (Some(side), rest)
    } else {
        (None, main)
    };
    let content = rest.inner(Sides::new(1, theme::spacing::SM, 0, theme::spacing::SM));
    ChromeLayout {
        sidebar,
        content,
        status,
    }
}

/// Render the navigation sidebar.
pub fn render_sidebar(current: ScreenId, frame: &mut Frame, area: Rect) {
    let buf = &mut frame.buffer;
    buf.fill(area, theme::fill(bg::BASE));
    if area.width < 4 || area.height < 4 {
        return;
    }
    // Right border separates the sidebar from content.
    let border_x = area.right() - 1;
    buf.draw_vertical_line(border_x, area.y, area.height, theme::border().with_char('│'));

    let x = area.x + theme::spacing::SM;
    let max_x = border_x.saturating_sub(1);
    let mut y = area.y + 1;

    // Brand mark.
    let mark = theme::text()
        .with_bg(accent::PRIMARY)
        .with_flags(StyleFlags::BOLD);
    buf.print_text_clipped(x, y, " V ", mark, max_x);
    buf.print_text_clipped(x + 4, y, "Vistral", theme::heading(), max_x);
    y += 2;

    buf.print_text_clipped(x, y, "TEMPORAL BINDINGS", theme::dim(), max_x);
    y += 2;

    for meta in SCREEN_REGISTRY {
        if y + 1 >= area.bottom() {
            break;
        }
        let active = meta.id == current;
        if active {
            buf.fill(
                Rect::new(area.x, y, border_x - area.x, 2),
                theme::fill(bg::RAISED),
            );
            let marker = theme::text().with_fg(theme::screen_accent(meta.id));
            buf.set(area.x, y, marker.with_char('▌'));
            buf.set(area.x, y + 1, marker.with_char('▌'));
        }
        let title_style = if active {
            theme::heading()
        } else {
            theme::text().with_fg(fg::SECONDARY)
        };
        let after_key = buf.print_text_clipped(x, y, meta.hotkey, theme::dim(), max_x);
        buf.print_text_clipped(after_key + 1, y, meta.title, title_style, max_x);
        buf.print_text_clipped(after_key + 1, y + 1, meta.sub_label, theme::muted(), max_x);
        y += 3;
    }

    let footer_width = max_x.saturating_sub(x);
    let footer = wrap(
        "Interactive visualization concept for Vistral Design Principles.",
        footer_width,
    );
    let footer_top = area.bottom().saturating_sub(footer.len() as u16 + 1);
    if footer_top > y {
        for (i, line) in footer.iter().enumerate() {
            buf.print_text_clipped(x, footer_top + i as u16, line, theme::dim(), max_x);
        }
    }
}

/// Render the one-line status bar.
///
/// Left: current screen title in its accent. Right: key hints and size.
pub fn render_status_bar(current: ScreenId, frame: &mut Frame, area: Rect) {
    if area.is_empty() {
        return;
    }
    let buf = &mut frame.buffer;
    buf.fill(area, theme::fill(bg::SURFACE));

    let title_style = theme::text()
        .with_fg(theme::screen_accent(current))
        .with_flags(StyleFlags::BOLD);
    let x = buf.print_text_clipped(area.x + 1, area.y, current.title(), title_style, area.right());
    let position = format!(" {}/{}", current.index() + 1, ScreenId::ALL.len());
    let left_end = buf.print_text_clipped(x, area.y, &position, theme::muted(), area.right());

    let hints = format!(
        "1-4 screens  Tab next  ? help  q quit  {}x{} ",
        buf.width(),
        buf.height()
    );
    buf.print_text_right(area.right(), area.y, &hints, theme::muted(), left_end + 1);
}

/// Render the help overlay centered in `area`.
pub fn render_help_overlay(
    current: ScreenId,
    screen_bindings: &[HelpEntry],
    frame: &mut Frame,
    area: Rect,
) {
    const GLOBAL: &[HelpEntry] = &[
        HelpEntry {
            key: "1-4",
            action: "Switch to screen by number",
        },
        HelpEntry {
            key: "Tab / S-Tab",
            action: "Next / previous screen",
        },
        HelpEntry {
            key: "?",
            action: "Toggle this help overlay",
        },
        HelpEntry {
            key: "q / Esc",
            action: "Quit",
        },
    ];

    let rows = GLOBAL.len() + screen_bindings.len() + 6;
    let overlay_width = ((area.width as u32 * 60) / 100).clamp(36, 64) as u16;
    let overlay_width = overlay_width.min(area.width.saturating_sub(2));
    let overlay_height = (rows as u16).min(area.height.saturating_sub(2));
    if overlay_width < 12 || overlay_height < 5 {
        return;
    }
    let x = area.x + (area.width - overlay_width) / 2;
    let y = area.y + (area.height - overlay_height) / 2;
    let overlay = Rect::new(x, y, overlay_width, overlay_height);

    let buf = &mut frame.buffer;
    buf.draw_box(
        overlay,
        BorderChars::ROUNDED,
        theme::text().with_fg(accent::PRIMARY),
        theme::fill(bg::SURFACE),
    );
    let title = " Keyboard Shortcuts ";
    let title_x = overlay.x + (overlay.width.saturating_sub(text_width(title))) / 2;
    buf.print_text(title_x, overlay.y, title, theme::heading());

    let inner = overlay.inner(Sides::new(1, 2, 1, 2));
    let key_col = 14.min(inner.width / 2);
    let mut row = inner.y;
    help_section(buf, inner, key_col, &mut row, "Global", GLOBAL);
    if !screen_bindings.is_empty() {
        row += 1;
        let heading = format!("{} Controls", current.title());
        help_section(buf, inner, key_col, &mut row, &heading, screen_bindings);
    }

    let footer = "Press ? or Esc to close";
    let footer_x = overlay.x + (overlay.width.saturating_sub(text_width(footer))) / 2;
    buf.print_text(footer_x, overlay.bottom() - 1, footer, theme::muted());
}

fn help_section(
    buf: &mut Buffer,
    inner: Rect,
    key_col: u16,
    row: &mut u16,
    heading: &str,
    entries: &[HelpEntry],
) {
    if *row >= inner.bottom() {
        return;
    }
    let heading_style = theme::text()
        .with_fg(fg::SECONDARY)
        .with_flags(StyleFlags::BOLD | StyleFlags::UNDERLINE);
    buf.print_text_clipped(inner.x, *row, heading, heading_style, inner.right());
    *row += 1;
    for entry in entries {
        if *row >= inner.bottom() {
            return;
        }
        buf.print_text_clipped(inner.x, *row, entry.key, theme::emphasis(), inner.x + key_col);
        buf.print_text_clipped(inner.x + key_col, *row, entry.action, theme::text(), inner.right());
        *row += 1;
    }
}

/// Greedy word wrap by display width. Words wider than `width` are split.
pub fn wrap(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = usize::from(text_width(word));
        let needed = if line.is_empty() {
            word_width
        } else {
            line_width + 1 + word_width
        };
        if needed <= width {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            line_width = needed;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        for ch in word.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if line_width + w > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(ch);
            line_width += w;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
