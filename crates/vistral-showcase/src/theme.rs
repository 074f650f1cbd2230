#![forbid(unsafe_code)]

//! Shared colors and cell styles for the showcase.
//!
//! There is a single dark theme. Colors are grouped the way the screens use
//! them:
//!
//! | Module | Use |
//! |--------|-----|
//! | [`bg`] | Surfaces, from the deepest backdrop to raised cards |
//! | [`fg`] | Text, from primary to disabled |
//! | [`accent`] | The brand pink plus the per-screen palettes |
//!
//! # Spacing
//!
//! Layout code uses the [`spacing`] tokens instead of bare numbers so the
//! screens share one rhythm.

use vistral_render::cell::{Cell, PackedRgba, StyleFlags};

use crate::app::ScreenId;

pub mod bg {
    use super::PackedRgba;

    /// Page background.
    pub const DEEP: PackedRgba = PackedRgba::rgb(0x09, 0x09, 0x0b);
    /// Sidebar and canvases.
    pub const BASE: PackedRgba = PackedRgba::rgb(0x0c, 0x0c, 0x0e);
    /// Cards and panels.
    pub const SURFACE: PackedRgba = PackedRgba::rgb(0x18, 0x18, 0x1b);
    /// Selected navigation entry.
    pub const RAISED: PackedRgba = PackedRgba::rgb(0x27, 0x27, 0x2a);
    /// Row highlight behind the latest key update (pink at 20%).
    pub const HIGHLIGHT: PackedRgba = PackedRgba::rgba(0xec, 0x48, 0x99, 0x33);
    /// Source layer card on the home screen (pink at 10%).
    pub const SOURCE: PackedRgba = PackedRgba::rgba(0xec, 0x48, 0x99, 0x1a);
}

pub mod fg {
    use super::PackedRgba;

    pub const PRIMARY: PackedRgba = PackedRgba::rgb(0xe4, 0xe4, 0xe7);
    pub const SECONDARY: PackedRgba = PackedRgba::rgb(0xa1, 0xa1, 0xaa);
    pub const MUTED: PackedRgba = PackedRgba::rgb(0x71, 0x71, 0x7a);
    pub const DISABLED: PackedRgba = PackedRgba::rgb(0x52, 0x52, 0x5b);
    /// Borders and grid lines.
    pub const BORDER: PackedRgba = PackedRgba::rgb(0x27, 0x27, 0x2a);
    pub const GRID: PackedRgba = PackedRgba::rgb(0x1f, 0x1f, 0x23);
}

pub mod accent {
    use super::PackedRgba;

    /// Brand pink (pink-500).
    pub const PRIMARY: PackedRgba = PackedRgba::rgb(0xec, 0x48, 0x99);
    /// Lighter pink for emphasized numbers (pink-400).
    pub const PRIMARY_LIGHT: PackedRgba = PackedRgba::rgb(0xf4, 0x72, 0xb6);
    /// Connector endpoints.
    pub const MAGENTA: PackedRgba = PackedRgba::rgb(0xd5, 0x3f, 0x8c);
    /// Stream color (sky-500).
    pub const SKY: PackedRgba = PackedRgba::rgb(0x0e, 0xa5, 0xe9);

    /// Particle colors on the axis screen.
    pub const STREAM: [PackedRgba; 3] = [
        PackedRgba::rgb(0x0e, 0xa5, 0xe9),
        PackedRgba::rgb(0x06, 0xb6, 0xd4),
        PackedRgba::rgb(0x3b, 0x82, 0xf6),
    ];

    /// Point colors on the frame screen, by point index.
    pub const SNAPSHOT: [PackedRgba; 3] = [
        PackedRgba::rgb(0xf4, 0x72, 0xb6),
        PackedRgba::rgb(0xc0, 0x84, 0xfc),
        PackedRgba::rgb(0x81, 0x8c, 0xf8),
    ];
}

pub mod spacing {
    /// Tight spacing between inline elements.
    pub const XS: u16 = 1;
    /// Gaps between list or grid items.
    pub const SM: u16 = 2;
    /// Padding inside panels.
    pub const MD: u16 = 3;
    /// Between major sections.
    pub const LG: u16 = 4;
}

/// Accent used for a screen's heading and navigation marker.
pub const fn screen_accent(id: ScreenId) -> PackedRgba {
    match id {
        ScreenId::Home => accent::PRIMARY,
        ScreenId::Axis => accent::SKY,
        ScreenId::Frame => accent::SNAPSHOT[1],
        ScreenId::Key => accent::PRIMARY_LIGHT,
    }
}

/// Base cell for regular text.
pub const fn text() -> Cell {
    Cell::from_char(' ')
        .with_fg(fg::PRIMARY)
        .with_bg(PackedRgba::TRANSPARENT)
}

pub const fn muted() -> Cell {
    text().with_fg(fg::MUTED)
}

pub const fn dim() -> Cell {
    text().with_fg(fg::DISABLED)
}

pub const fn heading() -> Cell {
    text().with_flags(StyleFlags::BOLD)
}

/// Bold text in the brand pink.
pub const fn emphasis() -> Cell {
    text().with_fg(accent::PRIMARY).with_flags(StyleFlags::BOLD)
}

pub const fn border() -> Cell {
    text().with_fg(fg::BORDER)
}

/// Solid fill with the given background.
pub const fn fill(color: PackedRgba) -> Cell {
    Cell::from_char(' ').with_fg(fg::PRIMARY).with_bg(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_match_hex_sources() {
        let stream: Vec<_> = ["#0ea5e9", "#06b6d4", "#3b82f6"]
            .iter()
            .filter_map(|h| PackedRgba::from_hex(h))
            .collect();
        assert_eq!(stream, accent::STREAM.to_vec());
        let snapshot: Vec<_> = ["#f472b6", "#c084fc", "#818cf8"]
            .iter()
            .filter_map(|h| PackedRgba::from_hex(h))
            .collect();
        assert_eq!(snapshot, accent::SNAPSHOT.to_vec());
    }

    #[test]
    fn surfaces_get_lighter() {
        let luma = |c: PackedRgba| u32::from(c.r()) + u32::from(c.g()) + u32::from(c.b());
        assert!(luma(bg::DEEP) < luma(bg::BASE));
        assert!(luma(bg::BASE) < luma(bg::SURFACE));
        assert!(luma(bg::SURFACE) < luma(bg::RAISED));
    }

    #[test]
    fn translucent_highlights_stay_translucent() {
        assert!(!bg::HIGHLIGHT.is_opaque());
        assert!(!bg::SOURCE.is_opaque());
        assert!(accent::PRIMARY.is_opaque());
    }
}
