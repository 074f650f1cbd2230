#![forbid(unsafe_code)]

//! Connector curve between two laid-out anchors.
//!
//! The math is pure: anchors come from a [`LayoutProvider`], the curve is a
//! cubic Bezier in the drawing surface's own coordinates, and rasterizing it
//! is the caller's business.
//!
//! Construction, with every point relative to the surface origin:
//!
//! ```text
//! start = source.right_mid()
//! end   = target.top_left()
//! cp1   = (start.x + (end.x - start.x) * 0.6, start.y)
//! cp2   = (start.x + (end.x - start.x) * 0.4, end.y)
//! ```
//!
//! Control points keep the start and end heights, which gives the curve its
//! S shape.

use std::fmt::Write as _;

use vistral_core::geometry::{BoundingBox, PointF};

/// Elements a connector can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The surface the curve is drawn on.
    Surface,
    /// Where the curve starts (right-middle edge).
    Source,
    /// Where the curve ends (top-left corner).
    Target,
}

/// Read access to laid-out geometry.
///
/// `None` means the element is not laid out (not mounted, or hidden at the
/// current size). Callers must skip the draw rather than guess.
pub trait LayoutProvider {
    fn bounding_box(&self, anchor: Anchor) -> Option<BoundingBox>;
}

const CP1_T: f64 = 0.6;
const CP2_T: f64 = 0.4;

/// A cubic Bezier from a source anchor to a target anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorLine {
    pub start: PointF,
    pub cp1: PointF,
    pub cp2: PointF,
    pub end: PointF,
}

impl ConnectorLine {
    /// Build the curve from boxes in a shared coordinate space.
    pub fn between(source: &BoundingBox, target: &BoundingBox, surface: &BoundingBox) -> Self {
        let start = source.relative_to(surface).right_mid();
        let end = target.relative_to(surface).top_left();
        let dx = end.x - start.x;
        Self {
            start,
            cp1: PointF::new(start.x + dx * CP1_T, start.y),
            cp2: PointF::new(start.x + dx * CP2_T, end.y),
            end,
        }
    }

    /// Query all three anchors; `None` if any of them is missing.
    pub fn from_layout(layout: &impl LayoutProvider) -> Option<Self> {
        let surface = layout.bounding_box(Anchor::Surface)?;
        let source = layout.bounding_box(Anchor::Source)?;
        let target = layout.bounding_box(Anchor::Target)?;
        Some(Self::between(&source, &target, &surface))
    }

    /// Point on the curve at `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> PointF {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        PointF::new(
            a * self.start.x + b * self.cp1.x + c * self.cp2.x + d * self.end.x,
            a * self.start.y + b * self.cp1.y + c * self.cp2.y + d * self.end.y,
        )
    }

    /// `segments + 1` evenly spaced points, endpoints included.
    pub fn sample(&self, segments: usize) -> Vec<PointF> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }

    /// SVG path data: `M sx sy C c1x c1y, c2x c2y, ex ey`.
    pub fn to_svg_path(&self) -> String {
        let mut d = String::with_capacity(64);
        let _ = write!(
            d,
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.cp1.x,
            self.cp1.y,
            self.cp2.x,
            self.cp2.y,
            self.end.x,
            self.end.y
        );
        d
    }
}
