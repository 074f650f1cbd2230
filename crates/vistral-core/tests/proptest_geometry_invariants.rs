//! Property-based invariants for the geometry primitives.
//!
//! 1. Intersection is commutative and fits within both inputs.
//! 2. `inner` never grows a rectangle.
//! 3. Column splitting stays inside the parent and never overlaps.
//! 4. `BoundingBox::relative_to` is undone by adding the surface origin back.

use proptest::prelude::*;
use vistral_core::geometry::{BoundingBox, Rect, Sides};

fn small_rect() -> impl Strategy<Value = Rect> {
    (0u16..=500, 0u16..=500, 0u16..=500, 0u16..=500).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn sides() -> impl Strategy<Value = Sides> {
    (0u16..=50, 0u16..=50, 0u16..=50, 0u16..=50).prop_map(|(t, r, b, l)| Sides::new(t, r, b, l))
}

proptest! {
    #[test]
    fn intersection_commutative_and_bounded(a in small_rect(), b in small_rect()) {
        let ab = a.intersection_opt(&b);
        prop_assert_eq!(ab, b.intersection_opt(&a));
        if let Some(r) = ab {
            prop_assert!(r.x >= a.x && r.x >= b.x);
            prop_assert!(r.right() <= a.right() && r.right() <= b.right());
            prop_assert!(r.bottom() <= a.bottom() && r.bottom() <= b.bottom());
        }
    }

    #[test]
    fn inner_never_grows(r in small_rect(), m in sides()) {
        let inner = r.inner(m);
        prop_assert!(inner.width <= r.width);
        prop_assert!(inner.height <= r.height);
        prop_assert!(inner.x >= r.x);
        prop_assert!(inner.y >= r.y);
    }

    #[test]
    fn columns_are_disjoint_and_contained(r in small_rect(), count in 1u16..=6, gap in 0u16..=4) {
        prop_assume!(r.width >= count * (gap + 1));
        let cols = r.columns(count, gap);
        prop_assert_eq!(cols.len(), count as usize);
        for pair in cols.windows(2) {
            prop_assert!(pair[0].right() <= pair[1].x, "overlap: {:?}", pair);
        }
        for col in &cols {
            prop_assert!(col.x >= r.x && col.right() <= r.right());
            prop_assert_eq!(col.height, r.height);
        }
    }

    #[test]
    fn relative_to_round_trips(
        x in -1000.0f64..1000.0, y in -1000.0f64..1000.0,
        sx in -1000.0f64..1000.0, sy in -1000.0f64..1000.0
    ) {
        let b = BoundingBox::new(x, y, 3.0, 1.0);
        let surface = BoundingBox::new(sx, sy, 10.0, 10.0);
        let local = b.relative_to(&surface);
        prop_assert!((local.x + sx - x).abs() < 1e-9);
        prop_assert!((local.y + sy - y).abs() < 1e-9);
        prop_assert_eq!(local.width, b.width);
    }
}
