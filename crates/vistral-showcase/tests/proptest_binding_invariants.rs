//! Property tests for the per-screen binding invariants.

use std::collections::HashMap;
use std::time::Duration;

use proptest::prelude::*;
use vistral_showcase::screens::Screen;
use vistral_showcase::screens::axis_stream::{AxisStream, EXIT_X, SPAWN_INTERVAL, SPAWN_X};
use vistral_showcase::screens::frame_snapshots::{CENTER, RADIUS, Snapshot, position};
use vistral_showcase::screens::key_updates::{KeyUpdates, VALUE_MAX, VALUE_MIN};

#[derive(Debug, Clone)]
enum KeyOp {
    Announce,
    /// Commit the pending cycle, or an arbitrary (probably stale) one.
    Commit(Option<u64>),
}

fn key_op() -> impl Strategy<Value = KeyOp> {
    prop_oneof![
        Just(KeyOp::Announce),
        Just(KeyOp::Commit(None)),
        (0u64..20).prop_map(|c| KeyOp::Commit(Some(c))),
    ]
}

proptest! {
    #[test]
    fn particles_only_move_left_and_stay_in_window(
        seed in any::<u64>(),
        gaps in proptest::collection::vec(1u64..120, 1..400),
    ) {
        let mut axis = AxisStream::new(seed);
        let _ = axis.activate();
        let mut seen: HashMap<u64, f64> = HashMap::new();
        let mut now = Duration::ZERO;
        for gap in gaps {
            now += Duration::from_millis(gap);
            axis.advance_frame(now);
            for p in axis.particles() {
                prop_assert!(p.x > EXIT_X);
                prop_assert!(p.x <= SPAWN_X);
                if let Some(prev) = seen.insert(p.id, p.x) {
                    prop_assert!(p.x < prev, "particle {} moved right", p.id);
                }
            }
        }
    }

    #[test]
    fn spawns_are_spaced_by_more_than_interval(
        seed in any::<u64>(),
        gaps in proptest::collection::vec(1u64..400, 1..300),
    ) {
        let mut axis = AxisStream::new(seed);
        let _ = axis.activate();
        let mut spawns = Vec::new();
        let mut now = Duration::ZERO;
        for gap in gaps {
            now += Duration::from_millis(gap);
            let before = axis.spawned();
            axis.advance_frame(now);
            prop_assert!(axis.spawned() - before <= 1);
            if axis.spawned() > before {
                spawns.push(now);
            }
        }
        prop_assert!(spawns.windows(2).all(|w| w[1] - w[0] > SPAWN_INTERVAL));
    }

    #[test]
    fn at_most_one_row_highlighted(
        seed in any::<u64>(),
        ops in proptest::collection::vec(key_op(), 1..60),
    ) {
        let mut key = KeyUpdates::new(seed);
        let _ = key.activate();
        let mut now = Duration::ZERO;
        let mut commits = 0;
        for op in ops {
            now += Duration::from_millis(400);
            match op {
                KeyOp::Announce => {
                    key.announce(now);
                }
                KeyOp::Commit(cycle) => {
                    let cycle = cycle.or_else(|| key.pending().map(|p| p.cycle));
                    if let Some(cycle) = cycle
                        && key.commit(cycle, now).is_some()
                    {
                        commits += 1;
                    }
                }
            }
            let highlighted = key.rows().iter().filter(|r| r.highlight).count();
            prop_assert!(highlighted <= 1);
            prop_assert_eq!(highlighted, usize::from(commits > 0));
            prop_assert_eq!(key.commits(), commits);
            for row in key.rows().iter().filter(|r| r.last_updated.is_some()) {
                prop_assert!((VALUE_MIN..VALUE_MAX).contains(&row.value));
            }
        }
    }

    #[test]
    fn snapshot_positions_are_pure_and_on_orbit(t in 0u64..10_000, index in 0usize..3) {
        let a = position(t, index);
        let b = position(t, index);
        prop_assert_eq!(a, b);
        let r = ((a.x - CENTER).powi(2) + (a.y - CENTER).powi(2)).sqrt();
        prop_assert!((r - RADIUS).abs() < 1e-9);
        prop_assert_eq!(Snapshot::at(t).points[index].pos, a);
    }
}
