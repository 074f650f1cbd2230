#![forbid(unsafe_code)]

//! End-to-end timing scenarios for every screen.
//!
//! Each test drives the full `AppModel` through the deterministic simulator,
//! so subscription reconciliation and message stamping behave exactly as
//! they do under the real event loop.

use std::time::Duration;

use vistral_core::event::{Event, KeyCode};
use vistral_runtime::ProgramSimulator;
use vistral_showcase::app::{AppModel, AppMsg, ScreenId};
use vistral_showcase::screens::key_updates::{KEYS, VALUE_MAX, VALUE_MIN};
use vistral_showcase::screens::{Screen, sub_id};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn started(screen: ScreenId) -> ProgramSimulator<AppModel> {
    let mut sim = ProgramSimulator::new(AppModel::new(7).with_start_screen(screen));
    sim.init();
    sim
}

fn times(sim: &ProgramSimulator<AppModel>) -> Vec<u64> {
    sim.model()
        .screens
        .frame
        .frames()
        .iter()
        .map(|s| s.time)
        .collect()
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

#[test]
fn home_connector_waits_for_settle_delay() {
    let mut sim = started(ScreenId::Home);
    sim.advance_to(ms(99));
    assert!(sim.model().screens.home.connector().is_none());
    assert!(!sim.model().screens.home.is_settled());

    sim.advance_to(ms(100));
    let home = &sim.model().screens.home;
    assert!(home.is_settled());
    assert!(home.connector().is_some());
    assert_eq!(home.redraw_count(), 1);
    assert!(sim.active_subscriptions().is_empty());
}

#[test]
fn home_connector_follows_resize() {
    let mut sim = started(ScreenId::Home);
    sim.advance_to(ms(100));
    let before = sim.model().screens.home.connector().copied();

    sim.inject_event(Event::Resize {
        width: 150,
        height: 40,
    });
    let home = &sim.model().screens.home;
    assert_eq!(home.redraw_count(), 2);
    assert_ne!(home.connector().copied(), before);
}

#[test]
fn home_resize_before_settle_draws_at_once() {
    let mut sim = started(ScreenId::Home);
    sim.advance_to(ms(40));
    sim.inject_event(Event::Resize {
        width: 150,
        height: 40,
    });
    let home = &sim.model().screens.home;
    assert!(!home.is_settled());
    assert!(home.connector().is_some());
    assert_eq!(home.redraw_count(), 1);

    // The pending settle still lands and redraws on the same layout.
    sim.advance_to(ms(100));
    let home = &sim.model().screens.home;
    assert!(home.is_settled());
    assert_eq!(home.redraw_count(), 2);
}

#[test]
fn home_narrow_terminal_has_no_connector() {
    let mut app = AppModel::new(7);
    app.size = (60, 24);
    let mut sim = ProgramSimulator::new(app);
    sim.init();
    sim.advance_to(ms(500));
    let home = &sim.model().screens.home;
    assert!(home.is_settled());
    assert!(home.connector().is_none());
}

#[test]
fn home_renders_layers_and_card() {
    let mut sim = started(ScreenId::Home);
    sim.advance_to(ms(100));
    let frame = sim.capture_frame(120, 36);
    assert!(frame.contains_text("GRAMMAR LAYERS"));
    assert!(frame.contains_text("TEMPORAL BINDINGS"));
}

// ---------------------------------------------------------------------------
// Axis stream
// ---------------------------------------------------------------------------

#[test]
fn axis_spawns_on_interval() {
    let mut sim = started(ScreenId::Axis);
    sim.advance_to(ms(2400));
    let axis = &sim.model().screens.axis;
    assert_eq!(axis.spawned(), 3);
    assert_eq!(axis.last_spawn(), Some(ms(1648)));
}

#[test]
fn axis_particles_drift_left() {
    let mut sim = started(ScreenId::Axis);
    sim.advance_to(ms(16));
    let first_x = sim.model().screens.axis.particles()[0].x;
    sim.advance_to(ms(500));
    let later_x = sim.model().screens.axis.particles()[0].x;
    assert!(later_x < first_x);
}

#[test]
fn axis_pause_stops_frames() {
    let mut sim = started(ScreenId::Axis);
    sim.advance_to(ms(100));
    sim.inject_event(Event::key(KeyCode::Char(' ')));
    assert!(sim.model().screens.axis.is_paused());
    assert!(sim.active_subscriptions().is_empty());

    let spawned = sim.model().screens.axis.spawned();
    sim.advance_to(ms(3000));
    assert_eq!(sim.model().screens.axis.spawned(), spawned);

    sim.inject_event(Event::key(KeyCode::Char('p')));
    sim.advance_to(ms(3100));
    assert!(sim.model().screens.axis.spawned() > spawned);
}

// ---------------------------------------------------------------------------
// Frame snapshots
// ---------------------------------------------------------------------------

#[test]
fn frame_cadence_advances_window() {
    let mut sim = started(ScreenId::Frame);
    assert_eq!(times(&sim), vec![0, 1, 2]);
    sim.advance_to(ms(1999));
    assert_eq!(times(&sim), vec![0, 1, 2]);
    sim.advance_to(ms(2000));
    assert_eq!(times(&sim), vec![1, 2, 3]);
    assert!(sim.model().screens.frame.is_fading());

    sim.advance_to(ms(2600));
    assert!(!sim.model().screens.frame.is_fading());
}

#[test]
fn frame_reset_restarts_at_zero() {
    let mut sim = started(ScreenId::Frame);
    sim.advance_to(ms(4000));
    assert_eq!(times(&sim), vec![2, 3, 4]);
    sim.inject_event(Event::key(KeyCode::Char('r')));
    assert_eq!(times(&sim), vec![0, 1, 2]);
    sim.advance_to(ms(6000));
    assert_eq!(times(&sim), vec![1, 2, 3]);
}

// ---------------------------------------------------------------------------
// Key updates
// ---------------------------------------------------------------------------

#[test]
fn key_update_announces_then_commits() {
    let mut sim = started(ScreenId::Key);
    sim.advance_to(ms(1999));
    assert!(sim.model().screens.key.pending().is_none());

    sim.advance_to(ms(2000));
    let pending = *sim.model().screens.key.pending().expect("announced");
    assert_eq!(pending.key, KEYS[0]);
    assert!((VALUE_MIN..VALUE_MAX).contains(&pending.value));
    assert_eq!(pending.announced_at, ms(2000));

    sim.advance_to(ms(2799));
    assert_eq!(sim.model().screens.key.commits(), 0);

    sim.advance_to(ms(2800));
    let key = &sim.model().screens.key;
    assert!(key.pending().is_none());
    assert_eq!(key.commits(), 1);
    let row = key.highlighted().expect("highlighted row");
    assert_eq!(row.key, KEYS[0]);
    assert_eq!(row.value, pending.value);
    assert_eq!(row.last_updated, Some(ms(2800)));
    assert_eq!(
        sim.logs().last(),
        Some(&format!("{} = {}", pending.key, pending.value))
    );
}

#[test]
fn key_updates_cycle_through_keys() {
    let mut sim = started(ScreenId::Key);
    sim.advance_to(ms(6800));
    let key = &sim.model().screens.key;
    assert_eq!(key.commits(), 3);
    assert_eq!(key.highlighted().map(|r| r.key), Some(KEYS[2]));
    assert!(key.rows().iter().all(|r| r.last_updated.is_some()));
}

// ---------------------------------------------------------------------------
// Zombie prevention
// ---------------------------------------------------------------------------

#[test]
fn pending_commit_dies_with_screen() {
    let mut sim = started(ScreenId::Key);
    sim.advance_to(ms(2100));
    let old_generation = sim.model().screens.key.generation();
    assert!(sim.model().screens.key.pending().is_some());

    sim.send(AppMsg::SwitchScreen(ScreenId::Frame));
    assert!(sim.model().screens.key.pending().is_none());
    assert!(
        !sim.active_subscriptions()
            .contains(&sub_id(4, old_generation, 1))
    );

    // The old commit deadline passes with nobody listening.
    sim.advance_to(ms(3000));
    assert_eq!(sim.model().screens.key.commits(), 0);

    sim.send(AppMsg::SwitchScreen(ScreenId::Key));
    let key = &sim.model().screens.key;
    assert_eq!(key.generation(), old_generation + 1);
    assert!(key.pending().is_none());
    assert!(key.highlighted().is_none());

    // Fresh cadence counts from the switch back.
    sim.advance_to(ms(4999));
    assert!(sim.model().screens.key.pending().is_none());
    sim.advance_to(ms(5800));
    assert_eq!(sim.model().screens.key.commits(), 1);
}

#[test]
fn axis_frames_stop_when_hidden() {
    let mut sim = started(ScreenId::Axis);
    sim.advance_to(ms(900));
    assert_eq!(sim.model().screens.axis.spawned(), 2);
    let generation = sim.model().screens.axis.generation();

    sim.send(AppMsg::SwitchScreen(ScreenId::Home));
    assert!(!sim.model().screens.axis.is_active());
    assert!(
        !sim.active_subscriptions()
            .contains(&sub_id(2, generation, 0))
    );

    let positions: Vec<f64> = sim
        .model()
        .screens
        .axis
        .particles()
        .iter()
        .map(|p| p.x)
        .collect();
    sim.advance_to(ms(3000));
    let axis = &sim.model().screens.axis;
    assert_eq!(axis.spawned(), 2);
    let after: Vec<f64> = axis.particles().iter().map(|p| p.x).collect();
    assert_eq!(after, positions);
}

#[test]
fn only_current_screen_has_timers() {
    let mut sim = started(ScreenId::Frame);
    assert_eq!(sim.active_subscriptions().len(), 1);
    sim.send(AppMsg::SwitchScreen(ScreenId::Axis));
    let active = sim.active_subscriptions();
    assert_eq!(active.len(), 1);
    let generation = sim.model().screens.axis.generation();
    assert_eq!(active[0], sub_id(2, generation, 0));
}

#[test]
fn rapid_switching_leaves_one_screen_running() {
    let mut sim = started(ScreenId::Home);
    for _ in 0..10 {
        sim.inject_event(Event::key(KeyCode::Tab));
        sim.advance(ms(30));
    }
    // Ten tabs from Home lands on Frame (index 2).
    assert_eq!(sim.model().current_screen, ScreenId::Frame);
    for &id in ScreenId::ALL {
        assert_eq!(sim.model().screens.is_active(id), id == ScreenId::Frame);
    }
    assert_eq!(sim.model().switch_count(), 10);
}

// ---------------------------------------------------------------------------
// App shell
// ---------------------------------------------------------------------------

#[test]
fn exit_after_quits() {
    let mut sim = ProgramSimulator::new(
        AppModel::new(7)
            .with_start_screen(ScreenId::Axis)
            .with_exit_after_ms(500),
    );
    sim.init();
    sim.advance_to(ms(499));
    assert!(sim.is_running());
    sim.advance_to(ms(500));
    assert!(!sim.is_running());
    assert!(!sim.model().screens.axis.is_active());
    assert!(sim.active_subscriptions().is_empty());
}

#[test]
fn quit_key_stops_program() {
    let mut sim = started(ScreenId::Key);
    sim.inject_event(Event::key(KeyCode::Char('q')));
    assert!(!sim.is_running());
}

#[test]
fn same_seed_same_run() {
    let run = || {
        let mut sim = started(ScreenId::Key);
        sim.advance_to(ms(10_000));
        sim.model()
            .screens
            .key
            .rows()
            .iter()
            .map(|r| r.value)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
