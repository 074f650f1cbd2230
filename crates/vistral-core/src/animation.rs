#![forbid(unsafe_code)]

//! Time-based animation values in `[0.0, 1.0]`.
//!
//! Animations are advanced explicitly with a `dt`; they never read a clock.
//! Screens feed them the delta between two animation-frame messages so the
//! same code runs under the real clock and under the simulator.

use std::time::Duration;

/// Maps progress `t` in [0, 1] to an eased value in [0, 1].
pub type EasingFn = fn(f32) -> f32;

#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic, slow start.
#[inline]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic, slow end.
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic, slow start and end.
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    fn tick(&mut self, dt: Duration);

    fn is_complete(&self) -> bool;

    /// Current output, clamped to [0.0, 1.0].
    fn value(&self) -> f32;

    fn reset(&mut self);
}

/// Progress from 0.0 to 1.0 over a fixed duration, shaped by an easing curve.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Fade {
    /// Linear fade. A zero duration completes on the first tick.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: duration.max(Duration::from_nanos(1)),
            easing: linear,
        }
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Progress before easing.
    pub fn raw_progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

/// Endless sine oscillation between 0.0 and 1.0.
#[derive(Debug, Clone, Copy)]
pub struct Pulse {
    frequency: f32,
    phase: f32,
}

impl Pulse {
    /// `frequency` is in cycles per second; negative values are treated as zero.
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: frequency.max(0.0),
            phase: 0.0,
        }
    }
}

impl Animation for Pulse {
    fn tick(&mut self, dt: Duration) {
        self.phase = (self.phase + dt.as_secs_f32() * self.frequency).fract();
    }

    fn is_complete(&self) -> bool {
        false
    }

    fn value(&self) -> f32 {
        let wave = (self.phase * std::f32::consts::TAU).sin();
        (0.5 + 0.5 * wave).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}
