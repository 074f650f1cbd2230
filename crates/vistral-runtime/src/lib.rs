#![forbid(unsafe_code)]

//! Elm-style runtime: model/update/view, declarative timer subscriptions,
//! a deterministic timer queue, and a simulator for tests.

pub mod clock;
pub mod error;
pub mod program;
pub mod simulator;
pub mod subscription;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{Error, Result};
pub use program::{Cmd, Model, Program, ProgramConfig};
pub use simulator::ProgramSimulator;
pub use subscription::{After, AnimationFrame, Every, SubId, Subscription};
pub use timer::{Schedule, TimerId, TimerQueue};
