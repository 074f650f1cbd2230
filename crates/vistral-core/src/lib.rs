#![forbid(unsafe_code)]

//! Core: geometry, input events, animation curves, terminal lifecycle, and logging shims.

pub mod animation;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod terminal_session;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, warn};
