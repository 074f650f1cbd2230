#![forbid(unsafe_code)]

//! Vistral temporal-binding showcase.
//!
//! Three small animated panels illustrate how time can bind to a
//! visualization (axis, frame, key), plus a home screen that connects the
//! new grammar layer to its explanation with a drawn curve.

pub mod app;
pub mod chrome;
pub mod cli;
pub mod connector;
pub mod diagnostics;
pub mod rng;
pub mod screens;
pub mod theme;
