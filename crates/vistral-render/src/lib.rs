#![forbid(unsafe_code)]

//! Render kernel: cells, buffers, drawing, braille plotting, and presentation.

pub mod braille;
pub mod buffer;
pub mod cell;
pub mod diff;
pub mod drawing;
pub mod frame;
pub mod presenter;
