#![forbid(unsafe_code)]

//! Frame = buffer + per-render metadata.

use crate::buffer::Buffer;
use vistral_core::geometry::Rect;

/// Render target handed to `Model::view()`.
///
/// Frames are rebuilt for every render pass and never outlive it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The cell grid for this render pass.
    pub buffer: Buffer,

    /// Where the terminal cursor should sit, relative to the buffer.
    /// `None` keeps it hidden.
    pub cursor_position: Option<(u16, u16)>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self::from_buffer(Buffer::new(width, height))
    }

    /// Reuse an existing buffer, cleared to blanks.
    pub fn from_buffer(mut buffer: Buffer) -> Self {
        buffer.clear();
        Self {
            buffer,
            cursor_position: None,
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.buffer.width()
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.buffer.height()
    }

    #[inline]
    pub fn area(&self) -> Rect {
        self.buffer.area()
    }

    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }
}
