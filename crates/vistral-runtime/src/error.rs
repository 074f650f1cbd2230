#![forbid(unsafe_code)]

//! Runtime errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("terminal is {width}x{height}, need at least {min_width}x{min_height}")]
    TerminalTooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::other("boom").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "terminal I/O failed: boom");
    }

    #[test]
    fn too_small_message_names_sizes() {
        let err = Error::TerminalTooSmall {
            width: 10,
            height: 4,
            min_width: 40,
            min_height: 12,
        };
        assert_eq!(err.to_string(), "terminal is 10x4, need at least 40x12");
    }
}
