//! Error type for header-peekable streams
//!
//! Every failure surfaces synchronously to the call that triggered it. The
//! stream never retries internally.

use std::io;
use std::time::Duration;

/// Coarse classification of a [`StreamError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Write after seal, or any operation after dispose
    InvalidState,
    /// Header window did not become ready within the configured bound
    Timeout,
    /// Caller-supplied cancellation on the async path
    Cancelled,
    /// Seek outside the header window, `SeekFrom::End`, `set_length`
    UnsupportedOperation,
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream is sealed; no further writes are accepted")]
    Sealed,

    #[error("stream has been disposed")]
    Disposed,

    #[error("header window not ready within {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0} is not supported by a header-peekable stream")]
    Unsupported(&'static str),

    #[error("seek target {target} lies outside the header window [0, {window}]")]
    OutOfRange { target: i128, window: u64 },
}

impl StreamError {
    /// Coarse classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::Sealed | StreamError::Disposed => ErrorKind::InvalidState,
            StreamError::Timeout(_) => ErrorKind::Timeout,
            StreamError::Cancelled => ErrorKind::Cancelled,
            StreamError::Unsupported(_) | StreamError::OutOfRange { .. } => {
                ErrorKind::UnsupportedOperation
            }
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::Sealed | StreamError::Disposed => io::ErrorKind::BrokenPipe,
            StreamError::Timeout(_) => io::ErrorKind::TimedOut,
            // Not `Interrupted`: std read loops retry on that kind.
            StreamError::Cancelled => io::ErrorKind::Other,
            StreamError::Unsupported(_) => io::ErrorKind::Unsupported,
            StreamError::OutOfRange { .. } => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
