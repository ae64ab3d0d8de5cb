//! Diagnostic events emitted by a stream
//!
//! A sink accepts every event, never blocks and never fails. The default
//! [`TracingSink`] forwards to `tracing`; install a subscriber to see them.

use std::fmt;

use super::state::WaitFor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Written {
        bytes: usize,
        queued_chunks: usize,
        total_written: u64,
    },
    HeaderReady {
        header_len: usize,
        total_written: u64,
    },
    Sealed {
        total_written: u64,
    },
    Disposed {
        total_written: u64,
        position: u64,
    },
    Read {
        bytes: usize,
        position: u64,
    },
    Waiting(WaitFor),
}

/// Receiver for [`StreamEvent`]s; must not block or call back into the stream
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn emit(&self, event: &StreamEvent);
}

/// Lifecycle transitions at debug, per-call byte counts at trace
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: &StreamEvent) {
        match *event {
            StreamEvent::Written {
                bytes,
                queued_chunks,
                total_written,
            } => tracing::trace!(bytes, queued_chunks, total_written, "stream write"),
            StreamEvent::HeaderReady {
                header_len,
                total_written,
            } => tracing::debug!(header_len, total_written, "header window ready"),
            StreamEvent::Sealed { total_written } => {
                tracing::debug!(total_written, "stream sealed")
            }
            StreamEvent::Disposed {
                total_written,
                position,
            } => tracing::debug!(total_written, position, "stream disposed"),
            StreamEvent::Read { bytes, position } => {
                tracing::trace!(bytes, position, "stream read")
            }
            StreamEvent::Waiting(wait) => tracing::trace!(?wait, "reader waiting"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _event: &StreamEvent) {}
}

/// Collects events for assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub(crate) events: std::sync::Mutex<Vec<StreamEvent>>,
}

#[cfg(test)]
impl DiagnosticSink for RecordingSink {
    fn emit(&self, event: &StreamEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(*event);
        }
    }
}
