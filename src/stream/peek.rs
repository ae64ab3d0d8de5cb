//! The header-peekable byte stream
//!
//! One producer pushes bytes with [`HeaderPeekStream::write`] while one
//! consumer pulls them with [`HeaderPeekStream::read`] or
//! [`HeaderPeekStream::read_async`]. The first
//! [`header_capacity`](StreamConfig::header_capacity) bytes stay buffered so
//! the consumer can seek around inside them (to sniff a container format)
//! before the rest of the payload has arrived. Everything after the header
//! window is queued as chunks and released as soon as it has been read.
//!
//! ```
//! use headerpeek::{HeaderPeekStream, StreamConfig};
//! use std::io::SeekFrom;
//!
//! let stream = HeaderPeekStream::new(StreamConfig::default());
//! stream.write(b"RIFF\x24\x08\x00\x00WAVEfmt ").unwrap();
//! stream.seal().unwrap();
//!
//! let mut magic = [0u8; 4];
//! stream.seek(SeekFrom::Start(8)).unwrap();
//! stream.read(&mut magic).unwrap();
//! assert_eq!(&magic, b"WAVE");
//! ```
//!
//! # Concurrency
//!
//! All counters, flags and buffers live in one [`StreamState`] behind a
//! single mutex. Writes never block. Readers suspend only while waiting for
//! the header window (bounded by
//! [`header_ready_timeout`](StreamConfig::header_ready_timeout)) or for more
//! data once the queue is empty. Both read conventions drive the same
//! [`StreamState::drain`] step, so they cannot diverge.

use std::io::SeekFrom;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

use super::config::StreamConfig;
use super::diagnostics::{DiagnosticSink, StreamEvent, TracingSink};
use super::error::{Result, StreamError};
use super::signal::Signal;
use super::state::{Drain, StreamState, WaitFor};

#[derive(Debug)]
pub struct HeaderPeekStream {
    state: Mutex<StreamState>,
    header_ready: Signal,
    data_available: Signal,
    config: StreamConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for HeaderPeekStream {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

impl HeaderPeekStream {
    /// Create an empty stream that reports through [`TracingSink`]
    pub fn new(config: StreamConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create an empty stream that reports through `sink`
    pub fn with_sink(config: StreamConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            state: Mutex::new(StreamState::new(config.header_capacity)),
            header_ready: Signal::new(),
            data_available: Signal::new(),
            config,
            sink,
        }
    }

    /// Configuration the stream was built with
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Instant after which a header wait gives up; `None` waits indefinitely
    fn header_deadline(&self) -> Option<Instant> {
        Instant::now().checked_add(self.config.header_ready_timeout)
    }

    /// Park until the header signal is raised or `deadline` passes
    fn wait_for_header<'a>(
        &self,
        state: MutexGuard<'a, StreamState>,
        deadline: Option<Instant>,
    ) -> Result<MutexGuard<'a, StreamState>> {
        let Some(deadline) = deadline else {
            return Ok(self.header_ready.wait(state));
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(StreamError::Timeout(self.config.header_ready_timeout));
        }
        Ok(self.header_ready.wait_timeout(state, remaining))
    }

    // ---------------------------------------------------------------------
    // Write path
    // ---------------------------------------------------------------------

    /// Append bytes; never blocks
    ///
    /// Fails with [`StreamError::Sealed`] after [`seal`](Self::seal) and
    /// [`StreamError::Disposed`] after [`dispose`](Self::dispose). An empty
    /// slice is accepted and changes nothing.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let (appended, header_len, queued_chunks, total_written) = {
            let mut state = self.lock();
            let appended = state.append(data)?;
            (
                appended,
                state.header_len(),
                state.queue_depth(),
                state.total_written(),
            )
        };

        if appended.header_filled {
            self.header_ready.raise();
            self.sink.emit(&StreamEvent::HeaderReady {
                header_len,
                total_written,
            });
        }
        if appended.queued > 0 {
            self.data_available.raise();
        }
        if !data.is_empty() {
            self.sink.emit(&StreamEvent::Written {
                bytes: data.len(),
                queued_chunks,
                total_written,
            });
        }
        Ok(())
    }

    /// Async form of [`write`](Self::write); fails with
    /// [`StreamError::Cancelled`] if `cancel` has already fired
    #[cfg(feature = "async")]
    pub async fn write_async(&self, data: &[u8], cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        self.write(data)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Mark end of input; idempotent
    ///
    /// If the header window never filled, it is completed with whatever was
    /// collected so header waiters are released.
    pub fn seal(&self) -> Result<()> {
        let (sealed, header_len, total_written) = {
            let mut state = self.lock();
            let sealed = state.seal()?;
            (sealed, state.header_len(), state.total_written())
        };
        if !sealed.newly_sealed {
            return Ok(());
        }

        self.header_ready.raise();
        self.data_available.raise();
        if sealed.header_forced {
            self.sink.emit(&StreamEvent::HeaderReady {
                header_len,
                total_written,
            });
        }
        self.sink.emit(&StreamEvent::Sealed { total_written });
        Ok(())
    }

    /// Async form of [`seal`](Self::seal)
    #[cfg(feature = "async")]
    pub async fn seal_async(&self) -> Result<()> {
        self.seal()
    }

    /// Tear the stream down; idempotent
    ///
    /// Buffers are released and any blocked reader wakes with
    /// [`StreamError::Disposed`]. Every later operation fails the same way.
    pub fn dispose(&self) {
        let (first, total_written, position) = {
            let mut state = self.lock();
            (state.dispose(), state.total_written(), state.position())
        };
        if !first {
            return;
        }
        self.header_ready.raise();
        self.data_available.raise();
        self.sink.emit(&StreamEvent::Disposed {
            total_written,
            position,
        });
    }

    /// True once sealed or disposed
    pub fn is_sealed(&self) -> bool {
        self.lock().is_sealed()
    }

    /// True once [`dispose`](Self::dispose) has run
    pub fn is_disposed(&self) -> bool {
        self.lock().is_disposed()
    }

    /// Bytes accepted so far, header window included
    pub fn total_written(&self) -> u64 {
        self.lock().total_written()
    }

    /// Chunks queued beyond the header window and not yet touched by the reader
    pub fn queued_chunks(&self) -> usize {
        self.lock().queue_depth()
    }

    // ---------------------------------------------------------------------
    // Read path
    // ---------------------------------------------------------------------

    fn copied(&self, bytes: usize, position: u64) -> usize {
        if bytes > 0 {
            self.sink.emit(&StreamEvent::Read { bytes, position });
        }
        bytes
    }

    /// Blocking read
    ///
    /// Returns the number of bytes copied, which may be fewer than
    /// `buf.len()`. Zero means end of stream (sealed and fully drained) or an
    /// empty `buf`. While the header window is filling the call waits at most
    /// [`header_ready_timeout`](StreamConfig::header_ready_timeout) and then
    /// fails with [`StreamError::Timeout`].
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let deadline = self.header_deadline();
        let mut state = self.lock();
        loop {
            let wait = match state.drain(buf)? {
                Drain::Copied(n) => {
                    let position = state.position();
                    drop(state);
                    return Ok(self.copied(n, position));
                }
                Drain::Wait(wait) => wait,
            };
            self.sink.emit(&StreamEvent::Waiting(wait));

            state = match wait {
                WaitFor::HeaderReady => self.wait_for_header(state, deadline)?,
                WaitFor::DataAvailable => self.data_available.wait(state),
            };
        }
    }

    /// Cancellable async read with the same results as [`read`](Self::read)
    ///
    /// Caller cancellation yields [`StreamError::Cancelled`]; the internal
    /// header bound yields [`StreamError::Timeout`].
    #[cfg(feature = "async")]
    pub async fn read_async(&self, buf: &mut [u8], cancel: &CancellationToken) -> Result<usize> {
        let deadline = self.header_deadline().map(tokio::time::Instant::from_std);
        loop {
            if cancel.is_cancelled() {
                return Err(StreamError::Cancelled);
            }

            let header_ready = self.header_ready.notified();
            let data_available = self.data_available.notified();
            tokio::pin!(header_ready, data_available);
            header_ready.as_mut().enable();
            data_available.as_mut().enable();

            let (drained, position) = {
                let mut state = self.lock();
                (state.drain(buf)?, state.position())
            };
            let wait = match drained {
                Drain::Copied(n) => return Ok(self.copied(n, position)),
                Drain::Wait(wait) => wait,
            };
            self.sink.emit(&StreamEvent::Waiting(wait));

            match wait {
                WaitFor::HeaderReady => {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                        _ = sleep_until_deadline(deadline) => {
                            return Err(StreamError::Timeout(self.config.header_ready_timeout));
                        }
                        _ = header_ready => {}
                    }
                }
                WaitFor::DataAvailable => {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                        _ = data_available => {}
                    }
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Seek / position / length
    // ---------------------------------------------------------------------

    /// Reposition inside the header window
    ///
    /// Only `Start` and `Current` are accepted and the target must lie in
    /// `[0, header_len]`; `SeekFrom::Current(0)` always succeeds. Reading
    /// past the header window after seeking back resumes at the chunk
    /// queue's cursor.
    pub fn seek(&self, pos: SeekFrom) -> Result<u64> {
        self.lock().seek(pos)
    }

    /// Current read position
    pub fn position(&self) -> Result<u64> {
        let state = self.lock();
        state.ensure_live()?;
        Ok(state.position())
    }

    /// Same as `seek(SeekFrom::Start(position))`
    pub fn set_position(&self, position: u64) -> Result<u64> {
        self.seek(SeekFrom::Start(position))
    }

    /// Byte count observed when the header window became ready
    ///
    /// Blocks until then (bounded like [`read`](Self::read)). This is **not**
    /// the eventual length of the stream: it is `total_written` right after
    /// the write that filled the header window, or at [`seal`](Self::seal)
    /// for a short stream. Format sniffers use it as an early, cheap size
    /// check before the payload has arrived.
    pub fn length(&self) -> Result<u64> {
        let deadline = self.header_deadline();
        let mut state = self.lock();
        loop {
            state.ensure_live()?;
            if let Some(len) = state.header_ready_len() {
                return Ok(len);
            }
            state = self.wait_for_header(state, deadline)?;
        }
    }

    /// Async form of [`length`](Self::length), cancellable through `cancel`
    #[cfg(feature = "async")]
    pub async fn length_async(&self, cancel: &CancellationToken) -> Result<u64> {
        let deadline = self.header_deadline().map(tokio::time::Instant::from_std);
        loop {
            let header_ready = self.header_ready.notified();
            tokio::pin!(header_ready);
            header_ready.as_mut().enable();

            {
                let state = self.lock();
                state.ensure_live()?;
                if let Some(len) = state.header_ready_len() {
                    return Ok(len);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                _ = sleep_until_deadline(deadline) => {
                    return Err(StreamError::Timeout(self.config.header_ready_timeout));
                }
                _ = header_ready => {}
            }
        }
    }

    /// Always fails: the length is defined by what the producer writes
    pub fn set_length(&self, _len: u64) -> Result<()> {
        Err(StreamError::Unsupported("set_length"))
    }
}

#[cfg(feature = "async")]
async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
