//! Shared stream state, guarded as one unit by the stream's mutex

use std::io::SeekFrom;

use bytes::Bytes;

use super::chunk::ChunkQueue;
use super::error::{Result, StreamError};
use super::header::HeaderWindow;

/// Which signal a reader must wait on before retrying
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitFor {
    HeaderReady,
    DataAvailable,
}

/// Outcome of one non-blocking pass of the read algorithm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drain {
    /// Bytes copied; 0 means end of stream (or an empty buffer)
    Copied(usize),
    Wait(WaitFor),
}

/// What a write changed, so the caller can raise signals after unlocking
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Appended {
    pub header_filled: bool,
    pub queued: usize,
}

/// Transitions made by `seal`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sealed {
    pub newly_sealed: bool,
    pub header_forced: bool,
}

/// Counters, flags and owned buffers of one stream
///
/// Invariants: `total_written` never decreases, `position <= total_written`,
/// and nothing changes once `disposed` is set.
#[derive(Debug)]
pub struct StreamState {
    header: HeaderWindow,
    queue: ChunkQueue,
    total_written: u64,
    /// `total_written` at the moment the header window became complete
    header_ready_len: Option<u64>,
    sealed: bool,
    disposed: bool,
    position: u64,
}

impl StreamState {
    /// Empty state; a zero capacity header window starts out complete
    pub fn new(header_capacity: usize) -> Self {
        let header = HeaderWindow::new(header_capacity);
        let header_ready_len = header.is_complete().then_some(0);
        Self {
            header,
            queue: ChunkQueue::new(),
            total_written: 0,
            header_ready_len,
            sealed: false,
            disposed: false,
            position: 0,
        }
    }

    /// Bytes accepted by `append`
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Logical read position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// True once sealed or disposed
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// True once disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// `total_written` captured when the header window became complete
    pub fn header_ready_len(&self) -> Option<u64> {
        self.header_ready_len
    }

    /// Bytes held in the header window
    pub fn header_len(&self) -> usize {
        self.header.len()
    }

    /// Chunks queued and not yet touched by the reader
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Fail with [`StreamError::Disposed`] once disposed
    pub fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(StreamError::Disposed);
        }
        Ok(())
    }

    /// Fail unless the stream still accepts writes
    pub fn ensure_writable(&self) -> Result<()> {
        self.ensure_live()?;
        if self.sealed {
            return Err(StreamError::Sealed);
        }
        Ok(())
    }

    /// Split `data` between the header window and the chunk queue
    pub fn append(&mut self, data: &[u8]) -> Result<Appended> {
        self.ensure_writable()?;
        if data.is_empty() {
            return Ok(Appended::default());
        }

        let (taken, header_filled) = self.header.fill(data);
        let rest = &data[taken..];
        if !rest.is_empty() {
            self.queue.push(Bytes::copy_from_slice(rest));
        }
        self.total_written += data.len() as u64;
        if header_filled {
            self.header_ready_len = Some(self.total_written);
        }

        Ok(Appended {
            header_filled,
            queued: rest.len(),
        })
    }

    /// Mark end of input; a partially filled header window becomes final
    pub fn seal(&mut self) -> Result<Sealed> {
        self.ensure_live()?;
        if self.sealed {
            return Ok(Sealed::default());
        }
        self.sealed = true;
        let header_forced = self.header.force_complete();
        if header_forced {
            self.header_ready_len = Some(self.total_written);
        }
        Ok(Sealed {
            newly_sealed: true,
            header_forced,
        })
    }

    /// Freeze the state and release buffers; returns false if already disposed
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.sealed = true;
        self.header.release();
        self.queue.clear();
        true
    }

    /// One pass of the read algorithm, shared by blocking and async callers
    ///
    /// Serves the header window first, then the chunk queue in FIFO order.
    /// Never blocks: when nothing can be copied yet it names the signal to
    /// wait on.
    pub fn drain(&mut self, out: &mut [u8]) -> Result<Drain> {
        self.ensure_live()?;
        if out.is_empty() {
            return Ok(Drain::Copied(0));
        }
        if !self.header.is_complete() {
            return Ok(Drain::Wait(WaitFor::HeaderReady));
        }

        let header_len = self.header.len() as u64;
        if self.position < header_len {
            let n = self.header.read_at(self.position as usize, out);
            self.position += n as u64;
            return Ok(Drain::Copied(n));
        }

        let n = self.queue.drain_into(out);
        if n > 0 {
            // Resume at the queue cursor even after a seek back into the header.
            self.position = header_len + self.queue.consumed();
            return Ok(Drain::Copied(n));
        }
        if self.sealed {
            return Ok(Drain::Copied(0));
        }
        Ok(Drain::Wait(WaitFor::DataAvailable))
    }

    /// Reposition within `[0, header_len]`
    ///
    /// `SeekFrom::Current(0)` always succeeds so position queries work past
    /// the header window.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_live()?;
        let target: i128 = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(0) => return Ok(self.position),
            SeekFrom::Current(delta) => self.position as i128 + delta as i128,
            SeekFrom::End(_) => return Err(StreamError::Unsupported("SeekFrom::End")),
        };

        let window = self.header.len() as u64;
        if target < 0 || target > window as i128 {
            return Err(StreamError::OutOfRange { target, window });
        }
        self.position = target as u64;
        Ok(self.position)
    }
}
