//! Producer and consumer halves of a stream
//!
//! [`channel`] hands out exactly one [`StreamProducer`] and one
//! [`StreamConsumer`], so the single-writer / single-reader contract is
//! enforced by ownership. The halves plug into `std::io`:
//!
//! ```
//! use headerpeek::{channel, StreamConfig};
//! use std::io::{Read, Write};
//!
//! let (mut producer, mut consumer) = channel(StreamConfig::default());
//! let writer = std::thread::spawn(move || {
//!     for i in 0..4u8 {
//!         producer.write_all(&[i; 100]).unwrap();
//!     }
//!     // Dropping the producer seals the stream.
//! });
//!
//! let mut payload = Vec::new();
//! consumer.read_to_end(&mut payload).unwrap();
//! writer.join().unwrap();
//! assert_eq!(payload.len(), 400);
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

use super::config::StreamConfig;
use super::error::Result;
use super::peek::HeaderPeekStream;

/// Create a stream and split it into its two halves
pub fn channel(config: StreamConfig) -> (StreamProducer, StreamConsumer) {
    split(Arc::new(HeaderPeekStream::new(config)))
}

/// Split an existing stream, e.g. one built with a custom diagnostic sink
pub fn split(stream: Arc<HeaderPeekStream>) -> (StreamProducer, StreamConsumer) {
    (
        StreamProducer {
            stream: Arc::clone(&stream),
        },
        StreamConsumer { stream },
    )
}

/// Write half; seals the stream when dropped
#[derive(Debug)]
pub struct StreamProducer {
    stream: Arc<HeaderPeekStream>,
}

impl StreamProducer {
    /// The shared stream behind this half
    pub fn stream(&self) -> &HeaderPeekStream {
        &self.stream
    }

    /// Append bytes; see [`HeaderPeekStream::write`]
    pub fn send(&self, data: &[u8]) -> Result<()> {
        self.stream.write(data)
    }

    #[cfg(feature = "async")]
    pub async fn send_async(&self, data: &[u8], cancel: &CancellationToken) -> Result<()> {
        self.stream.write_async(data, cancel).await
    }

    /// Seal explicitly and surface any error instead of doing it on drop
    pub fn finish(self) -> Result<()> {
        self.stream.seal()
    }

    /// Tear down the shared stream; see [`HeaderPeekStream::dispose`]
    pub fn dispose(&self) {
        self.stream.dispose();
    }
}

impl Write for StreamProducer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for StreamProducer {
    fn drop(&mut self) {
        if let Err(err) = self.stream.seal() {
            tracing::debug!(%err, "producer dropped without sealing");
        }
    }
}

/// Read half; disposes the stream when dropped
///
/// Once the consumer is gone nobody can drain the queue, so disposing makes
/// further writes fail instead of piling up.
#[derive(Debug)]
pub struct StreamConsumer {
    stream: Arc<HeaderPeekStream>,
}

impl StreamConsumer {
    /// The shared stream behind this half
    pub fn stream(&self) -> &HeaderPeekStream {
        &self.stream
    }

    /// Blocking read; see [`HeaderPeekStream::read`]
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf)
    }

    #[cfg(feature = "async")]
    pub async fn recv_async(
        &mut self,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        self.stream.read_async(buf, cancel).await
    }

    /// See [`HeaderPeekStream::length`] for what this number means
    pub fn length(&self) -> Result<u64> {
        self.stream.length()
    }

    /// Tear down the shared stream; see [`HeaderPeekStream::dispose`]
    pub fn dispose(&self) {
        self.stream.dispose();
    }
}

impl Read for StreamConsumer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.stream.read(buf)?)
    }
}

impl Seek for StreamConsumer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.stream.seek(pos)?)
    }
}

impl Drop for StreamConsumer {
    fn drop(&mut self) {
        self.stream.dispose();
    }
}
