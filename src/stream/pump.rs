//! Helpers that move data between `std::io` endpoints and a stream
//!
//! Feed a live source into the producer side in fixed-size chunks, or drain
//! the consumer side into any writer, without holding the whole payload in
//! memory.

use std::io::{self, Read, Write};

#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

use super::error::Result;
use super::handles::{StreamConsumer, StreamProducer};
#[cfg(feature = "async")]
use super::peek::HeaderPeekStream;

/// Default chunk size when feeding a stream (64KB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Small chunk size for latency-sensitive sources such as live audio (4KB)
pub const SMALL_CHUNK_SIZE: usize = 4 * 1024;

/// Push everything from `reader` into the stream, then seal it
///
/// Each successful `read` becomes one write. Returns the number of bytes fed.
///
/// # Examples
/// ```
/// use headerpeek::{channel, feed_from_reader, StreamConfig};
/// use std::io::{Cursor, Read};
///
/// let (producer, mut consumer) = channel(StreamConfig::default());
/// let fed = feed_from_reader(Cursor::new(vec![7u8; 1000]), producer, 128).unwrap();
/// assert_eq!(fed, 1000);
///
/// let mut out = Vec::new();
/// consumer.read_to_end(&mut out).unwrap();
/// assert_eq!(out.len(), 1000);
/// ```
pub fn feed_from_reader<R: Read>(
    mut reader: R,
    producer: StreamProducer,
    chunk_size: usize,
) -> io::Result<u64> {
    feed_with(&mut reader, &producer, chunk_size, |_| {})?;
    let total = producer.stream().total_written();
    producer.finish()?;
    Ok(total)
}

/// Like [`feed_from_reader`], calling `after_chunk` with each chunk's length
///
/// The hook runs after the chunk was written; the CLI uses it to pace a
/// simulated live source. The stream is not sealed.
pub fn feed_with<R, F>(
    reader: &mut R,
    producer: &StreamProducer,
    chunk_size: usize,
    mut after_chunk: F,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    F: FnMut(usize),
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        producer.send(&buffer[..n])?;
        total += n as u64;
        after_chunk(n);
    }

    Ok(total)
}

/// Copy the consumer to `writer` until end of stream
///
/// Returns the number of bytes copied.
pub fn drain_to_writer<W: Write + ?Sized>(
    consumer: &mut StreamConsumer,
    writer: &mut W,
    buffer_size: usize,
) -> io::Result<u64> {
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = consumer.recv(&mut buffer)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n])?;
        total += n as u64;
    }

    Ok(total)
}

/// Fold every remaining chunk the consumer yields into an accumulator
pub fn fold<T, F>(
    consumer: &mut StreamConsumer,
    buffer_size: usize,
    init: T,
    mut fold_fn: F,
) -> Result<T>
where
    F: FnMut(T, &[u8]) -> T,
{
    let mut acc = init;
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let n = consumer.recv(&mut buffer)?;
        if n == 0 {
            break;
        }
        acc = fold_fn(acc, &buffer[..n]);
    }

    Ok(acc)
}

/// Read the rest of the stream asynchronously
#[cfg(feature = "async")]
pub async fn read_to_end_async(
    stream: &HeaderPeekStream,
    out: &mut Vec<u8>,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<usize> {
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let start = out.len();

    loop {
        let n = stream.read_async(&mut buffer, cancel).await?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buffer[..n]);
    }

    Ok(out.len() - start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::config::StreamConfig;
    use crate::stream::handles::channel;
    use std::io::Cursor;

    #[test]
    fn test_feed_and_drain() {
        let data: Vec<u8> = (0..5000).map(|i| (i % 251) as u8).collect();
        let (producer, mut consumer) = channel(StreamConfig::default());

        let source = data.clone();
        let feeder =
            std::thread::spawn(move || feed_from_reader(Cursor::new(source), producer, 333));

        let mut sink = Vec::new();
        let copied = drain_to_writer(&mut consumer, &mut sink, 256).unwrap();
        assert_eq!(feeder.join().unwrap().unwrap(), 5000);
        assert_eq!(copied, 5000);
        assert_eq!(sink, data);
    }

    #[test]
    fn test_feed_with_reports_chunks() {
        let (producer, _consumer) = channel(StreamConfig::default());
        let mut chunks = Vec::new();
        let mut source = Cursor::new(vec![1u8; 250]);
        let total = feed_with(&mut source, &producer, 100, |n| chunks.push(n)).unwrap();
        assert_eq!(total, 250);
        assert_eq!(chunks, vec![100, 100, 50]);
        assert!(!producer.stream().is_sealed());
    }

    #[test]
    fn test_fold_counts_bytes() {
        let (producer, mut consumer) = channel(StreamConfig::default());
        producer.send(&[0u8; 700]).unwrap();
        drop(producer);

        let count = fold(&mut consumer, 64, 0u64, |acc, chunk| acc + chunk.len() as u64).unwrap();
        assert_eq!(count, 700);
    }
}
