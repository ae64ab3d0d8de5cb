//! FIFO of payload chunks beyond the header window

use std::collections::VecDeque;

use bytes::{Buf, Bytes};

/// Queue of immutable chunks plus the one the reader is part-way through
///
/// A chunk's read cursor is its own `Bytes` view: consuming advances it, and
/// a fully consumed chunk is dropped on the spot so memory stays bounded by
/// the unconsumed tail.
#[derive(Debug, Default)]
pub struct ChunkQueue {
    pending: VecDeque<Bytes>,
    current: Option<Bytes>,
    consumed: u64,
}

impl ChunkQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a chunk; empty chunks are skipped
    pub fn push(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.pending.push_back(chunk);
    }

    /// Chunks not yet touched by the reader
    pub fn depth(&self) -> usize {
        self.pending.len()
    }

    /// Bytes handed out to the reader so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Copy from the current chunk, then from following chunks, until `out`
    /// is full or the queue runs dry
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < out.len() {
            if self.current.is_none() {
                self.current = self.pending.pop_front();
            }
            let Some(chunk) = self.current.as_mut() else {
                break;
            };
            let n = chunk.len().min(out.len() - copied);
            out[copied..copied + n].copy_from_slice(&chunk[..n]);
            chunk.advance(n);
            copied += n;
            if !chunk.has_remaining() {
                self.current = None;
            }
        }
        self.consumed += copied as u64;
        copied
    }

    /// Drop every unread chunk
    pub fn clear(&mut self) {
        self.pending = VecDeque::new();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_across_chunks() {
        let mut queue = ChunkQueue::new();
        queue.push(Bytes::from_static(b"hello "));
        queue.push(Bytes::from_static(b"chunked "));
        queue.push(Bytes::from_static(b"world"));

        let mut out = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = queue.drain_into(&mut buf);
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"hello chunked world");
        assert_eq!(queue.consumed(), 19);
        assert_eq!(queue.depth(), 0);
    }

    #[test]
    fn test_partial_chunk_is_held() {
        let mut queue = ChunkQueue::new();
        queue.push(Bytes::from_static(b"abcdef"));

        let mut buf = [0u8; 2];
        assert_eq!(queue.drain_into(&mut buf), 2);
        assert_eq!(queue.depth(), 0);

        queue.push(Bytes::from_static(b"gh"));
        let mut rest = [0u8; 16];
        assert_eq!(queue.drain_into(&mut rest), 6);
        assert_eq!(&rest[..6], b"cdefgh");
    }

    #[test]
    fn test_empty_chunks_are_ignored() {
        let mut queue = ChunkQueue::new();
        queue.push(Bytes::new());
        assert_eq!(queue.depth(), 0);
        let mut buf = [0u8; 4];
        assert_eq!(queue.drain_into(&mut buf), 0);
    }

    #[test]
    fn test_clear_discards_unread() {
        let mut queue = ChunkQueue::new();
        queue.push(Bytes::from_static(b"abc"));
        queue.clear();
        assert_eq!(queue.depth(), 0);
        let mut buf = [0u8; 3];
        assert_eq!(queue.drain_into(&mut buf), 0);
    }
}
