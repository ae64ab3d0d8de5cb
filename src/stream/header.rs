//! Fixed-capacity window over the first bytes written to a stream

/// Leading bytes of a stream, kept for positional reads
///
/// Mutable only while filling. Once [`complete`](Self::is_complete) it is
/// read-only for the rest of the stream's lifetime.
#[derive(Debug)]
pub struct HeaderWindow {
    buf: Vec<u8>,
    capacity: usize,
    complete: bool,
}

impl HeaderWindow {
    /// Empty window; a zero capacity window is complete at once
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            complete: capacity == 0,
        }
    }

    /// Bytes collected so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True once full or forced complete
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Copy as much of `data` as still fits into the window
    ///
    /// Returns `(taken, filled)`: how many bytes were consumed from the front
    /// of `data`, and whether this call moved the window to complete. `filled`
    /// is true on exactly one call over the window's lifetime.
    pub fn fill(&mut self, data: &[u8]) -> (usize, bool) {
        if self.complete {
            return (0, false);
        }
        let take = data.len().min(self.capacity - self.buf.len());
        self.buf.extend_from_slice(&data[..take]);
        if self.buf.len() == self.capacity {
            self.complete = true;
            return (take, true);
        }
        (take, false)
    }

    /// Mark the window complete with whatever has been collected so far
    ///
    /// Returns true if the window was still filling.
    pub fn force_complete(&mut self) -> bool {
        !std::mem::replace(&mut self.complete, true)
    }

    /// Positional read; `offset` past the end copies nothing
    pub fn read_at(&self, offset: usize, out: &mut [u8]) -> usize {
        let Some(available) = self.buf.get(offset..) else {
            return 0;
        };
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        n
    }

    /// Drop the backing storage
    pub fn release(&mut self) {
        self.buf = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_transitions_once() {
        let mut header = HeaderWindow::new(4);
        assert_eq!(header.fill(b"ab"), (2, false));
        assert_eq!(header.fill(b"cdef"), (2, true));
        assert!(header.is_complete());
        assert_eq!(header.fill(b"gh"), (0, false));
        let mut out = [0u8; 8];
        assert_eq!(header.read_at(0, &mut out), 4);
        assert_eq!(&out[..4], b"abcd");
    }

    #[test]
    fn test_force_complete_keeps_partial_bytes() {
        let mut header = HeaderWindow::new(12);
        header.fill(b"hello");
        assert!(header.force_complete());
        assert!(!header.force_complete());
        assert_eq!(header.len(), 5);
        assert_eq!(header.fill(b"more"), (0, false));
    }

    #[test]
    fn test_read_at_bounds() {
        let mut header = HeaderWindow::new(6);
        header.fill(b"abcdef");

        let mut out = [0u8; 4];
        assert_eq!(header.read_at(4, &mut out), 2);
        assert_eq!(&out[..2], b"ef");
        assert_eq!(header.read_at(6, &mut out), 0);
        assert_eq!(header.read_at(60, &mut out), 0);
    }

    #[test]
    fn test_zero_capacity_is_complete() {
        let header = HeaderWindow::new(0);
        assert!(header.is_complete());
        assert_eq!(header.len(), 0);
    }
}
