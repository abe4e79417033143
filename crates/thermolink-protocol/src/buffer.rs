//! Bounded incoming byte buffer.
//!
//! Bytes read off the bus accumulate here until the assembler can carve a
//! frame out of them. The buffer is bounded: an append reports how many bytes
//! it accepted, and saturation is a normal condition handled by resync, not a
//! fault.

use bytes::{Buf, BufMut, BytesMut};

/// Accumulation buffer for raw bus bytes.
#[derive(Debug)]
pub struct IncomingBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl IncomingBuffer {
    /// Create a buffer bounded at `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        IncomingBuffer {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append as many bytes as fit in the remaining capacity.
    ///
    /// Returns the number of bytes accepted; the rest is the caller's to
    /// retry or drop. Never blocks.
    pub fn extend(&mut self, data: &[u8]) -> usize {
        let room = self.capacity - self.buf.len();
        let accepted = data.len().min(room);
        self.buf.put_slice(&data[..accepted]);
        accepted
    }

    /// Remove the first `n` buffered bytes.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }

    /// Discard all buffered bytes.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// View the buffered bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether the buffer has reached capacity.
    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// The bound this buffer was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_within_capacity() {
        let mut buf = IncomingBuffer::with_capacity(8);
        assert_eq!(buf.extend(&[1, 2, 3]), 3);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_extend_reports_partial_accept() {
        let mut buf = IncomingBuffer::with_capacity(4);
        assert_eq!(buf.extend(&[1, 2, 3]), 3);
        assert_eq!(buf.extend(&[4, 5, 6]), 1);
        assert!(buf.is_full());
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(buf.extend(&[7]), 0);
    }

    #[test]
    fn test_consume_shifts_front() {
        let mut buf = IncomingBuffer::with_capacity(8);
        buf.extend(&[1, 2, 3, 4]);
        buf.consume(2);
        assert_eq!(buf.as_slice(), &[3, 4]);
        // Freed room is usable again.
        assert_eq!(buf.extend(&[5, 6, 7, 8, 9, 10]), 6);
    }

    #[test]
    fn test_consume_past_end_saturates() {
        let mut buf = IncomingBuffer::with_capacity(8);
        buf.extend(&[1, 2]);
        buf.consume(10);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut buf = IncomingBuffer::with_capacity(8);
        buf.extend(&[1, 2, 3]);
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.extend(&[9]), 1);
        assert_eq!(buf.as_slice(), &[9]);
    }
}
