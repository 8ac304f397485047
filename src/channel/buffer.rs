//! Growable byte buffer with consume-on-match semantics.
//!
//! The expect engine accumulates raw device output here and discards
//! bytes irreversibly once a pattern has matched. `BytesMut::split_to`
//! keeps consumption an O(1) pointer bump rather than a copy.

use bytes::{Bytes, BytesMut};

/// Buffer for accumulating output until a pattern consumes it.
#[derive(Debug, Default)]
pub struct ExpectBuffer {
    buf: BytesMut,
}

impl ExpectBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Append a chunk of raw output.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// The bytes not yet consumed by a match.
    pub fn unconsumed(&self) -> &[u8] {
        &self.buf
    }

    /// Irreversibly discard the first `n` bytes, returning them.
    ///
    /// Panics if `n` exceeds the unconsumed length; callers derive `n`
    /// from a match offset inside this buffer.
    pub fn consume(&mut self, n: usize) -> Bytes {
        self.buf.split_to(n).freeze()
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop everything, e.g. between the login handshake and first command.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_and_len() {
        let mut buffer = ExpectBuffer::new();
        buffer.extend(b"hello");
        buffer.extend(b" world");
        assert_eq!(buffer.unconsumed(), b"hello world");
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn test_consume_discards_prefix() {
        let mut buffer = ExpectBuffer::new();
        buffer.extend(b"before|after");
        let taken = buffer.consume(7);
        assert_eq!(&taken[..], b"before|");
        assert_eq!(buffer.unconsumed(), b"after");
    }

    #[test]
    fn test_consume_is_irreversible() {
        let mut buffer = ExpectBuffer::new();
        buffer.extend(b"prompt#rest");
        buffer.consume(7);
        buffer.extend(b" more");
        assert_eq!(buffer.unconsumed(), b"rest more");
    }

    #[test]
    fn test_clear() {
        let mut buffer = ExpectBuffer::new();
        buffer.extend(b"leftover banner");
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
