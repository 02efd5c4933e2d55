use bytes::{Bytes, BytesMut};

use crate::ensure;
use crate::protocol::{BodyChunk, BufferError};

/// A bounded, ordered accumulator of body chunks.
///
/// Chunks must arrive in offset order without gaps: each pushed chunk has to
/// start where the previous one ended. The buffer owns its storage until
/// [`ChunkBuffer::freeze`] hands the assembled bytes over to the writer.
#[derive(Debug)]
pub struct ChunkBuffer {
    buf: BytesMut,
    limit: usize,
}

impl ChunkBuffer {
    pub fn new(limit: usize) -> Self {
        Self { buf: BytesMut::new(), limit }
    }

    /// Creates a buffer with preallocated storage, never more than `limit`.
    pub fn with_capacity(capacity: usize, limit: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity.min(limit)), limit }
    }

    pub fn push(&mut self, chunk: &BodyChunk) -> Result<(), BufferError> {
        let expected = self.buf.len() as u64;
        ensure!(chunk.offset() == expected, BufferError::OutOfOrder { expected, actual: chunk.offset() });
        ensure!(chunk.len() <= self.remaining(), BufferError::Overflow { limit: self.limit });

        self.buf.extend_from_slice(chunk.as_bytes());
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes that can still be pushed before reaching the limit
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
