//! Body generator for the generate mode.
//!
//! A [`RepeatBody`] describes `fragment` repeated `count` times without
//! materializing it. [`RepeatBody::chunks`] hands out a fresh lazy sequence of
//! [`BodyChunk`]s each time it is called, so the same body can be replayed.
//!
//! Memory stays bounded by the chunk size: one chunk worth of repeated
//! fragments is built once, and every full chunk is a reference counted clone
//! of it. Only the tail chunk is a shorter slice of the same buffer.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{BufMut, Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};

use crate::ensure;
use crate::protocol::{BodyChunk, ParamError};

/// Validates a fragment and repeat count and returns the body they describe.
///
/// An empty fragment is only accepted with `count == 0`; repeating nothing a
/// positive number of times is rejected instead of producing an empty body.
pub fn generate(fragment: Bytes, count: u64) -> Result<RepeatBody, ParamError> {
    ensure!(count == 0 || !fragment.is_empty(), ParamError::EmptyFragment { count });

    let fragment_len = fragment.len();
    let length = (fragment_len as u64)
        .checked_mul(count)
        .ok_or(ParamError::BodyLengthOverflow { fragment_len, count })?;

    Ok(RepeatBody { fragment, count, length })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatBody {
    fragment: Bytes,
    count: u64,
    length: u64,
}

impl RepeatBody {
    pub fn fragment(&self) -> &Bytes {
        &self.fragment
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Total body length, `fragment.len() * count`
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Starts a new chunk sequence over the whole body.
    ///
    /// Each chunk holds as many whole fragments as fit in `chunk_size`, at
    /// least one.
    pub fn chunks(&self, chunk_size: usize) -> RepeatChunks {
        if self.is_empty() {
            return RepeatChunks::empty();
        }

        let fragment_len = self.fragment.len();
        let per_chunk = (chunk_size / fragment_len).max(1);
        let per_chunk = usize::try_from(self.count).map_or(per_chunk, |count| per_chunk.min(count));

        // per_chunk * fragment_len <= max(chunk_size, fragment_len)
        let mut unit = BytesMut::with_capacity(per_chunk * fragment_len);
        for _ in 0..per_chunk {
            unit.put_slice(&self.fragment);
        }

        RepeatChunks {
            unit: unit.freeze(),
            fragment_len: fragment_len as u64,
            per_chunk: per_chunk as u64,
            remaining: self.count,
            offset: 0,
        }
    }
}

/// The lazy chunk sequence of a [`RepeatBody`].
///
/// Usable as an `Iterator` of [`BodyChunk`]s, or as an `http_body::Body`
/// with an exact size hint.
#[derive(Debug, Clone)]
pub struct RepeatChunks {
    unit: Bytes,
    fragment_len: u64,
    per_chunk: u64,
    /// fragments not yet handed out
    remaining: u64,
    offset: u64,
}

impl RepeatChunks {
    fn empty() -> Self {
        Self { unit: Bytes::new(), fragment_len: 0, per_chunk: 0, remaining: 0, offset: 0 }
    }

    /// Bytes not yet handed out
    pub fn remaining_len(&self) -> u64 {
        self.remaining * self.fragment_len
    }

    fn remaining_chunks(&self) -> u64 {
        if self.per_chunk == 0 { 0 } else { self.remaining.div_ceil(self.per_chunk) }
    }
}

impl Iterator for RepeatChunks {
    type Item = BodyChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let repeats = self.per_chunk.min(self.remaining);
        let bytes = if repeats == self.per_chunk {
            self.unit.clone()
        } else {
            #[expect(clippy::cast_possible_truncation, reason = "shorter than the unit, which is a usize long")]
            let tail = (repeats * self.fragment_len) as usize;
            self.unit.slice(..tail)
        };

        self.remaining -= repeats;
        let chunk = BodyChunk::new(self.offset, bytes);
        self.offset = chunk.next_offset();
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining_chunks()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl Body for RepeatChunks {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        Poll::Ready(this.next().map(|chunk| Ok(Frame::data(chunk.into_bytes()))))
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining_len())
    }
}
