use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_LENGTH;
use http_body::SizeHint;

/// A contiguous slice of body bytes together with its offset from the body start.
///
/// Chunks of one stream are produced and consumed in strictly increasing
/// offset order, so `next_offset()` of one chunk is the `offset()` of the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyChunk {
    offset: u64,
    bytes: Bytes,
}

impl BodyChunk {
    pub fn new(offset: u64, bytes: Bytes) -> Self {
        Self { offset, bytes }
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The offset right after the last byte of this chunk
    #[inline]
    pub fn next_offset(&self) -> u64 {
        self.offset + self.bytes.len() as u64
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Represents an item in a body stream.
///
/// Either a chunk of data or the end-of-body marker signaled by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A chunk of payload data
    Chunk(Bytes),
    /// Marks the end of the payload stream
    Eof,
}

/// Represents the size information of a body.
///
/// - Known length: the `content-length` header can be sent
/// - Chunked: the length is only known once end-of-body is observed
/// - Empty: no payload at all
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload with unknown length
    Chunked,
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn new_length(length: u64) -> Self {
        if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) }
    }

    /// Reads the `content-length` header, falling back to `Chunked` when the
    /// header is absent or unparsable.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(PayloadSize::Chunked, PayloadSize::new_length)
    }

    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    /// Returns the exact length, `Some(0)` for empty payloads
    pub fn exact(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(length) => Some(*length),
            PayloadSize::Empty => Some(0),
            PayloadSize::Chunked => None,
        }
    }
}

impl From<SizeHint> for PayloadSize {
    fn from(size_hint: SizeHint) -> Self {
        match size_hint.exact() {
            Some(length) => PayloadSize::new_length(length),
            None => PayloadSize::Chunked,
        }
    }
}

impl From<PayloadSize> for SizeHint {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => SizeHint::with_exact(length),
            PayloadSize::Chunked => SizeHint::new(),
            PayloadSize::Empty => SizeHint::with_exact(0),
        }
    }
}
