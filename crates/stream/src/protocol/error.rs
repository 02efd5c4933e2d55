use std::io;
use thiserror::Error;

/// Errors reported for a single stream.
///
/// Every variant is local to one stream context: a failure here never
/// affects other streams sharing the same connection.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid parameters: {source}")]
    InvalidParameters {
        #[from]
        source: ParamError,
    },

    #[error("request body truncated after {received} bytes: {source}")]
    TruncatedBody { received: u64, source: TransportError },

    #[error("request body exceed the buffer limit {limit}")]
    BodyTooLarge { limit: usize },

    #[error("response write failed after {written} bytes: {source}")]
    WriteFailed { written: u64, source: TransportError },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },
}

impl StreamError {
    pub fn truncated_body(received: u64, source: TransportError) -> Self {
        Self::TruncatedBody { received, source }
    }

    pub fn write_failed(written: u64, source: TransportError) -> Self {
        Self::WriteFailed { written, source }
    }

    /// Returns true for errors caused by the request parameters, which are
    /// answered with a status code instead of a stream reset.
    #[inline]
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(self, StreamError::InvalidParameters { .. })
    }
}

impl From<BufferError> for StreamError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::Overflow { limit } => Self::BodyTooLarge { limit },
            e @ BufferError::OutOfOrder { .. } => Self::Transport { source: TransportError::other(e) },
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing `type` parameter")]
    MissingType,

    #[error("unknown `type` parameter: {value}")]
    UnknownType { value: String },

    #[error("missing `{field}` parameter")]
    MissingField { field: &'static str },

    #[error("invalid `count` parameter: {reason}")]
    InvalidCount { reason: String },

    #[error("negative `count` parameter: {value}")]
    NegativeCount { value: String },

    #[error("empty `body_part` can't be repeated {count} times")]
    EmptyFragment { count: u64 },

    #[error("generated body length overflow, fragment size: {fragment_len}, count: {count}")]
    BodyLengthOverflow { fragment_len: usize, count: u64 },

    #[error("malformed query string: {reason}")]
    MalformedQuery { reason: String },
}

impl ParamError {
    pub fn unknown_type<S: ToString>(value: S) -> Self {
        Self::UnknownType { value: value.to_string() }
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub fn invalid_count<S: ToString>(reason: S) -> Self {
        Self::InvalidCount { reason: reason.to_string() }
    }

    pub fn malformed_query<S: ToString>(reason: S) -> Self {
        Self::MalformedQuery { reason: reason.to_string() }
    }
}

/// Faults reported by the transport collaborator for one stream.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("stream closed before end of body")]
    Closed,

    #[error("stream reset by peer, reason: {reason}")]
    Reset { reason: h2::Reason },

    #[error("h2 error: {source}")]
    H2 { source: h2::Error },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl TransportError {
    pub fn other<E: Into<Box<dyn std::error::Error + Send + Sync>>>(e: E) -> Self {
        Self::Io { source: io::Error::other(e) }
    }
}

impl From<h2::Error> for TransportError {
    fn from(e: h2::Error) -> Self {
        match e.reason() {
            Some(reason) if e.is_reset() => Self::Reset { reason },
            _ if e.is_io() => match e.into_io() {
                Some(source) => Self::Io { source },
                None => Self::Closed,
            },
            _ => Self::H2 { source: e },
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("chunk out of order, expected offset: {expected}, actual: {actual}")]
    OutOfOrder { expected: u64, actual: u64 },

    #[error("buffer size exceed the limit {limit}")]
    Overflow { limit: usize },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("address must be set")]
    MissingAddress,

    #[error("bind {address} error: {source}")]
    Bind { address: std::net::SocketAddr, source: io::Error },

    #[error("can't resolve local address: {source}")]
    LocalAddr { source: io::Error },
}
