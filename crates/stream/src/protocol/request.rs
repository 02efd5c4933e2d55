//! HTTP request header handling.
//!
//! The transport hands over a full `http::Request` whose body is a stream
//! reader. The header part is split off into a [`RequestHeader`] so the
//! parameters can be inspected while the body reader moves on to its own owner.

use http::request::Parts;
use http::{HeaderMap, Request, Uri};

use crate::protocol::{ParamError, PayloadSize, RequestParams};

/// Represents an HTTP request header.
///
/// This struct wraps a `http::Request<()>`, the body being owned elsewhere.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl RequestHeader {
    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Parses the stream parameters from the query string.
    pub fn params(&self) -> Result<RequestParams, ParamError> {
        RequestParams::from_uri(self.uri())
    }

    /// The announced size of the request body.
    pub fn payload_size(&self) -> PayloadSize {
        PayloadSize::from_headers(self.headers())
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}
