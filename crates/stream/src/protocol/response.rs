//! HTTP response header handling implementation.
//!
//! This module provides type definitions for HTTP response headers.
//! It uses the standard `http::Response` type with an empty body placeholder
//! to represent response headers before the body is streamed out.

use http::header::CONTENT_LENGTH;
use http::{HeaderValue, Response, StatusCode};

use crate::protocol::PayloadSize;

/// Type alias for HTTP response headers.
pub type ResponseHead = Response<()>;

/// Builds a response head, setting `content-length` when the size is known.
pub fn build_head(status: StatusCode, payload_size: PayloadSize) -> ResponseHead {
    let mut head = Response::new(());
    *head.status_mut() = status;
    if let Some(length) = payload_size.exact() {
        head.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(length));
    }
    head
}

/// Builds a bodyless response head for error status codes.
pub fn build_error_head(status: StatusCode) -> ResponseHead {
    build_head(status, PayloadSize::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_with_length() {
        let head = build_head(StatusCode::OK, PayloadSize::Length(400));
        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(head.headers().get(CONTENT_LENGTH).unwrap(), "400");
    }

    #[test]
    fn head_without_length() {
        let head = build_head(StatusCode::OK, PayloadSize::Chunked);
        assert!(head.headers().get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn error_head_is_empty() {
        let head = build_error_head(StatusCode::BAD_REQUEST);
        assert_eq!(head.status(), StatusCode::BAD_REQUEST);
        assert_eq!(head.headers().get(CONTENT_LENGTH).unwrap(), "0");
    }
}
