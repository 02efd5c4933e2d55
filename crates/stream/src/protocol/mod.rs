//! Core protocol abstractions for body streaming.
//!
//! This module provides the building blocks every stream handler is made of:
//! request parameters, body chunks, the body producers and the error taxonomy.
//! The HTTP/2 framing itself belongs to the transport layer.
//!
//! # Architecture
//!
//! - **Message Handling** ([`message`]): body chunk types
//!   - [`BodyChunk`]: an immutable byte run plus its offset from the body start
//!   - [`PayloadItem`]: a chunk or the end-of-body marker
//!   - [`PayloadSize`]: size information used for `content-length`
//!
//! - **Parameters** ([`params`]): [`Mode`] and [`RequestParams`] parsed from the query
//!
//! - **Request/Response Heads** ([`request`], [`response`])
//!
//! - **Stream State** ([`context`]): [`StreamContext`] and its [`StreamState`] machine
//!
//! - **Body Production** ([`body`]): the generator, the chunk buffer and the echo collector
//!
//! - **Error Handling** ([`error`]):
//!   - [`StreamError`]: per-stream error type
//!   - [`ParamError`]: parameter validation errors
//!   - [`TransportError`]: faults reported by the transport
//!   - [`BufferError`]: chunk buffer violations
//!   - [`ServerError`]: listener errors

mod message;
pub use message::BodyChunk;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod params;
pub use params::Mode;
pub use params::RequestParams;

mod request;
pub use request::RequestHeader;

mod context;
pub use context::StreamContext;
pub use context::StreamState;

mod response;
pub use response::ResponseHead;
pub use response::build_error_head;
pub use response::build_head;

mod error;
pub use error::BufferError;
pub use error::ParamError;
pub use error::ServerError;
pub use error::StreamError;
pub use error::TransportError;

pub mod body;
