//! The per-stream transport contract.
//!
//! The HTTP/2 framing, HPACK and flow-control windows live in the transport
//! layer. This module only names what a stream handler needs from it:
//!
//! - [`BodyReader`]: the request body, one chunk at a time, until end-of-body
//! - [`Respond`]: sends the response head and hands out the body writer
//! - [`BodyWriter`]: the response body, suspending while the peer can't take more
//!
//! Each handle is exclusive to the handler of its stream. Interleaving frames
//! of different streams on a shared connection is the transport's job.
//!
//! Implementations:
//!
//! - [`H2BodyReader`], [`H2Respond`], [`H2BodyWriter`] over the `h2` crate
//! - [`memory`]: an in-process transport used by tests and benchmarks

use async_trait::async_trait;
use bytes::Bytes;

use crate::protocol::{ResponseHead, TransportError};

mod h2_stream;
pub use h2_stream::H2BodyReader;
pub use h2_stream::H2BodyWriter;
pub use h2_stream::H2Respond;

pub mod memory;

#[async_trait]
pub trait BodyReader: Send {
    /// Reads the next non empty chunk of the request body.
    ///
    /// Returns `Ok(None)` once the peer signaled end-of-body. Suspends while
    /// no bytes have arrived yet.
    async fn read_chunk(&mut self) -> Result<Option<Bytes>, TransportError>;
}

#[async_trait]
pub trait BodyWriter: Send {
    /// Writes a chunk of the response body.
    ///
    /// Suspends until the transport accepted every byte of `data`.
    async fn write_chunk(&mut self, data: Bytes) -> Result<(), TransportError>;

    /// Signals end-of-body to the peer.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Terminates the stream abnormally, discarding pending output.
    fn abort(&mut self);
}

pub trait Respond: Send {
    type Writer: BodyWriter;

    fn stream_id(&self) -> u32;

    /// Sends the response head.
    ///
    /// With `end_of_stream` the response has no body and the returned writer
    /// must not be written to.
    fn send_head(self, head: ResponseHead, end_of_stream: bool) -> Result<Self::Writer, TransportError>;

    /// Terminates the stream before any response head was sent.
    fn reset(self);
}
