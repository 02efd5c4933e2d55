use std::future::poll_fn;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::FutureExt;
use h2::server::SendResponse;
use h2::{Reason, RecvStream, SendStream};

use crate::protocol::{ResponseHead, TransportError};
use crate::transport::{BodyReader, BodyWriter, Respond};

/// Upper bound of one coalesced request chunk.
const COALESCE_LIMIT: usize = 16 * 1024;

/// Request body reader over an `h2` receive stream.
///
/// Flow control capacity is released as soon as a frame is taken from `h2`.
/// The caller reads the next chunk only after it forwarded the current one,
/// so the bytes in flight stay bounded by the stream window.
///
/// Frames that are already buffered when a chunk is read are merged into it,
/// up to [`COALESCE_LIMIT`] bytes. A body sent as many tiny frames is drained
/// as fast as it arrives, and every frame taken out of `h2` gives its framing
/// overhead back to the connection.
#[derive(Debug)]
pub struct H2BodyReader {
    inner: RecvStream,
    ended: bool,
    failed: Option<TransportError>,
}

impl H2BodyReader {
    pub fn new(inner: RecvStream) -> Self {
        Self { inner, ended: false, failed: None }
    }

    async fn next_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        loop {
            match self.inner.data().await {
                Some(Ok(bytes)) if bytes.is_empty() => {}
                Some(Ok(bytes)) => {
                    self.inner.flow_control().release_capacity(bytes.len())?;
                    return Ok(Some(bytes));
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    self.ended = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Takes a frame only if `h2` has one buffered right now.
    ///
    /// End of stream and errors are remembered for the next read so the
    /// bytes merged so far are still delivered.
    fn buffered_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.inner.data().now_or_never() {
            Some(Some(Ok(bytes))) => {
                self.inner.flow_control().release_capacity(bytes.len())?;
                Ok(Some(bytes))
            }
            Some(Some(Err(e))) => {
                self.failed = Some(e.into());
                Ok(None)
            }
            Some(None) => {
                self.ended = true;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BodyReader for H2BodyReader {
    async fn read_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        if let Some(e) = self.failed.take() {
            return Err(e);
        }
        if self.ended {
            return Ok(None);
        }

        let Some(first) = self.next_frame().await? else {
            return Ok(None);
        };

        let mut merged: Option<BytesMut> = None;
        let mut len = first.len();
        while len < COALESCE_LIMIT {
            let Some(next) = self.buffered_frame()? else {
                break;
            };
            let buf = merged.get_or_insert_with(|| {
                let mut buf = BytesMut::with_capacity(COALESCE_LIMIT.max(len));
                buf.extend_from_slice(&first);
                buf
            });
            buf.extend_from_slice(&next);
            len += next.len();
        }

        Ok(Some(merged.map_or(first, BytesMut::freeze)))
    }
}

/// Response body writer over an `h2` send stream.
#[derive(Debug)]
pub struct H2BodyWriter {
    inner: SendStream<Bytes>,
}

impl H2BodyWriter {
    pub fn new(inner: SendStream<Bytes>) -> Self {
        Self { inner }
    }

    /// Waits until the peer's window grants some capacity.
    ///
    /// Resolves with an error as soon as the peer resets the stream.
    async fn wait_capacity(&mut self, desired: usize) -> Result<usize, TransportError> {
        self.inner.reserve_capacity(desired);
        loop {
            // poll_capacity only wakes on increments, so check what is already assigned
            let capacity = self.inner.capacity();
            if capacity > 0 {
                return Ok(capacity);
            }

            match poll_fn(|cx| self.inner.poll_capacity(cx)).await {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(TransportError::Closed),
            }
        }
    }
}

#[async_trait]
impl BodyWriter for H2BodyWriter {
    async fn write_chunk(&mut self, mut data: Bytes) -> Result<(), TransportError> {
        while !data.is_empty() {
            let capacity = self.wait_capacity(data.len()).await?;
            let frame = data.split_to(capacity.min(data.len()));
            self.inner.send_data(frame, false)?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner.send_data(Bytes::new(), true)?;
        Ok(())
    }

    fn abort(&mut self) {
        self.inner.send_reset(Reason::INTERNAL_ERROR);
    }
}

/// The response side of one `h2` stream.
#[derive(Debug)]
pub struct H2Respond {
    inner: SendResponse<Bytes>,
}

impl H2Respond {
    pub fn new(inner: SendResponse<Bytes>) -> Self {
        Self { inner }
    }
}

impl Respond for H2Respond {
    type Writer = H2BodyWriter;

    fn stream_id(&self) -> u32 {
        self.inner.stream_id().as_u32()
    }

    fn send_head(mut self, head: ResponseHead, end_of_stream: bool) -> Result<Self::Writer, TransportError> {
        let send_stream = self.inner.send_response(head, end_of_stream)?;
        Ok(H2BodyWriter::new(send_stream))
    }

    fn reset(mut self) {
        self.inner.send_reset(Reason::CANCEL);
    }
}
