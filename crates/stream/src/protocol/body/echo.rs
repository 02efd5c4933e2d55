use bytes::Bytes;
use tracing::debug;

use crate::protocol::body::ChunkBuffer;
use crate::protocol::{BodyChunk, StreamContext, StreamError};
use crate::transport::{BodyReader, BodyWriter};

/// Consumes a request body chunk by chunk, in arrival order.
///
/// Transport chunk boundaries carry no meaning: the collector only tracks the
/// byte offset, so a body sent as one frame and the same body split into
/// single bytes produce identical output.
///
/// If the transport fails before end-of-body the collector reports
/// [`StreamError::TruncatedBody`], never a partial result.
#[derive(Debug)]
pub struct EchoCollector<R> {
    reader: R,
    received: u64,
    eof: bool,
}

impl<R> EchoCollector<R>
where
    R: BodyReader,
{
    pub fn new(reader: R) -> Self {
        Self { reader, received: 0, eof: false }
    }

    /// Bytes received so far
    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Reads the next chunk, `Ok(None)` once end-of-body was signaled.
    pub async fn next_chunk(&mut self) -> Result<Option<BodyChunk>, StreamError> {
        if self.eof {
            return Ok(None);
        }

        match self.reader.read_chunk().await {
            Ok(Some(bytes)) => {
                let chunk = BodyChunk::new(self.received, bytes);
                self.received = chunk.next_offset();
                Ok(Some(chunk))
            }
            Ok(None) => {
                self.eof = true;
                Ok(None)
            }
            Err(e) => Err(StreamError::truncated_body(self.received, e)),
        }
    }

    /// Buffers the whole body, failing once it exceeds the buffer limit.
    pub async fn consume(mut self, mut buffer: ChunkBuffer) -> Result<Bytes, StreamError> {
        while let Some(chunk) = self.next_chunk().await? {
            buffer.push(&chunk)?;
        }

        debug!(size = buffer.len(), "request body buffered");
        Ok(buffer.freeze())
    }

    /// Forwards every chunk to `writer` as soon as it arrived.
    ///
    /// Returns the body length once end-of-body was observed. The writer is
    /// not closed.
    pub async fn relay<W>(mut self, writer: &mut W, context: &mut StreamContext) -> Result<u64, StreamError>
    where
        W: BodyWriter + ?Sized,
    {
        while let Some(chunk) = self.next_chunk().await? {
            context.write_chunk(writer, chunk).await?;
        }

        debug!(stream_id = context.id(), size = self.received, "request body relayed");
        Ok(self.received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ResponseHead, TransportError};
    use crate::transport::Respond;
    use crate::transport::memory::{MemoryReader, MemoryRespond, body_channel};

    fn echo_body() -> Bytes {
        Bytes::from("abcdefgh".repeat(128))
    }

    fn split(body: &Bytes, size: usize) -> Vec<Bytes> {
        body.chunks(size).map(Bytes::copy_from_slice).collect()
    }

    #[tokio::test]
    async fn consume_whole_body() {
        let body = echo_body();
        let collector = EchoCollector::new(MemoryReader::from_chunks(split(&body, 100)));
        let collected = collector.consume(ChunkBuffer::new(4096)).await.unwrap();
        assert_eq!(collected, body);
    }

    #[tokio::test]
    async fn fragmentation_does_not_change_result() {
        let body = echo_body();
        let whole = EchoCollector::new(MemoryReader::from_chunks([body.clone()]))
            .consume(ChunkBuffer::new(4096))
            .await
            .unwrap();
        let pieces = EchoCollector::new(MemoryReader::from_chunks(split(&body, 1)))
            .consume(ChunkBuffer::new(4096))
            .await
            .unwrap();
        assert_eq!(whole, body);
        assert_eq!(pieces, body);
    }

    #[tokio::test]
    async fn empty_body() {
        let mut collector = EchoCollector::new(MemoryReader::from_chunks(Vec::<Bytes>::new()));
        assert_eq!(collector.next_chunk().await.unwrap(), None);
        assert!(collector.is_eof());
        assert_eq!(collector.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn consume_truncated_body() {
        let collector = EchoCollector::new(MemoryReader::truncated([Bytes::from_static(b"abc")]));
        let error = collector.consume(ChunkBuffer::new(4096)).await.unwrap_err();
        assert!(matches!(error, StreamError::TruncatedBody { received: 3, source: TransportError::Closed }));
    }

    #[tokio::test]
    async fn consume_over_limit() {
        let body = echo_body();
        let collector = EchoCollector::new(MemoryReader::from_chunks(split(&body, 100)));
        let error = collector.consume(ChunkBuffer::new(512)).await.unwrap_err();
        assert!(matches!(error, StreamError::BodyTooLarge { limit: 512 }));
    }

    #[tokio::test]
    async fn relay_forwards_in_order() {
        let body = echo_body();
        let (respond, probe) = MemoryRespond::new(1);
        let mut writer = respond.send_head(ResponseHead::new(()), false).unwrap();
        let mut context = StreamContext::new(1);

        let collector = EchoCollector::new(MemoryReader::from_chunks(split(&body, 7)));
        let size = collector.relay(&mut writer, &mut context).await.unwrap();

        assert_eq!(size, 1024);
        assert_eq!(context.written(), 1024);
        assert_eq!(probe.body(), body);
        assert_eq!(probe.lock().chunks.len(), 1024_usize.div_ceil(7));
    }

    #[tokio::test]
    async fn relay_forwards_before_end_of_body() {
        let (mut feeder, reader) = body_channel(1);
        let (respond, probe) = MemoryRespond::new(1);
        let mut writer = respond.send_head(ResponseHead::new(()), false).unwrap();

        let relay = tokio::spawn(async move {
            let mut context = StreamContext::new(1);
            EchoCollector::new(reader).relay(&mut writer, &mut context).await
        });

        feeder.send(Bytes::from_static(b"first")).await.unwrap();
        while probe.body().len() < 5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(probe.body(), Bytes::from_static(b"first"));

        feeder.send(Bytes::from_static(b"second")).await.unwrap();
        feeder.finish().await.unwrap();

        assert_eq!(relay.await.unwrap().unwrap(), 11);
        assert_eq!(probe.body(), Bytes::from_static(b"firstsecond"));
    }

    #[tokio::test]
    async fn relay_truncated_body() {
        let (respond, probe) = MemoryRespond::new(1);
        let mut writer = respond.send_head(ResponseHead::new(()), false).unwrap();
        let mut context = StreamContext::new(1);

        let collector = EchoCollector::new(MemoryReader::truncated([Bytes::from_static(b"ab"), Bytes::from_static(b"cd")]));
        let error = collector.relay(&mut writer, &mut context).await.unwrap_err();

        assert!(matches!(error, StreamError::TruncatedBody { received: 4, .. }));
        assert_eq!(probe.body(), Bytes::from_static(b"abcd"));
    }
}
