//! In-process transport.
//!
//! Request bodies are fed through a [`BodyFeeder`] (or prepared up front with
//! [`MemoryReader::from_chunks`]) and responses are recorded in a
//! [`ResponseProbe`] that can be inspected once the handler is done.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use http::StatusCode;

use crate::protocol::{PayloadItem, ResponseHead, TransportError};
use crate::transport::{BodyReader, BodyWriter, Respond};

/// Creates a request body channel.
///
/// The reader observes end-of-body only after [`BodyFeeder::finish`]; dropping
/// the feeder without finishing looks like a connection closed mid-body.
pub fn body_channel(buffer: usize) -> (BodyFeeder, MemoryReader) {
    let (sender, receiver) = mpsc::channel(buffer);
    (BodyFeeder { sender }, MemoryReader { source: Source::Channel(receiver), eof: false })
}

#[derive(Debug, Clone)]
pub struct BodyFeeder {
    sender: mpsc::Sender<PayloadItem>,
}

impl BodyFeeder {
    pub async fn send(&mut self, bytes: Bytes) -> Result<(), TransportError> {
        self.sender.send(PayloadItem::Chunk(bytes)).await.map_err(TransportError::other)
    }

    pub async fn finish(mut self) -> Result<(), TransportError> {
        self.sender.send(PayloadItem::Eof).await.map_err(TransportError::other)
    }
}

#[derive(Debug)]
enum Source {
    Queue(VecDeque<PayloadItem>),
    Channel(mpsc::Receiver<PayloadItem>),
}

#[derive(Debug)]
pub struct MemoryReader {
    source: Source,
    eof: bool,
}

impl MemoryReader {
    /// A complete request body made of the given chunks.
    pub fn from_chunks<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        let mut items = chunks.into_iter().map(PayloadItem::Chunk).collect::<VecDeque<_>>();
        items.push_back(PayloadItem::Eof);
        Self { source: Source::Queue(items), eof: false }
    }

    /// A request body whose connection closes after the given chunks.
    pub fn truncated<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        let items = chunks.into_iter().map(PayloadItem::Chunk).collect::<VecDeque<_>>();
        Self { source: Source::Queue(items), eof: false }
    }

    async fn next_item(&mut self) -> Option<PayloadItem> {
        match &mut self.source {
            Source::Queue(items) => items.pop_front(),
            Source::Channel(receiver) => receiver.next().await,
        }
    }
}

#[async_trait]
impl BodyReader for MemoryReader {
    async fn read_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        while !self.eof {
            match self.next_item().await {
                Some(PayloadItem::Chunk(bytes)) if bytes.is_empty() => {}
                Some(PayloadItem::Chunk(bytes)) => return Ok(Some(bytes)),
                Some(PayloadItem::Eof) => self.eof = true,
                None => return Err(TransportError::Closed),
            }
        }
        Ok(None)
    }
}

/// What a handler sent through a [`MemoryRespond`].
#[derive(Debug, Default)]
pub struct RecordedResponse {
    pub head: Option<ResponseHead>,
    pub chunks: Vec<Bytes>,
    pub end_of_stream: bool,
    pub reset: bool,
}

impl RecordedResponse {
    pub fn status(&self) -> Option<StatusCode> {
        self.head.as_ref().map(ResponseHead::status)
    }

    pub fn body(&self) -> Bytes {
        let mut body = BytesMut::with_capacity(self.chunks.iter().map(Bytes::len).sum());
        for chunk in &self.chunks {
            body.extend_from_slice(chunk);
        }
        body.freeze()
    }
}

/// Shared view on a recorded response.
#[derive(Debug, Clone, Default)]
pub struct ResponseProbe {
    inner: Arc<Mutex<RecordedResponse>>,
}

impl ResponseProbe {
    pub fn lock(&self) -> MutexGuard<'_, RecordedResponse> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.lock().status()
    }

    pub fn body(&self) -> Bytes {
        self.lock().body()
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.lock().end_of_stream
    }

    pub fn is_reset(&self) -> bool {
        self.lock().reset
    }
}

#[derive(Debug)]
pub struct MemoryRespond {
    stream_id: u32,
    probe: ResponseProbe,
    reset_after: Option<usize>,
}

impl MemoryRespond {
    pub fn new(stream_id: u32) -> (Self, ResponseProbe) {
        let probe = ResponseProbe::default();
        (Self { stream_id, probe: probe.clone(), reset_after: None }, probe)
    }

    /// Simulates a peer resetting the stream after `writes` successful writes.
    #[must_use]
    pub fn reset_after(mut self, writes: usize) -> Self {
        self.reset_after = Some(writes);
        self
    }
}

impl Respond for MemoryRespond {
    type Writer = MemoryWriter;

    fn stream_id(&self) -> u32 {
        self.stream_id
    }

    fn send_head(self, head: ResponseHead, end_of_stream: bool) -> Result<Self::Writer, TransportError> {
        let mut recorded = self.probe.lock();
        recorded.head = Some(head);
        recorded.end_of_stream = end_of_stream;
        drop(recorded);

        Ok(MemoryWriter { probe: self.probe, remaining_writes: self.reset_after })
    }

    fn reset(self) {
        self.probe.lock().reset = true;
    }
}

#[derive(Debug)]
pub struct MemoryWriter {
    probe: ResponseProbe,
    remaining_writes: Option<usize>,
}

#[async_trait]
impl BodyWriter for MemoryWriter {
    async fn write_chunk(&mut self, data: Bytes) -> Result<(), TransportError> {
        match &mut self.remaining_writes {
            Some(0) => return Err(TransportError::Reset { reason: h2::Reason::CANCEL }),
            Some(remaining) => *remaining -= 1,
            None => {}
        }

        let mut recorded = self.probe.lock();
        if recorded.end_of_stream || recorded.reset {
            return Err(TransportError::Closed);
        }
        recorded.chunks.push(data);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let mut recorded = self.probe.lock();
        if recorded.reset {
            return Err(TransportError::Closed);
        }
        recorded.end_of_stream = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.probe.lock().reset = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reader_from_chunks_skips_empty() {
        let mut reader = MemoryReader::from_chunks([Bytes::from_static(b"ab"), Bytes::new(), Bytes::from_static(b"c")]);
        assert_eq!(reader.read_chunk().await.unwrap(), Some(Bytes::from_static(b"ab")));
        assert_eq!(reader.read_chunk().await.unwrap(), Some(Bytes::from_static(b"c")));
        assert_eq!(reader.read_chunk().await.unwrap(), None);
        assert_eq!(reader.read_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn truncated_reader_reports_closed() {
        let mut reader = MemoryReader::truncated([Bytes::from_static(b"ab")]);
        assert_eq!(reader.read_chunk().await.unwrap(), Some(Bytes::from_static(b"ab")));
        assert!(matches!(reader.read_chunk().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn channel_reader() {
        let (mut feeder, mut reader) = body_channel(1);
        let feeding = tokio::spawn(async move {
            feeder.send(Bytes::from_static(b"a")).await.unwrap();
            feeder.send(Bytes::from_static(b"b")).await.unwrap();
            feeder.finish().await.unwrap();
        });

        assert_eq!(reader.read_chunk().await.unwrap(), Some(Bytes::from_static(b"a")));
        assert_eq!(reader.read_chunk().await.unwrap(), Some(Bytes::from_static(b"b")));
        assert_eq!(reader.read_chunk().await.unwrap(), None);
        feeding.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_feeder_reports_closed() {
        let (mut feeder, mut reader) = body_channel(1);
        feeder.send(Bytes::from_static(b"a")).await.unwrap();
        drop(feeder);

        assert_eq!(reader.read_chunk().await.unwrap(), Some(Bytes::from_static(b"a")));
        assert!(matches!(reader.read_chunk().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn respond_records_response() {
        let (respond, probe) = MemoryRespond::new(1);
        let mut writer = respond.send_head(ResponseHead::new(()), false).unwrap();
        writer.write_chunk(Bytes::from_static(b"ab")).await.unwrap();
        writer.write_chunk(Bytes::from_static(b"cd")).await.unwrap();
        writer.close().await.unwrap();

        assert_eq!(probe.status(), Some(StatusCode::OK));
        assert_eq!(probe.body(), Bytes::from_static(b"abcd"));
        assert!(probe.is_end_of_stream());
        assert!(matches!(writer.write_chunk(Bytes::from_static(b"e")).await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn respond_simulates_reset() {
        let (respond, probe) = MemoryRespond::new(1);
        let mut writer = respond.reset_after(1).send_head(ResponseHead::new(()), false).unwrap();
        writer.write_chunk(Bytes::from_static(b"ab")).await.unwrap();
        assert!(matches!(writer.write_chunk(Bytes::from_static(b"cd")).await, Err(TransportError::Reset { .. })));
        assert_eq!(probe.body(), Bytes::from_static(b"ab"));
    }
}
