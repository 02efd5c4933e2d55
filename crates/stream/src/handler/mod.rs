//! The per-request stream handler.
//!
//! [`StreamHandler::handle`] runs one request to completion:
//!
//! 1. the query parameters select the generate or the echo mode
//! 2. the response head is sent, `400 Bad Request` for invalid parameters
//! 3. the chosen body producer streams chunks to the response, in order
//! 4. the response is closed, or the stream is reset if anything failed after the head went out
//!
//! A handler only ever touches the handles of its own stream. The handler
//! itself is immutable and shared by all streams of a server.

use bytes::Bytes;
use http::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::protocol::body::{ChunkBuffer, EchoCollector, generate};
use crate::protocol::{
    BodyChunk, PayloadSize, RequestHeader, RequestParams, StreamContext, StreamError, StreamState, build_error_head,
    build_head,
};
use crate::transport::{BodyReader, BodyWriter, Respond};

/// How echo mode produces its response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoMode {
    /// Forward each request chunk as soon as it arrives
    #[default]
    Relay,
    /// Assemble the whole request body first, bounded by `max_buffered_body`
    Buffered,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamOptions {
    /// Target size of generated chunks
    pub chunk_size: usize,
    pub echo_mode: EchoMode,
    pub max_buffered_body: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self { chunk_size: 16 * 1024, echo_mode: EchoMode::Relay, max_buffered_body: 16 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamHandler {
    options: StreamOptions,
}

impl StreamHandler {
    pub fn new(options: StreamOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Handles one request, returning its finished context.
    ///
    /// Every error is local to this stream. Parameter errors are answered with
    /// a status code; failures after the head was sent reset the stream.
    pub async fn handle<B, R>(&self, request: http::Request<B>, respond: R) -> Result<StreamContext, StreamError>
    where
        B: BodyReader,
        R: Respond,
    {
        let mut context = StreamContext::new(respond.stream_id());
        let (parts, body) = request.into_parts();
        let header = RequestHeader::from(parts);

        match self.drive(&mut context, &header, body, respond).await {
            Ok(()) => {
                context.transition(StreamState::Completed);
                info!(stream_id = context.id(), mode = ?context.mode(), written = context.written(), "stream completed");
                Ok(context)
            }
            Err(e) => {
                context.fail(&e);
                Err(e)
            }
        }
    }

    async fn drive<B, R>(&self, context: &mut StreamContext, header: &RequestHeader, body: B, respond: R) -> Result<(), StreamError>
    where
        B: BodyReader,
        R: Respond,
    {
        context.transition(StreamState::ParsingParameters);
        let params = match header.params() {
            Ok(params) => params,
            Err(e) => {
                respond.send_head(build_error_head(StatusCode::BAD_REQUEST), true)?;
                return Err(e.into());
            }
        };

        match params {
            RequestParams::Generate { fragment, count } => self.serve_generate(context, fragment, count, respond).await,
            RequestParams::Echo => match self.options.echo_mode {
                EchoMode::Relay => serve_echo_relay(context, header, body, respond).await,
                EchoMode::Buffered => self.serve_echo_buffered(context, header, body, respond).await,
            },
        }
    }

    async fn serve_generate<R>(&self, context: &mut StreamContext, fragment: Bytes, count: u64, respond: R) -> Result<(), StreamError>
    where
        R: Respond,
    {
        let body = match generate(fragment, count) {
            Ok(body) => body,
            Err(e) => {
                respond.send_head(build_error_head(StatusCode::BAD_REQUEST), true)?;
                return Err(e.into());
            }
        };

        context.transition(StreamState::Generating);
        if body.is_empty() {
            respond.send_head(build_head(StatusCode::OK, PayloadSize::Empty), true)?;
            context.transition(StreamState::Writing);
            return Ok(());
        }

        let mut writer = respond.send_head(build_head(StatusCode::OK, PayloadSize::new_length(body.len())), false)?;
        let result = write_all(context, &mut writer, body.chunks(self.options.chunk_size)).await;
        abort_on_error(&mut writer, result)
    }

    async fn serve_echo_buffered<B, R>(
        &self,
        context: &mut StreamContext,
        header: &RequestHeader,
        body: B,
        respond: R,
    ) -> Result<(), StreamError>
    where
        B: BodyReader,
        R: Respond,
    {
        context.transition(StreamState::Echoing);
        // an announced length only sizes the allocation, the limit still applies
        let announced = header.payload_size().exact().and_then(|length| usize::try_from(length).ok()).unwrap_or(0);
        let buffer = ChunkBuffer::with_capacity(announced, self.options.max_buffered_body);
        let collected = match EchoCollector::new(body).consume(buffer).await {
            Ok(collected) => collected,
            Err(e @ StreamError::BodyTooLarge { .. }) => {
                respond.send_head(build_error_head(StatusCode::PAYLOAD_TOO_LARGE), true)?;
                return Err(e);
            }
            Err(e) => {
                respond.reset();
                return Err(e);
            }
        };

        let payload_size = PayloadSize::new_length(collected.len() as u64);
        let mut writer = respond.send_head(build_head(StatusCode::OK, payload_size), false)?;
        let result = write_all(context, &mut writer, [BodyChunk::new(0, collected)]).await;
        abort_on_error(&mut writer, result)
    }
}

async fn serve_echo_relay<B, R>(context: &mut StreamContext, header: &RequestHeader, body: B, respond: R) -> Result<(), StreamError>
where
    B: BodyReader,
    R: Respond,
{
    context.transition(StreamState::Echoing);
    let mut writer = respond.send_head(build_head(StatusCode::OK, header.payload_size()), false)?;
    let result = relay_all(context, &mut writer, body).await;
    abort_on_error(&mut writer, result)
}

async fn write_all<W, I>(context: &mut StreamContext, writer: &mut W, chunks: I) -> Result<(), StreamError>
where
    W: BodyWriter,
    I: IntoIterator<Item = BodyChunk>,
{
    for chunk in chunks {
        context.write_chunk(writer, chunk).await?;
    }
    finish(context, writer).await
}

async fn relay_all<W, B>(context: &mut StreamContext, writer: &mut W, body: B) -> Result<(), StreamError>
where
    W: BodyWriter,
    B: BodyReader,
{
    EchoCollector::new(body).relay(writer, context).await?;
    finish(context, writer).await
}

async fn finish<W>(context: &mut StreamContext, writer: &mut W) -> Result<(), StreamError>
where
    W: BodyWriter,
{
    context.transition(StreamState::Writing);
    writer.close().await.map_err(|e| StreamError::write_failed(context.written(), e))
}

/// Resets the stream when the body could not be completed.
fn abort_on_error<W>(writer: &mut W, result: Result<(), StreamError>) -> Result<(), StreamError>
where
    W: BodyWriter,
{
    if result.is_err() {
        writer.abort();
    }
    result
}
