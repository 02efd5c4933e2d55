use std::sync::Arc;

use bytes::Bytes;
use h2::RecvStream;
use h2::server::SendResponse;
use http::Request;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

use crate::handler::StreamHandler;
use crate::protocol::{StreamContext, StreamError, TransportError};
use crate::transport::{H2BodyReader, H2Respond};

/// HTTP/2 settings sent to every client in the connection preface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct H2Settings {
    pub max_concurrent_streams: u32,
    pub initial_window_size: u32,
    pub max_frame_size: u32,
    /// Framing overhead the connection tolerates for small DATA frames that
    /// are buffered but not yet read; a frame of `n < 256` bytes costs
    /// `256 - n`. Exceeding it closes the connection with `ENHANCE_YOUR_CALM`.
    pub data_frame_budget: usize,
}

/// Covers a full default connection window sent as one byte frames.
const DEFAULT_DATA_FRAME_BUDGET: usize = 255 * 65_535;

impl Default for H2Settings {
    fn default() -> Self {
        Self {
            max_concurrent_streams: 256,
            initial_window_size: 65_535,
            max_frame_size: 16_384,
            data_frame_budget: DEFAULT_DATA_FRAME_BUDGET,
        }
    }
}

impl H2Settings {
    pub fn builder(&self) -> h2::server::Builder {
        let mut builder = h2::server::Builder::new();
        builder
            .max_concurrent_streams(self.max_concurrent_streams)
            .initial_window_size(self.initial_window_size)
            .max_frame_size(self.max_frame_size)
            .data_frame_budget(self.data_frame_budget);
        builder
    }
}

/// An HTTP/2 connection serving body streams.
///
/// Streams are independent: each one owns its request body reader and its
/// response writer, and shares nothing with its siblings but the immutable
/// [`StreamHandler`]. Frames of concurrent responses are interleaved by `h2`.
#[derive(Debug)]
pub struct H2Connection<T> {
    io: T,
    handler: Arc<StreamHandler>,
    settings: H2Settings,
}

type StreamResult = Result<StreamContext, StreamError>;

impl<T> H2Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: T, handler: Arc<StreamHandler>, settings: H2Settings) -> Self {
        Self { io, handler, settings }
    }

    /// Serves streams until the client closes the connection or `shutdown`
    /// fired and every open stream finished.
    ///
    /// Connection level failures are returned; stream level failures only
    /// end their own stream.
    pub async fn process(self, shutdown: CancellationToken) -> Result<(), TransportError> {
        let mut connection = self.settings.builder().handshake::<_, Bytes>(self.io).await?;
        debug!("http2 handshake completed");

        let mut streams = JoinSet::<StreamResult>::new();
        let mut draining = false;

        let result = loop {
            select! {
                next = connection.accept() => match next {
                    Some(Ok((request, respond))) => {
                        let span = info_span!("stream", id = respond.stream_id().as_u32());
                        streams.spawn(serve_stream(Arc::clone(&self.handler), request, respond).instrument(span));
                    }
                    Some(Err(e)) => break Err(TransportError::from(e)),
                    None => break Ok(()),
                },

                () = shutdown.cancelled(), if !draining => {
                    info!(active_streams = streams.len(), "shutdown requested, sending goaway");
                    draining = true;
                    connection.graceful_shutdown();
                }

                Some(joined) = streams.join_next() => log_joined(joined),
            }
        };

        match &result {
            Ok(()) => {
                while let Some(joined) = streams.join_next().await {
                    log_joined(joined);
                }
            }
            Err(e) => {
                error!(cause = %e, active_streams = streams.len(), "connection lost, abort streams");
                streams.shutdown().await;
            }
        }

        result
    }
}

async fn serve_stream(handler: Arc<StreamHandler>, request: Request<RecvStream>, respond: SendResponse<Bytes>) -> StreamResult {
    let request = request.map(H2BodyReader::new);
    handler.handle(request, H2Respond::new(respond)).await
}

fn log_joined(joined: Result<StreamResult, JoinError>) {
    match joined {
        Ok(Ok(context)) => debug!(stream_id = context.id(), written = context.written(), "stream task finished"),
        // already logged by the stream context
        Ok(Err(_)) => {}
        Err(e) if e.is_panic() => error!(cause = %e, "stream task panicked"),
        Err(_) => {}
    }
}
