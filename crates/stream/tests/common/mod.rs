#![allow(dead_code, reason = "every test binary uses a subset of the helpers")]

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use h2::client::{ResponseFuture, SendRequest};
use http::{HeaderMap, Request, StatusCode};
use micro_stream::connection::{H2Connection, H2Settings};
use micro_stream::handler::{StreamHandler, StreamOptions};
use micro_stream::protocol::TransportError;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Served {
    pub client: SendRequest<Bytes>,
    pub client_connection: JoinHandle<()>,
    pub shutdown: CancellationToken,
    pub server: JoinHandle<Result<(), TransportError>>,
}

/// Serves one in-memory connection and returns a client connected to it.
pub async fn serve_duplex(options: StreamOptions) -> Served {
    let (client_io, server_io): (DuplexStream, DuplexStream) = tokio::io::duplex(64 * 1024);
    let shutdown = CancellationToken::new();
    let connection = H2Connection::new(server_io, Arc::new(StreamHandler::new(options)), H2Settings::default());
    let server = tokio::spawn(connection.process(shutdown.clone()));

    let (client, client_connection) = connect(client_io).await;
    Served { client, client_connection, shutdown, server }
}

pub async fn connect<T>(io: T) -> (SendRequest<Bytes>, JoinHandle<()>)
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    // echoed bodies can come back in small frames as well
    let (client, connection) = h2::client::Builder::new()
        .data_frame_budget(H2Settings::default().data_frame_budget)
        .handshake(io)
        .await
        .unwrap();
    let connection = tokio::spawn(async move {
        let _ = connection.await;
    });
    (client, connection)
}

pub fn request(query: &str) -> Request<()> {
    Request::get(format!("http://localhost/http2server-stream?{query}")).body(()).unwrap()
}

pub struct Collected {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub async fn read_response(response: ResponseFuture) -> Result<Collected, h2::Error> {
    let response = response.await?;
    let status = response.status();
    let headers = response.headers().clone();

    let mut body = response.into_body();
    let mut collected = BytesMut::new();
    while let Some(data) = body.data().await {
        let data = data?;
        body.flow_control().release_capacity(data.len())?;
        collected.extend_from_slice(&data);
    }

    Ok(Collected { status, headers, body: collected.freeze() })
}

/// Sends a request without a body.
pub async fn get(client: &SendRequest<Bytes>, query: &str) -> Collected {
    let mut client = client.clone().ready().await.unwrap();
    let (response, _) = client.send_request(request(query), true).unwrap();
    read_response(response).await.unwrap()
}

/// Sends an echo request whose body arrives as the given pieces.
pub async fn echo(client: &SendRequest<Bytes>, pieces: Vec<Bytes>) -> Collected {
    let mut client = client.clone().ready().await.unwrap();
    let (response, mut body) = client.send_request(request("type=ne"), false).unwrap();
    for piece in pieces {
        body.send_data(piece, false).unwrap();
    }
    body.send_data(Bytes::new(), true).unwrap();

    read_response(response).await.unwrap()
}

pub fn split(body: &Bytes, size: usize) -> Vec<Bytes> {
    body.chunks(size).map(Bytes::copy_from_slice).collect()
}

pub fn echo_body() -> Bytes {
    Bytes::from("abcdefgh".repeat(128))
}
