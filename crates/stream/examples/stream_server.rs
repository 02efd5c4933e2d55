//! Runs the streaming endpoint.
//!
//! ```text
//! cargo run --example stream_server -- 127.0.0.1:8080
//! curl --http2-prior-knowledge 'http://127.0.0.1:8080/stream?type=eq&body_part=part&count=100'
//! curl --http2-prior-knowledge --data-binary @file 'http://127.0.0.1:8080/stream?type=ne'
//! ```

use micro_stream::handler::{EchoMode, StreamOptions};
use micro_stream::server::{Server, ServerConfig};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let echo_mode = match args.next().as_deref() {
        Some("buffered") => EchoMode::Buffered,
        _ => EchoMode::Relay,
    };

    let config = ServerConfig { stream: StreamOptions { echo_mode, ..StreamOptions::default() }, ..ServerConfig::default() };
    info!(%address, ?echo_mode, "starting stream server");

    let server = match Server::builder().config(config).address(address.as_str()).bind().await {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    server.start().await;
}
