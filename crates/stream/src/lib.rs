//! An asynchronous HTTP/2 body streaming server
//!
//! This crate serves a single streaming endpoint over HTTP/2. Each request
//! stream selects one of two modes through its query string:
//!
//! - **generate** (`type=eq&body_part=X&count=N`): responds with `X` repeated `N` times,
//!   produced chunk by chunk without ever materializing the whole body
//! - **echo** (`type=ne`): streams the request body back, forwarding every chunk
//!   as soon as it arrived
//!
//! Streams multiplexed on one connection are handled concurrently and
//! independently. Backpressure follows the HTTP/2 flow-control windows: a
//! handler suspends while the peer can't take more bytes, and echo never
//! reads more of the request than the stream window allows.
//!
//! # Example
//!
//! ```no_run
//! use micro_stream::server::Server;
//! use tracing::{Level, error};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let server = match Server::builder().address("127.0.0.1:8080").bind().await {
//!         Ok(server) => server,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     server.start().await;
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: parameters, body chunks, the body producers and the error types
//! - [`transport`]: what a stream needs from HTTP/2, implemented over `h2` and in memory
//! - [`handler`]: the per-stream state machine
//! - [`connection`]: one task per connection, one task per stream
//! - [`server`]: the listener, its configuration and graceful shutdown
//!
//! # Limitations
//!
//! - HTTP/2 over cleartext TCP only (use a reverse proxy for TLS)
//! - No routing: every path serves the same endpoint

pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod transport;

mod utils;
pub(crate) use utils::ensure;
