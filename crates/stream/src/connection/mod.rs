//! HTTP/2 connection handling
//!
//! One [`H2Connection`] drives one client connection. It performs the HTTP/2
//! handshake, accepts request streams and runs each of them in its own task,
//! so a slow or stalled stream never blocks the others on the same connection.
//!
//! # Components
//!
//! - [`H2Connection`]: the per-connection accept loop. It:
//!   - spawns one [`StreamHandler`](crate::handler::StreamHandler) task per stream
//!   - keeps driving connection I/O while streams are active
//!   - sends GOAWAY on shutdown and lets open streams finish
//!   - aborts every stream task when the connection is lost
//! - [`H2Settings`]: the HTTP/2 settings advertised to clients

mod h2_connection;

pub use h2_connection::H2Connection;
pub use h2_connection::H2Settings;
