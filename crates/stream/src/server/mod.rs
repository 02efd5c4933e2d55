//! The TCP server
//!
//! [`Server`] owns the listener and the shared [`StreamHandler`](crate::handler::StreamHandler).
//! Every accepted client runs its own [`H2Connection`](crate::connection::H2Connection)
//! task; connections share no mutable state.

mod config;
mod tcp_server;

pub use config::ServerConfig;
pub use tcp_server::Server;
pub use tcp_server::ServerBuilder;
