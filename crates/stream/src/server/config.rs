use std::net::{Ipv4Addr, SocketAddr};

use serde::Deserialize;

use crate::connection::H2Settings;
use crate::handler::StreamOptions;

/// Server configuration.
///
/// Every field has a default, so a partial document is a valid configuration:
///
/// ```json
/// { "address": "0.0.0.0:8080", "stream": { "echo_mode": "buffered" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub stream: StreamOptions,
    pub h2: H2Settings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            stream: StreamOptions::default(),
            h2: H2Settings::default(),
        }
    }
}
