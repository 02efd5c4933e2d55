use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::select;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::connection::{H2Connection, H2Settings};
use crate::handler::{StreamHandler, StreamOptions};
use crate::protocol::ServerError;
use crate::server::ServerConfig;

#[derive(Debug)]
pub struct ServerBuilder {
    address: Option<Vec<SocketAddr>>,
    config: ServerConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { address: None, config: ServerConfig::default() }
    }

    /// Overrides the configured address.
    ///
    /// Addresses that don't resolve leave the builder without an address and
    /// [`bind`](Self::bind) fails with [`ServerError::MissingAddress`].
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        let resolved = match address.to_socket_addrs() {
            Ok(addresses) => addresses.collect(),
            Err(e) => {
                warn!(cause = %e, "can't resolve server address");
                Vec::new()
            }
        };
        self.address = Some(resolved);
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn stream_options(mut self, options: StreamOptions) -> Self {
        self.config.stream = options;
        self
    }

    pub fn h2_settings(mut self, settings: H2Settings) -> Self {
        self.config.h2 = settings;
        self
    }

    pub async fn bind(self) -> Result<Server, ServerError> {
        let addresses = self.address.unwrap_or_else(|| vec![self.config.address]);
        let Some(&first) = addresses.first() else {
            return Err(ServerError::MissingAddress);
        };

        let listener =
            TcpListener::bind(addresses.as_slice()).await.map_err(|source| ServerError::Bind { address: first, source })?;

        Ok(Server { listener, handler: Arc::new(StreamHandler::new(self.config.stream)), settings: self.config.h2 })
    }
}

/// A bound body streaming server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    handler: Arc<StreamHandler>,
    settings: H2Settings,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        Self::builder().config(config).bind().await
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(|source| ServerError::LocalAddr { source })
    }

    /// Accepts connections until `shutdown` is cancelled.
    ///
    /// On shutdown the listener stops accepting, every open connection sends
    /// GOAWAY, and this returns once all of them have drained.
    pub async fn serve(self, shutdown: CancellationToken) {
        match self.local_addr() {
            Ok(address) => info!(%address, "start listening"),
            Err(e) => warn!(cause = %e, "start listening at unknown address"),
        }

        let mut connections = JoinSet::new();
        loop {
            select! {
                accepted = self.listener.accept() => {
                    let (tcp_stream, peer) = match accepted {
                        Ok(stream_and_addr) => stream_and_addr,
                        Err(e) => {
                            warn!(cause = %e, "failed to accept");
                            continue;
                        }
                    };

                    let connection = H2Connection::new(tcp_stream, Arc::clone(&self.handler), self.settings);
                    let shutdown = shutdown.child_token();
                    let span = info_span!("connection", %peer);
                    connections.spawn(
                        async move {
                            match connection.process(shutdown).await {
                                Ok(()) => info!("finished process, connection shutdown"),
                                Err(e) => error!(cause = %e, "connection failed, connection shutdown"),
                            }
                        }
                        .instrument(span),
                    );
                }

                () = shutdown.cancelled() => break,

                Some(joined) = connections.join_next() => {
                    if let Err(e) = joined {
                        error!(cause = %e, "connection task failed");
                    }
                }
            }
        }

        info!(connections = connections.len(), "stop accepting, draining connections");
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                error!(cause = %e, "connection task failed");
            }
        }
        info!("server stopped");
    }

    /// Serves until ctrl-c.
    pub async fn start(self) {
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("ctrl-c received");
                    signal.cancel();
                }
                Err(e) => warn!(cause = %e, "can't listen for ctrl-c"),
            }
        });

        self.serve(shutdown).await;
    }
}
