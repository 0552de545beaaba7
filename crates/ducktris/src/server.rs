//! `DucktrisServer` builder and server loop.
//!
//! This is the entry point for running a Ducktris server. It ties together
//! all the layers: transport → protocol → room registry, with the reaper
//! sweeping the same registry in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use ducktris_protocol::JsonCodec;
use ducktris_reaper::{Reaper, ReaperConfig};
use ducktris_room::{RegistryConfig, RoomRegistry};
use ducktris_transport::{Transport, WebSocketTransport};

use crate::DucktrisError;
use crate::handler::{ServerState, handle_connection};

/// Address the builder binds to unless told otherwise.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";

/// Builder for configuring and starting a Ducktris server.
///
/// # Example
///
/// ```rust,no_run
/// use ducktris::prelude::*;
///
/// # async fn start() -> Result<(), DucktrisError> {
/// let server = DucktrisServer::builder()
///     .bind("0.0.0.0:8888")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct DucktrisServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
    reaper_config: ReaperConfig,
}

impl DucktrisServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            registry_config: RegistryConfig::default(),
            reaper_config: ReaperConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the piece batch size and room channel capacity.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Sets the eviction timeouts and sweep period.
    pub fn reaper_config(mut self, config: ReaperConfig) -> Self {
        self.reaper_config = config;
        self
    }

    /// Binds the listener and builds the server. Nothing is accepted until
    /// [`DucktrisServer::run`] is called.
    pub async fn build(self) -> Result<DucktrisServer, DucktrisError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Arc::new(RoomRegistry::new(self.registry_config)),
            codec: JsonCodec,
        });

        Ok(DucktrisServer {
            transport,
            state,
            reaper_config: self.reaper_config,
        })
    }
}

impl Default for DucktrisServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Ducktris server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DucktrisServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<JsonCodec>>,
    reaper_config: ReaperConfig,
}

impl DucktrisServer {
    /// Creates a new builder.
    pub fn builder() -> DucktrisServerBuilder {
        DucktrisServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, DucktrisError> {
        Ok(self.transport.local_addr()?)
    }

    /// The registry every connection shares.
    pub fn registry(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Starts the reaper under supervision, then runs the accept loop.
    ///
    /// Spawns a handler task per connection. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), DucktrisError> {
        let _reaper = Reaper::new(self.registry(), self.reaper_config).spawn_supervised();
        tracing::info!(addr = %self.local_addr()?, "Ducktris server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
