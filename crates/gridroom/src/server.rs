//! `GridroomServer` builder and server loop.
//!
//! This is the entry point for running a Gridroom server. It ties
//! together all the layers: transport → protocol → coordinator → store.

use std::sync::Arc;
use std::time::Duration;

use gridroom_protocol::JsonCodec;
use gridroom_room::{Coordinator, CoordinatorConfig, CoordinatorHandle, spawn_coordinator};
use gridroom_session::SessionRegistry;
use gridroom_store::RoomStore;
use gridroom_transport::{Pending, Transport, WebSocketTransport};

use crate::GridroomError;
use crate::handler::handle_connection;

/// Default bound on the coordinator's command queue.
pub const DEFAULT_CHANNEL_SIZE: usize = 1024;

/// Default time a peer gets to complete the WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. All room
/// state sits behind the coordinator actor, so nothing here needs a lock.
pub(crate) struct ServerState {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Gridroom server.
///
/// # Example
///
/// ```rust,no_run
/// use gridroom::prelude::*;
///
/// # async fn start() -> Result<(), GridroomError> {
/// let server = GridroomServer::builder()
///     .bind("0.0.0.0:3000")
///     .build(JsonFileStore::new("db.json"))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GridroomServerBuilder {
    bind_addr: String,
    coordinator_config: CoordinatorConfig,
    channel_size: usize,
    handshake_timeout: Duration,
}

impl GridroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            coordinator_config: CoordinatorConfig::default(),
            channel_size: DEFAULT_CHANNEL_SIZE,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the board bounds and rejection notices.
    pub fn coordinator_config(mut self, config: CoordinatorConfig) -> Self {
        self.coordinator_config = config;
        self
    }

    /// Sets the bound on the coordinator's command queue.
    pub fn channel_size(mut self, size: usize) -> Self {
        self.channel_size = size.max(1);
        self
    }

    /// Sets how long a peer may take to complete the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener and starts the coordinator over `store`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self, store: impl RoomStore) -> Result<GridroomServer, GridroomError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let coordinator = Coordinator::new(store, SessionRegistry::new(), self.coordinator_config);
        let handle = spawn_coordinator(coordinator, self.channel_size);

        let state = Arc::new(ServerState {
            coordinator: handle,
            codec: JsonCodec,
        });

        Ok(GridroomServer {
            transport,
            state,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

impl Default for GridroomServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gridroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GridroomServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    handshake_timeout: Duration,
}

impl GridroomServer {
    /// Creates a new builder.
    pub fn builder() -> GridroomServerBuilder {
        GridroomServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the coordinator, e.g. to query room presence.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.state.coordinator.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming peers and spawns a task for each that completes
    /// the WebSocket handshake and then runs the handler. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), GridroomError> {
        match self.transport.local_addr() {
            Ok(addr) => tracing::info!(%addr, "Gridroom server running"),
            Err(_) => tracing::info!("Gridroom server running"),
        }

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    let timeout = self.handshake_timeout;
                    tokio::spawn(async move {
                        let (id, addr) = (pending.id(), pending.peer_addr());
                        let conn = match pending.handshake(timeout).await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(%id, %addr, error = %e, "handshake failed");
                                return;
                            }
                        };
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
