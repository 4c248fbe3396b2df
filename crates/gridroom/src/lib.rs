//! # Gridroom
//!
//! WebSocket room server for turn-based grid games.
//!
//! Clients join rooms by code. The first two connections in a room get
//! the marks `X` and `O`, everyone after that spectates. The server
//! checks every move against whose turn it is and which cells are taken,
//! persists the room, and only then broadcasts the move to the room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridroom::prelude::*;
//!
//! # async fn start() -> Result<(), GridroomError> {
//! let config = ServerConfig::from_env()?;
//! let server = GridroomServer::builder()
//!     .bind(&config.bind_addr)
//!     .coordinator_config(config.coordinator_config())
//!     .build(JsonFileStore::new(&config.db_path))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod logging;
mod server;

pub use config::ServerConfig;
pub use error::GridroomError;
pub use logging::init_logging;
pub use server::{
    DEFAULT_CHANNEL_SIZE, DEFAULT_HANDSHAKE_TIMEOUT, GridroomServer, GridroomServerBuilder,
};

/// Re-exports everything needed to run or embed a server.
pub mod prelude {
    pub use crate::{GridroomError, GridroomServer, GridroomServerBuilder, ServerConfig, init_logging};
    pub use gridroom_protocol::{
        CellKey, ClientEvent, Codec, JsonCodec, Mark, MoveRecord, MoveRequest, ProtocolError, Role,
        Room, RoomCode, ServerEvent,
    };
    pub use gridroom_room::{
        Coordinator, CoordinatorConfig, CoordinatorHandle, Rejection, RoomError, RoomPresence,
    };
    pub use gridroom_session::SessionRegistry;
    pub use gridroom_store::{JsonFileStore, MemoryStore, RoomStore, Snapshot, StoreError};
    pub use gridroom_transport::{ConnectionId, TransportError};
}
