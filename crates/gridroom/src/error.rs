//! Unified error type for the Gridroom server.

use gridroom_protocol::ProtocolError;
use gridroom_room::RoomError;
use gridroom_store::StoreError;
use gridroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gridroom` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum GridroomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room document could not be loaded or saved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A room-level error (failed commit, coordinator gone).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
