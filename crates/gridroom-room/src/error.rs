//! Error types for the room layer.

use gridroom_store::StoreError;

/// Errors that can occur during room operations.
///
/// Rejected moves are not errors: they are [`Rejection`](crate::Rejection)s
/// and leave the room untouched. An error means an operation could not be
/// committed, so nothing about it was broadcast.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Loading or saving the room document failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The coordinator task is gone or its command channel is closed.
    #[error("coordinator is unavailable")]
    Unavailable,
}
