//! Durable room storage for Gridroom.
//!
//! Room state lives in a single document keyed by room code:
//!
//! ```json
//! { "rooms": { "ABC": { "board": {}, "currentPlayer": "X", "history": [], "isGameActive": true } } }
//! ```
//!
//! The document is loaded and saved wholesale. Callers that modify it
//! must serialize their load-modify-save sequences (the coordinator does
//! this by owning the store inside a single actor task).
//!
//! # Key types
//!
//! - [`RoomStore`]: the load/save contract
//! - [`Snapshot`]: the whole document
//! - [`JsonFileStore`]: a JSON file on disk
//! - [`MemoryStore`]: an in-process document for tests and ephemeral servers

mod error;
mod file;
mod memory;
mod snapshot;

use std::future::Future;
use std::sync::Arc;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;

/// Loads and saves the room document.
///
/// # Contract
///
/// - `load` never fails because the document is missing, unreadable, or
///   malformed. It substitutes a [`Snapshot`] holding whatever rooms still
///   decode (none for a missing document), persists it, and returns it.
///   It fails only if persisting that substitute fails. Backends that
///   keep files move a bad document aside before replacing it.
/// - `save` replaces the whole document. A reader never observes a
///   partially written document. An `Err` means nothing was committed.
pub trait RoomStore: Send + Sync + 'static {
    /// Returns the current document.
    fn load(&self) -> impl Future<Output = Result<Snapshot, StoreError>> + Send;

    /// Replaces the document with `snapshot`.
    fn save(
        &self,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: RoomStore> RoomStore for Arc<S> {
    fn load(&self) -> impl Future<Output = Result<Snapshot, StoreError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).save(snapshot)
    }
}
