//! Session registry for Gridroom.
//!
//! Tracks which live connection holds each play mark in each room. The
//! registry is purely in memory and lives as long as the process: after
//! a restart rooms come back from the store, but every mark is free again
//! and goes to whoever joins first.
//!
//! ```text
//! Coordinator (above)  ← asks "who may move here?"
//!     ↕
//! Session Registry (this crate)  ← connection → (room, mark)
//!     ↕
//! Protocol / Transport (below)  ← RoomCode, Mark, ConnectionId
//! ```

mod registry;

pub use registry::{SessionEntry, SessionRegistry};
