//! Room coordination for Gridroom.
//!
//! The [`Coordinator`] applies join, move, reset, and disconnect events.
//! It consults the session registry for who may act and the room store
//! for the game state, commits changes, and only then says who to tell.
//! [`spawn_coordinator`] runs it as a single actor task so events are
//! applied one at a time in arrival order.
//!
//! # Key types
//!
//! - [`Coordinator`]: the turn-validation engine
//! - [`CoordinatorHandle`]: send events to the running actor
//! - [`CoordinatorConfig`]: board bounds and rejection notices
//! - [`RoomPhase`]: whether a room accepts moves
//! - [`Rejection`]: why a move was refused

mod actor;
mod config;
mod coordinator;
mod error;
mod rejection;

pub use actor::{ConnectionSender, CoordinatorHandle, RoomPresence, spawn_coordinator};
pub use config::{CoordinatorConfig, RoomPhase};
pub use coordinator::{Coordinator, Delivery};
pub use error::RoomError;
pub use rejection::Rejection;
