//! Room model and wire protocol for Gridroom.
//!
//! - **Model** ([`Room`], [`RoomCode`], [`Mark`], [`Role`], [`CellKey`]):
//!   the state a room persists and sends to clients.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): what travels over a
//!   connection.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (events) → Coordinator (rooms)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    CellKey, ClientEvent, Mark, MoveRecord, MoveRequest, Role, Room, RoomCode,
    ServerEvent,
};
