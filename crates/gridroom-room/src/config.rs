//! Coordinator configuration and the per-room phase.

use gridroom_protocol::{CellKey, Room};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CoordinatorConfig
// ---------------------------------------------------------------------------

/// Settings for a [`Coordinator`](crate::Coordinator).
///
/// The defaults reproduce the plain protocol: any cell coordinates are
/// accepted and rejected moves get no reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Side length of a square board. When set, moves with a row or column
    /// outside `0..board_size` are rejected. `None` leaves bounds to the
    /// client.
    pub board_size: Option<u32>,

    /// Send `moveRejected` to a connection whose move was refused.
    /// Never broadcast to the rest of the room.
    pub notify_rejections: bool,
}

impl CoordinatorConfig {
    /// Returns `true` if `cell` is on the configured board (always `true`
    /// without a board size).
    pub fn in_bounds(&self, cell: CellKey) -> bool {
        match self.board_size {
            None => true,
            Some(size) => {
                let size = i64::from(size);
                (0..size).contains(&cell.row) && (0..size).contains(&cell.col)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Whether a room takes moves.
///
/// ```text
/// Active ──(game marked over)──→ Inactive ──(reset)──→ Active
/// ```
///
/// The coordinator itself never ends a game (there is no win or draw
/// detection here), so rooms only become `Inactive` through a stored
/// `isGameActive: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Moves are accepted, turns alternate.
    Active,
    /// Moves are rejected until the room is reset.
    Inactive,
}

impl RoomPhase {
    /// Derives the phase from stored room state.
    pub fn of(room: &Room) -> Self {
        if room.is_game_active {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    /// Returns `true` if moves may be applied.
    pub fn accepts_moves(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Inactive => write!(f, "Inactive"),
        }
    }
}
