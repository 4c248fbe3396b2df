//! Reasons a move is turned down.

/// Why the coordinator refused a move.
///
/// Rejections never change state. They are logged, and reported to the
/// mover only when [`CoordinatorConfig::notify_rejections`] is set; the
/// rest of the room never hears about them.
///
/// [`CoordinatorConfig::notify_rejections`]: crate::CoordinatorConfig::notify_rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The code is blank or names no stored room.
    #[error("room does not exist")]
    UnknownRoom,

    /// The room is inactive until it is reset.
    #[error("game is not active")]
    GameInactive,

    /// The mover is a spectator or never joined this room.
    #[error("you are not a player in this room")]
    NotAPlayer,

    /// The mover's mark does not hold the turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The cell already has a mark.
    #[error("cell is occupied")]
    CellOccupied,

    /// The cell lies outside the configured board.
    #[error("cell is off the board")]
    OutOfBounds,
}
