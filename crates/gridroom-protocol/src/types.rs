//! Room model and wire events.
//!
//! The same [`Room`] type is persisted by the store and sent to clients
//! as `roomData`, so its JSON shape is part of both contracts:
//!
//! ```json
//! {
//!   "board": { "0-0": "X" },
//!   "currentPlayer": "O",
//!   "history": [{ "r": 0, "c": 0, "player": "X" }],
//!   "isGameActive": true
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// A normalized room code: trimmed and uppercased.
///
/// The only way to build one from user input is [`RoomCode::parse`], so
/// `"abc "` and `"ABC"` always name the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes a raw code. Returns `None` when nothing is left after
    /// trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            None
        } else {
            Some(Self(code))
        }
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Mark / Role
// ---------------------------------------------------------------------------

/// A play role. Only marks can own cells or hold the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The mark that moves after this one.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// The role handed out on join: one of the two marks, or a spectator
/// with no move rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    X,
    O,
    Spectator,
}

impl From<Mark> for Role {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Self::X,
            Mark::O => Self::O,
        }
    }
}

// ---------------------------------------------------------------------------
// CellKey
// ---------------------------------------------------------------------------

/// A board cell, exactly as the client addressed it.
///
/// No bounds are implied: the coordinator checks a board size only when
/// one is configured. Serialized as `"{row}-{col}"`, which is also the
/// key format of the persisted board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: i64,
    pub col: i64,
}

impl CellKey {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

impl FromStr for CellKey {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidMessage(format!("bad cell key {s:?}"));
        // Skip the first byte so a leading minus sign is not the separator.
        let split = s
            .get(1..)
            .and_then(|rest| rest.find('-'))
            .map(|i| i + 1)
            .ok_or_else(invalid)?;
        let row = s[..split].parse().map_err(|_| invalid())?;
        let col = s[split + 1..].parse().map_err(|_| invalid())?;
        Ok(Self { row, col })
    }
}

impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One applied move, kept for audit and replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub r: i64,
    pub c: i64,
    pub player: Mark,
}

/// The durable state of one room.
///
/// Every field has a default so documents written by older servers (or
/// with fields missing) still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    /// Occupied cells only. A key is never overwritten once set.
    pub board: BTreeMap<CellKey, Mark>,
    /// Whose turn it is.
    pub current_player: Mark,
    /// Applied moves in order; its length equals the number of occupied cells.
    pub history: Vec<MoveRecord>,
    /// Moves are rejected while this is `false`.
    pub is_game_active: bool,
}

impl Room {
    /// A fresh room: empty board, `X` to move, active.
    pub fn new() -> Self {
        Self {
            board: BTreeMap::new(),
            current_player: Mark::X,
            history: Vec::new(),
            is_game_active: true,
        }
    }

    /// Returns the mark occupying `cell`, if any.
    pub fn occupant(&self, cell: CellKey) -> Option<Mark> {
        self.board.get(&cell).copied()
    }

    /// Places `mark` on `cell`, records it, and passes the turn.
    ///
    /// Callers validate first; this only debug-asserts the cell is free.
    pub fn apply_move(&mut self, cell: CellKey, mark: Mark) {
        debug_assert!(!self.board.contains_key(&cell), "cell {cell} already occupied");
        self.board.insert(cell, mark);
        self.history.push(MoveRecord {
            r: cell.row,
            c: cell.col,
            player: mark,
        });
        self.current_player = mark.other();
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Wire events
// ---------------------------------------------------------------------------

/// Payload of a `move` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Room code as the client sent it; normalized before lookup.
    pub room_code: String,
    pub r: i64,
    pub c: i64,
}

impl MoveRequest {
    pub fn cell(&self) -> CellKey {
        CellKey::new(self.r, self.c)
    }
}

/// Events a client sends.
///
/// Each frame is `{"event": NAME, "data": PAYLOAD}`. Disconnect is not an
/// event: the transport reports it when the socket closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join (creating if needed) the room with this raw code.
    JoinRoom(String),
    /// Place the sender's mark.
    Move(MoveRequest),
    /// Start the room over with a fresh board.
    Reset(String),
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Unicast to a joining connection.
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_code: RoomCode,
        role: Role,
        room_data: Room,
    },

    /// Broadcast to the room after a committed move.
    #[serde(rename_all = "camelCase")]
    UpdateMove {
        r: i64,
        c: i64,
        player: Mark,
        next_turn: Mark,
    },

    /// Broadcast to the room after a committed reset. No payload.
    GameReset,

    /// Unicast to the mover when rejection notices are enabled.
    MoveRejected { reason: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =====================================================================
    // RoomCode
    // =====================================================================

    #[test]
    fn test_room_code_parse_trims_and_uppercases() {
        let code = RoomCode::parse("  abc ").unwrap();
        assert_eq!(code.as_str(), "ABC");
        assert_eq!(code, RoomCode::parse("ABC").unwrap());
    }

    #[test]
    fn test_room_code_parse_blank_returns_none() {
        assert!(RoomCode::parse("").is_none());
        assert!(RoomCode::parse(" \t\n").is_none());
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let code = RoomCode::parse("xy1").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"XY1\"");
    }

    // =====================================================================
    // Mark / Role
    // =====================================================================

    #[test]
    fn test_mark_other_alternates() {
        assert_eq!(Mark::X.other(), Mark::O);
        assert_eq!(Mark::O.other(), Mark::X);
    }

    #[test]
    fn test_role_from_mark() {
        assert_eq!(Role::from(Mark::X), Role::X);
        assert_eq!(Role::from(Mark::O), Role::O);
    }

    #[test]
    fn test_role_serializes_as_name() {
        assert_eq!(serde_json::to_value(Role::Spectator).unwrap(), "Spectator");
        assert_eq!(serde_json::to_value(Role::X).unwrap(), "X");
    }

    // =====================================================================
    // CellKey
    // =====================================================================

    #[test]
    fn test_cell_key_display_uses_dash() {
        assert_eq!(CellKey::new(3, 14).to_string(), "3-14");
    }

    #[test]
    fn test_cell_key_parse_handles_negative_coordinates() {
        assert_eq!("-1-2".parse::<CellKey>().unwrap(), CellKey::new(-1, 2));
        assert_eq!("4--7".parse::<CellKey>().unwrap(), CellKey::new(4, -7));
    }

    #[test]
    fn test_cell_key_parse_rejects_garbage() {
        assert!("".parse::<CellKey>().is_err());
        assert!("12".parse::<CellKey>().is_err());
        assert!("a-b".parse::<CellKey>().is_err());
        assert!("1-".parse::<CellKey>().is_err());
    }

    // =====================================================================
    // Room
    // =====================================================================

    #[test]
    fn test_room_new_is_default_state() {
        let room = Room::new();
        assert!(room.board.is_empty());
        assert_eq!(room.current_player, Mark::X);
        assert!(room.history.is_empty());
        assert!(room.is_game_active);
    }

    #[test]
    fn test_room_apply_move_sets_cell_and_flips_turn() {
        let mut room = Room::new();
        room.apply_move(CellKey::new(0, 0), Mark::X);

        assert_eq!(room.occupant(CellKey::new(0, 0)), Some(Mark::X));
        assert_eq!(room.current_player, Mark::O);
        assert_eq!(
            room.history,
            vec![MoveRecord { r: 0, c: 0, player: Mark::X }]
        );
    }

    #[test]
    fn test_room_json_shape_matches_stored_document() {
        let mut room = Room::new();
        room.apply_move(CellKey::new(0, 0), Mark::X);

        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(
            value,
            json!({
                "board": { "0-0": "X" },
                "currentPlayer": "O",
                "history": [{ "r": 0, "c": 0, "player": "X" }],
                "isGameActive": true
            })
        );
    }

    #[test]
    fn test_room_missing_fields_take_defaults() {
        let room: Room = serde_json::from_str(r#"{"board":{"1-1":"O"}}"#).unwrap();
        assert_eq!(room.occupant(CellKey::new(1, 1)), Some(Mark::O));
        assert_eq!(room.current_player, Mark::X);
        assert!(room.is_game_active);
    }

    #[test]
    fn test_room_rejects_spectator_as_current_player() {
        let result: Result<Room, _> =
            serde_json::from_str(r#"{"currentPlayer":"Spectator"}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // ClientEvent
    // =====================================================================

    #[test]
    fn test_client_event_join_room_from_json() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"joinRoom","data":"abc "}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom("abc ".into()));
    }

    #[test]
    fn test_client_event_move_from_json() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"move","data":{"roomCode":"ABC","r":2,"c":5}}"#,
        )
        .unwrap();
        match event {
            ClientEvent::Move(req) => {
                assert_eq!(req.room_code, "ABC");
                assert_eq!(req.cell(), CellKey::new(2, 5));
            }
            other => panic!("expected Move, got {other:?}"),
        }
    }

    #[test]
    fn test_client_event_reset_from_json() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"reset","data":"ABC"}"#).unwrap();
        assert_eq!(event, ClientEvent::Reset("ABC".into()));
    }

    #[test]
    fn test_client_event_unknown_name_is_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"chat","data":"hi"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_event_move_with_fractional_cell_is_error() {
        let result: Result<ClientEvent, _> = serde_json::from_str(
            r#"{"event":"move","data":{"roomCode":"A","r":0.5,"c":0}}"#,
        );
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_server_event_room_joined_json_format() {
        let event = ServerEvent::RoomJoined {
            room_code: RoomCode::parse("abc").unwrap(),
            role: Role::X,
            room_data: Room::new(),
        };
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event"], "roomJoined");
        assert_eq!(value["data"]["roomCode"], "ABC");
        assert_eq!(value["data"]["role"], "X");
        assert_eq!(value["data"]["roomData"]["currentPlayer"], "X");
        assert_eq!(value["data"]["roomData"]["board"], json!({}));
    }

    #[test]
    fn test_server_event_update_move_json_format() {
        let event = ServerEvent::UpdateMove {
            r: 1,
            c: 1,
            player: Mark::O,
            next_turn: Mark::X,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "updateMove",
                "data": { "r": 1, "c": 1, "player": "O", "nextTurn": "X" }
            })
        );
    }

    #[test]
    fn test_server_event_game_reset_has_no_payload() {
        assert_eq!(
            serde_json::to_value(&ServerEvent::GameReset).unwrap(),
            json!({ "event": "gameReset" })
        );
    }

    #[test]
    fn test_server_event_move_rejected_json_format() {
        let event = ServerEvent::MoveRejected {
            reason: "not your turn".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "moveRejected");
        assert_eq!(value["data"]["reason"], "not your turn");
    }
}
