use std::collections::BTreeMap;

use gridroom_protocol::{Room, RoomCode};
use serde::{Deserialize, Serialize};

/// The persisted document: every room ever created, keyed by code.
///
/// Rooms are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub rooms: BTreeMap<RoomCode, Room>,
}

impl Snapshot {
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Inserts `room` under `code`, replacing whatever was there.
    pub fn put(&mut self, code: RoomCode, room: Room) {
        self.rooms.insert(code, room);
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Recovers what it can from a document that did not parse as a whole.
    ///
    /// Every room that still decodes on its own is kept; the rest are
    /// logged and dropped. Input that is not even a JSON object of rooms
    /// yields an empty snapshot.
    pub(crate) fn salvage(bytes: &[u8]) -> Self {
        let Ok(loose) = serde_json::from_slice::<LooseDocument>(bytes) else {
            return Self::default();
        };

        let mut snapshot = Self::default();
        for (key, value) in loose.rooms {
            let Some(code) = RoomCode::parse(&key) else {
                tracing::warn!(room = %key, "dropping room with blank code");
                continue;
            };
            match serde_json::from_value::<Room>(value) {
                Ok(room) => snapshot.put(code, room),
                Err(e) => tracing::warn!(room = %code, error = %e, "dropping unreadable room"),
            }
        }
        snapshot
    }
}

/// The document shape with each room left undecoded.
#[derive(Deserialize)]
struct LooseDocument {
    #[serde(default)]
    rooms: BTreeMap<String, serde_json::Value>,
}
