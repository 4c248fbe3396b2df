//! The session registry: which connection holds which mark, per room.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a plain struct over `HashMap`s with no interior
//! locking. It is owned by the coordinator actor, which applies events
//! one at a time, so two joins can never race for the same mark.

use std::collections::HashMap;

use gridroom_protocol::{Mark, Role, RoomCode};
use gridroom_transport::ConnectionId;

/// A live connection's claim on a mark in one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub room: RoomCode,
    pub mark: Mark,
}

/// Maps live connections to the marks they hold.
///
/// ## Invariants
///
/// - Within a room, each mark is held by at most one connection.
/// - A connection holds at most one mark, in at most one room.
/// - Spectators are never recorded.
///
/// ```text
/// assign_role() ──→ [X] / [O] / Spectator (unrecorded)
///       │
///       ▼
///   release() ──→ mark is free for the next joiner
/// ```
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Marks held in each room.
    rooms: HashMap<RoomCode, HashMap<ConnectionId, Mark>>,

    /// Reverse index so `release` does not scan every room. Kept in sync
    /// with `rooms`.
    connections: HashMap<ConnectionId, RoomCode>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a role to `conn` in `room`, first-available: `X` if no live
    /// connection holds it, else `O`, else [`Role::Spectator`].
    ///
    /// A connection that already holds a mark in `room` keeps it. One that
    /// holds a mark in a different room gives it up first.
    pub fn assign_role(&mut self, room: &RoomCode, conn: ConnectionId) -> Role {
        if let Some(current) = self.connections.get(&conn) {
            if current == room {
                if let Some(mark) = self.role_of(room, conn) {
                    return Role::from(mark);
                }
            } else {
                self.release(conn);
            }
        }

        let held = self.rooms.get(room);
        let free = [Mark::X, Mark::O].into_iter().find(|mark| {
            held.is_none_or(|holders| !holders.values().any(|m| m == mark))
        });

        let Some(mark) = free else {
            tracing::debug!(%room, %conn, "both marks taken, joining as spectator");
            return Role::Spectator;
        };

        self.rooms.entry(room.clone()).or_default().insert(conn, mark);
        self.connections.insert(conn, room.clone());
        tracing::info!(%room, %conn, %mark, "mark assigned");
        Role::from(mark)
    }

    /// Returns the mark `conn` holds in `room`, if any.
    pub fn role_of(&self, room: &RoomCode, conn: ConnectionId) -> Option<Mark> {
        self.rooms.get(room)?.get(&conn).copied()
    }

    /// Frees whatever mark `conn` holds. No-op if it holds none.
    ///
    /// Rooms left without holders are dropped from the registry; the
    /// durable room itself is unaffected.
    pub fn release(&mut self, conn: ConnectionId) -> Option<SessionEntry> {
        let room = self.connections.remove(&conn)?;
        let holders = self.rooms.get_mut(&room)?;
        let mark = holders.remove(&conn)?;
        if holders.is_empty() {
            self.rooms.remove(&room);
        }
        tracing::info!(%room, %conn, %mark, "mark released");
        Some(SessionEntry { room, mark })
    }

    /// Lists the holders in `room`, `X` first.
    pub fn players(&self, room: &RoomCode) -> Vec<(ConnectionId, Mark)> {
        let mut players: Vec<_> = self
            .rooms
            .get(room)
            .map(|holders| holders.iter().map(|(c, m)| (*c, *m)).collect())
            .unwrap_or_default();
        players.sort_by_key(|(_, mark)| matches!(mark, Mark::O));
        players
    }

    /// Number of connections holding a mark, across all rooms.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connection holds a mark.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn room(raw: &str) -> RoomCode {
        RoomCode::parse(raw).unwrap()
    }

    // =====================================================================
    // assign_role()
    // =====================================================================

    #[test]
    fn test_assign_role_first_three_get_x_o_spectator() {
        let mut reg = SessionRegistry::new();

        assert_eq!(reg.assign_role(&room("abc"), conn(1)), Role::X);
        assert_eq!(reg.assign_role(&room("abc"), conn(2)), Role::O);
        assert_eq!(reg.assign_role(&room("abc"), conn(3)), Role::Spectator);
        assert_eq!(reg.assign_role(&room("abc"), conn(4)), Role::Spectator);
    }

    #[test]
    fn test_assign_role_spectator_is_not_recorded() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));
        reg.assign_role(&room("abc"), conn(2));

        reg.assign_role(&room("abc"), conn(3));

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.role_of(&room("abc"), conn(3)), None);
        assert!(reg.release(conn(3)).is_none());
    }

    #[test]
    fn test_assign_role_rooms_are_independent() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("one"), conn(1));

        assert_eq!(reg.assign_role(&room("two"), conn(2)), Role::X);
    }

    #[test]
    fn test_assign_role_repeat_join_same_room_keeps_mark() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));
        reg.assign_role(&room("abc"), conn(2));

        assert_eq!(reg.assign_role(&room("abc"), conn(2)), Role::O);
        assert_eq!(reg.assign_role(&room("abc"), conn(1)), Role::X);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_assign_role_join_other_room_releases_previous_mark() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("one"), conn(1));

        assert_eq!(reg.assign_role(&room("two"), conn(1)), Role::X);

        assert_eq!(reg.role_of(&room("one"), conn(1)), None);
        assert_eq!(reg.role_of(&room("two"), conn(1)), Some(Mark::X));
        // The vacated X in room one goes to the next joiner.
        assert_eq!(reg.assign_role(&room("one"), conn(2)), Role::X);
    }

    #[test]
    fn test_assign_role_vacated_o_is_reassigned_before_spectating() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));
        reg.assign_role(&room("abc"), conn(2));
        reg.release(conn(2));

        assert_eq!(reg.assign_role(&room("abc"), conn(3)), Role::O);
    }

    #[test]
    fn test_assign_role_vacated_x_is_reassigned_while_o_held() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));
        reg.assign_role(&room("abc"), conn(2));
        reg.release(conn(1));

        assert_eq!(reg.assign_role(&room("abc"), conn(3)), Role::X);
        assert_eq!(reg.assign_role(&room("abc"), conn(4)), Role::Spectator);
    }

    #[test]
    fn test_assign_role_never_duplicates_a_mark() {
        // Churn joins and releases and check uniqueness after every step.
        let mut reg = SessionRegistry::new();
        let code = room("abc");
        for id in 1..=20u64 {
            reg.assign_role(&code, conn(id));
            if id % 3 == 0 {
                reg.release(conn(id - 1));
            }
            let marks: Vec<Mark> = reg.players(&code).into_iter().map(|(_, m)| m).collect();
            let xs = marks.iter().filter(|m| **m == Mark::X).count();
            let os = marks.iter().filter(|m| **m == Mark::O).count();
            assert!(xs <= 1 && os <= 1, "duplicate mark after join {id}: {marks:?}");
        }
    }

    // =====================================================================
    // role_of()
    // =====================================================================

    #[test]
    fn test_role_of_unknown_returns_none() {
        let reg = SessionRegistry::new();
        assert_eq!(reg.role_of(&room("abc"), conn(1)), None);
    }

    #[test]
    fn test_role_of_is_scoped_to_room() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));

        assert_eq!(reg.role_of(&room("abc"), conn(1)), Some(Mark::X));
        assert_eq!(reg.role_of(&room("xyz"), conn(1)), None);
    }

    // =====================================================================
    // release()
    // =====================================================================

    #[test]
    fn test_release_returns_entry_and_clears_lookup() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));

        let entry = reg.release(conn(1));

        assert_eq!(
            entry,
            Some(SessionEntry {
                room: room("abc"),
                mark: Mark::X
            })
        );
        assert_eq!(reg.role_of(&room("abc"), conn(1)), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_release_unknown_connection_is_noop() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));

        assert_eq!(reg.release(conn(99)), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_release_twice_second_is_noop() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));

        assert!(reg.release(conn(1)).is_some());
        assert!(reg.release(conn(1)).is_none());
    }

    #[test]
    fn test_release_leaves_other_holder_in_place() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(1));
        reg.assign_role(&room("abc"), conn(2));

        reg.release(conn(1));

        assert_eq!(reg.players(&room("abc")), vec![(conn(2), Mark::O)]);
    }

    // =====================================================================
    // players() / len()
    // =====================================================================

    #[test]
    fn test_players_lists_x_before_o() {
        let mut reg = SessionRegistry::new();
        reg.assign_role(&room("abc"), conn(5));
        reg.assign_role(&room("abc"), conn(3));

        assert_eq!(
            reg.players(&room("abc")),
            vec![(conn(5), Mark::X), (conn(3), Mark::O)]
        );
        assert!(reg.players(&room("nope")).is_empty());
    }
}
