//! The room coordinator: join, move, reset, and disconnect.
//!
//! Every operation follows the same sequence:
//!
//! ```text
//! load document → authorize (registry) → validate (room) → mutate
//!     → save document → deliveries
//! ```
//!
//! Deliveries are produced only after the save returned `Ok`, so no client
//! ever sees state that was not durably committed. A failed save returns
//! [`RoomError::Store`] and an empty outcome.

use std::collections::{BTreeSet, HashMap};

use gridroom_protocol::{CellKey, Mark, MoveRequest, Room, RoomCode, ServerEvent};
use gridroom_session::{SessionEntry, SessionRegistry};
use gridroom_store::RoomStore;
use gridroom_transport::ConnectionId;

use crate::{CoordinatorConfig, Rejection, RoomError, RoomPhase};

/// An outbound event addressed to one connection.
pub type Delivery = (ConnectionId, ServerEvent);

/// Applies room events against the store and the session registry.
///
/// The coordinator is not synchronized. Run it inside one task (see
/// [`spawn_coordinator`](crate::spawn_coordinator)) so each
/// load-mutate-save sequence finishes before the next event starts.
pub struct Coordinator<S: RoomStore> {
    store: S,
    sessions: SessionRegistry,

    /// Connections receiving each room's broadcasts, spectators included.
    watchers: HashMap<RoomCode, BTreeSet<ConnectionId>>,

    /// The room each connection watches. A connection watches one room
    /// at a time.
    watching: HashMap<ConnectionId, RoomCode>,

    config: CoordinatorConfig,
}

impl<S: RoomStore> Coordinator<S> {
    /// Creates a coordinator over an injected store and registry.
    pub fn new(store: S, sessions: SessionRegistry, config: CoordinatorConfig) -> Self {
        Self {
            store,
            sessions,
            watchers: HashMap::new(),
            watching: HashMap::new(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Connections that receive broadcasts for `room`, in id order.
    pub fn watchers(&self, room: &RoomCode) -> Vec<ConnectionId> {
        self.watchers
            .get(room)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Joins `conn` to the room named by `raw_code`, creating the room if
    /// the store does not have it yet.
    ///
    /// A blank code is ignored. Otherwise the joiner, and only the joiner,
    /// receives `roomJoined` with its role and the current room state.
    pub async fn join(
        &mut self,
        conn: ConnectionId,
        raw_code: &str,
    ) -> Result<Vec<Delivery>, RoomError> {
        let Some(code) = RoomCode::parse(raw_code) else {
            tracing::debug!(%conn, "join with blank room code ignored");
            return Ok(Vec::new());
        };

        let mut snapshot = self.store.load().await?;
        let room = match snapshot.room(&code) {
            Some(room) => room.clone(),
            None => {
                let room = Room::new();
                snapshot.put(code.clone(), room.clone());
                self.store.save(&snapshot).await?;
                tracing::info!(room = %code, "room created");
                room
            }
        };

        let role = self.sessions.assign_role(&code, conn);
        self.watch(conn, &code);
        tracing::info!(room = %code, %conn, ?role, "connection joined room");

        Ok(vec![(
            conn,
            ServerEvent::RoomJoined {
                room_code: code,
                role,
                room_data: room,
            },
        )])
    }

    /// Places the mover's mark on the requested cell.
    ///
    /// Refused moves change nothing and are not broadcast (see
    /// [`Rejection`]). An applied move is saved, then `updateMove` goes to
    /// every watcher of the room, mover included.
    pub async fn make_move(
        &mut self,
        conn: ConnectionId,
        request: MoveRequest,
    ) -> Result<Vec<Delivery>, RoomError> {
        let cell = request.cell();
        let Some(code) = RoomCode::parse(&request.room_code) else {
            return Ok(self.reject(conn, &request.room_code, cell, Rejection::UnknownRoom));
        };

        let mut snapshot = self.store.load().await?;
        let Some(room) = snapshot.room_mut(&code) else {
            return Ok(self.reject(conn, code.as_str(), cell, Rejection::UnknownRoom));
        };

        let mark = match self.check_move(&code, room, conn, cell) {
            Ok(mark) => mark,
            Err(rejection) => return Ok(self.reject(conn, code.as_str(), cell, rejection)),
        };

        room.apply_move(cell, mark);
        let next_turn = room.current_player;
        self.store.save(&snapshot).await?;

        tracing::debug!(room = %code, %conn, %cell, %mark, %next_turn, "move applied");
        Ok(self.broadcast(
            &code,
            ServerEvent::UpdateMove {
                r: cell.row,
                c: cell.col,
                player: mark,
                next_turn,
            },
        ))
    }

    /// Starts the room over: empty board, `X` to move, active.
    ///
    /// Unknown rooms are ignored. Marks stay with the connections holding
    /// them. Anyone may reset, whether or not they joined the room.
    pub async fn reset(
        &mut self,
        conn: ConnectionId,
        raw_code: &str,
    ) -> Result<Vec<Delivery>, RoomError> {
        let Some(code) = RoomCode::parse(raw_code) else {
            return Ok(Vec::new());
        };

        let mut snapshot = self.store.load().await?;
        if snapshot.room(&code).is_none() {
            tracing::debug!(room = %code, %conn, "reset of unknown room ignored");
            return Ok(Vec::new());
        }

        snapshot.put(code.clone(), Room::new());
        self.store.save(&snapshot).await?;

        tracing::info!(room = %code, %conn, "game reset");
        Ok(self.broadcast(&code, ServerEvent::GameReset))
    }

    /// Forgets a closed connection: frees its mark and stops its
    /// broadcasts. Nothing is sent and the stored room is untouched.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Option<SessionEntry> {
        self.unwatch(conn);
        let released = self.sessions.release(conn);
        tracing::debug!(%conn, released = released.is_some(), "connection removed");
        released
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Decides whether `conn` may put its mark on `cell` in `room`.
    fn check_move(
        &self,
        code: &RoomCode,
        room: &Room,
        conn: ConnectionId,
        cell: CellKey,
    ) -> Result<Mark, Rejection> {
        if !RoomPhase::of(room).accepts_moves() {
            return Err(Rejection::GameInactive);
        }
        let mark = self.sessions.role_of(code, conn).ok_or(Rejection::NotAPlayer)?;
        if room.current_player != mark {
            return Err(Rejection::NotYourTurn);
        }
        if !self.config.in_bounds(cell) {
            return Err(Rejection::OutOfBounds);
        }
        if room.occupant(cell).is_some() {
            return Err(Rejection::CellOccupied);
        }
        Ok(mark)
    }

    fn reject(
        &self,
        conn: ConnectionId,
        room: &str,
        cell: CellKey,
        rejection: Rejection,
    ) -> Vec<Delivery> {
        tracing::debug!(room, %conn, %cell, reason = %rejection, "move rejected");
        if self.config.notify_rejections {
            vec![(
                conn,
                ServerEvent::MoveRejected {
                    reason: rejection.to_string(),
                },
            )]
        } else {
            Vec::new()
        }
    }

    fn broadcast(&self, code: &RoomCode, event: ServerEvent) -> Vec<Delivery> {
        self.watchers(code)
            .into_iter()
            .map(|conn| (conn, event.clone()))
            .collect()
    }

    fn watch(&mut self, conn: ConnectionId, code: &RoomCode) {
        if self.watching.get(&conn) == Some(code) {
            return;
        }
        self.unwatch(conn);
        self.watchers.entry(code.clone()).or_default().insert(conn);
        self.watching.insert(conn, code.clone());
    }

    fn unwatch(&mut self, conn: ConnectionId) {
        let Some(code) = self.watching.remove(&conn) else {
            return;
        };
        if let Some(set) = self.watchers.get_mut(&code) {
            set.remove(&conn);
            if set.is_empty() {
                self.watchers.remove(&code);
            }
        }
    }
}
