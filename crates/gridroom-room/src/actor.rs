//! Coordinator actor: a single Tokio task that owns the [`Coordinator`].
//!
//! Connection handlers never touch the coordinator directly. They send
//! commands through a [`CoordinatorHandle`], and the actor applies them
//! one at a time in arrival order. That single worker is what makes each
//! load-validate-mutate-save-broadcast sequence atomic with respect to
//! every other event, without any locks around the store or registry.

use std::collections::HashMap;

use gridroom_protocol::{Mark, MoveRequest, RoomCode, ServerEvent};
use gridroom_store::RoomStore;
use gridroom_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{Coordinator, Delivery, RoomError};

/// Channel sender for delivering outbound events to one connection.
pub type ConnectionSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the coordinator actor.
///
/// Only `Inspect` carries a reply channel; everything else is
/// fire-and-forget, and its outcome arrives as outbound events.
pub(crate) enum Command {
    /// Register where a connection's outbound events go.
    Connect {
        conn: ConnectionId,
        sender: ConnectionSender,
    },

    Join {
        conn: ConnectionId,
        room_code: String,
    },

    Move {
        conn: ConnectionId,
        request: MoveRequest,
    },

    Reset {
        conn: ConnectionId,
        room_code: String,
    },

    Disconnect {
        conn: ConnectionId,
    },

    /// Report who is in a room.
    Inspect {
        room_code: RoomCode,
        reply: oneshot::Sender<RoomPresence>,
    },

    Shutdown,
}

/// Who is currently attached to a room (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPresence {
    pub room_code: RoomCode,
    /// Mark holders, `X` first.
    pub players: Vec<(ConnectionId, Mark)>,
    /// Every connection receiving the room's broadcasts, spectators included.
    pub watchers: Vec<ConnectionId>,
}

/// Handle to the running coordinator actor.
///
/// Cheap to clone; every connection handler holds one.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Registers the outbound channel for a newly accepted connection.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<(), RoomError> {
        self.send(Command::Connect { conn, sender }).await
    }

    /// Forwards a `joinRoom` event.
    pub async fn join(&self, conn: ConnectionId, room_code: String) -> Result<(), RoomError> {
        self.send(Command::Join { conn, room_code }).await
    }

    /// Forwards a `move` event.
    pub async fn make_move(
        &self,
        conn: ConnectionId,
        request: MoveRequest,
    ) -> Result<(), RoomError> {
        self.send(Command::Move { conn, request }).await
    }

    /// Forwards a `reset` event.
    pub async fn reset(&self, conn: ConnectionId, room_code: String) -> Result<(), RoomError> {
        self.send(Command::Reset { conn, room_code }).await
    }

    /// Reports that a connection closed.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(Command::Disconnect { conn }).await
    }

    /// Asks who is attached to `room_code`.
    ///
    /// The reply reflects every command sent before this one.
    pub async fn presence(&self, room_code: RoomCode) -> Result<RoomPresence, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Inspect {
            room_code,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Stops the actor after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

/// The actor state. Runs inside a Tokio task.
struct CoordinatorActor<S: RoomStore> {
    coordinator: Coordinator<S>,
    /// Per-connection outbound channels.
    senders: HashMap<ConnectionId, ConnectionSender>,
    receiver: mpsc::Receiver<Command>,
}

impl<S: RoomStore> CoordinatorActor<S> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!("coordinator started");

        while let Some(command) = self.receiver.recv().await {
            match command {
                Command::Connect { conn, sender } => {
                    self.senders.insert(conn, sender);
                }
                Command::Join { conn, room_code } => {
                    let result = self.coordinator.join(conn, &room_code).await;
                    self.settle(conn, "join", result);
                }
                Command::Move { conn, request } => {
                    let result = self.coordinator.make_move(conn, request).await;
                    self.settle(conn, "move", result);
                }
                Command::Reset { conn, room_code } => {
                    let result = self.coordinator.reset(conn, &room_code).await;
                    self.settle(conn, "reset", result);
                }
                Command::Disconnect { conn } => {
                    self.coordinator.disconnect(conn);
                    self.senders.remove(&conn);
                }
                Command::Inspect { room_code, reply } => {
                    let presence = RoomPresence {
                        players: self.coordinator.sessions().players(&room_code),
                        watchers: self.coordinator.watchers(&room_code),
                        room_code,
                    };
                    let _ = reply.send(presence);
                }
                Command::Shutdown => {
                    tracing::info!("coordinator shutting down");
                    break;
                }
            }
        }

        tracing::info!("coordinator stopped");
    }

    /// Dispatches a committed outcome, or logs a failed one. A failed
    /// operation sends nothing to anyone.
    fn settle(
        &self,
        conn: ConnectionId,
        operation: &'static str,
        result: Result<Vec<Delivery>, RoomError>,
    ) {
        match result {
            Ok(deliveries) => self.dispatch(deliveries),
            Err(e) => {
                tracing::error!(%conn, operation, error = %e, "operation not committed");
            }
        }
    }

    /// Sends each delivery to its connection. Silently drops deliveries
    /// for connections that are already gone.
    fn dispatch(&self, deliveries: Vec<Delivery>) {
        for (conn, event) in deliveries {
            if let Some(sender) = self.senders.get(&conn) {
                let _ = sender.send(event);
            }
        }
    }
}

/// Spawns the coordinator actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_coordinator<S: RoomStore>(
    coordinator: Coordinator<S>,
    channel_size: usize,
) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = CoordinatorActor {
        coordinator,
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    CoordinatorHandle { sender: tx }
}
