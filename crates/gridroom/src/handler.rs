//! Per-connection handler: event decoding and outbound delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound channel with the coordinator
//!   2. Spawn a writer task that encodes and sends outbound events
//!   3. Loop: receive frames → decode `ClientEvent` → forward to coordinator
//!   4. Close the socket; the guard reports the disconnect

use std::sync::Arc;

use gridroom_protocol::{ClientEvent, Codec, ServerEvent};
use gridroom_room::CoordinatorHandle;
use gridroom_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::GridroomError;
use crate::server::ServerState;

/// Drop guard that reports a connection's disconnect when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler returns early or
/// panics. Since `Drop` is synchronous, we spawn a fire-and-forget task.
struct ConnectionGuard {
    conn_id: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            let _ = coordinator.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), GridroomError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, "connection opened");

    // Register the outbound channel and arm the guard together: once the
    // coordinator knows the connection, the disconnect must follow.
    let (tx, rx) = mpsc::unbounded_channel();
    state.coordinator.connect(conn_id, tx).await?;
    let _guard = ConnectionGuard {
        conn_id,
        coordinator: state.coordinator.clone(),
    };

    // The writer ends on its own once the coordinator drops our sender.
    tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), rx));

    let result = read_events(&conn, &state).await;

    if let Err(e) = conn.close().await {
        tracing::trace!(%conn_id, error = %e, "close after read loop");
    }

    // _guard drops here → disconnect fires.
    result
}

/// Forwards decoded client events to the coordinator until the peer goes
/// away.
async fn read_events(
    conn: &WebSocketConnection,
    state: &ServerState,
) -> Result<(), GridroomError> {
    let conn_id = conn.id();
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Ok(());
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "ignoring undecodable frame");
                continue;
            }
        };

        match event {
            ClientEvent::JoinRoom(room_code) => {
                state.coordinator.join(conn_id, room_code).await?;
            }
            ClientEvent::Move(request) => {
                state.coordinator.make_move(conn_id, request).await?;
            }
            ClientEvent::Reset(room_code) => {
                state.coordinator.reset(conn_id, room_code).await?;
            }
        }
    }
}

/// Drains a connection's outbound queue onto the socket.
async fn write_events(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
