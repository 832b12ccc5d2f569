//! Fanout helpers: session, room, and server-wide message delivery.
//!
//! All delivery goes through the per-connection unbounded queues, so
//! nothing here blocks on a slow peer. A send to a gone connection is
//! silently dropped; the reader's cleanup path handles the rest.

use std::sync::Arc;

use cardforge_protocol::{RoomEvent, RoomId, ServerMessage, SessionEvent};
use cardforge_transport::ConnectionId;

use crate::server::ServerState;

/// Queues one message for one connection. Returns false when the
/// connection is gone.
pub(crate) async fn send_to(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    msg: ServerMessage,
) -> bool {
    let connections = state.connections.lock().await;
    match connections.get(&conn_id) {
        Some(handle) => handle.sender.send(msg).is_ok(),
        None => false,
    }
}

/// Queues a room event for every member of a room.
pub(crate) async fn broadcast_room(state: &Arc<ServerState>, room_id: RoomId, event: RoomEvent) {
    let members: Vec<ConnectionId> = {
        let rooms = state.rooms.lock().await;
        match rooms.room(room_id) {
            Ok(room) => room.members().map(|(c, _)| c).collect(),
            Err(_) => return,
        }
    };
    let connections = state.connections.lock().await;
    for conn_id in members {
        if let Some(handle) = connections.get(&conn_id) {
            let _ = handle.sender.send(ServerMessage::Room {
                room_id,
                event: event.clone(),
            });
        }
    }
}

/// Queues a session event for every connection on the server.
pub(crate) async fn broadcast_all(state: &Arc<ServerState>, event: SessionEvent) {
    let connections = state.connections.lock().await;
    for handle in connections.values() {
        let _ = handle.sender.send(ServerMessage::Session(event.clone()));
    }
}

/// Tells a connection it is being closed and stops its reader. The
/// close notice is best-effort.
pub(crate) async fn close_connection(state: &Arc<ServerState>, conn_id: ConnectionId, reason: &str) {
    let connections = state.connections.lock().await;
    if let Some(handle) = connections.get(&conn_id) {
        let _ = handle
            .sender
            .send(ServerMessage::Session(SessionEvent::ConnectionClosed {
                reason: reason.to_owned(),
            }));
        handle.shutdown.notify_one();
    }
}

/// Stops every connection's reader, after a best-effort close notice.
pub(crate) async fn close_all(state: &Arc<ServerState>, reason: &str) {
    let connections = state.connections.lock().await;
    for handle in connections.values() {
        let _ = handle
            .sender
            .send(ServerMessage::Session(SessionEvent::ConnectionClosed {
                reason: reason.to_owned(),
            }));
        handle.shutdown.notify_one();
    }
}
