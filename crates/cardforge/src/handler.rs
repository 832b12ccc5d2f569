//! Per-connection handler: hello exchange, frame loop, liveness, and
//! teardown.
//!
//! Each accepted connection gets one reader task (this handler) and one
//! writer task draining the connection's outbound queue. The reader
//! never writes to the socket directly; everything outbound goes
//! through the queue so a slow peer can't stall dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, mpsc};

use cardforge_protocol::{
    ClientMessage, Codec, GameCmd, PROTOCOL_VERSION, ProtocolError,
    ServerMessage, SessionEvent, registry,
};
use cardforge_session::AuthState;
use cardforge_transport::{Connection, ConnectionId, TcpConnection};

use crate::CardforgeError;
use crate::broadcast;
use crate::dispatch;
use crate::server::{ConnHandle, ServerState};

enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to teardown.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
) -> Result<(), CardforgeError> {
    let conn_id = conn.id();
    let conn = Arc::new(conn);
    tracing::debug!(%conn_id, "connection accepted");

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let shutdown = Arc::new(Notify::new());

    state.connections.lock().await.insert(
        conn_id,
        ConnHandle {
            sender: tx.clone(),
            shutdown: Arc::clone(&shutdown),
        },
    );
    state.sessions.lock().await.register(conn_id);

    // Writer task: drains the queue until every sender is gone.
    let writer_conn = Arc::clone(&conn);
    let codec = state.codec;
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match codec.encode(&msg) {
                Ok(bytes) => {
                    if writer_conn.send(&bytes).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "outbound encode failed");
                }
            }
        }
        let _ = writer_conn.close().await;
    });

    // The server speaks first.
    let _ = tx.send(ServerMessage::Hello {
        version: PROTOCOL_VERSION,
        compression: true,
    });

    let mut liveness = tokio::time::interval(Duration::from_secs(1));
    liveness.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                tracing::debug!(%conn_id, "connection shut down by server");
                break;
            }
            _ = liveness.tick() => {
                let idle_secs = {
                    let sessions = state.sessions.lock().await;
                    sessions.get(conn_id).map(|s| s.idle_for().as_secs()).unwrap_or(0)
                };
                if idle_secs >= state.session_config.idle_timeout_secs {
                    tracing::info!(%conn_id, idle_secs, "connection timed out");
                    let _ = tx.send(ServerMessage::Session(SessionEvent::ConnectionClosed {
                        reason: "server_timeout".to_owned(),
                    }));
                    break;
                }
            }
            frame = conn.recv() => {
                match frame {
                    Ok(Some(payload)) => {
                        match handle_frame(&conn, &state, conn_id, &tx, &payload).await {
                            Flow::Continue => {}
                            Flow::Close => break,
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(%conn_id, "connection closed by peer");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv failed");
                        break;
                    }
                }
            }
        }
    }

    cleanup(&state, conn_id).await;
    Ok(())
}

/// Processes one inbound frame payload.
async fn handle_frame(
    conn: &Arc<TcpConnection>,
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    payload: &[u8],
) -> Flow {
    if let Some(session) = state.sessions.lock().await.get_mut(conn_id) {
        session.touch();
    }

    let message = match registry::decode_client_message(payload) {
        Ok(message) => message,
        Err(ProtocolError::UnknownType(tag)) => {
            // Newer peer, unknown item: drop the frame, keep the stream.
            tracing::debug!(%conn_id, %tag, "dropping frame with unknown item type");
            return Flow::Continue;
        }
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "malformed frame");
            return Flow::Close;
        }
    };

    match message {
        ClientMessage::Hello { version, compression } => {
            let awaiting = {
                let sessions = state.sessions.lock().await;
                sessions
                    .get(conn_id)
                    .is_some_and(|s| matches!(s.state, AuthState::AwaitingHello))
            };
            if !awaiting {
                tracing::debug!(%conn_id, "unexpected second hello");
                return Flow::Close;
            }
            if version != PROTOCOL_VERSION {
                tracing::info!(%conn_id, client_version = version, "protocol version mismatch");
                let _ = tx.send(ServerMessage::Session(SessionEvent::ConnectionClosed {
                    reason: "protocol_version_mismatch".to_owned(),
                }));
                return Flow::Close;
            }
            conn.set_compression(compression);
            {
                let mut sessions = state.sessions.lock().await;
                if let Some(session) = sessions.get_mut(conn_id) {
                    session.state = AuthState::AwaitingLogin;
                    session.compression = compression;
                }
            }
            let _ = tx.send(ServerMessage::Session(SessionEvent::ServerNotice {
                text: state.welcome.clone(),
            }));
            Flow::Continue
        }
        ClientMessage::Container(container) => {
            {
                let mut sessions = state.sessions.lock().await;
                let Some(session) = sessions.get_mut(conn_id) else {
                    return Flow::Close;
                };
                if matches!(session.state, AuthState::AwaitingHello) {
                    tracing::debug!(%conn_id, "commands before hello");
                    return Flow::Close;
                }
                if let Err(e) = session.admit_container(container.cmd_id) {
                    // Already dispatched once; never run it again.
                    tracing::debug!(%conn_id, error = %e, "dropping duplicate container");
                    return Flow::Continue;
                }
            }
            let cmd_id = container.cmd_id;
            let (code, data) = dispatch::handle_container(state, conn_id, container).await;
            let _ = tx.send(ServerMessage::Response { cmd_id, code, data });
            Flow::Continue
        }
    }
}

/// Unwinds a connection's memberships after its reader stops.
async fn cleanup(state: &Arc<ServerState>, conn_id: ConnectionId) {
    state.connections.lock().await.remove(&conn_id);
    let Some(session) = state.sessions.lock().await.remove(conn_id) else {
        return;
    };

    // Unseat from every game; the in-flight command (if any) finishes
    // first because the actor serializes.
    for (game_id, (room_id, seat)) in &session.games {
        let handle = {
            let rooms = state.rooms.lock().await;
            rooms
                .room(*room_id)
                .ok()
                .and_then(|r| r.game(*game_id).ok().cloned())
        };
        if let Some(handle) = handle {
            let _ = handle.command(*seat, GameCmd::Leave).await;
            dispatch::refresh_game_listing(state, *room_id, *game_id).await;
        }
    }

    // Leave every room.
    for room_id in &session.rooms {
        let left = {
            let mut rooms = state.rooms.lock().await;
            rooms
                .room_mut(*room_id)
                .ok()
                .and_then(|room| room.leave(conn_id).ok())
        };
        if let Some(user) = left {
            broadcast::broadcast_room(
                state,
                *room_id,
                cardforge_protocol::RoomEvent::UserLeft { name: user.name },
            )
            .await;
        }
    }

    if let Some(user) = session.user() {
        tracing::info!(%conn_id, user = %user.name, "user disconnected");
    } else {
        tracing::debug!(%conn_id, "connection cleaned up");
    }
}
