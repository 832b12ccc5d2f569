//! Command dispatch: runs each container's commands against the
//! session, store, room, and game layers and shapes the response.
//!
//! A container gets exactly one response. Commands run in order; the
//! first failure stops the batch and its code becomes the container's
//! code. When everything succeeds the response carries the payload of
//! the last data-producing command.
//!
//! Lock discipline: the shared mutexes (sessions, rooms, store,
//! connections) are taken one at a time and never held across a game
//! handle await.

use std::sync::Arc;
use std::time::Duration;

use cardforge_game::{Game, GameSettings, spawn_game};
use cardforge_protocol::{
    Command, CommandContainer, GameCmd, GameId, ListKind, ResponseCode,
    ResponseData, RoomCmd, RoomEvent, RoomId, ServerMessage, SessionEvent,
    UserInfo, UserLevel,
};
use cardforge_store::StoreError;
use cardforge_transport::ConnectionId;

use crate::broadcast::{broadcast_all, broadcast_room, close_all, close_connection, send_to};
use crate::server::ServerState;

/// Runs one container and produces its single response.
pub(crate) async fn handle_container(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    container: CommandContainer,
) -> (ResponseCode, Option<ResponseData>) {
    let mut data = None;
    for command in container.commands {
        match handle_command(state, conn_id, command).await {
            Ok(Some(d)) => data = Some(d),
            Ok(None) => {}
            // First failure wins; the rest of the batch never runs.
            Err(code) => return (code, None),
        }
    }
    (ResponseCode::Ok, data)
}

async fn handle_command(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    command: Command,
) -> Result<Option<ResponseData>, ResponseCode> {
    match command {
        Command::Ping => Ok(None),
        Command::Login { user, password } => login(state, conn_id, user, password).await,
        Command::Message { user, text } => {
            let sender = current_user(state, conn_id).await?;
            private_message(state, &sender, &user, text).await
        }
        Command::ListRooms => {
            current_user(state, conn_id).await?;
            let rooms = state.rooms.lock().await.infos();
            Ok(Some(ResponseData::Rooms { rooms }))
        }
        Command::JoinRoom { room_id } => {
            let user = current_user(state, conn_id).await?;
            join_room(state, conn_id, &user, room_id).await
        }
        Command::AddToList { list, user } => {
            let caller = registered_user(state, conn_id).await?;
            let result = {
                let mut store = state.store.lock().await;
                store.add_to_list(&caller.name, list, &user)
            };
            result.map_err(store_code)?;
            notify_list_change(state, conn_id, list, user, true).await;
            Ok(None)
        }
        Command::RemoveFromList { list, user } => {
            let caller = registered_user(state, conn_id).await?;
            let result = {
                let mut store = state.store.lock().await;
                store.remove_from_list(&caller.name, list, &user)
            };
            result.map_err(store_code)?;
            notify_list_change(state, conn_id, list, user, false).await;
            Ok(None)
        }
        Command::DeckList => {
            let caller = registered_user(state, conn_id).await?;
            let root = state.store.lock().await.deck_tree(&caller.name);
            Ok(Some(ResponseData::DeckTree { root }))
        }
        Command::DeckNewDir { path, name } => {
            let caller = registered_user(state, conn_id).await?;
            let mut store = state.store.lock().await;
            store
                .deck_new_dir(&caller.name, &path, &name)
                .map_err(store_code)?;
            Ok(None)
        }
        Command::DeckDelDir { path } => {
            let caller = registered_user(state, conn_id).await?;
            let mut store = state.store.lock().await;
            store.deck_del_dir(&caller.name, &path).map_err(store_code)?;
            Ok(None)
        }
        Command::DeckDel { deck_id } => {
            let caller = registered_user(state, conn_id).await?;
            let mut store = state.store.lock().await;
            store.deck_delete(&caller.name, deck_id).map_err(store_code)?;
            Ok(None)
        }
        Command::DeckUpload { path, name, content } => {
            let caller = registered_user(state, conn_id).await?;
            let mut store = state.store.lock().await;
            let file = store
                .deck_upload(&caller.name, &path, &name, &content)
                .map_err(store_code)?;
            Ok(Some(ResponseData::DeckUploaded {
                deck_id: file.id,
                name: file.name,
            }))
        }
        Command::DeckDownload { deck_id } => {
            let caller = registered_user(state, conn_id).await?;
            let store = state.store.lock().await;
            let deck = store
                .deck_download(&caller.name, deck_id)
                .map_err(store_code)?;
            Ok(Some(ResponseData::DeckContent {
                deck_id: deck.id,
                name: deck.name,
                content: deck.content,
            }))
        }
        Command::BanFromServer {
            user,
            address,
            minutes,
            reason,
        } => {
            let caller = leveled_user(state, conn_id, UserLevel::Moderator).await?;
            ban_from_server(state, &caller, &user, &address, minutes, &reason).await
        }
        Command::BroadcastMessage { text } => {
            let caller = leveled_user(state, conn_id, UserLevel::Admin).await?;
            tracing::info!(by = %caller.name, "server broadcast");
            broadcast_all(state, SessionEvent::ServerNotice { text }).await;
            Ok(None)
        }
        Command::ShutdownServer { reason, minutes } => {
            let caller = leveled_user(state, conn_id, UserLevel::Admin).await?;
            shutdown_server(state, &caller, reason, minutes).await
        }
        Command::Room { room_id, cmd } => {
            let user = current_user(state, conn_id).await?;
            room_command(state, conn_id, &user, room_id, cmd).await
        }
        Command::Game {
            room_id,
            game_id,
            cmd,
        } => {
            current_user(state, conn_id).await?;
            game_command(state, conn_id, room_id, game_id, cmd).await
        }
    }
}

// ---------------------------------------------------------------------------
// Session-scope handlers
// ---------------------------------------------------------------------------

async fn login(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    name: String,
    password: String,
) -> Result<Option<ResponseData>, ResponseCode> {
    if name.trim().is_empty() {
        return Err(ResponseCode::InvalidData);
    }
    {
        let sessions = state.sessions.lock().await;
        let session = sessions.get(conn_id).ok_or(ResponseCode::InternalError)?;
        if session.is_logged_in() {
            return Err(ResponseCode::ContextError);
        }
    }

    let level = {
        let mut store = state.store.lock().await;
        store.authenticate(&name, &password)
    };
    let level = match level {
        Ok(level) => level,
        Err(StoreError::Banned { reason }) => {
            tracing::info!(%conn_id, user = %name, %reason, "banned user refused");
            close_connection(state, conn_id, "banned").await;
            return Err(ResponseCode::ContextError);
        }
        Err(e) => return Err(store_code(e)),
    };

    let user = UserInfo { name, level };
    state
        .sessions
        .lock()
        .await
        .login(conn_id, user.clone())
        .map_err(|e| match e {
            cardforge_session::SessionError::NameInUse(_) => {
                ResponseCode::WouldOverwriteOldSession
            }
            _ => ResponseCode::ContextError,
        })?;

    let (buddy_list, ignore_list) = {
        let store = state.store.lock().await;
        (
            store.list_members(&user.name, ListKind::Buddy),
            store.list_members(&user.name, ListKind::Ignore),
        )
    };
    Ok(Some(ResponseData::LoginOk {
        user,
        buddy_list,
        ignore_list,
    }))
}

async fn private_message(
    state: &Arc<ServerState>,
    sender: &UserInfo,
    target: &str,
    text: String,
) -> Result<Option<ResponseData>, ResponseCode> {
    let target_conn = state
        .sessions
        .lock()
        .await
        .by_name(target)
        .ok_or(ResponseCode::NameNotFound)?;
    let ignored = {
        let store = state.store.lock().await;
        store
            .list_members(target, ListKind::Ignore)
            .iter()
            .any(|n| n == &sender.name)
    };
    if ignored {
        return Err(ResponseCode::InIgnoreList);
    }
    send_to(
        state,
        target_conn,
        ServerMessage::Session(SessionEvent::PrivateMessage {
            sender: sender.clone(),
            text,
        }),
    )
    .await;
    Ok(None)
}

async fn join_room(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    user: &UserInfo,
    room_id: RoomId,
) -> Result<Option<ResponseData>, ResponseCode> {
    let details = {
        let mut rooms = state.rooms.lock().await;
        let room = rooms.room_mut(room_id).map_err(|e| e.code())?;
        room.join(conn_id, user.clone()).map_err(|e| e.code())?;
        room.details()
    };
    if let Some(session) = state.sessions.lock().await.get_mut(conn_id) {
        session.rooms.insert(room_id);
    }
    broadcast_room(state, room_id, RoomEvent::UserJoined { user: user.clone() }).await;
    Ok(Some(ResponseData::RoomJoined { room: details }))
}

async fn notify_list_change(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    list: ListKind,
    user: String,
    added: bool,
) {
    send_to(
        state,
        conn_id,
        ServerMessage::Session(SessionEvent::ListChanged { list, user, added }),
    )
    .await;
}

async fn ban_from_server(
    state: &Arc<ServerState>,
    caller: &UserInfo,
    user: &str,
    address: &str,
    minutes: u32,
    reason: &str,
) -> Result<Option<ResponseData>, ResponseCode> {
    if user.is_empty() && address.is_empty() {
        return Err(ResponseCode::InvalidData);
    }
    // The target must exist before anything is written.
    if !user.is_empty() {
        let registered = state.store.lock().await.user_exists(user);
        let online = state.sessions.lock().await.is_online(user);
        if !registered && !online {
            return Err(ResponseCode::NameNotFound);
        }
    }
    state
        .store
        .lock()
        .await
        .add_ban(user, address, minutes, reason);
    tracing::info!(by = %caller.name, target = %user, %address, minutes, "ban recorded");

    if !user.is_empty() {
        let target_conn = state.sessions.lock().await.by_name(user);
        if let Some(target_conn) = target_conn {
            close_connection(state, target_conn, "banned").await;
        }
    }
    Ok(None)
}

async fn shutdown_server(
    state: &Arc<ServerState>,
    caller: &UserInfo,
    reason: String,
    minutes: u32,
) -> Result<Option<ResponseData>, ResponseCode> {
    tracing::warn!(by = %caller.name, minutes, %reason, "server shutdown scheduled");
    broadcast_all(
        state,
        SessionEvent::ShutdownScheduled {
            reason: reason.clone(),
            minutes,
        },
    )
    .await;
    if minutes == 0 {
        close_all(state, "server_shutdown").await;
    } else {
        let state = Arc::clone(state);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(minutes) * 60)).await;
            close_all(&state, "server_shutdown").await;
        });
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Room-scope handlers
// ---------------------------------------------------------------------------

async fn room_command(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    user: &UserInfo,
    room_id: RoomId,
    cmd: RoomCmd,
) -> Result<Option<ResponseData>, ResponseCode> {
    // Every room command requires membership.
    {
        let sessions = state.sessions.lock().await;
        let member = sessions
            .get(conn_id)
            .is_some_and(|s| s.rooms.contains(&room_id));
        if !member {
            return Err(ResponseCode::NotInRoom);
        }
    }

    match cmd {
        RoomCmd::Leave => {
            let left = {
                let mut rooms = state.rooms.lock().await;
                let room = rooms.room_mut(room_id).map_err(|e| e.code())?;
                room.leave(conn_id).map_err(|e| e.code())?
            };
            if let Some(session) = state.sessions.lock().await.get_mut(conn_id) {
                session.rooms.remove(&room_id);
            }
            broadcast_room(state, room_id, RoomEvent::UserLeft { name: left.name }).await;
            Ok(None)
        }
        RoomCmd::Say { text } => {
            let admitted = {
                let mut sessions = state.sessions.lock().await;
                sessions
                    .get_mut(conn_id)
                    .is_some_and(|s| s.admit_chat(&state.session_config))
            };
            if !admitted {
                return Err(ResponseCode::ChatFlood);
            }
            broadcast_room(
                state,
                room_id,
                RoomEvent::Say {
                    name: user.name.clone(),
                    text,
                },
            )
            .await;
            Ok(None)
        }
        RoomCmd::CreateGame {
            description,
            password,
            max_players,
            only_buddies,
            spectators_allowed,
            spectators_need_password,
            spectators_can_talk,
            spectators_see_everything,
        } => {
            if max_players == 0 {
                return Err(ResponseCode::InvalidData);
            }
            let settings = GameSettings {
                description,
                password: password.clone(),
                max_players,
                only_buddies,
                spectators_allowed,
                spectators_need_password,
                spectators_can_talk,
                spectators_see_everything,
            };
            let game_id = state.rooms.lock().await.next_game_id();
            let handle = spawn_game(Game::new(game_id, room_id, user.clone(), settings), 32);
            let sink = sink_for(state, conn_id).await.ok_or(ResponseCode::InternalError)?;

            // The creator takes the first seat.
            let joined = handle
                .join(user.clone(), password, false, true, sink)
                .await
                .map_err(|e| e.code())?;

            {
                let mut rooms = state.rooms.lock().await;
                let room = rooms.room_mut(room_id).map_err(|e| e.code())?;
                room.add_game(handle, joined.game.clone());
            }
            if let Some(session) = state.sessions.lock().await.get_mut(conn_id) {
                session.games.insert(game_id, (room_id, joined.player_id));
            }
            tracing::info!(%room_id, %game_id, creator = %user.name, "game created");
            broadcast_room(
                state,
                room_id,
                RoomEvent::GameCreated {
                    game: joined.game.clone(),
                },
            )
            .await;
            Ok(Some(ResponseData::GameJoined {
                game: joined.game,
                player_id: joined.player_id,
                players: joined.players,
            }))
        }
        RoomCmd::JoinGame {
            game_id,
            password,
            spectator,
        } => {
            {
                let sessions = state.sessions.lock().await;
                let seated = sessions
                    .get(conn_id)
                    .is_some_and(|s| s.games.contains_key(&game_id));
                if seated {
                    return Err(ResponseCode::ContextError);
                }
            }
            let (handle, creator_name) = {
                let rooms = state.rooms.lock().await;
                let room = rooms.room(room_id).map_err(|e| e.code())?;
                let handle = room.game(game_id).map_err(|e| e.code())?.clone();
                let creator = room
                    .details()
                    .games
                    .iter()
                    .find(|g| g.game_id == game_id)
                    .map(|g| g.creator.name.clone())
                    .unwrap_or_default();
                (handle, creator)
            };
            let is_buddy = {
                let store = state.store.lock().await;
                store
                    .list_members(&creator_name, ListKind::Buddy)
                    .iter()
                    .any(|n| n == &user.name)
            };
            let sink = sink_for(state, conn_id).await.ok_or(ResponseCode::InternalError)?;

            let joined = handle
                .join(user.clone(), password, spectator, is_buddy, sink)
                .await
                .map_err(|e| e.code())?;

            if let Some(session) = state.sessions.lock().await.get_mut(conn_id) {
                session.games.insert(game_id, (room_id, joined.player_id));
            }
            {
                let mut rooms = state.rooms.lock().await;
                if let Ok(room) = rooms.room_mut(room_id) {
                    room.update_game_info(joined.game.clone());
                }
            }
            broadcast_room(
                state,
                room_id,
                RoomEvent::GameUpdated {
                    game: joined.game.clone(),
                },
            )
            .await;
            Ok(Some(ResponseData::GameJoined {
                game: joined.game,
                player_id: joined.player_id,
                players: joined.players,
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Game-scope handlers
// ---------------------------------------------------------------------------

async fn game_command(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    room_id: RoomId,
    game_id: GameId,
    cmd: GameCmd,
) -> Result<Option<ResponseData>, ResponseCode> {
    let seat = {
        let sessions = state.sessions.lock().await;
        match sessions.get(conn_id).and_then(|s| s.games.get(&game_id)) {
            Some(&(seated_room, seat)) if seated_room == room_id => seat,
            _ => return Err(ResponseCode::NotInRoom),
        }
    };

    if matches!(cmd, GameCmd::Say { .. }) {
        let admitted = {
            let mut sessions = state.sessions.lock().await;
            sessions
                .get_mut(conn_id)
                .is_some_and(|s| s.admit_chat(&state.session_config))
        };
        if !admitted {
            return Err(ResponseCode::ChatFlood);
        }
    }

    let handle = {
        let rooms = state.rooms.lock().await;
        rooms
            .room(room_id)
            .map_err(|e| e.code())?
            .game(game_id)
            .map_err(|e| e.code())?
            .clone()
    };

    let leaving = matches!(cmd, GameCmd::Leave);
    // Seat-count changes that room listings must reflect.
    let listing_changed = matches!(
        cmd,
        GameCmd::Leave | GameCmd::ReadyStart | GameCmd::Concede
    );

    handle.command(seat, cmd).await.map_err(|e| e.code())?;

    if leaving {
        if let Some(session) = state.sessions.lock().await.get_mut(conn_id) {
            session.games.remove(&game_id);
        }
    }
    if listing_changed {
        refresh_game_listing(state, room_id, game_id).await;
    }
    Ok(None)
}

/// Re-reads a game's directory entry and tells the room. A game with no
/// players left is removed and its actor stopped; spectators alone do
/// not keep a game alive.
pub(crate) async fn refresh_game_listing(
    state: &Arc<ServerState>,
    room_id: RoomId,
    game_id: GameId,
) {
    let handle = {
        let rooms = state.rooms.lock().await;
        rooms
            .room(room_id)
            .ok()
            .and_then(|r| r.game(game_id).ok().cloned())
    };
    let Some(handle) = handle else { return };
    let Ok(info) = handle.info().await else { return };

    if info.player_count == 0 {
        {
            let mut rooms = state.rooms.lock().await;
            if let Ok(room) = rooms.room_mut(room_id) {
                room.remove_game(game_id);
            }
        }
        handle.shutdown().await;
        // Unseat any spectators still watching; their sinks died with
        // the actor.
        {
            let mut sessions = state.sessions.lock().await;
            for conn in sessions.connection_ids() {
                if let Some(session) = sessions.get_mut(conn) {
                    session.games.remove(&game_id);
                }
            }
        }
        tracing::info!(%room_id, %game_id, "game without players removed");
        broadcast_room(state, room_id, RoomEvent::GameRemoved { game_id }).await;
    } else {
        {
            let mut rooms = state.rooms.lock().await;
            if let Ok(room) = rooms.room_mut(room_id) {
                room.update_game_info(info.clone());
            }
        }
        broadcast_room(state, room_id, RoomEvent::GameUpdated { game: info }).await;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The caller's logged-in identity, or `LoginNeeded`.
async fn current_user(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
) -> Result<UserInfo, ResponseCode> {
    let sessions = state.sessions.lock().await;
    sessions
        .get(conn_id)
        .and_then(|s| s.user().cloned())
        .ok_or(ResponseCode::LoginNeeded)
}

/// Like [`current_user`], but guests are refused. Deck storage and
/// buddy/ignore lists are account features.
async fn registered_user(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
) -> Result<UserInfo, ResponseCode> {
    leveled_user(state, conn_id, UserLevel::Registered).await
}

async fn leveled_user(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    level: UserLevel,
) -> Result<UserInfo, ResponseCode> {
    let user = current_user(state, conn_id).await?;
    if user.level < level {
        return Err(ResponseCode::FunctionNotAllowed);
    }
    Ok(user)
}

/// The connection's outbound queue, for seating it in a game.
async fn sink_for(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
) -> Option<cardforge_game::EventSink> {
    let connections = state.connections.lock().await;
    connections.get(&conn_id).map(|h| h.sender.clone())
}

fn store_code(err: StoreError) -> ResponseCode {
    match err {
        StoreError::UserNotFound(_) | StoreError::FolderNotFound(_) | StoreError::DeckNotFound(_) => {
            ResponseCode::NameNotFound
        }
        StoreError::WrongPassword(_) => ResponseCode::WrongPassword,
        StoreError::InvalidName(_) => ResponseCode::InvalidData,
        StoreError::Banned { .. }
        | StoreError::AlreadyOnList { .. }
        | StoreError::NotOnList { .. }
        | StoreError::SelfReference
        | StoreError::FolderExists(_)
        | StoreError::RootFolder => ResponseCode::ContextError,
    }
}
