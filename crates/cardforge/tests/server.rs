//! End-to-end tests: a real server, real TCP, real clients.

use std::time::Duration;

use cardforge::prelude::*;
use cardforge_client::{CardforgeClient, ClientError};
use cardforge_protocol::{
    ClientMessage, Codec, Command, GameCmd, GameEvent, JsonCodec, ListKind,
    ResponseCode, ResponseData, RoomCmd, RoomEvent, RoomId, ServerMessage,
    SessionEvent,
};
use cardforge_transport::{Connection, TcpConnection};

async fn start_server(store: MemoryStore) -> String {
    let server = CardforgeServer::builder()
        .bind("127.0.0.1:0")
        .welcome("test server")
        .build(store)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(server.run());
    addr
}

async fn connect_and_login(addr: &str, name: &str) -> CardforgeClient {
    let mut client = CardforgeClient::connect(addr, false).await.unwrap();
    client.login(name, "").await.unwrap();
    client
}

/// Waits (bounded) for the next pushed event.
async fn next_event(client: &mut CardforgeClient) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(5), client.next_event())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended")
}

#[tokio::test]
async fn test_version_mismatch_gets_a_close_reason() {
    let addr = start_server(MemoryStore::new()).await;
    let conn = TcpConnection::connect(&addr).await.unwrap();
    let codec = JsonCodec;

    // Server hello first.
    let payload = conn.recv().await.unwrap().unwrap();
    let hello: ServerMessage = codec.decode(&payload).unwrap();
    assert!(matches!(hello, ServerMessage::Hello { .. }));

    // Answer with a version the server does not speak.
    let bad_hello = codec
        .encode(&ClientMessage::Hello {
            version: 13,
            compression: false,
        })
        .unwrap();
    conn.send(&bad_hello).await.unwrap();

    let payload = conn.recv().await.unwrap().unwrap();
    let msg: ServerMessage = codec.decode(&payload).unwrap();
    match msg {
        ServerMessage::Session(SessionEvent::ConnectionClosed { reason }) => {
            assert_eq!(reason, "protocol_version_mismatch");
        }
        other => panic!("unexpected message: {other:?}"),
    }
    // And the stream ends.
    assert!(matches!(conn.recv().await, Ok(None) | Err(_)));
}

#[tokio::test]
async fn test_commands_before_login_are_refused() {
    let addr = start_server(MemoryStore::new()).await;
    let mut client = CardforgeClient::connect(&addr, false).await.unwrap();
    assert_eq!(client.welcome(), "test server");

    let (code, _) = client.call(vec![Command::ListRooms]).await.unwrap();
    assert_eq!(code, ResponseCode::LoginNeeded);

    // Ping works unauthenticated.
    client.ping().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_login_name_is_refused_without_displacing() {
    let addr = start_server(MemoryStore::new()).await;
    let mut alice = connect_and_login(&addr, "alice").await;

    let mut intruder = CardforgeClient::connect(&addr, false).await.unwrap();
    match intruder.login("alice", "").await {
        Err(ClientError::Refused(code)) => {
            assert_eq!(code, ResponseCode::WouldOverwriteOldSession);
        }
        other => panic!("expected refusal, got {other:?}"),
    }

    // The original session is untouched.
    let (code, _) = alice.call(vec![Command::ListRooms]).await.unwrap();
    assert_eq!(code, ResponseCode::Ok);
}

#[tokio::test]
async fn test_room_chat_reaches_other_members() {
    let addr = start_server(MemoryStore::new()).await;
    let mut alice = connect_and_login(&addr, "alice").await;
    let mut bob = connect_and_login(&addr, "bob").await;

    let room_id = RoomId(1);
    let (code, data) = alice
        .call(vec![Command::JoinRoom { room_id }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);
    let Some(ResponseData::RoomJoined { room }) = data else {
        panic!("expected room snapshot");
    };
    assert_eq!(room.info.name, "Main");

    bob.call(vec![Command::JoinRoom { room_id }]).await.unwrap();

    // Alice sees bob arrive.
    loop {
        match next_event(&mut alice).await {
            ServerMessage::Room {
                event: RoomEvent::UserJoined { user },
                ..
            } if user.name == "bob" => break,
            _ => {}
        }
    }

    alice
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::Say { text: "hi".into() },
        }])
        .await
        .unwrap();

    loop {
        match next_event(&mut bob).await {
            ServerMessage::Room {
                event: RoomEvent::Say { name, text },
                ..
            } => {
                assert_eq!(name, "alice");
                assert_eq!(text, "hi");
                break;
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_container_stops_at_the_first_failure() {
    let addr = start_server(MemoryStore::new()).await;
    let mut alice = connect_and_login(&addr, "alice").await;

    let room_id = RoomId(1);
    // Saying into a room she never joined fails; the join behind it
    // must not run.
    let (code, _) = alice
        .call(vec![
            Command::Room {
                room_id,
                cmd: RoomCmd::Say { text: "hi".into() },
            },
            Command::JoinRoom { room_id },
        ])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::NotInRoom);

    // Still not a member.
    let (code, _) = alice
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::Leave,
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::NotInRoom);
}

#[tokio::test]
async fn test_deck_folder_errors_map_to_codes() {
    let mut store = MemoryStore::new();
    store.add_account("alice", "pw", cardforge_protocol::UserLevel::Registered);
    let addr = start_server(store).await;

    let mut alice = CardforgeClient::connect(&addr, false).await.unwrap();
    alice.login("alice", "pw").await.unwrap();

    let (code, _) = alice
        .call(vec![Command::DeckNewDir {
            path: "no/such/folder".into(),
            name: "x".into(),
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::NameNotFound);

    // Guests get no deck storage at all.
    let mut guest = connect_and_login(&addr, "wanderer").await;
    let (code, _) = guest.call(vec![Command::DeckList]).await.unwrap();
    assert_eq!(code, ResponseCode::FunctionNotAllowed);
}

#[tokio::test]
async fn test_duplicate_buddy_add_is_a_context_error() {
    let mut store = MemoryStore::new();
    store.add_account("alice", "pw", cardforge_protocol::UserLevel::Registered);
    store.add_account("bob", "pw", cardforge_protocol::UserLevel::Registered);
    let addr = start_server(store).await;

    let mut alice = CardforgeClient::connect(&addr, false).await.unwrap();
    alice.login("alice", "pw").await.unwrap();

    let add = Command::AddToList {
        list: ListKind::Buddy,
        user: "bob".into(),
    };
    let (code, _) = alice.call(vec![add.clone()]).await.unwrap();
    assert_eq!(code, ResponseCode::Ok);
    let (code, _) = alice.call(vec![add]).await.unwrap();
    assert_eq!(code, ResponseCode::ContextError);
}

#[tokio::test]
async fn test_game_flow_hides_the_opponents_draw() {
    let addr = start_server(MemoryStore::new()).await;
    let mut alice = connect_and_login(&addr, "alice").await;
    let mut bob = connect_and_login(&addr, "bob").await;

    let room_id = RoomId(1);
    alice.call(vec![Command::JoinRoom { room_id }]).await.unwrap();
    bob.call(vec![Command::JoinRoom { room_id }]).await.unwrap();

    let (code, data) = alice
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::CreateGame {
                description: "duel".into(),
                password: String::new(),
                max_players: 2,
                only_buddies: false,
                spectators_allowed: false,
                spectators_need_password: false,
                spectators_can_talk: false,
                spectators_see_everything: false,
            },
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);
    let Some(ResponseData::GameJoined { game, .. }) = data else {
        panic!("expected game snapshot");
    };
    let game_id = game.game_id;

    let (code, _) = bob
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::JoinGame {
                game_id,
                password: String::new(),
                spectator: false,
            },
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);

    let deck = "2 Island\n1 Bear\n";
    for client in [&mut alice, &mut bob] {
        let (code, _) = client
            .call(vec![
                Command::Game {
                    room_id,
                    game_id,
                    cmd: GameCmd::SetDeck { deck: deck.into() },
                },
                Command::Game {
                    room_id,
                    game_id,
                    cmd: GameCmd::ReadyStart,
                },
            ])
            .await
            .unwrap();
        assert_eq!(code, ResponseCode::Ok);
    }

    // Both readies in: the game starts.
    loop {
        if let ServerMessage::Game { events, .. } = next_event(&mut alice).await {
            if events
                .iter()
                .any(|e| matches!(e, GameEvent::GameStarted { .. }))
            {
                break;
            }
        }
    }

    let (code, _) = alice
        .call(vec![Command::Game {
            room_id,
            game_id,
            cmd: GameCmd::DrawCards { number: 2 },
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);

    // Alice sees her cards; bob sees the count but no identities.
    let alice_draw = loop {
        if let ServerMessage::Game { events, .. } = next_event(&mut alice).await {
            if let Some(GameEvent::DrawCards { cards, count, .. }) = events
                .into_iter()
                .find(|e| matches!(e, GameEvent::DrawCards { .. }))
            {
                break (cards, count);
            }
        }
    };
    assert_eq!(alice_draw.1, 2);
    assert_eq!(alice_draw.0.len(), 2);
    assert!(alice_draw.0.iter().all(|c| !c.name.is_empty()));

    let bob_view = loop {
        if let ServerMessage::Game { events, .. } = next_event(&mut bob).await {
            if let Some(GameEvent::DrawCards { cards, count, .. }) = events
                .into_iter()
                .find(|e| matches!(e, GameEvent::DrawCards { .. }))
            {
                break (cards, count);
            }
        }
    };
    assert_eq!(bob_view.1, 2);
    assert!(bob_view.0.is_empty());
}

#[tokio::test]
async fn test_leaving_empties_and_removes_the_game() {
    let addr = start_server(MemoryStore::new()).await;
    let mut alice = connect_and_login(&addr, "alice").await;
    let mut bob = connect_and_login(&addr, "bob").await;

    let room_id = RoomId(1);
    alice.call(vec![Command::JoinRoom { room_id }]).await.unwrap();
    bob.call(vec![Command::JoinRoom { room_id }]).await.unwrap();

    let (_, data) = alice
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::CreateGame {
                description: String::new(),
                password: String::new(),
                max_players: 2,
                only_buddies: false,
                spectators_allowed: true,
                spectators_need_password: false,
                spectators_can_talk: true,
                spectators_see_everything: false,
            },
        }])
        .await
        .unwrap();
    let Some(ResponseData::GameJoined { game, .. }) = data else {
        panic!("expected game snapshot");
    };
    let game_id = game.game_id;

    let (code, _) = alice
        .call(vec![Command::Game {
            room_id,
            game_id,
            cmd: GameCmd::Leave,
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);

    // The emptied game disappears from the room.
    loop {
        match next_event(&mut bob).await {
            ServerMessage::Room {
                event: RoomEvent::GameRemoved { game_id: removed },
                ..
            } => {
                assert_eq!(removed, game_id);
                break;
            }
            _ => {}
        }
    }

    // And can no longer be joined.
    let (code, _) = bob
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::JoinGame {
                game_id,
                password: String::new(),
                spectator: false,
            },
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::NameNotFound);
}

#[tokio::test]
async fn test_spectators_do_not_keep_a_game_alive() {
    let addr = start_server(MemoryStore::new()).await;
    let mut alice = connect_and_login(&addr, "alice").await;
    let mut bob = connect_and_login(&addr, "bob").await;

    let room_id = RoomId(1);
    alice.call(vec![Command::JoinRoom { room_id }]).await.unwrap();
    bob.call(vec![Command::JoinRoom { room_id }]).await.unwrap();

    let (_, data) = alice
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::CreateGame {
                description: String::new(),
                password: String::new(),
                max_players: 2,
                only_buddies: false,
                spectators_allowed: true,
                spectators_need_password: false,
                spectators_can_talk: true,
                spectators_see_everything: false,
            },
        }])
        .await
        .unwrap();
    let Some(ResponseData::GameJoined { game, .. }) = data else {
        panic!("expected game snapshot");
    };
    let game_id = game.game_id;

    let (code, _) = bob
        .call(vec![Command::Room {
            room_id,
            cmd: RoomCmd::JoinGame {
                game_id,
                password: String::new(),
                spectator: true,
            },
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);

    // The last player leaves; the watching spectator does not keep the
    // game in the directory.
    let (code, _) = alice
        .call(vec![Command::Game {
            room_id,
            game_id,
            cmd: GameCmd::Leave,
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);

    loop {
        match next_event(&mut bob).await {
            ServerMessage::Room {
                event: RoomEvent::GameRemoved { game_id: removed },
                ..
            } => {
                assert_eq!(removed, game_id);
                break;
            }
            _ => {}
        }
    }

    // The spectator's seat is gone with the game.
    let (code, _) = bob
        .call(vec![Command::Game {
            room_id,
            game_id,
            cmd: GameCmd::Say { text: "hello?".into() },
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::NotInRoom);
}

#[tokio::test]
async fn test_moderator_ban_requires_an_existing_target() {
    let mut store = MemoryStore::new();
    store.add_account("mod", "pw", cardforge_protocol::UserLevel::Moderator);
    let addr = start_server(store).await;

    let mut moderator = CardforgeClient::connect(&addr, false).await.unwrap();
    moderator.login("mod", "pw").await.unwrap();

    // Nobody by that name, registered or online.
    let (code, _) = moderator
        .call(vec![Command::BanFromServer {
            user: "ghost".into(),
            address: String::new(),
            minutes: 5,
            reason: "test".into(),
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::NameNotFound);

    // An online guest can be banned; they get disconnected.
    let mut mallory = connect_and_login(&addr, "mallory").await;
    let (code, _) = moderator
        .call(vec![Command::BanFromServer {
            user: "mallory".into(),
            address: String::new(),
            minutes: 5,
            reason: "test".into(),
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);

    loop {
        match next_event(&mut mallory).await {
            ServerMessage::Session(SessionEvent::ConnectionClosed { reason }) => {
                assert_eq!(reason, "banned");
                break;
            }
            _ => {}
        }
    }

    // Coming back while banned is refused at login.
    let mut retry = CardforgeClient::connect(&addr, false).await.unwrap();
    match retry.login("mallory", "").await {
        Err(ClientError::Refused(code)) => assert_eq!(code, ResponseCode::ContextError),
        other => panic!("expected refusal, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_flood_is_refused_and_not_counted() {
    let server = CardforgeServer::builder()
        .bind("127.0.0.1:0")
        .session_config(SessionConfig {
            chat_flood_max: 2,
            ..SessionConfig::default()
        })
        .build(MemoryStore::new())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(server.run());

    let mut alice = connect_and_login(&addr, "alice").await;
    let room_id = RoomId(1);
    alice.call(vec![Command::JoinRoom { room_id }]).await.unwrap();

    let say = Command::Room {
        room_id,
        cmd: RoomCmd::Say { text: "spam".into() },
    };
    for _ in 0..2 {
        let (code, _) = alice.call(vec![say.clone()]).await.unwrap();
        assert_eq!(code, ResponseCode::Ok);
    }
    let (code, _) = alice.call(vec![say]).await.unwrap();
    assert_eq!(code, ResponseCode::ChatFlood);
}

#[tokio::test]
async fn test_private_message_respects_the_ignore_list() {
    let mut store = MemoryStore::new();
    store.add_account("alice", "pw", cardforge_protocol::UserLevel::Registered);
    store.add_account("bob", "pw", cardforge_protocol::UserLevel::Registered);
    let addr = start_server(store).await;

    let mut alice = CardforgeClient::connect(&addr, false).await.unwrap();
    alice.login("alice", "pw").await.unwrap();
    let mut bob = CardforgeClient::connect(&addr, false).await.unwrap();
    bob.login("bob", "pw").await.unwrap();

    let (code, _) = alice
        .call(vec![Command::Message {
            user: "bob".into(),
            text: "hello".into(),
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::Ok);
    loop {
        match next_event(&mut bob).await {
            ServerMessage::Session(SessionEvent::PrivateMessage { sender, text }) => {
                assert_eq!(sender.name, "alice");
                assert_eq!(text, "hello");
                break;
            }
            _ => {}
        }
    }

    // Bob ignores alice; her next message bounces.
    bob.call(vec![Command::AddToList {
        list: ListKind::Ignore,
        user: "alice".into(),
    }])
    .await
    .unwrap();
    let (code, _) = alice
        .call(vec![Command::Message {
            user: "bob".into(),
            text: "still there?".into(),
        }])
        .await
        .unwrap();
    assert_eq!(code, ResponseCode::InIgnoreList);
}
