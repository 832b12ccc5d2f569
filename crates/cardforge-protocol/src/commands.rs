//! Client-issued commands and the container envelope that carries them.
//!
//! Commands come in three scopes, mirroring the authority that handles
//! them:
//!
//! - [`Command`] is session scope: login, ping, lists, deck storage,
//!   moderation, plus the `Room`/`Game` wrappers.
//! - [`RoomCmd`] is room scope: chat, leaving, creating/joining games.
//! - [`GameCmd`] is game scope: every in-game action.
//!
//! Each enum is internally tagged; the `type` tag string is the wire
//! type name registered in [`crate::registry`].

use serde::{Deserialize, Serialize};

use crate::types::{
    CardAttr, CardId, CardToMove, GameId, ListKind, PlayerId, RoomId,
};

// ---------------------------------------------------------------------------
// Top-level client items
// ---------------------------------------------------------------------------

/// Everything a client may put on the wire.
///
/// Adjacently tagged (`type` + `data`) so the nested tagged enums below
/// don't collide with the outer tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Must be the very first item on a fresh connection. `compression`
    /// asks the server to lz4-compress large frames it sends back.
    Hello { version: u32, compression: bool },

    /// A batch of commands sharing one response.
    Container(CommandContainer),
}

/// The client request envelope.
///
/// `cmd_id` is chosen by the client and must increase monotonically per
/// connection; the server refuses to dispatch a container whose id it
/// has already processed. The container gets exactly one response, plus
/// zero or more events produced while processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandContainer {
    pub cmd_id: u64,
    pub commands: Vec<Command>,
}

// ---------------------------------------------------------------------------
// Session-scope commands
// ---------------------------------------------------------------------------

/// A single command. Session-scope variants are handled directly; the
/// `Room` and `Game` variants carry a scoped sub-command plus the ids
/// needed to route it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Liveness probe. Also the only command besides `Login` accepted
    /// before authentication.
    Ping,

    /// Authenticate this connection.
    Login { user: String, password: String },

    /// Private message to one online user.
    Message { user: String, text: String },

    /// List all rooms on the server.
    ListRooms,

    /// Join a room by id.
    JoinRoom { room_id: RoomId },

    /// Add a user to the caller's buddy or ignore list.
    AddToList { list: ListKind, user: String },

    /// Remove a user from the caller's buddy or ignore list.
    RemoveFromList { list: ListKind, user: String },

    /// Fetch the caller's whole deck folder tree.
    DeckList,

    /// Create a folder under `path` (slash-separated, "" = root).
    DeckNewDir { path: String, name: String },

    /// Delete the folder at `path` and everything under it.
    DeckDelDir { path: String },

    /// Delete one stored deck by id.
    DeckDel { deck_id: u64 },

    /// Store a deck under the folder at `path`.
    DeckUpload { path: String, name: String, content: String },

    /// Fetch a stored deck's content.
    DeckDownload { deck_id: u64 },

    /// Moderator+: ban a user and disconnect them if online.
    BanFromServer {
        user: String,
        address: String,
        minutes: u32,
        reason: String,
    },

    /// Admin: push a server message to every connection.
    BroadcastMessage { text: String },

    /// Admin: announce shutdown in `minutes`, then disconnect everyone.
    ShutdownServer { reason: String, minutes: u32 },

    /// A room-scoped command.
    Room { room_id: RoomId, cmd: RoomCmd },

    /// A game-scoped command.
    Game {
        room_id: RoomId,
        game_id: GameId,
        cmd: GameCmd,
    },
}

// ---------------------------------------------------------------------------
// Room-scope commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomCmd {
    /// Leave this room.
    Leave,

    /// Chat to everyone in the room.
    Say { text: String },

    /// Create a game in this room; the creator is seated as host.
    CreateGame {
        description: String,
        password: String,
        max_players: usize,
        only_buddies: bool,
        spectators_allowed: bool,
        spectators_need_password: bool,
        spectators_can_talk: bool,
        spectators_see_everything: bool,
    },

    /// Join (or spectate) an existing game in this room.
    JoinGame {
        game_id: GameId,
        password: String,
        spectator: bool,
    },
}

// ---------------------------------------------------------------------------
// Game-scope commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameCmd {
    /// Leave the game (as player or spectator).
    Leave,

    /// In-game chat.
    Say { text: String },

    /// Load a deck list into the caller's deck and sideboard zones.
    /// Only valid before the game starts; peers learn the deck's hash,
    /// never its content.
    SetDeck { deck: String },

    /// Shuffle the caller's deck zone.
    Shuffle,

    /// Roll a die with the given number of sides.
    RollDie { sides: u32 },

    /// Move the top `number` cards of the caller's deck to their hand.
    DrawCards { number: usize },

    /// Move cards between the caller's own zones.
    ///
    /// In a hidden `start_zone` the `card_id`s are list positions;
    /// everywhere else they are stable card ids. `x` is the insertion
    /// position for list zones, the x coordinate for the table.
    MoveCard {
        cards: Vec<CardToMove>,
        start_zone: String,
        target_zone: String,
        x: i32,
        y: i32,
    },

    /// Create a token card on the table.
    CreateToken {
        zone: String,
        name: String,
        pt: String,
        color: String,
        x: i32,
        y: i32,
    },

    /// Set one attribute of an own card.
    SetCardAttr {
        zone: String,
        card_id: CardId,
        attr: CardAttr,
        value: String,
    },

    /// Create a free-standing player counter.
    CreateCounter {
        name: String,
        color: String,
        radius: i32,
        value: i32,
    },

    /// Set a player counter to an absolute value.
    SetCounter { counter_id: u64, value: i32 },

    /// Add a delta to a player counter.
    IncCounter { counter_id: u64, delta: i32 },

    /// Delete a player counter.
    DelCounter { counter_id: u64 },

    /// Hand the turn to a specific player.
    SetActivePlayer { player_id: PlayerId },

    /// Advance to a specific phase of the current turn.
    SetActivePhase { phase: u32 },

    /// Pass the turn to the next non-conceded player, phase 0.
    NextTurn,

    /// Attach an own card to another card in play.
    AttachCard {
        start_zone: String,
        card_id: CardId,
        target_player_id: PlayerId,
        target_zone: String,
        target_card_id: CardId,
    },

    /// Clear an own card's attachment.
    DetachCard { zone: String, card_id: CardId },

    /// Look at the top `number_cards` of a zone (-1 = all). Owners may
    /// dump their own hidden zones; everyone may dump public ones.
    DumpZone {
        player_id: PlayerId,
        zone: String,
        number_cards: i32,
    },

    /// Declare readiness; the game starts when every player is ready.
    ReadyStart,

    /// Concede the game.
    Concede,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CardToMove;

    #[test]
    fn test_client_hello_json_shape() {
        let msg = ClientMessage::Hello {
            version: 14,
            compression: true,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Hello");
        assert_eq!(json["data"]["version"], 14);
        assert_eq!(json["data"]["compression"], true);
    }

    #[test]
    fn test_container_json_shape() {
        let msg = ClientMessage::Container(CommandContainer {
            cmd_id: 5,
            commands: vec![Command::Ping],
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Container");
        assert_eq!(json["data"]["cmd_id"], 5);
        assert_eq!(json["data"]["commands"][0]["type"], "Ping");
    }

    #[test]
    fn test_room_command_nests_its_own_tag() {
        let cmd = Command::Room {
            room_id: RoomId(2),
            cmd: RoomCmd::Say { text: "hi".into() },
        };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "Room");
        assert_eq!(json["room_id"], 2);
        assert_eq!(json["cmd"]["type"], "Say");
        assert_eq!(json["cmd"]["text"], "hi");
    }

    #[test]
    fn test_move_card_round_trip() {
        let cmd = GameCmd::MoveCard {
            cards: vec![CardToMove {
                card_id: CardId(3),
                face_down: true,
            }],
            start_zone: "hand".into(),
            target_zone: "table".into(),
            x: 120,
            y: 40,
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let back: GameCmd = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, back);
    }

    #[test]
    fn test_unknown_command_tag_fails_decode() {
        let result: Result<Command, _> =
            serde_json::from_str(r#"{"type": "FlyToMoon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_login_round_trip() {
        let cmd = Command::Login {
            user: "alice".into(),
            password: "secret".into(),
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let back: Command = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, back);
    }
}
