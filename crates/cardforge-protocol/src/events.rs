//! Server-issued messages: command responses and pushed events.
//!
//! Everything the server puts on the wire is a [`ServerMessage`]. A
//! [`CommandContainer`](crate::commands::CommandContainer) always gets
//! exactly one `Response` carrying its `cmd_id`; events are pushed
//! independently and carry the scope ids needed to route them on the
//! client side.

use serde::{Deserialize, Serialize};

use crate::types::{
    AttachRef, CardAttr, CardId, CardInfo, Counter, DeckDir, GameId,
    GameInfo, ListKind, PlayerId, PlayerInfo, ResponseCode, RoomDetails,
    RoomId, RoomInfo, UserInfo, ZoneInfo,
};

// ---------------------------------------------------------------------------
// Top-level server items
// ---------------------------------------------------------------------------

/// Everything the server may put on the wire.
///
/// Adjacently tagged for the same reason as
/// [`ClientMessage`](crate::commands::ClientMessage): the nested event
/// enums carry their own `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// First message on every connection, sent before anything else.
    /// `compression` reports whether the server can send compressed
    /// frames at all; whether it does is decided by the client's hello.
    Hello { version: u32, compression: bool },

    /// The single response to a command container.
    Response {
        cmd_id: u64,
        code: ResponseCode,
        data: Option<ResponseData>,
    },

    /// A session-scoped event.
    Session(SessionEvent),

    /// A room-scoped event.
    Room { room_id: RoomId, event: RoomEvent },

    /// A batch of game-scoped events produced by one state change.
    ///
    /// Events in a batch are already visibility-filtered for the
    /// receiving participant and must be applied in order.
    Game {
        room_id: RoomId,
        game_id: GameId,
        events: Vec<GameEvent>,
    },
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Payload attached to a successful response, when the command returns
/// data beyond its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseData {
    /// `Login` succeeded.
    LoginOk {
        user: UserInfo,
        buddy_list: Vec<String>,
        ignore_list: Vec<String>,
    },

    /// `ListRooms` result.
    Rooms { rooms: Vec<RoomInfo> },

    /// `JoinRoom` succeeded; full snapshot of the room.
    RoomJoined { room: RoomDetails },

    /// `JoinGame`/`CreateGame` succeeded; filtered snapshot of the game
    /// plus the id assigned to the caller.
    GameJoined {
        game: GameInfo,
        player_id: PlayerId,
        players: Vec<PlayerInfo>,
    },

    /// `DeckList` result: the caller's folder tree from the root.
    DeckTree { root: DeckDir },

    /// `DeckUpload` succeeded.
    DeckUploaded { deck_id: u64, name: String },

    /// `DeckDownload` result.
    DeckContent {
        deck_id: u64,
        name: String,
        content: String,
    },
}

// ---------------------------------------------------------------------------
// Session-scope events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Free-form text from the server: the login welcome message and
    /// admin broadcasts.
    ServerNotice { text: String },

    /// The server will shut down in `minutes`.
    ShutdownScheduled { reason: String, minutes: u32 },

    /// The server is about to close this connection.
    ConnectionClosed { reason: String },

    /// A private message from another user.
    PrivateMessage { sender: UserInfo, text: String },

    /// The caller's buddy or ignore list changed.
    ListChanged {
        list: ListKind,
        user: String,
        added: bool,
    },
}

// ---------------------------------------------------------------------------
// Room-scope events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// A user entered the room.
    UserJoined { user: UserInfo },

    /// A user left the room.
    UserLeft { name: String },

    /// Room chat.
    Say { name: String, text: String },

    /// A game was created in the room.
    GameCreated { game: GameInfo },

    /// A listed game changed (seat counts, started flag).
    GameUpdated { game: GameInfo },

    /// A game ended and was removed from the room's list.
    GameRemoved { game_id: GameId },
}

// ---------------------------------------------------------------------------
// Game-scope events
// ---------------------------------------------------------------------------

/// One game state change, as seen by a particular participant.
///
/// Card names and ids inside these events are already filtered: a card
/// another player cannot see carries [`CardId::HIDDEN`] and no name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// A player or spectator joined. Zone contents in `player` are
    /// filtered for the receiver.
    Joined { player: PlayerInfo },

    /// A participant left the game.
    Left { player_id: PlayerId },

    /// In-game chat.
    Say { player_id: PlayerId, text: String },

    /// A player selected a deck. Only the hash travels.
    DeckSelect { player_id: PlayerId, deck_hash: String },

    /// A player declared (or revoked) readiness.
    ReadyStart { player_id: PlayerId, ready: bool },

    /// All players were ready; the game began.
    GameStarted { active_player: PlayerId },

    /// A player conceded.
    Concede { player_id: PlayerId },

    /// A player shuffled a zone of theirs.
    Shuffle { player_id: PlayerId, zone: String },

    /// A die was rolled.
    RollDie {
        player_id: PlayerId,
        sides: u32,
        value: u32,
    },

    /// A player drew cards. `cards` is populated only for the drawing
    /// player (and omniscient spectators); everyone else gets the count
    /// with an empty list.
    DrawCards {
        player_id: PlayerId,
        count: usize,
        cards: Vec<CardInfo>,
    },

    /// A single card moved between zones. `position` is the card's
    /// index in the start zone; `card_name` is absent when the receiver
    /// may not see the card.
    MoveCard {
        player_id: PlayerId,
        card_id: CardId,
        card_name: Option<String>,
        start_zone: String,
        position: usize,
        target_zone: String,
        x: i32,
        y: i32,
        face_down: bool,
    },

    /// A token was created on the table.
    CreateToken {
        player_id: PlayerId,
        zone: String,
        card: CardInfo,
    },

    /// A card attribute changed.
    SetCardAttr {
        player_id: PlayerId,
        zone: String,
        card_id: CardId,
        attr: CardAttr,
        value: String,
    },

    /// A card was attached to another card, or detached when `target`
    /// is `None`.
    AttachCard {
        player_id: PlayerId,
        start_zone: String,
        card_id: CardId,
        target: Option<AttachRef>,
    },

    /// A player counter was created.
    CreateCounter { player_id: PlayerId, counter: Counter },

    /// A player counter changed value.
    SetCounter {
        player_id: PlayerId,
        counter_id: u64,
        value: i32,
    },

    /// A player counter was deleted.
    DelCounter { player_id: PlayerId, counter_id: u64 },

    /// The active player changed. `player_id` is who caused it.
    SetActivePlayer {
        player_id: PlayerId,
        active_player: PlayerId,
    },

    /// The active phase changed.
    SetActivePhase { player_id: PlayerId, phase: u32 },

    /// A player looked at a zone. Sent to everyone so the table knows;
    /// the zone contents go only to the requester via `revealed`.
    DumpZone {
        player_id: PlayerId,
        zone_owner: PlayerId,
        zone: String,
        number_cards: i32,
        revealed: Option<ZoneInfo>,
    },
}
