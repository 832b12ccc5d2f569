//! Core protocol types for Cardforge's wire format.
//!
//! Everything in this module travels on the wire: identifiers, the
//! response-code enumeration, and the "info" structures that describe
//! server state to a client (rooms, games, players, zones, cards).
//!
//! Wire items are serde-derived; tagged enums carry their type name in
//! the `type` field, which is also the name the item registry knows
//! them by.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The protocol version both peers must agree on exactly.
///
/// There is no backward compatibility across versions: a mismatched
/// hello fails the connection.
pub const PROTOCOL_VERSION: u32 = 14;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room.
///
/// Newtype over `u64` so a `RoomId` can never be passed where a
/// `GameId` is expected. `#[serde(transparent)]` keeps the JSON a
/// plain number. Ordered so registries can keep rooms in id order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room-{}", self.0)
    }
}

/// A unique identifier for a game within the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-{}", self.0)
    }
}

/// A player's seat number within one game. Not stable across games.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// A card's stable identifier within one game.
///
/// Signed because `-1` is the anonymized value carried by events whose
/// recipient is not allowed to track the card. Cards inside hidden
/// zones have ids, but commands address them by list position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct CardId(pub i64);

impl CardId {
    /// The id carried by events when the recipient may not see the card.
    pub const HIDDEN: CardId = CardId(-1);
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// The privilege ladder. Ordered: a moderator can do everything a
/// registered user can, an admin everything a moderator can.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    Guest,
    Registered,
    Moderator,
    Admin,
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Registered => write!(f, "registered"),
            Self::Moderator => write!(f, "moderator"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The outcome attached to every processed command container.
///
/// Exactly one of these goes back per container. `Nothing` is the
/// sentinel meaning "a handler already attached a richer response";
/// it never travels on the wire as a final code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    Nothing,
    Ok,
    NotInRoom,
    InternalError,
    InvalidCommand,
    InvalidData,
    NameNotFound,
    LoginNeeded,
    FunctionNotAllowed,
    GameNotStarted,
    GameFull,
    ContextError,
    WrongPassword,
    SpectatorsNotAllowed,
    OnlyBuddies,
    UserLevelTooLow,
    InIgnoreList,
    WouldOverwriteOldSession,
    ChatFlood,
}

/// A zone's visibility policy.
///
/// - `Private`: contents visible to the owner only (a hand).
/// - `Public`: contents visible to everyone (the table, a graveyard).
/// - `Hidden`: contents visible to nobody; the owner may temporarily
///   reveal the top N via a zone dump. Cards here are addressed by
///   list position, not id, because identity is deliberately not
///   observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Private,
    Public,
    Hidden,
}

/// Which per-user list an add/remove targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Buddy,
    Ignore,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buddy => write!(f, "buddy"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

/// A mutable card attribute settable by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardAttr {
    Tapped,
    FaceDown,
    Annotation,
    Pt,
    Color,
}

// ---------------------------------------------------------------------------
// Info structures (server state as seen by a client)
// ---------------------------------------------------------------------------

/// A user's public identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub level: UserLevel,
}

/// A room summary, as returned by room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub description: String,
    pub player_count: usize,
    pub game_count: usize,
    pub auto_join: bool,
}

/// Full room state delivered when a user joins a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetails {
    pub info: RoomInfo,
    pub users: Vec<UserInfo>,
    pub games: Vec<GameInfo>,
    pub game_types: Vec<String>,
}

/// A game's directory entry: everything a client needs to decide
/// whether (and how) it can join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub description: String,
    pub creator: UserInfo,
    pub has_password: bool,
    pub only_buddies: bool,
    pub spectators_allowed: bool,
    pub spectators_need_password: bool,
    pub spectators_can_talk: bool,
    pub spectators_see_everything: bool,
    pub max_players: usize,
    pub player_count: usize,
    pub spectator_count: usize,
    pub started: bool,
}

/// A named counter sitting on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCounter {
    pub name: String,
    pub color: String,
    pub value: i32,
}

/// A weak reference to the card another card is attached to.
///
/// Never an ownership edge: deleting the target detaches, it does not
/// cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachRef {
    pub player_id: PlayerId,
    pub zone: String,
    pub card_id: CardId,
}

/// One card as visible to a particular observer. The name is empty and
/// the id is [`CardId::HIDDEN`] when the observer may not see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: CardId,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub face_down: bool,
    pub tapped: bool,
    pub annotation: String,
    pub pt: String,
    pub color: String,
    pub counters: Vec<CardCounter>,
    pub attached_to: Option<AttachRef>,
}

/// A free-standing player counter (life, poison, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub id: u64,
    pub name: String,
    pub color: String,
    pub radius: i32,
    pub value: i32,
}

/// One zone as visible to a particular observer. `card_count` is always
/// accurate; `cards` may be empty when contents are not visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub name: String,
    pub kind: ZoneKind,
    pub has_coords: bool,
    pub card_count: usize,
    pub cards: Vec<CardInfo>,
}

/// One player's full in-game state as visible to a particular observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub user: UserInfo,
    pub spectator: bool,
    pub conceded: bool,
    pub ready_start: bool,
    pub deck_hash: String,
    pub zones: Vec<ZoneInfo>,
    pub counters: Vec<Counter>,
}

/// One card selected by a move command.
///
/// In a hidden source zone, `card_id.0` is the list position; anywhere
/// else it is the card's stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardToMove {
    pub card_id: CardId,
    pub face_down: bool,
}

// ---------------------------------------------------------------------------
// Deck storage tree
// ---------------------------------------------------------------------------

/// A stored deck file. `uploaded_at` is unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckFile {
    pub id: u64,
    pub name: String,
    pub uploaded_at: u64,
}

/// A deck folder with its subtree. The root has id 0 and an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckDir {
    pub id: u64,
    pub name: String,
    pub dirs: Vec<DeckDir>,
    pub files: Vec<DeckFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RoomId(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_room_ids_sort_by_value() {
        let mut ids = vec![RoomId(3), RoomId(1), RoomId(2)];
        ids.sort();
        assert_eq!(ids, vec![RoomId(1), RoomId(2), RoomId(3)]);
    }

    #[test]
    fn test_card_id_hidden_sentinel() {
        assert_eq!(CardId::HIDDEN, CardId(-1));
        let json = serde_json::to_string(&CardId::HIDDEN).unwrap();
        assert_eq!(json, "-1");
    }

    #[test]
    fn test_user_level_is_ordered() {
        assert!(UserLevel::Guest < UserLevel::Registered);
        assert!(UserLevel::Registered < UserLevel::Moderator);
        assert!(UserLevel::Moderator < UserLevel::Admin);
    }

    #[test]
    fn test_user_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserLevel::Moderator).unwrap(),
            "\"moderator\""
        );
    }

    #[test]
    fn test_response_code_round_trip() {
        let codes = [
            ResponseCode::Ok,
            ResponseCode::WouldOverwriteOldSession,
            ResponseCode::ChatFlood,
            ResponseCode::SpectatorsNotAllowed,
        ];
        for code in codes {
            let json = serde_json::to_string(&code).unwrap();
            let back: ResponseCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, back);
        }
    }

    #[test]
    fn test_list_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ListKind::Buddy).unwrap(),
            "\"buddy\""
        );
        assert_eq!(ListKind::Ignore.to_string(), "ignore");
    }

    #[test]
    fn test_deck_dir_round_trip() {
        let root = DeckDir {
            id: 0,
            name: String::new(),
            dirs: vec![DeckDir {
                id: 7,
                name: "Standard".into(),
                dirs: vec![],
                files: vec![DeckFile {
                    id: 12,
                    name: "Aggro".into(),
                    uploaded_at: 1_700_000_000,
                }],
            }],
            files: vec![],
        };
        let json = serde_json::to_vec(&root).unwrap();
        let back: DeckDir = serde_json::from_slice(&json).unwrap();
        assert_eq!(root, back);
    }
}
