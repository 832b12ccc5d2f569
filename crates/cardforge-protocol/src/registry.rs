//! Wire type-name registry and the pre-decode gate built on it.
//!
//! Clients and servers evolve independently, so an item whose `type`
//! tag this build has never heard of must be dropped, not treated as a
//! malformed frame. Plain serde gives one undifferentiated decode error
//! for both cases, so [`decode_client_message`] inspects the tags first:
//! a tag missing from the registry yields the non-fatal
//! [`ProtocolError::UnknownType`], and only structurally bad JSON
//! yields the fatal [`ProtocolError::Decode`].
//!
//! Tags are scoped. "Say" and "Leave" exist in both the room and game
//! namespaces and are looked up against the scope they appear in.

use std::collections::HashSet;
use std::sync::OnceLock;

#[cfg(feature = "json")]
use crate::commands::ClientMessage;
use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Registered tag sets
// ---------------------------------------------------------------------------

/// Top-level client item tags.
fn client_item_tags() -> &'static HashSet<&'static str> {
    static TAGS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    TAGS.get_or_init(|| HashSet::from(["Hello", "Container"]))
}

/// Session-scope command tags.
fn command_tags() -> &'static HashSet<&'static str> {
    static TAGS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    TAGS.get_or_init(|| {
        HashSet::from([
            "Ping",
            "Login",
            "Message",
            "ListRooms",
            "JoinRoom",
            "AddToList",
            "RemoveFromList",
            "DeckList",
            "DeckNewDir",
            "DeckDelDir",
            "DeckDel",
            "DeckUpload",
            "DeckDownload",
            "BanFromServer",
            "BroadcastMessage",
            "ShutdownServer",
            "Room",
            "Game",
        ])
    })
}

/// Room-scope command tags.
fn room_cmd_tags() -> &'static HashSet<&'static str> {
    static TAGS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    TAGS.get_or_init(|| HashSet::from(["Leave", "Say", "CreateGame", "JoinGame"]))
}

/// Game-scope command tags.
fn game_cmd_tags() -> &'static HashSet<&'static str> {
    static TAGS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    TAGS.get_or_init(|| {
        HashSet::from([
            "Leave",
            "Say",
            "SetDeck",
            "Shuffle",
            "RollDie",
            "DrawCards",
            "MoveCard",
            "CreateToken",
            "SetCardAttr",
            "CreateCounter",
            "SetCounter",
            "IncCounter",
            "DelCounter",
            "SetActivePlayer",
            "SetActivePhase",
            "NextTurn",
            "AttachCard",
            "DetachCard",
            "DumpZone",
            "ReadyStart",
            "Concede",
        ])
    })
}

/// Reports whether `tag` is a registered tag in the given scope.
pub fn is_registered(scope: TagScope, tag: &str) -> bool {
    match scope {
        TagScope::ClientItem => client_item_tags().contains(tag),
        TagScope::Command => command_tags().contains(tag),
        TagScope::RoomCmd => room_cmd_tags().contains(tag),
        TagScope::GameCmd => game_cmd_tags().contains(tag),
    }
}

/// The namespace a wire tag is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScope {
    ClientItem,
    Command,
    RoomCmd,
    GameCmd,
}

// ---------------------------------------------------------------------------
// Pre-decode gate
// ---------------------------------------------------------------------------

/// Decodes one client frame payload, distinguishing unknown item types
/// from malformed frames.
///
/// # Errors
/// - [`ProtocolError::UnknownType`] when any tag in the frame is
///   unregistered (caller should drop the frame and keep the
///   connection).
/// - [`ProtocolError::Decode`] when the payload is not valid JSON or
///   doesn't match the message shape (fatal).
/// - [`ProtocolError::InvalidMessage`] when required structure (the
///   `type` tag itself) is missing.
#[cfg(feature = "json")]
pub fn decode_client_message(payload: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(ProtocolError::Decode)?;

    check_tag(&value, TagScope::ClientItem)?;

    if value["type"] == "Container" {
        let commands = value["data"]["commands"]
            .as_array()
            .ok_or_else(|| {
                ProtocolError::InvalidMessage("container without commands array".into())
            })?;
        for command in commands {
            check_tag(command, TagScope::Command)?;
            match command["type"].as_str() {
                Some("Room") => check_tag(&command["cmd"], TagScope::RoomCmd)?,
                Some("Game") => check_tag(&command["cmd"], TagScope::GameCmd)?,
                _ => {}
            }
        }
    }

    serde_json::from_value(value).map_err(ProtocolError::Decode)
}

#[cfg(feature = "json")]
fn check_tag(value: &serde_json::Value, scope: TagScope) -> Result<(), ProtocolError> {
    let tag = value["type"].as_str().ok_or_else(|| {
        ProtocolError::InvalidMessage("item without a type tag".into())
    })?;
    if is_registered(scope, tag) {
        Ok(())
    } else {
        Err(ProtocolError::UnknownType(tag.to_owned()))
    }
}
