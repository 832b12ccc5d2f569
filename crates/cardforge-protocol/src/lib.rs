//! Wire protocol for Cardforge.
//!
//! This crate defines the language clients and servers speak:
//!
//! - **Types** ([`ResponseCode`], [`RoomId`], [`CardInfo`], ...): the
//!   shared data model.
//! - **Commands** ([`ClientMessage`], [`Command`], [`RoomCmd`],
//!   [`GameCmd`]): what clients send.
//! - **Events** ([`ServerMessage`], [`ResponseData`], the event enums):
//!   what servers send.
//! - **Codec** ([`Codec`], [`JsonCodec`]): item bytes.
//! - **Registry** ([`registry`]): scoped tag lookup and the pre-decode
//!   gate that turns unknown item types into non-fatal errors.
//!
//! The protocol layer sits between transport (frames) and session
//! (user identity). It knows nothing about connections or rooms, only
//! about the items that travel inside frames.

mod codec;
mod commands;
mod error;
mod events;
pub mod registry;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use commands::{ClientMessage, Command, CommandContainer, GameCmd, RoomCmd};
pub use error::ProtocolError;
pub use events::{
    GameEvent, ResponseData, RoomEvent, ServerMessage, SessionEvent,
};
pub use types::{
    AttachRef, CardAttr, CardCounter, CardId, CardInfo, CardToMove, Counter,
    DeckDir, DeckFile, GameId, GameInfo, ListKind, PROTOCOL_VERSION, PlayerId,
    PlayerInfo, ResponseCode, RoomDetails, RoomId, RoomInfo, UserInfo,
    UserLevel, ZoneInfo, ZoneKind,
};
