//! Room and game authority for Cardforge.
//!
//! This crate owns the rules: rooms and their rosters, games with their
//! seats, zones, cards, and counters, and every mutation on them. Each
//! game runs as an actor task ([`spawn_game`], [`GameHandle`]), which
//! serializes its commands and delivers visibility-filtered event
//! batches to each participant.
//!
//! Validation is strict and mutation-free: any command that fails
//! leaves the game untouched and maps to exactly one wire response code
//! via [`GameError::code`].

mod actor;
mod card;
mod error;
mod game;
mod manager;
mod player;
mod room;
mod visibility;
mod zone;

pub use actor::{EventSink, GameHandle, GameJoined, spawn_game};
pub use card::Card;
pub use error::GameError;
pub use game::{Game, GameSettings};
pub use manager::Rooms;
pub use player::Player;
pub use room::Room;
pub use visibility::{Observer, Scoped};
pub use zone::Zone;
