//! Error types for the room/game authority.

use cardforge_protocol::{GameId, ResponseCode, RoomId};

/// Errors produced while validating or applying room and game commands.
///
/// Every variant maps onto exactly one wire [`ResponseCode`]; nothing
/// about a failed command mutates state.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no such room: {0}")]
    RoomNotFound(RoomId),

    #[error("not a member of {0}")]
    NotInRoom(RoomId),

    #[error("no such game: {0}")]
    GameNotFound(GameId),

    #[error("not a participant of {0}")]
    NotInGame(GameId),

    #[error("game {0} is full")]
    GameFull(GameId),

    #[error("wrong password")]
    WrongPassword,

    #[error("game does not allow spectators")]
    SpectatorsNotAllowed,

    #[error("game is restricted to the host's buddies")]
    OnlyBuddies,

    #[error("game has not started")]
    NotStarted,

    /// The caller's role does not permit this: a spectator mutating the
    /// game, or peeking into a zone they don't own.
    #[error("not allowed: {0}")]
    NotAllowed(String),

    #[error("no such zone: {0}")]
    ZoneNotFound(String),

    #[error("card not found in {zone}")]
    CardNotFound { zone: String },

    #[error("no such counter: {0}")]
    CounterNotFound(u64),

    #[error("no such player seat: {0}")]
    PlayerNotFound(u64),

    /// Anything whose precondition no longer holds: acting on a started
    /// game as if unstarted (or vice versa), joining twice, targeting a
    /// card that just moved away.
    #[error("command out of context: {0}")]
    OutOfContext(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The game's actor task is gone; treated as an internal fault.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),
}

impl GameError {
    /// The wire code this error reports as.
    pub fn code(&self) -> ResponseCode {
        match self {
            Self::RoomNotFound(_) | Self::GameNotFound(_) => ResponseCode::NameNotFound,
            Self::NotInRoom(_) => ResponseCode::NotInRoom,
            Self::NotInGame(_) => ResponseCode::NotInRoom,
            Self::GameFull(_) => ResponseCode::GameFull,
            Self::WrongPassword => ResponseCode::WrongPassword,
            Self::SpectatorsNotAllowed => ResponseCode::SpectatorsNotAllowed,
            Self::OnlyBuddies => ResponseCode::OnlyBuddies,
            Self::NotStarted => ResponseCode::GameNotStarted,
            Self::NotAllowed(_) => ResponseCode::FunctionNotAllowed,
            Self::ZoneNotFound(_)
            | Self::CardNotFound { .. }
            | Self::CounterNotFound(_)
            | Self::PlayerNotFound(_)
            | Self::OutOfContext(_) => ResponseCode::ContextError,
            Self::InvalidData(_) => ResponseCode::InvalidData,
            Self::Unavailable(_) => ResponseCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_map_as_documented() {
        assert_eq!(GameError::NotInRoom(RoomId(1)).code(), ResponseCode::NotInRoom);
        assert_eq!(GameError::GameFull(GameId(1)).code(), ResponseCode::GameFull);
        assert_eq!(
            GameError::CardNotFound { zone: "table".into() }.code(),
            ResponseCode::ContextError
        );
        assert_eq!(GameError::NotStarted.code(), ResponseCode::GameNotStarted);
        assert_eq!(
            GameError::Unavailable(GameId(3)).code(),
            ResponseCode::InternalError
        );
    }
}
