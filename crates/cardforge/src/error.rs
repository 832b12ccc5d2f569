//! Unified error type for the Cardforge server.

use cardforge_game::GameError;
use cardforge_protocol::ProtocolError;
use cardforge_session::SessionError;
use cardforge_store::StoreError;
use cardforge_transport::TransportError;

/// Top-level error wrapping every layer's error type, so server code
/// can use `?` across layers.
#[derive(Debug, thiserror::Error)]
pub enum CardforgeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
