//! Error types for the session layer.

use cardforge_transport::ConnectionId;

/// Errors that can occur in the session layer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session exists for this connection.
    #[error("no session for {0}")]
    NotFound(ConnectionId),

    /// Another connection is already logged in under this name.
    #[error("name already in use: {0}")]
    NameInUse(String),

    /// The connection is already past this point in the auth ladder.
    #[error("connection {0} is already authenticated")]
    AlreadyLoggedIn(ConnectionId),

    /// A container arrived with a `cmd_id` at or below the watermark;
    /// it has already been dispatched and must not run again.
    #[error("stale command id {cmd_id} (watermark {watermark})")]
    StaleCommandId { cmd_id: u64, watermark: u64 },
}
