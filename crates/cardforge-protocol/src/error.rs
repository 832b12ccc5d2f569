//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating
/// protocol items.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Malformed JSON, missing fields, or a
    /// truncated payload.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The item's `type` tag is not registered in this build. Unknown
    /// items are dropped, not fatal; newer clients may speak to older
    /// servers.
    #[error("unknown item type: {0}")]
    UnknownType(String),

    /// The bytes decoded but violate protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The peer's handshake announced an incompatible protocol version.
    #[error("protocol version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },
}
