//! Errors raised while turning messages into bytes and back.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Malformed, truncated, or mistyped input.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Well-formed bytes that break a protocol rule, such as a game
    /// payload arriving before the handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
