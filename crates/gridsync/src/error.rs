//! Unified error type for Gridsync.

use gridsync_core::MoveError;
use gridsync_protocol::{PlayerId, ProtocolError};
use gridsync_room::RoomError;
use gridsync_transport::TransportError;

use crate::AuthError;

/// Top-level error wrapping every layer's error.
///
/// `#[from]` lets `?` lift sub-crate errors without explicit mapping.
#[derive(Debug, thiserror::Error)]
pub enum GridsyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A move the client refused to send because it can never be legal.
    #[error(transparent)]
    Move(#[from] MoveError),

    /// The same player is already connected on another socket.
    #[error("player {0} is already connected")]
    DuplicatePlayer(PlayerId),

    /// The server answered with `SystemMessage::Error`.
    #[error("server error {code}: {message}")]
    Remote { code: u16, message: String },

    /// The peer closed the connection while a reply was expected.
    #[error("connection closed")]
    Closed,
}
