//! Wire protocol for Gridsync.
//!
//! Everything that crosses a socket is an [`Envelope`]. Its [`Payload`] is
//! either a [`SystemMessage`] (handshake, heartbeats, room membership,
//! snapshots, rejections) or opaque game bytes. Game bytes carry a
//! [`Request`](gridsync_core::Request) from client to server and a
//! [`Notification`](gridsync_core::Notification) from server to client,
//! both encoded with the same [`Codec`] as the envelope.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room (Request / Notification)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Envelope, Payload, PlayerId, RoomId, RoomListEntry, SystemMessage,
};
