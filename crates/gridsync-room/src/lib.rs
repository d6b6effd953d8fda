//! Room hosting for Gridsync.
//!
//! A room is one match. It runs as its own Tokio task that owns the
//! [`GameSession`](gridsync_core::GameSession), so every move for that match
//! is validated and applied by exactly one writer, one command at a time.
//! Rooms never share state; any number of them run side by side.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates and destroys rooms, tracks who is where
//! - [`RoomHandle`]: cloneable sender for commands to one room
//! - [`SessionTransport`]: how a room fans results out to participants
//! - [`RoomConfig`]: channel size and spectator policy

mod config;
mod error;
mod manager;
mod room;
mod seats;
mod transport;

pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo, RoomOutbound};
pub use transport::{Participants, SessionTransport};
