//! # Gridsync
//!
//! Authoritative state synchronization for a two-player 3×3 grid game.
//!
//! The server owns every match. Clients send requests over WebSocket; the
//! room hosting the match validates them against its
//! [`GameSession`](gridsync_core::GameSession) and broadcasts the resulting
//! notifications, in order, to everyone in the room. Each client keeps a
//! [`GameView`] replica that those notifications drive.
//!
//! ```text
//! GridsyncClient ──WebSocket──→ handler ──→ RoomManager ──→ room task
//!       ↑                                                      │
//!       └────────── snapshot + notifications ←─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridsync::prelude::*;
//!
//! # async fn demo() -> Result<(), GridsyncError> {
//! let server = GridsyncServerBuilder::new()
//!     .bind("127.0.0.1:9000")
//!     .build(AnonymousAuthenticator::new())
//!     .await?;
//! tokio::spawn(server.run());
//!
//! let mut client = GridsyncClient::connect("127.0.0.1:9000", None).await?;
//! let (room_id, seat) = client.join_or_create().await?;
//! println!("seated in {room_id} as {seat}");
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod error;
mod handler;
mod server;

pub use auth::{AnonymousAuthenticator, AuthError, Authenticator};
pub use client::{ClientEvent, GridsyncClient};
pub use error::GridsyncError;
pub use server::{GridsyncServer, GridsyncServerBuilder, PROTOCOL_VERSION, ServerHandle};

pub use gridsync_core::{
    BOARD_SIZE, Board, Cell, GameView, Line, Mark, MoveError, Notification, Phase, Request,
    Seat, SessionSnapshot, WinLineCatalog,
};
pub use gridsync_protocol::{Codec, JsonCodec, PlayerId, RoomId, RoomListEntry};
pub use gridsync_room::{RoomConfig, RoomInfo, RoomOutbound};

/// Everything a host or client program usually needs.
pub mod prelude {
    pub use crate::{
        AnonymousAuthenticator, AuthError, Authenticator, ClientEvent, GameView, GridsyncClient,
        GridsyncError, GridsyncServer, GridsyncServerBuilder, Mark, Notification, Phase,
        PlayerId, RoomConfig, RoomId, RoomOutbound, Seat, ServerHandle,
    };
}
