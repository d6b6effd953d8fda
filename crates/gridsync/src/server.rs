//! `GridsyncServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room. Every accepted
//! socket gets its own handler task; every room is its own actor task.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gridsync_protocol::{Codec, JsonCodec, PlayerId, RoomId};
use gridsync_room::{RoomConfig, RoomInfo, RoomManager, RoomOutbound};
use gridsync_transport::{Transport, WebSocketTransport};
use tokio::sync::{Mutex, mpsc};

use crate::handler::handle_connection;
use crate::{Authenticator, GridsyncError};

/// Clients must send this version in their handshake.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Timeouts {
    pub(crate) handshake: Duration,
    pub(crate) idle: Duration,
}

/// Shared by every connection handler.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    /// Players with a live connection. A second socket for the same player
    /// is refused.
    pub(crate) connected: Mutex<HashSet<PlayerId>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) timeouts: Timeouts,
}

/// Builder for configuring and starting a Gridsync server.
///
/// ```rust,no_run
/// use gridsync::prelude::*;
///
/// # async fn run() -> Result<(), GridsyncError> {
/// let server = GridsyncServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(AnonymousAuthenticator::new())
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GridsyncServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    timeouts: Timeouts,
}

impl GridsyncServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            timeouts: Timeouts {
                handshake: Duration::from_secs(5),
                idle: Duration::from_secs(15),
            },
        }
    }

    /// Address to listen on. Port `0` picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// How long a new socket may take to send its `Handshake`.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.handshake = timeout;
        self
    }

    /// How long a connected client may stay silent before it is dropped.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.idle = timeout;
        self
    }

    /// Binds the listener. Uses [`JsonCodec`] on the wire.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<GridsyncServer<A, JsonCodec>, GridsyncError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.room_config)),
            connected: Mutex::new(HashSet::new()),
            auth,
            codec: JsonCodec,
            timeouts: self.timeouts,
        });

        Ok(GridsyncServer { transport, state })
    }
}

impl Default for GridsyncServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gridsync server. Call [`run`](Self::run) to start accepting.
pub struct GridsyncServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
}

impl<A, C> GridsyncServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    pub fn local_addr(&self) -> Result<SocketAddr, GridsyncError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle for host-side code that keeps working after `run` has
    /// consumed the server.
    pub fn handle(&self) -> ServerHandle<A, C> {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Accepts connections until the process ends.
    pub async fn run(mut self) -> Result<(), GridsyncError> {
        tracing::info!("Gridsync server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Host-side view of a running server's rooms.
pub struct ServerHandle<A: Authenticator, C: Codec> {
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> Clone for ServerHandle<A, C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: Authenticator, C: Codec> ServerHandle<A, C> {
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let handles = self.state.rooms.lock().await.room_handles();
        let mut infos = Vec::with_capacity(handles.len());
        for handle in &handles {
            if let Ok(info) = handle.get_info().await {
                infos.push(info);
            }
        }
        infos.sort_by_key(|info| info.room_id);
        infos
    }

    /// Registers a local listener on a room. It receives a snapshot and then
    /// the same notifications as the remote participants.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
    ) -> Result<mpsc::UnboundedReceiver<RoomOutbound>, GridsyncError> {
        let handle = self.state.rooms.lock().await.handle(room_id)?.clone();
        Ok(handle.subscribe().await?)
    }

    pub async fn player_room(&self, player_id: PlayerId) -> Option<RoomId> {
        self.state.rooms.lock().await.player_room(player_id)
    }

    pub async fn connected_players(&self) -> usize {
        self.state.connected.lock().await.len()
    }
}
