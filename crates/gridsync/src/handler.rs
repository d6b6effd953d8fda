//! Per-connection handler: handshake, routing, and delivery.
//!
//! Each accepted connection gets its own task running [`handle_connection`]:
//!   1. receive `Handshake`, check the version, authenticate the token
//!   2. refuse a second socket for an already connected player
//!   3. send `HandshakeAck`
//!   4. loop: forward room output to the socket, route inbound envelopes,
//!      drop the client once it has been silent past the idle timeout

use std::sync::Arc;
use std::time::Instant;

use gridsync_core::Request;
use gridsync_protocol::{
    Codec, Envelope, Payload, PlayerId, ProtocolError, RoomListEntry, SystemMessage,
};
use gridsync_room::{PlayerSender, RoomError, RoomOutbound};
use gridsync_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::{PROTOCOL_VERSION, ServerState};
use crate::{Authenticator, GridsyncError};

/// Removes the player from its room and from the connected set when the
/// handler exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct ConnectionGuard<A: Authenticator, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> Drop for ConnectionGuard<A, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            if rooms.player_room(player_id).is_some() {
                if let Err(e) = rooms.leave_room(player_id).await {
                    tracing::debug!(%player_id, error = %e, "leave on disconnect failed");
                }
            }
            drop(rooms);
            state.connected.lock().await.remove(&player_id);
            tracing::debug!(%player_id, "connection cleaned up");
        });
    }
}

/// Numbers and timestamps everything this server sends on one socket.
struct Outbox<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<'a, C: Codec> Outbox<'a, C> {
    fn new(conn: &'a WebSocketConnection, codec: &'a C) -> Self {
        Self {
            conn,
            codec,
            seq: 1,
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send(&mut self, payload: Payload) -> Result<(), GridsyncError> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.elapsed_ms(),
            payload,
        };
        self.seq += 1;
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn system(&mut self, msg: SystemMessage) -> Result<(), GridsyncError> {
        self.send(Payload::System(msg)).await
    }

    async fn error(&mut self, code: u16, message: impl Into<String>) -> Result<(), GridsyncError> {
        self.system(SystemMessage::Error {
            code,
            message: message.into(),
        })
        .await
    }

    /// Puts one room output on the wire.
    async fn forward(&mut self, outbound: RoomOutbound) -> Result<(), GridsyncError> {
        let payload = match outbound {
            RoomOutbound::Snapshot(snapshot) => Payload::System(SystemMessage::RoomState {
                data: self.codec.encode(&snapshot)?,
            }),
            RoomOutbound::Notification(notification) => {
                Payload::Game(self.codec.encode(&notification)?)
            }
            RoomOutbound::Rejected(reason) => {
                Payload::System(SystemMessage::Rejected { reason })
            }
            RoomOutbound::Abandoned { player_id } => {
                Payload::System(SystemMessage::Abandoned { player_id })
            }
        };
        self.send(payload).await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), GridsyncError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut out = Outbox::new(&conn, &state.codec);
    let player_id = perform_handshake(&conn, &state, &mut out).await?;

    if !state.connected.lock().await.insert(player_id) {
        tracing::warn!(%conn_id, %player_id, "duplicate connection refused");
        out.error(409, format!("player {player_id} is already connected"))
            .await?;
        let _ = conn.close().await;
        return Err(GridsyncError::DuplicatePlayer(player_id));
    }
    let _guard = ConnectionGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let server_time = out.elapsed_ms();
    out.system(SystemMessage::HandshakeAck {
        player_id,
        server_time,
    })
    .await?;
    tracing::info!(%conn_id, %player_id, "player connected");

    let (room_tx, mut room_rx) = mpsc::unbounded_channel();
    let idle = state.timeouts.idle;
    let mut deadline = tokio::time::Instant::now() + idle;

    loop {
        tokio::select! {
            biased;

            Some(outbound) = room_rx.recv() => {
                out.forward(outbound).await?;
            }

            received = conn.recv() => {
                let data = match received {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };
                deadline = tokio::time::Instant::now() + idle;

                let envelope: Envelope = match state.codec.decode(&data) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                        out.error(400, "malformed envelope").await?;
                        continue;
                    }
                };

                match envelope.payload {
                    Payload::System(msg) => {
                        let close =
                            handle_system_message(&state, player_id, msg, &room_tx, &mut out)
                                .await?;
                        if close {
                            break;
                        }
                    }
                    Payload::Game(data) => {
                        handle_request(&state, player_id, &data, &mut out).await?;
                    }
                }
            }

            () = tokio::time::sleep_until(deadline) => {
                tracing::info!(%player_id, "connection idle, dropping");
                let _ = out
                    .system(SystemMessage::Disconnect { reason: "idle timeout".into() })
                    .await;
                break;
            }
        }
    }

    let _ = conn.close().await;
    Ok(())
}

/// Receives `Handshake`, checks the version, and authenticates.
///
/// Refusals are reported to the client with an `Error` envelope before
/// the connection is dropped.
async fn perform_handshake<A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<A, C>,
    out: &mut Outbox<'_, C>,
) -> Result<PlayerId, GridsyncError>
where
    A: Authenticator,
    C: Codec,
{
    let data = match tokio::time::timeout(state.timeouts.handshake, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let (version, token) = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version, token }) => (version, token),
        _ => {
            out.error(400, "expected Handshake").await?;
            return Err(ProtocolError::InvalidMessage(
                "first message must be Handshake".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        out.error(
            400,
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    match state.auth.authenticate(token.as_deref().unwrap_or("")).await {
        Ok(player_id) => Ok(player_id),
        Err(e) => {
            tracing::debug!(error = %e, "authentication refused");
            out.error(401, "unauthorized").await?;
            Err(e.into())
        }
    }
}

/// Handles a system message. Returns `true` if the connection should close.
async fn handle_system_message<A, C>(
    state: &ServerState<A, C>,
    player_id: PlayerId,
    msg: SystemMessage,
    room_tx: &PlayerSender,
    out: &mut Outbox<'_, C>,
) -> Result<bool, GridsyncError>
where
    A: Authenticator,
    C: Codec,
{
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            let server_time = out.elapsed_ms();
            out.system(SystemMessage::HeartbeatAck {
                client_time,
                server_time,
            })
            .await?;
        }

        SystemMessage::JoinRoom { room_id } => {
            let result = state
                .rooms
                .lock()
                .await
                .join_room(player_id, room_id, room_tx.clone())
                .await;
            match result {
                Ok(seat) => out.system(SystemMessage::RoomJoined { room_id, seat }).await?,
                Err(e) => out.error(room_error_code(&e), e.to_string()).await?,
            }
        }

        SystemMessage::JoinOrCreate => {
            let result = state
                .rooms
                .lock()
                .await
                .join_or_create(player_id, room_tx.clone())
                .await;
            match result {
                Ok((room_id, seat)) => {
                    out.system(SystemMessage::RoomJoined { room_id, seat }).await?;
                }
                Err(e) => out.error(room_error_code(&e), e.to_string()).await?,
            }
        }

        SystemMessage::LeaveRoom => {
            let result = state.rooms.lock().await.leave_room(player_id).await;
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "leave room failed");
            }
        }

        SystemMessage::ListRooms => {
            let handles = state.rooms.lock().await.room_handles();
            let mut rooms = Vec::with_capacity(handles.len());
            for handle in &handles {
                if let Ok(info) = handle.get_info().await {
                    rooms.push(RoomListEntry::from(info));
                }
            }
            rooms.sort_by_key(|entry| entry.room_id);
            out.system(SystemMessage::RoomList { rooms }).await?;
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(%player_id, %reason, "client disconnected");
            return Ok(true);
        }

        other => {
            tracing::debug!(%player_id, ?other, "ignoring unexpected system message");
        }
    }

    Ok(false)
}

/// Decodes a game payload as a [`Request`] and routes it to the player's
/// room. The room replies through the player's channel, not here.
async fn handle_request<A, C>(
    state: &ServerState<A, C>,
    player_id: PlayerId,
    data: &[u8],
    out: &mut Outbox<'_, C>,
) -> Result<(), GridsyncError>
where
    A: Authenticator,
    C: Codec,
{
    let request: Request = match state.codec.decode(data) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(%player_id, error = %e, "undecodable request");
            out.error(400, format!("invalid game message: {e}")).await?;
            return Ok(());
        }
    };

    let result = state.rooms.lock().await.route_request(player_id, request).await;
    if let Err(e) = result {
        out.error(room_error_code(&e), e.to_string()).await?;
    }
    Ok(())
}

/// HTTP-style status for a room failure.
fn room_error_code(e: &RoomError) -> u16 {
    match e {
        RoomError::NotFound(_) => 404,
        RoomError::RoomFull(_) | RoomError::AlreadyInRoom(..) | RoomError::InvalidState(_) => 409,
        RoomError::NotInRoom(..) | RoomError::NoRoom(_) => 400,
        RoomError::Unavailable(_) => 503,
    }
}

#[cfg(test)]
mod tests {
    use gridsync_protocol::RoomId;

    use super::*;

    #[test]
    fn test_room_error_codes() {
        assert_eq!(room_error_code(&RoomError::NotFound(RoomId(1))), 404);
        assert_eq!(room_error_code(&RoomError::RoomFull(RoomId(1))), 409);
        assert_eq!(room_error_code(&RoomError::NoRoom(PlayerId(1))), 400);
        assert_eq!(room_error_code(&RoomError::Unavailable(RoomId(1))), 503);
    }
}
