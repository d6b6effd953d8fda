//! Client side of the wire protocol.
//!
//! [`GridsyncClient`] owns one WebSocket connection and, once seated, a
//! [`GameView`] that it keeps in step with the server by applying every
//! snapshot and notification before handing it to the caller.

use std::collections::VecDeque;
use std::time::Instant;

use gridsync_core::{
    BOARD_SIZE, GameView, Mark, MoveError, Notification, Request, Seat, SessionSnapshot,
};
use gridsync_protocol::{
    Codec, Envelope, JsonCodec, Payload, PlayerId, ProtocolError, RoomId, RoomListEntry,
    SystemMessage,
};
use gridsync_transport::{Connection, WebSocketConnection};

use crate::GridsyncError;
use crate::server::PROTOCOL_VERSION;

/// Something the server told this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Seated in a room. The view is reset for `seat`.
    Joined { room_id: RoomId, seat: Seat },
    /// The room's full state arrived and replaced the view.
    Snapshot,
    /// Already applied to the view when this is returned.
    Notification(Notification),
    /// The last request was refused and changed nothing.
    Rejected(String),
    Abandoned { player_id: PlayerId },
    HeartbeatAck { client_time: u64, server_time: u64 },
    RoomList(Vec<RoomListEntry>),
    Error { code: u16, message: String },
    Disconnected { reason: String },
}

/// A connected, authenticated player.
pub struct GridsyncClient {
    conn: WebSocketConnection,
    codec: JsonCodec,
    player_id: PlayerId,
    seq: u64,
    start: Instant,
    last_remote_seq: u64,
    room: Option<RoomId>,
    view: Option<GameView>,
    /// Events read while waiting for a specific reply.
    pending: VecDeque<ClientEvent>,
}

impl GridsyncClient {
    /// Connects to `addr` (`host:port`) and performs the handshake.
    ///
    /// # Errors
    /// [`GridsyncError::Remote`] if the server refuses the handshake,
    /// [`GridsyncError::Closed`] if it hangs up first.
    pub async fn connect(addr: &str, token: Option<&str>) -> Result<Self, GridsyncError> {
        let conn = gridsync_transport::connect(addr).await?;
        let mut client = Self {
            conn,
            codec: JsonCodec,
            player_id: PlayerId(0),
            seq: 1,
            start: Instant::now(),
            last_remote_seq: 0,
            room: None,
            view: None,
            pending: VecDeque::new(),
        };

        client
            .send_system(SystemMessage::Handshake {
                version: PROTOCOL_VERSION,
                token: token.map(str::to_string),
            })
            .await?;

        let envelope = client.recv_envelope().await?.ok_or(GridsyncError::Closed)?;
        match envelope.payload {
            Payload::System(SystemMessage::HandshakeAck { player_id, .. }) => {
                client.player_id = player_id;
                tracing::debug!(%player_id, "handshake complete");
                Ok(client)
            }
            Payload::System(SystemMessage::Error { code, message }) => {
                Err(GridsyncError::Remote { code, message })
            }
            other => Err(ProtocolError::InvalidMessage(format!(
                "expected HandshakeAck, got {other:?}"
            ))
            .into()),
        }
    }

    /// Takes a seat in any waiting room, or opens a new one.
    pub async fn join_or_create(&mut self) -> Result<(RoomId, Seat), GridsyncError> {
        self.send_system(SystemMessage::JoinOrCreate).await?;
        self.wait_for_join().await
    }

    pub async fn join_room(&mut self, room_id: RoomId) -> Result<Seat, GridsyncError> {
        self.send_system(SystemMessage::JoinRoom { room_id }).await?;
        let (_, seat) = self.wait_for_join().await?;
        Ok(seat)
    }

    /// Asks the server to place the local player's mark at `(x, y)`.
    ///
    /// Coordinates outside the board are refused here without a round trip.
    /// Everything else is judged by the server; a refusal comes back as
    /// [`ClientEvent::Rejected`].
    pub async fn submit_move(&mut self, x: usize, y: usize) -> Result<(), GridsyncError> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(MoveError::OutOfRange { x, y }.into());
        }
        self.send_request(Request::SubmitMove { x, y }).await
    }

    pub async fn request_rematch(&mut self) -> Result<(), GridsyncError> {
        self.send_request(Request::RequestRematch).await
    }

    pub async fn heartbeat(&mut self) -> Result<(), GridsyncError> {
        let client_time = self.elapsed_ms();
        self.send_system(SystemMessage::Heartbeat { client_time })
            .await
    }

    /// Every live room on the server, ordered by ID.
    pub async fn list_rooms(&mut self) -> Result<Vec<RoomListEntry>, GridsyncError> {
        self.send_system(SystemMessage::ListRooms).await?;
        loop {
            match self.read_event().await? {
                Some(ClientEvent::RoomList(rooms)) => return Ok(rooms),
                Some(ClientEvent::Error { code, message }) => {
                    return Err(GridsyncError::Remote { code, message });
                }
                Some(event) => self.pending.push_back(event),
                None => return Err(GridsyncError::Closed),
            }
        }
    }

    pub async fn leave(&mut self) -> Result<(), GridsyncError> {
        self.send_system(SystemMessage::LeaveRoom).await?;
        self.room = None;
        self.view = None;
        Ok(())
    }

    pub async fn disconnect(mut self, reason: &str) -> Result<(), GridsyncError> {
        self.send_system(SystemMessage::Disconnect {
            reason: reason.to_string(),
        })
        .await?;
        self.conn.close().await?;
        Ok(())
    }

    /// The next event from the server, or `None` once the connection is
    /// closed.
    pub async fn next_event(&mut self) -> Result<Option<ClientEvent>, GridsyncError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        self.read_event().await
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.room
    }

    /// The local replica, present while seated in a room.
    pub fn view(&self) -> Option<&GameView> {
        self.view.as_ref()
    }

    pub fn local_player(&self) -> Option<Mark> {
        self.view.as_ref().and_then(GameView::local_player)
    }

    pub fn current_player(&self) -> Option<Mark> {
        self.view.as_ref().and_then(GameView::current_player)
    }

    pub fn scores(&self) -> (u32, u32) {
        self.view.as_ref().map_or((0, 0), GameView::scores)
    }

    async fn wait_for_join(&mut self) -> Result<(RoomId, Seat), GridsyncError> {
        loop {
            match self.read_event().await? {
                Some(ClientEvent::Joined { room_id, seat }) => return Ok((room_id, seat)),
                Some(ClientEvent::Error { code, message }) => {
                    return Err(GridsyncError::Remote { code, message });
                }
                Some(event) => self.pending.push_back(event),
                None => return Err(GridsyncError::Closed),
            }
        }
    }

    /// Reads envelopes until one produces an event.
    async fn read_event(&mut self) -> Result<Option<ClientEvent>, GridsyncError> {
        loop {
            let Some(envelope) = self.recv_envelope().await? else {
                return Ok(None);
            };
            if let Some(event) = self.apply(envelope.payload)? {
                return Ok(Some(event));
            }
        }
    }

    /// Updates room and view state from one payload.
    fn apply(&mut self, payload: Payload) -> Result<Option<ClientEvent>, GridsyncError> {
        let msg = match payload {
            Payload::Game(data) => {
                let notification: Notification = self.codec.decode(&data)?;
                if let Some(view) = self.view.as_mut() {
                    view.apply(&notification)?;
                }
                return Ok(Some(ClientEvent::Notification(notification)));
            }
            Payload::System(msg) => msg,
        };

        let event = match msg {
            SystemMessage::RoomJoined { room_id, seat } => {
                self.room = Some(room_id);
                self.view = Some(GameView::new(seat));
                ClientEvent::Joined { room_id, seat }
            }
            SystemMessage::RoomState { data } => {
                let snapshot: SessionSnapshot = self.codec.decode(&data)?;
                if let Some(view) = self.view.as_mut() {
                    view.apply_snapshot(snapshot);
                }
                ClientEvent::Snapshot
            }
            SystemMessage::Rejected { reason } => ClientEvent::Rejected(reason),
            SystemMessage::Abandoned { player_id } => {
                if let Some(view) = self.view.as_mut() {
                    view.abandon();
                }
                ClientEvent::Abandoned { player_id }
            }
            SystemMessage::HeartbeatAck {
                client_time,
                server_time,
            } => ClientEvent::HeartbeatAck {
                client_time,
                server_time,
            },
            SystemMessage::RoomList { rooms } => ClientEvent::RoomList(rooms),
            SystemMessage::Error { code, message } => ClientEvent::Error { code, message },
            SystemMessage::Disconnect { reason } => ClientEvent::Disconnected { reason },
            other => {
                tracing::debug!(?other, "ignoring unexpected system message");
                return Ok(None);
            }
        };
        Ok(Some(event))
    }

    async fn recv_envelope(&mut self) -> Result<Option<Envelope>, GridsyncError> {
        let Some(data) = self.conn.recv().await? else {
            return Ok(None);
        };
        let envelope: Envelope = self.codec.decode(&data)?;

        if envelope.seq != self.last_remote_seq + 1 {
            tracing::warn!(
                expected = self.last_remote_seq + 1,
                got = envelope.seq,
                "sequence gap from server"
            );
        }
        self.last_remote_seq = envelope.seq;
        Ok(Some(envelope))
    }

    async fn send_request(&mut self, request: Request) -> Result<(), GridsyncError> {
        let data = self.codec.encode(&request)?;
        self.send(Payload::Game(data)).await
    }

    async fn send_system(&mut self, msg: SystemMessage) -> Result<(), GridsyncError> {
        self.send(Payload::System(msg)).await
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

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
