//! Types that travel on the wire.

use std::fmt;

use gridsync_core::{Phase, Seat};
use serde::{Deserialize, Serialize};

/// A connected participant. Serialized as a bare number, displayed as `P-7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// One room, i.e. one running match. Displayed as `R-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    /// Seated players, at most 2.
    pub player_count: usize,
    pub spectator_count: usize,
    pub phase: Phase,
    /// `true` while a player seat is free.
    pub joinable: bool,
}

/// Messages handled by the server and client plumbing rather than by the
/// game session.
///
/// Internally tagged: `{ "type": "JoinRoom", "room_id": 4 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- connection ---------------------------------------------------------
    /// Client → Server, first message on every connection.
    Handshake { version: u32, token: Option<String> },

    /// Server → Client, reply to a successful handshake.
    HandshakeAck { player_id: PlayerId, server_time: u64 },

    /// Either direction.
    Disconnect { reason: String },

    /// Client → Server keep-alive. Any inbound message also counts.
    Heartbeat { client_time: u64 },

    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- rooms --------------------------------------------------------------
    /// Client → Server: join this specific room.
    JoinRoom { room_id: RoomId },

    /// Client → Server: take a free seat in any waiting room, or open one.
    JoinOrCreate,

    LeaveRoom,

    ListRooms,

    RoomList { rooms: Vec<RoomListEntry> },

    /// Server → Client: you are in `room_id` and sit in `seat`.
    RoomJoined { room_id: RoomId, seat: Seat },

    /// Server → Client: a codec-encoded
    /// [`SessionSnapshot`](gridsync_core::SessionSnapshot). Sent right after
    /// joining so late joiners catch up.
    RoomState { data: Vec<u8> },

    /// Server → Client: a seated player left mid-game and the session
    /// is over.
    Abandoned { player_id: PlayerId },

    /// Server → submitter only: the last request changed nothing.
    Rejected { reason: String },

    /// Server → Client. `code` follows HTTP conventions (400, 401, 404, 409).
    Error { code: u16, message: String },
}

/// The content of an envelope.
///
/// Adjacently tagged: `{ "type": "Game", "data": [123, 34, ...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),

    /// Codec-encoded `Request` or `Notification`.
    Game(Vec<u8>),
}

/// Every frame on the wire.
///
/// Each side numbers its own outbound envelopes from 1, so a gap in `seq`
/// means a lost or reordered frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    /// Milliseconds since the sender started.
    pub timestamp: u64,
    pub payload: Payload,
}
