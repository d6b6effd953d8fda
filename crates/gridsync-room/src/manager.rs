//! Room manager: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use gridsync_core::{Request, Seat};
use gridsync_protocol::{PlayerId, RoomId};
use tokio::sync::mpsc;

use crate::room::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo, RoomOutbound};

static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Owns the handle of every live room and the player → room index.
///
/// A player is in at most one room at a time. Sessions are reached only
/// through the handles held here, never through a global.
pub struct RoomManager {
    config: RoomConfig,
    rooms: HashMap<RoomId, RoomHandle>,
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Spawns a new, empty room.
    pub fn create_room(&mut self) -> RoomId {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room(room_id, self.config.clone());
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Seats a player in a specific room.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        self.ensure_roomless(player_id, room_id)?;
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;

        let seat = handle.join(player_id, sender).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok(seat)
    }

    /// Takes a free player seat in the oldest waiting room, or opens a new
    /// room when none is waiting.
    pub async fn join_or_create(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(RoomId, Seat), RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *current));
        }

        let mut candidates: Vec<RoomId> = self.rooms.keys().copied().collect();
        candidates.sort();
        for room_id in candidates {
            let Some(handle) = self.rooms.get(&room_id) else {
                continue;
            };
            let Ok(info) = handle.get_info().await else {
                continue;
            };
            if !info.joinable {
                continue;
            }
            if let Ok(seat) = handle.join(player_id, sender.clone()).await {
                self.player_rooms.insert(player_id, room_id);
                return Ok((room_id, seat));
            }
        }

        let room_id = self.create_room();
        let handle = self.rooms.get(&room_id).expect("room was just inserted");
        let seat = handle.join(player_id, sender).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok((room_id, seat))
    }

    /// Removes a player from their room. A room left with nobody in it is
    /// shut down.
    pub async fn leave_room(&mut self, player_id: PlayerId) -> Result<RoomId, RoomError> {
        let room_id = self
            .player_rooms
            .remove(&player_id)
            .ok_or(RoomError::NoRoom(player_id))?;

        let Some(handle) = self.rooms.get(&room_id) else {
            return Ok(room_id);
        };
        handle.leave(player_id).await?;
        let info = handle.get_info().await;

        match info {
            Ok(info) if info.is_empty() => self.destroy_room(room_id).await?,
            Ok(_) => {}
            Err(e) => tracing::warn!(%room_id, error = %e, "room did not report after leave"),
        }
        Ok(room_id)
    }

    /// Forwards a request to the sender's room.
    pub async fn route_request(
        &self,
        player_id: PlayerId,
        request: Request,
    ) -> Result<(), RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NoRoom(player_id))?;
        let handle = self.rooms.get(room_id).ok_or(RoomError::NotFound(*room_id))?;
        handle.request(player_id, request).await
    }

    /// Registers a local listener on a room.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
    ) -> Result<mpsc::UnboundedReceiver<RoomOutbound>, RoomError> {
        self.handle(room_id)?.subscribe().await
    }

    pub async fn get_room_info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        self.handle(room_id)?.get_info().await
    }

    /// Info for every live room, ordered by room ID. Rooms that fail to
    /// answer are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                infos.push(info);
            }
        }
        infos.sort_by_key(|info| info.room_id);
        infos
    }

    /// Shuts a room down and forgets everyone in it.
    pub async fn destroy_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self.rooms.remove(&room_id).ok_or(RoomError::NotFound(room_id))?;
        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, rid| *rid != room_id);
        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    pub fn player_room(&self, player_id: PlayerId) -> Option<RoomId> {
        self.player_rooms.get(&player_id).copied()
    }

    pub fn handle(&self, room_id: RoomId) -> Result<&RoomHandle, RoomError> {
        self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))
    }

    /// Cloned handles, for callers that must not hold the manager lock
    /// across awaits.
    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    fn ensure_roomless(&self, player_id: PlayerId, target: RoomId) -> Result<(), RoomError> {
        match self.player_rooms.get(&player_id) {
            None => Ok(()),
            Some(current) if *current == target => {
                Err(RoomError::AlreadyInRoom(player_id, target))
            }
            Some(current) => Err(RoomError::InvalidState(format!(
                "player {player_id} is already in room {current}"
            ))),
        }
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
