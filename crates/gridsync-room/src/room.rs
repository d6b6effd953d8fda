//! Room actor: an isolated Tokio task that owns one game session.
//!
//! The outside world talks to the actor through a bounded command channel.
//! Commands are handled strictly one at a time, so a move is validated,
//! applied, evaluated, and broadcast before the next command is looked at.

use gridsync_core::{
    GameSession, Mark, Notification, Phase, Request, Seat, SessionSnapshot,
};
use gridsync_protocol::{PlayerId, RoomId, RoomListEntry};
use tokio::sync::{mpsc, oneshot};

use crate::seats::Seats;
use crate::{Participants, RoomConfig, RoomError, SessionTransport};

/// What a room sends to a participant's connection handler or to a local
/// listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomOutbound {
    /// Full state, sent once right after joining or subscribing.
    Snapshot(SessionSnapshot),
    /// A session notification, in emission order.
    Notification(Notification),
    /// The recipient's last request was refused. Never broadcast.
    Rejected(String),
    /// A seated player left mid-match; the session accepts nothing more.
    Abandoned { player_id: PlayerId },
}

/// Channel sender for delivering outbound messages to one observer.
pub type PlayerSender = mpsc::UnboundedSender<RoomOutbound>;

pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<Seat, RoomError>>,
    },

    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Fire-and-forget. Rejections come back on the player's channel.
    Request {
        player_id: PlayerId,
        request: Request,
    },

    Subscribe { sender: PlayerSender },

    GetInfo { reply: oneshot::Sender<RoomInfo> },

    Shutdown,
}

/// Room metadata, not the game state itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub player_count: usize,
    pub spectator_count: usize,
    /// `true` while a player seat is free and the match has not started.
    pub joinable: bool,
}

impl RoomInfo {
    /// Nobody is seated or watching.
    pub fn is_empty(&self) -> bool {
        self.player_count == 0 && self.spectator_count == 0
    }
}

impl From<RoomInfo> for RoomListEntry {
    fn from(info: RoomInfo) -> Self {
        Self {
            room_id: info.room_id,
            player_count: info.player_count,
            spectator_count: info.spectator_count,
            phase: info.phase,
            joinable: info.joinable,
        }
    }
}

/// Cheap, cloneable handle to a running room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Seats `player_id` and registers its outbound channel. The channel
    /// immediately receives a [`RoomOutbound::Snapshot`].
    pub async fn join(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Queues a request from `player_id`. The room resolves the player's
    /// mark itself; callers cannot move on someone else's behalf.
    pub async fn request(
        &self,
        player_id: PlayerId,
        request: Request,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Request {
            player_id,
            request,
        })
        .await
    }

    pub async fn submit_move(
        &self,
        player_id: PlayerId,
        x: usize,
        y: usize,
    ) -> Result<(), RoomError> {
        self.request(player_id, Request::SubmitMove { x, y }).await
    }

    pub async fn request_rematch(
        &self,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        self.request(player_id, Request::RequestRematch).await
    }

    /// Registers a local listener on the host. It gets a snapshot first and
    /// then every broadcast, but no per-player diagnostics.
    pub async fn subscribe(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<RoomOutbound>, RoomError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.send(RoomCommand::Subscribe { sender: tx }).await?;
        Ok(rx)
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

struct RoomActor<T: SessionTransport> {
    room_id: RoomId,
    config: RoomConfig,
    session: GameSession,
    seats: Seats,
    transport: T,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor<Participants> {
    fn new(
        room_id: RoomId,
        config: RoomConfig,
        receiver: mpsc::Receiver<RoomCommand>,
    ) -> Self {
        Self {
            room_id,
            config,
            session: GameSession::new(),
            seats: Seats::default(),
            transport: Participants::new(),
            receiver,
        }
    }

    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(player_id, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let _ = reply.send(self.handle_leave(player_id));
                }
                RoomCommand::Request {
                    player_id,
                    request,
                } => self.handle_request(player_id, request),
                RoomCommand::Subscribe { sender } => {
                    let _ = sender.send(RoomOutbound::Snapshot(self.session.snapshot()));
                    self.transport.add_listener(sender);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        if self.seats.seat_of(player_id).is_some() {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }
        let phase = self.session.phase();
        if phase == Phase::Abandoned {
            return Err(RoomError::InvalidState(format!(
                "cannot join room {} in phase {phase}",
                self.room_id
            )));
        }

        let seat = match self.seats.free_mark() {
            Some(mark) if phase == Phase::WaitingForPlayers => Seat::Player(mark),
            _ if self.config.admits_spectator(self.seats.spectator_count()) => {
                Seat::Spectator
            }
            _ => return Err(RoomError::RoomFull(self.room_id)),
        };

        self.seats.take(player_id, seat);
        let _ = sender.send(RoomOutbound::Snapshot(self.session.snapshot()));
        self.transport.add_player(player_id, sender);
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            %seat,
            players = self.seats.player_count(),
            "player joined"
        );

        if self.seats.player_count() == 2 && phase == Phase::WaitingForPlayers {
            match self.session.start() {
                Ok(notifications) => {
                    tracing::info!(room_id = %self.room_id, "game started");
                    self.transport.broadcast_all(&notifications);
                }
                Err(e) => {
                    tracing::warn!(room_id = %self.room_id, error = %e, "start refused");
                }
            }
        }

        Ok(seat)
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        let seat = self
            .seats
            .vacate(player_id)
            .ok_or(RoomError::NotInRoom(player_id, self.room_id))?;
        self.transport.remove_player(player_id);

        tracing::info!(room_id = %self.room_id, %player_id, %seat, "player left");

        let seated = seat.mark().is_some();
        let started = self.session.phase() != Phase::WaitingForPlayers;
        if seated && started && self.session.abandon() {
            tracing::info!(room_id = %self.room_id, %player_id, "session abandoned");
            self.transport.announce(RoomOutbound::Abandoned { player_id });
        }
        Ok(())
    }

    fn handle_request(&mut self, player_id: PlayerId, request: Request) {
        let mark = match self.seats.seat_of(player_id) {
            Some(Seat::Player(mark)) => mark,
            Some(Seat::Spectator) => {
                tracing::debug!(room_id = %self.room_id, %player_id, "spectator request refused");
                self.reject(player_id, "spectators cannot act on the game".into());
                return;
            }
            None => {
                tracing::warn!(room_id = %self.room_id, %player_id, "request from non-member, ignoring");
                return;
            }
        };

        match request {
            Request::SubmitMove { x, y } => self.handle_move(player_id, mark, x, y),
            Request::RequestRematch => match self.session.request_rematch() {
                Ok(notifications) => self.transport.broadcast_all(&notifications),
                Err(e) => {
                    tracing::debug!(room_id = %self.room_id, %player_id, error = %e, "rematch refused");
                    self.reject(player_id, e.to_string());
                }
            },
        }
    }

    fn handle_move(&mut self, player_id: PlayerId, mark: Mark, x: usize, y: usize) {
        match self.session.submit_move(mark, x, y) {
            Ok(notifications) => self.transport.broadcast_all(&notifications),
            Err(e) => self.reject(player_id, e.to_string()),
        }
    }

    fn reject(&mut self, player_id: PlayerId, reason: String) {
        self.transport.notify(player_id, RoomOutbound::Rejected(reason));
    }

    fn info(&self) -> RoomInfo {
        let phase = self.session.phase();
        RoomInfo {
            room_id: self.room_id,
            phase,
            player_count: self.seats.player_count(),
            spectator_count: self.seats.spectator_count(),
            joinable: phase == Phase::WaitingForPlayers
                && self.seats.free_mark().is_some(),
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
pub(crate) fn spawn_room(room_id: RoomId, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    tokio::spawn(RoomActor::new(room_id, config, rx).run());
    RoomHandle {
        room_id,
        sender: tx,
    }
}
