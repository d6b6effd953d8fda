//! Fan-out from the authority to everyone watching a session.

use gridsync_core::Notification;
use gridsync_protocol::PlayerId;

use crate::{PlayerSender, RoomOutbound};

/// Where a room delivers what its session emits.
///
/// Notifications are symmetric: every participant and every local listener
/// receives the same sequence, in the order the session emitted it. Only
/// rejection diagnostics are addressed to a single participant.
pub trait SessionTransport {
    /// Delivers a room-level message to everyone.
    fn announce(&mut self, outbound: RoomOutbound);

    /// Delivers to one participant only. Listeners never see these.
    fn notify(&mut self, player_id: PlayerId, outbound: RoomOutbound);

    fn broadcast(&mut self, notification: &Notification) {
        self.announce(RoomOutbound::Notification(*notification));
    }

    /// Broadcasts a batch, preserving its order.
    fn broadcast_all(&mut self, notifications: &[Notification]) {
        for n in notifications {
            self.broadcast(n);
        }
    }
}

#[derive(Debug)]
enum Observer {
    Player(PlayerId),
    Listener,
}

/// Ordered registry of outbound channels: remote participants plus local
/// listeners on the host.
///
/// Channels whose receiver is gone are dropped on the next delivery.
#[derive(Debug, Default)]
pub struct Participants {
    entries: Vec<(Observer, PlayerSender)>,
}

impl Participants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a participant. A second registration for the same player
    /// replaces the first channel.
    pub fn add_player(&mut self, player_id: PlayerId, sender: PlayerSender) {
        self.remove_player(player_id);
        self.entries.push((Observer::Player(player_id), sender));
    }

    pub fn add_listener(&mut self, sender: PlayerSender) {
        self.entries.push((Observer::Listener, sender));
    }

    /// Returns `true` if the player was registered.
    pub fn remove_player(&mut self, player_id: PlayerId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|(o, _)| !matches!(o, Observer::Player(p) if *p == player_id));
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionTransport for Participants {
    fn announce(&mut self, outbound: RoomOutbound) {
        self.entries.retain(|(observer, sender)| {
            let delivered = sender.send(outbound.clone()).is_ok();
            if !delivered {
                tracing::debug!(?observer, "dropping closed observer channel");
            }
            delivered
        });
    }

    fn notify(&mut self, player_id: PlayerId, outbound: RoomOutbound) {
        let target = self
            .entries
            .iter()
            .find(|(o, _)| matches!(o, Observer::Player(p) if *p == player_id));
        if let Some((_, sender)) = target {
            let _ = sender.send(outbound);
        }
    }
}
