//! Join order to identity.
//!
//! The lowest-ordinal joiner of a room plays `A`, the next one `B`. Anyone
//! after that watches, if the room allows it. A seat freed before the game
//! starts goes to the next joiner.

use gridsync_core::{Mark, Seat};
use gridsync_protocol::PlayerId;

#[derive(Debug, Default)]
pub(crate) struct Seats {
    a: Option<PlayerId>,
    b: Option<PlayerId>,
    spectators: Vec<PlayerId>,
}

impl Seats {
    pub(crate) fn seat_of(&self, player_id: PlayerId) -> Option<Seat> {
        if self.a == Some(player_id) {
            Some(Seat::Player(Mark::A))
        } else if self.b == Some(player_id) {
            Some(Seat::Player(Mark::B))
        } else if self.spectators.contains(&player_id) {
            Some(Seat::Spectator)
        } else {
            None
        }
    }

    /// The first free player seat, `A` before `B`.
    pub(crate) fn free_mark(&self) -> Option<Mark> {
        match (self.a, self.b) {
            (None, _) => Some(Mark::A),
            (Some(_), None) => Some(Mark::B),
            _ => None,
        }
    }

    pub(crate) fn take(&mut self, player_id: PlayerId, seat: Seat) {
        match seat {
            Seat::Player(Mark::A) => self.a = Some(player_id),
            Seat::Player(Mark::B) => self.b = Some(player_id),
            Seat::Spectator => self.spectators.push(player_id),
        }
    }

    /// Frees whatever seat `player_id` held and returns it.
    pub(crate) fn vacate(&mut self, player_id: PlayerId) -> Option<Seat> {
        let seat = self.seat_of(player_id)?;
        match seat {
            Seat::Player(Mark::A) => self.a = None,
            Seat::Player(Mark::B) => self.b = None,
            Seat::Spectator => self.spectators.retain(|p| *p != player_id),
        }
        Some(seat)
    }

    pub(crate) fn player_count(&self) -> usize {
        usize::from(self.a.is_some()) + usize::from(self.b.is_some())
    }

    pub(crate) fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.player_count() == 0 && self.spectators.is_empty()
    }
}
