//! Player marks, cell occupancy, and participant seats.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two players in a match.
///
/// The first participant to join a room is always `A` and moves first;
/// the second is `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    A,
    B,
}

impl Mark {
    /// Returns the opposing player.
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// The occupancy of a single board cell.
///
/// There is no separate "unset" value: a fresh board is all `Empty`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Cell {
    #[default]
    Empty,
    Marked(Mark),
}

impl Cell {
    /// Returns `true` if no player has marked this cell.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the mark occupying this cell, if any.
    pub fn mark(&self) -> Option<Mark> {
        match self {
            Self::Empty => None,
            Self::Marked(mark) => Some(*mark),
        }
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        Self::Marked(mark)
    }
}

/// Where a participant sits in a room.
///
/// Players hold a [`Mark`] for the lifetime of the room. Spectators only
/// ever receive broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "mark")]
pub enum Seat {
    Player(Mark),
    Spectator,
}

impl Seat {
    /// Returns the player's mark, or `None` for spectators.
    pub fn mark(&self) -> Option<Mark> {
        match self {
            Self::Player(mark) => Some(*mark),
            Self::Spectator => None,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(mark) => write!(f, "player {mark}"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}
