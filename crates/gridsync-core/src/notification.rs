//! Values that flow into and out of a session.
//!
//! These are plain values, not wire bytes. The protocol layer decides how
//! they are framed; here we only fix their JSON shape with serde so that
//! every codec agrees on field names.

use serde::{Deserialize, Serialize};

use crate::Mark;

/// A state transition emitted by the authority, delivered to every
/// participant in emission order.
///
/// `#[serde(tag = "type")]` produces `{ "type": "MovePlaced", "x": 0, ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// The second player joined; `A` moves first.
    GameStarted,

    /// A mark was placed. The turn has passed to the other player.
    MovePlaced { x: usize, y: usize, player: Mark },

    /// `line_index` refers to the [`WinLineCatalog`](crate::WinLineCatalog).
    GameWon { line_index: usize, winner: Mark },

    /// The board filled up without a complete line.
    GameTied,

    /// The board was cleared and `A` moves first again.
    Rematch,

    /// Emitted whenever either score changes, right after `GameWon`.
    ScoreChanged { score_a: u32, score_b: u32 },
}

/// What a participant may ask of the authority.
///
/// The mover's identity is not part of the request: the authority takes it
/// from the connection the request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    SubmitMove { x: usize, y: usize },
    RequestRematch,
}
