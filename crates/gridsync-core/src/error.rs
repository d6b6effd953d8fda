//! Error types for the game core.
//!
//! None of these are fatal to a session. A rejected request leaves the
//! board and turn state exactly as they were, and the next request is
//! evaluated normally.

use crate::Mark;

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The coordinate lies outside the 3×3 board. Well-formed clients
    /// never send this; it indicates a client bug.
    #[error("coordinate ({x}, {y}) is outside the 3x3 board")]
    OutOfRange { x: usize, y: usize },

    /// The mover does not hold the turn. `current` is `None` before the
    /// game starts and after it ends.
    #[error("player {player} moved out of turn")]
    TurnViolation { player: Mark, current: Option<Mark> },

    /// The target cell already holds a mark.
    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: usize, y: usize },
}

/// Why a lifecycle operation (start, rematch) was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The second player has not joined yet.
    #[error("game has not started")]
    NotStarted,

    /// `start` was called on a session that already left the lobby.
    #[error("game already started")]
    AlreadyStarted,

    /// A player left; the session accepts nothing further.
    #[error("session was abandoned")]
    Abandoned,
}
