//! Authoritative game state for Gridsync.
//!
//! This crate is the single source of truth for one 3×3 match between two
//! players. It knows nothing about sockets, rooms, or tasks: every operation
//! is a plain synchronous method that either rejects the request without
//! touching state, or mutates state and returns the notifications that
//! describe what happened, in the order they must be delivered.
//!
//! # Key types
//!
//! - [`Board`]: the 3×3 grid of [`Cell`]s
//! - [`WinLineCatalog`]: the 8 fixed win lines, built once per process
//! - [`TurnState`]: whose turn it is, cumulative scores, and the [`Phase`]
//! - [`GameSession`]: the orchestrator; the only writer of board and turn
//! - [`Notification`] / [`Request`]: what the session emits and accepts
//! - [`GameView`]: a participant's read-only replica, fed by notifications
//!
//! ```text
//! Request ──→ GameSession ──→ Vec<Notification> ──→ every GameView
//!                 │
//!           Board + TurnState
//! ```

mod board;
mod cell;
mod error;
mod line;
mod notification;
mod session;
mod turn;
mod view;

pub use board::{Board, BOARD_SIZE};
pub use cell::{Cell, Mark, Seat};
pub use error::{LifecycleError, MoveError};
pub use line::{Coord, Line, Orientation, WinLineCatalog, LINE_COUNT};
pub use notification::{Notification, Request};
pub use session::GameSession;
pub use turn::{Outcome, Phase, TurnState};
pub use view::{GameView, SessionSnapshot};
