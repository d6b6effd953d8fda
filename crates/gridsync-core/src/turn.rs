//! Turn order, scores, and the session lifecycle phase.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Mark;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// `line_index` refers to the [`WinLineCatalog`](crate::WinLineCatalog).
    Won { line_index: usize, winner: Mark },
    Tied,
}

/// The lifecycle of a session.
///
/// ```text
/// WaitingForPlayers ──start──→ InProgress ──win/tie──→ Terminal
///                                  ↑                       │
///                                  └───────rematch─────────┘
///
/// any phase ──abandon──→ Abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    WaitingForPlayers,
    InProgress,
    Terminal(Outcome),
    Abandoned,
}

impl Phase {
    /// Returns `true` while moves can be accepted.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Terminal(Outcome::Won { winner, .. }) => {
                write!(f, "Terminal(Won by {winner})")
            }
            Self::Terminal(Outcome::Tied) => write!(f, "Terminal(Tied)"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}

/// Whose turn it is, the cumulative scores, and the current phase.
///
/// Only [`GameSession`](crate::GameSession) mutates this; everything else
/// sees it through `&` accessors or a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    current_player: Option<Mark>,
    score_a: u32,
    score_b: u32,
    phase: Phase,
}

impl TurnState {
    /// A fresh state: nobody may move, both scores zero.
    pub fn new() -> Self {
        Self {
            current_player: None,
            score_a: 0,
            score_b: 0,
            phase: Phase::WaitingForPlayers,
        }
    }

    /// The player allowed to move next, or `None` when no moves are
    /// accepted (before the start, after a win or tie, once abandoned).
    pub fn current_player(&self) -> Option<Mark> {
        self.current_player
    }

    /// `(score_a, score_b)`.
    pub fn scores(&self) -> (u32, u32) {
        (self.score_a, self.score_b)
    }

    pub fn score(&self, mark: Mark) -> u32 {
        match mark {
            Mark::A => self.score_a,
            Mark::B => self.score_b,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Hands the first turn to `A`. Used for the initial start and for
    /// every rematch; scores are left alone.
    pub(crate) fn begin(&mut self) {
        self.current_player = Some(Mark::A);
        self.phase = Phase::InProgress;
    }

    /// Passes the turn to the other player.
    pub(crate) fn advance(&mut self) {
        self.current_player = self.current_player.map(Mark::other);
    }

    /// Ends the game. A win credits the winner with exactly one point.
    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.current_player = None;
        self.phase = Phase::Terminal(outcome);
        if let Outcome::Won { winner, .. } = outcome {
            match winner {
                Mark::A => self.score_a += 1,
                Mark::B => self.score_b += 1,
            }
        }
    }

    pub(crate) fn abandon(&mut self) {
        self.current_player = None;
        self.phase = Phase::Abandoned;
    }

    /// Rebuilds a state from replicated values.
    pub(crate) fn from_parts(
        current_player: Option<Mark>,
        (score_a, score_b): (u32, u32),
        phase: Phase,
    ) -> Self {
        Self {
            current_player,
            score_a,
            score_b,
            phase,
        }
    }

    pub(crate) fn set_scores(&mut self, score_a: u32, score_b: u32) {
        self.score_a = score_a;
        self.score_b = score_b;
    }

    /// Replica-side mirror of `finish`: the scores arrive separately.
    pub(crate) fn end_without_scoring(&mut self, outcome: Outcome) {
        self.current_player = None;
        self.phase = Phase::Terminal(outcome);
    }

    /// Replica-side mirror of a placed move.
    pub(crate) fn pass_turn_from(&mut self, mover: Mark) {
        self.current_player = Some(mover.other());
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_turn_state_accepts_no_moves() {
        let turn = TurnState::new();
        assert_eq!(turn.current_player(), None);
        assert_eq!(turn.scores(), (0, 0));
        assert_eq!(turn.phase(), Phase::WaitingForPlayers);
    }

    #[test]
    fn test_begin_gives_turn_to_a() {
        let mut turn = TurnState::new();
        turn.begin();
        assert_eq!(turn.current_player(), Some(Mark::A));
        assert!(turn.phase().is_in_progress());
    }

    #[test]
    fn test_advance_alternates() {
        let mut turn = TurnState::new();
        turn.begin();
        turn.advance();
        assert_eq!(turn.current_player(), Some(Mark::B));
        turn.advance();
        assert_eq!(turn.current_player(), Some(Mark::A));
    }

    #[test]
    fn test_advance_without_current_player_stays_none() {
        let mut turn = TurnState::new();
        turn.advance();
        assert_eq!(turn.current_player(), None);
    }

    #[test]
    fn test_finish_with_win_scores_exactly_once() {
        let mut turn = TurnState::new();
        turn.begin();
        turn.finish(Outcome::Won {
            line_index: 4,
            winner: Mark::B,
        });
        assert_eq!(turn.current_player(), None);
        assert_eq!(turn.scores(), (0, 1));
        assert_eq!(turn.score(Mark::B), 1);
        assert!(turn.phase().is_terminal());
    }

    #[test]
    fn test_finish_with_tie_leaves_scores() {
        let mut turn = TurnState::new();
        turn.begin();
        turn.finish(Outcome::Tied);
        assert_eq!(turn.scores(), (0, 0));
        assert_eq!(turn.phase(), Phase::Terminal(Outcome::Tied));
    }

    #[test]
    fn test_begin_after_finish_keeps_scores() {
        let mut turn = TurnState::new();
        turn.begin();
        turn.finish(Outcome::Won {
            line_index: 0,
            winner: Mark::A,
        });
        turn.begin();
        assert_eq!(turn.scores(), (1, 0));
        assert_eq!(turn.current_player(), Some(Mark::A));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::InProgress.to_string(), "InProgress");
        assert_eq!(
            Phase::Terminal(Outcome::Won {
                line_index: 0,
                winner: Mark::A
            })
            .to_string(),
            "Terminal(Won by A)"
        );
        assert_eq!(Phase::Abandoned.to_string(), "Abandoned");
    }
}
