//! Participant-side replica of a session.
//!
//! The authority never shares its [`GameSession`](crate::GameSession).
//! Instead it publishes a [`SessionSnapshot`] when someone joins and a
//! stream of [`Notification`]s afterwards. A [`GameView`] applies the same
//! transitions to a local, read-only copy, so every participant answers
//! queries from the latest state it has received.

use serde::{Deserialize, Serialize};

use crate::{
    Board, Cell, Line, Mark, MoveError, Notification, Outcome, Phase, Seat,
    TurnState, WinLineCatalog,
};

/// Everything a participant needs to rebuild the session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub(crate) board: Board,
    pub(crate) turn: TurnState,
}

impl SessionSnapshot {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Option<Mark> {
        self.turn.current_player()
    }

    pub fn scores(&self) -> (u32, u32) {
        self.turn.scores()
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }
}

/// A participant's local copy of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    seat: Seat,
    board: Board,
    turn: TurnState,
}

impl GameView {
    /// An empty view for a participant who has just been seated.
    pub fn new(seat: Seat) -> Self {
        Self {
            seat,
            board: Board::new(),
            turn: TurnState::new(),
        }
    }

    /// Replaces the local state wholesale.
    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.board = snapshot.board;
        self.turn = snapshot.turn;
    }

    /// Applies one notification, mirroring the authority's transition.
    ///
    /// # Errors
    /// [`MoveError::OutOfRange`] if a `MovePlaced` names a cell outside the
    /// board. The view is left unchanged in that case.
    pub fn apply(&mut self, notification: &Notification) -> Result<(), MoveError> {
        match *notification {
            Notification::GameStarted => {
                self.board.reset();
                self.turn = TurnState::from_parts(
                    Some(Mark::A),
                    self.turn.scores(),
                    Phase::InProgress,
                );
            }
            Notification::MovePlaced { x, y, player } => {
                self.board.set(x, y, Cell::Marked(player))?;
                self.turn.pass_turn_from(player);
            }
            Notification::GameWon { line_index, winner } => {
                self.turn
                    .end_without_scoring(Outcome::Won { line_index, winner });
            }
            Notification::GameTied => {
                self.turn.end_without_scoring(Outcome::Tied);
            }
            Notification::Rematch => {
                self.board.reset();
                self.turn.begin();
            }
            Notification::ScoreChanged { score_a, score_b } => {
                self.turn.set_scores(score_a, score_b);
            }
        }
        Ok(())
    }

    /// Records that the session was torn down by the room.
    pub fn abandon(&mut self) {
        self.turn.abandon();
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// This participant's mark. `None` for spectators.
    pub fn local_player(&self) -> Option<Mark> {
        self.seat.mark()
    }

    pub fn current_player(&self) -> Option<Mark> {
        self.turn.current_player()
    }

    /// `(score_a, score_b)`.
    pub fn scores(&self) -> (u32, u32) {
        self.turn.scores()
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns `true` if this participant may move right now.
    pub fn is_my_turn(&self) -> bool {
        self.local_player().is_some()
            && self.local_player() == self.current_player()
    }

    /// The completed line when the last game was won.
    pub fn winning_line(&self) -> Option<&'static Line> {
        match self.turn.phase() {
            Phase::Terminal(Outcome::Won { line_index, .. }) => {
                WinLineCatalog::standard().get(line_index)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coord, GameSession, Orientation};

    /// Drives an authoritative session and a replica side by side.
    fn replay(
        session: &mut GameSession,
        view: &mut GameView,
        notifications: Vec<Notification>,
    ) {
        for n in &notifications {
            view.apply(n).unwrap();
        }
        assert_eq!(view.board(), session.board());
        assert_eq!(view.current_player(), session.current_player());
        assert_eq!(view.scores(), session.scores());
        assert_eq!(view.phase(), session.phase());
    }

    #[test]
    fn test_new_view_is_waiting() {
        let view = GameView::new(Seat::Player(Mark::B));
        assert_eq!(view.local_player(), Some(Mark::B));
        assert_eq!(view.current_player(), None);
        assert_eq!(view.scores(), (0, 0));
        assert_eq!(view.phase(), Phase::WaitingForPlayers);
        assert!(!view.is_my_turn());
    }

    #[test]
    fn test_view_tracks_authority_through_a_full_game() {
        let mut session = GameSession::new();
        let mut view = GameView::new(Seat::Player(Mark::A));

        let out = session.start().unwrap();
        replay(&mut session, &mut view, out);
        assert!(view.is_my_turn());

        let moves = [(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)];
        let mut player = Mark::A;
        for (x, y) in moves {
            let out = session.submit_move(player, x, y).unwrap();
            replay(&mut session, &mut view, out);
            player = player.other();
        }

        assert_eq!(view.scores(), (1, 0));
        let line = view.winning_line().expect("game was won");
        assert_eq!(line.orientation(), Orientation::Vertical);
        assert_eq!(line.center(), Coord::new(0, 1));

        let out = session.request_rematch().unwrap();
        replay(&mut session, &mut view, out);
        assert_eq!(view.winning_line(), None);
        assert_eq!(view.scores(), (1, 0));
    }

    #[test]
    fn test_spectator_view_never_has_the_turn() {
        let mut view = GameView::new(Seat::Spectator);
        view.apply(&Notification::GameStarted).unwrap();
        assert_eq!(view.local_player(), None);
        assert_eq!(view.current_player(), Some(Mark::A));
        assert!(!view.is_my_turn());
    }

    #[test]
    fn test_snapshot_catches_up_a_late_joiner() {
        let mut session = GameSession::new();
        session.start().unwrap();
        session.submit_move(Mark::A, 2, 2).unwrap();
        session.submit_move(Mark::B, 0, 0).unwrap();

        let mut view = GameView::new(Seat::Spectator);
        view.apply_snapshot(session.snapshot());

        assert_eq!(view.board(), session.board());
        assert_eq!(view.current_player(), Some(Mark::A));

        // Later notifications continue from the snapshot.
        let out = session.submit_move(Mark::A, 1, 1).unwrap();
        replay(&mut session, &mut view, out);
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut session = GameSession::new();
        session.start().unwrap();
        session.submit_move(Mark::A, 1, 0).unwrap();

        let bytes = serde_json::to_vec(&session.snapshot()).unwrap();
        let decoded: SessionSnapshot = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded, session.snapshot());
        assert_eq!(decoded.board().get(1, 0).unwrap(), Cell::Marked(Mark::A));
    }

    #[test]
    fn test_apply_rejects_out_of_range_move() {
        let mut view = GameView::new(Seat::Player(Mark::A));
        view.apply(&Notification::GameStarted).unwrap();
        let before = view.clone();

        let result = view.apply(&Notification::MovePlaced {
            x: 4,
            y: 0,
            player: Mark::A,
        });

        assert_eq!(result, Err(MoveError::OutOfRange { x: 4, y: 0 }));
        assert_eq!(view, before);
    }

    #[test]
    fn test_abandon_clears_turn() {
        let mut view = GameView::new(Seat::Player(Mark::A));
        view.apply(&Notification::GameStarted).unwrap();
        view.abandon();
        assert_eq!(view.phase(), Phase::Abandoned);
        assert_eq!(view.current_player(), None);
    }
}
