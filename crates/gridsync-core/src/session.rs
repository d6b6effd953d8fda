//! The authoritative session: validates requests, mutates state, and
//! reports what happened.

use crate::{
    Board, Cell, LifecycleError, Mark, MoveError, Notification, Outcome,
    Phase, SessionSnapshot, TurnState, WinLineCatalog,
};

/// One match between two players, owned by exactly one authority.
///
/// Every mutating method runs to completion before returning: the move is
/// applied, the terminal scan has run, and the returned notifications are
/// in the order they must reach participants. A rejected request returns
/// `Err` and leaves the session untouched.
///
/// `GameSession` is not `Clone`; other components observe it
/// through [`snapshot`](Self::snapshot) or the notifications it returns.
#[derive(Debug)]
pub struct GameSession {
    board: Board,
    turn: TurnState,
    catalog: &'static WinLineCatalog,
}

impl GameSession {
    /// Creates a session waiting for its second player.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: TurnState::new(),
            catalog: WinLineCatalog::standard(),
        }
    }

    /// Starts the first game once both players are present.
    ///
    /// # Errors
    /// - [`LifecycleError::AlreadyStarted`] if the session left the lobby
    /// - [`LifecycleError::Abandoned`] after [`abandon`](Self::abandon)
    pub fn start(&mut self) -> Result<Vec<Notification>, LifecycleError> {
        match self.turn.phase() {
            Phase::WaitingForPlayers => {}
            Phase::Abandoned => return Err(LifecycleError::Abandoned),
            _ => return Err(LifecycleError::AlreadyStarted),
        }
        self.turn.begin();
        tracing::info!("game started");
        Ok(vec![Notification::GameStarted])
    }

    /// Places `player`'s mark at `(x, y)`.
    ///
    /// Checks run in this order: coordinate range, turn, occupancy. The
    /// first failure is returned and nothing changes.
    ///
    /// On success the result always starts with `MovePlaced`, followed by
    /// either `GameWon` + `ScoreChanged`, `GameTied`, or nothing.
    pub fn submit_move(
        &mut self,
        player: Mark,
        x: usize,
        y: usize,
    ) -> Result<Vec<Notification>, MoveError> {
        if let Err(e) = self.validate_move(player, x, y) {
            tracing::debug!(%player, x, y, reason = %e, "move rejected");
            return Err(e);
        }

        self.board.set(x, y, Cell::Marked(player))?;
        let mut out = vec![Notification::MovePlaced { x, y, player }];
        self.turn.advance();
        self.evaluate_terminal(&mut out);
        Ok(out)
    }

    fn validate_move(
        &self,
        player: Mark,
        x: usize,
        y: usize,
    ) -> Result<(), MoveError> {
        let cell = self.board.get(x, y)?;
        let current = self.turn.current_player();
        if current != Some(player) {
            return Err(MoveError::TurnViolation { player, current });
        }
        if !cell.is_empty() {
            return Err(MoveError::CellOccupied { x, y });
        }
        Ok(())
    }

    /// Runs after every accepted move. A single placed mark can complete
    /// at most one new line, so stopping at the first match in catalog
    /// order never hides a second winner.
    fn evaluate_terminal(&mut self, out: &mut Vec<Notification>) {
        if let Some((line_index, winner)) = self.catalog.find_winner(&self.board)
        {
            self.turn.finish(Outcome::Won { line_index, winner });
            let (score_a, score_b) = self.turn.scores();
            tracing::info!(%winner, line_index, score_a, score_b, "game won");
            out.push(Notification::GameWon { line_index, winner });
            out.push(Notification::ScoreChanged { score_a, score_b });
        } else if self.board.is_full() {
            self.turn.finish(Outcome::Tied);
            tracing::info!("game tied");
            out.push(Notification::GameTied);
        }
    }

    /// Clears the board and gives the first move back to `A`. Scores are
    /// kept. Calling it repeatedly just resets again.
    ///
    /// # Errors
    /// - [`LifecycleError::NotStarted`] while waiting for the second player
    /// - [`LifecycleError::Abandoned`] after [`abandon`](Self::abandon)
    pub fn request_rematch(
        &mut self,
    ) -> Result<Vec<Notification>, LifecycleError> {
        match self.turn.phase() {
            Phase::WaitingForPlayers => return Err(LifecycleError::NotStarted),
            Phase::Abandoned => return Err(LifecycleError::Abandoned),
            Phase::InProgress | Phase::Terminal(_) => {}
        }
        self.board.reset();
        self.turn.begin();
        let (score_a, score_b) = self.turn.scores();
        tracing::info!(score_a, score_b, "rematch");
        Ok(vec![Notification::Rematch])
    }

    /// Marks the session as torn down. No further move or rematch is
    /// accepted. Returns `false` if it was already abandoned.
    pub fn abandon(&mut self) -> bool {
        if self.turn.phase() == Phase::Abandoned {
            return false;
        }
        self.turn.abandon();
        tracing::info!("session abandoned");
        true
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
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

    /// A full copy of the replicated state, for participants that join
    /// after notifications have already been sent.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.clone(),
            turn: self.turn.clone(),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
