//! The 3×3 grid.

use serde::{Deserialize, Serialize};

use crate::{Cell, Coord, MoveError};

/// Width and height of the board.
pub const BOARD_SIZE: usize = 3;

/// A 3×3 grid of cells addressed by `(x, y)`: `x` is the column and `y`
/// the row, both in `0..3`.
///
/// The board is pure data. It checks coordinates but not legality; turn
/// order and occupancy are left to [`GameSession`](crate::GameSession).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    /// Row-major: `rows[y][x]`.
    rows: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at `(x, y)`.
    ///
    /// # Errors
    /// [`MoveError::OutOfRange`] if either coordinate is outside `0..3`.
    pub fn get(&self, x: usize, y: usize) -> Result<Cell, MoveError> {
        check_bounds(x, y)?;
        Ok(self.rows[y][x])
    }

    /// Overwrites the cell at `(x, y)`.
    ///
    /// # Errors
    /// [`MoveError::OutOfRange`] if either coordinate is outside `0..3`.
    pub fn set(
        &mut self,
        x: usize,
        y: usize,
        cell: Cell,
    ) -> Result<(), MoveError> {
        check_bounds(x, y)?;
        self.rows[y][x] = cell;
        Ok(())
    }

    /// Returns `true` if no cell is empty.
    pub fn is_full(&self) -> bool {
        self.rows.iter().flatten().all(|cell| !cell.is_empty())
    }

    /// Clears every cell.
    pub fn reset(&mut self) {
        self.rows = Default::default();
    }

    /// Number of marked cells.
    pub fn marked_count(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| !cell.is_empty()).count()
    }

    /// Iterates over every cell with its coordinate, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, cell)| (Coord::new(x, y), *cell))
        })
    }

    /// Infallible lookup for coordinates that are known to be in range
    /// (catalog lines).
    pub(crate) fn at(&self, coord: Coord) -> Cell {
        self.rows[coord.y][coord.x]
    }
}

fn check_bounds(x: usize, y: usize) -> Result<(), MoveError> {
    if x >= BOARD_SIZE || y >= BOARD_SIZE {
        return Err(MoveError::OutOfRange { x, y });
    }
    Ok(())
}
