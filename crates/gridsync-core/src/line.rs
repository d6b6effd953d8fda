//! Win lines and the catalog that enumerates them.
//!
//! The catalog is built once per process and shared read-only. Its order
//! is part of the game rules: when scanning for a winner, the first
//! complete line in catalog order is the one that is reported, and
//! notifications refer to lines by their index in this order.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{Board, Mark};

/// Number of lines on a 3×3 board: 3 rows, 3 columns, 2 diagonals.
pub const LINE_COUNT: usize = 8;

static STANDARD: LazyLock<WinLineCatalog> =
    LazyLock::new(WinLineCatalog::build);

/// A board coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Direction of a line, used by presentation to orient the strike-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
    /// From (0,0) to (2,2).
    DiagonalA,
    /// From (0,2) to (2,0).
    DiagonalB,
}

/// Three distinct coordinates that win when they share a mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    cells: [Coord; 3],
    center: Coord,
    orientation: Orientation,
}

impl Line {
    fn new(cells: [Coord; 3], orientation: Orientation) -> Self {
        Self {
            center: cells[1],
            cells,
            orientation,
        }
    }

    pub fn cells(&self) -> &[Coord; 3] {
        &self.cells
    }

    /// The middle cell, where presentation anchors the line graphic.
    pub fn center(&self) -> Coord {
        self.center
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the mark that owns all three cells, if one does.
    pub fn owner(&self, board: &Board) -> Option<Mark> {
        let [a, b, c] = self.cells.map(|coord| board.at(coord));
        match a.mark() {
            Some(mark) if a == b && b == c => Some(mark),
            _ => None,
        }
    }
}

/// The ordered, immutable set of all 8 win lines.
#[derive(Debug)]
pub struct WinLineCatalog {
    lines: [Line; LINE_COUNT],
}

impl WinLineCatalog {
    /// Returns the process-wide catalog.
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    fn build() -> Self {
        let row = |y| {
            Line::new(
                [Coord::new(0, y), Coord::new(1, y), Coord::new(2, y)],
                Orientation::Horizontal,
            )
        };
        let column = |x| {
            Line::new(
                [Coord::new(x, 0), Coord::new(x, 1), Coord::new(x, 2)],
                Orientation::Vertical,
            )
        };

        Self {
            lines: [
                row(0),
                row(1),
                row(2),
                column(0),
                column(1),
                column(2),
                Line::new(
                    [Coord::new(0, 0), Coord::new(1, 1), Coord::new(2, 2)],
                    Orientation::DiagonalA,
                ),
                Line::new(
                    [Coord::new(0, 2), Coord::new(1, 1), Coord::new(2, 0)],
                    Orientation::DiagonalB,
                ),
            ],
        }
    }

    /// Looks up a line by catalog index.
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Scans lines in catalog order and returns the first complete one
    /// as `(index, winner)`. Later lines are not inspected.
    pub fn find_winner(&self, board: &Board) -> Option<(usize, Mark)> {
        self.lines
            .iter()
            .enumerate()
            .find_map(|(index, line)| line.owner(board).map(|m| (index, m)))
    }
}
