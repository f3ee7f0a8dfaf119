use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    COLUMN_COUNT, ROW_COUNT,
    piece::{Anchor, Frame, PieceKind},
};

/// A single cell of the playing field.
///
/// Collision only distinguishes empty from non-empty cells. The material of a
/// locked cell is kept for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing occupies the cell.
    #[default]
    Empty,
    /// Occupied by the falling piece, which has not been locked yet.
    Ephemeral,
    /// Permanently occupied by a locked piece of the given kind.
    Locked(PieceKind),
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// Returns the character used by the text representation of a [`Grid`].
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Ephemeral => '*',
            Cell::Locked(kind) => kind.as_char(),
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Cell::Empty),
            '*' => Some(Cell::Ephemeral),
            _ => match PieceKind::from_char(c) {
                Some(kind) => Some(Cell::Locked(kind)),
                None => None,
            },
        }
    }
}

type GridRow = [Cell; COLUMN_COUNT];

const EMPTY_ROW: GridRow = [Cell::Empty; COLUMN_COUNT];

/// Fixed-size cell matrix of the playing field.
///
/// Row 0 is the top of the field and column 0 its left edge. Direct cell
/// access outside `[0, ROW_COUNT) × [0, COLUMN_COUNT)` is a contract
/// violation and panics.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Cell, Grid, PieceKind};
///
/// let mut grid = Grid::EMPTY;
/// grid.set_cell(19, 0, Cell::Locked(PieceKind::T));
/// assert!(!grid.is_empty(19, 0));
///
/// grid.reset_all();
/// assert!(grid.is_empty(19, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: [GridRow; ROW_COUNT],
}

impl Default for Grid {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Grid {
    pub const ROW_COUNT: usize = ROW_COUNT;
    pub const COLUMN_COUNT: usize = COLUMN_COUNT;

    pub const EMPTY: Self = Self {
        rows: [EMPTY_ROW; ROW_COUNT],
    };

    #[must_use]
    pub fn cell_at(&self, row: usize, col: usize) -> Cell {
        assert_in_bounds(row, col);
        self.rows[row][col]
    }

    /// Writes a cell unconditionally. Callers are responsible for the field invariants.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        assert_in_bounds(row, col);
        self.rows[row][col] = cell;
    }

    #[must_use]
    pub fn is_empty(&self, row: usize, col: usize) -> bool {
        self.cell_at(row, col).is_empty()
    }

    /// Resets every [`Cell::Ephemeral`] cell to [`Cell::Empty`].
    pub fn clear_ephemeral(&mut self) {
        for cell in self.rows.as_flattened_mut() {
            if *cell == Cell::Ephemeral {
                *cell = Cell::Empty;
            }
        }
    }

    /// Resets every cell to [`Cell::Empty`].
    pub fn reset_all(&mut self) {
        self.rows.fill(EMPTY_ROW);
    }

    /// Moves every row above `row` down by one, overwriting `row` itself,
    /// and clears the topmost row.
    pub fn shift_rows_down_from(&mut self, row: usize) {
        assert!(row < ROW_COUNT, "row {row} out of range 0..{ROW_COUNT}");
        self.rows.copy_within(0..row, 1);
        self.rows[0] = EMPTY_ROW;
    }

    /// Returns `true` when the row has no empty cell.
    #[must_use]
    pub fn is_row_full(&self, row: usize) -> bool {
        self.rows[row].iter().all(|cell| !cell.is_empty())
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; COLUMN_COUNT]> {
        self.rows.iter()
    }

    /// Checks whether `frame` fits inside the field at `anchor` without
    /// overlapping any non-empty cell.
    ///
    /// Anchors are unsigned, so the top and left bounds always hold; the
    /// frame's height and width bind against the bottom and right edges.
    #[must_use]
    pub fn can_place(&self, frame: &Frame, anchor: Anchor) -> bool {
        let (row0, col0) = (anchor.row(), anchor.col());
        if frame.height() > ROW_COUNT.saturating_sub(row0)
            || frame.width() > COLUMN_COUNT.saturating_sub(col0)
        {
            return false;
        }
        frame
            .filled_cells()
            .all(|(i, j)| self.rows[row0 + i][col0 + j].is_empty())
    }

    /// Writes `cell` into every filled sub-cell of `frame` placed at `anchor`.
    ///
    /// The placement must have been validated with [`Self::can_place`] (or
    /// be the piece's own current placement).
    pub fn stamp(&mut self, frame: &Frame, anchor: Anchor, cell: Cell) {
        for (i, j) in frame.filled_cells() {
            self.set_cell(anchor.row() + i, anchor.col() + j, cell);
        }
    }

    /// Creates a `Grid` from ASCII art, mainly for tests.
    ///
    /// `.` is an empty cell, `*` an ephemeral one and a piece letter
    /// (`I`, `O`, `S`, `Z`, `J`, `L`, `T`) a locked cell of that kind.
    /// Rows are listed top to bottom and aligned to the bottom of the field,
    /// so a fixture only has to spell out the rows it cares about.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        assert!(
            lines.len() <= ROW_COUNT,
            "at most {ROW_COUNT} rows expected, got {}",
            lines.len()
        );

        let mut grid = Self::EMPTY;
        let offset = ROW_COUNT - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let cells: Vec<Cell> = line
                .chars()
                .map(|c| {
                    Cell::from_char(c).unwrap_or_else(|| panic!("invalid cell character {c:?}"))
                })
                .collect();
            assert_eq!(
                cells.len(),
                COLUMN_COUNT,
                "each row must have exactly {COLUMN_COUNT} cells, got {} at row {i}",
                cells.len(),
            );
            grid.rows[offset + i].copy_from_slice(&cells);
        }
        grid
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.as_char())?;
            }
        }
        Ok(())
    }
}

fn assert_in_bounds(row: usize, col: usize) {
    assert!(
        row < ROW_COUNT && col < COLUMN_COUNT,
        "cell ({row}, {col}) outside {ROW_COUNT}x{COLUMN_COUNT} grid"
    );
}
