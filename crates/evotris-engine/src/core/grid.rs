use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GridParseError;

use super::{GRID_HEIGHT, GRID_WIDTH, piece::Piece};

/// Cell id of an empty cell. Locked cells carry the color id (`1..=7`) of the
/// piece that filled them.
pub const EMPTY_CELL: u8 = 0;

/// A single row of cell ids.
pub type GridRow = [u8; GRID_WIDTH];

/// The 10×20 playfield.
///
/// Row 0 is the top of the board and `y` grows downward. The grid never changes
/// size: clearing lines shifts rows down and refills the top with empty rows.
///
/// # Example
///
/// ```
/// use evotris_engine::Grid;
///
/// let grid = Grid::from_ascii(&["##########", "#####.####"]).unwrap();
/// assert_eq!(grid.filled_rows(), 1);
/// assert_eq!(grid.column_top(5), Some(Grid::HEIGHT - 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: [GridRow; GRID_HEIGHT],
}

impl Default for Grid {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Grid {
    pub const WIDTH: usize = GRID_WIDTH;
    pub const HEIGHT: usize = GRID_HEIGHT;

    pub const EMPTY: Self = Self {
        rows: [[EMPTY_CELL; GRID_WIDTH]; GRID_HEIGHT],
    };

    /// Builds a grid from text rows aligned to the bottom of the board.
    ///
    /// `.` is an empty cell, a digit `1..=7` keeps its color id and any other
    /// character becomes a filled cell with id 1.
    pub fn from_ascii(lines: &[&str]) -> Result<Self, GridParseError> {
        if lines.len() > GRID_HEIGHT {
            return Err(GridParseError::TooManyRows { rows: lines.len() });
        }
        let mut grid = Self::EMPTY;
        let offset = GRID_HEIGHT - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let cells = line.chars().collect::<Vec<_>>();
            if cells.len() != GRID_WIDTH {
                return Err(GridParseError::RowWidth {
                    row: i,
                    len: cells.len(),
                });
            }
            for (x, ch) in cells.into_iter().enumerate() {
                grid.rows[offset + i][x] = match ch {
                    '.' => EMPTY_CELL,
                    '1'..='7' => ch as u8 - b'0',
                    _ => 1,
                };
            }
        }
        Ok(grid)
    }

    /// Returns the cell id at `(x, y)`, or `None` outside the board.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<u8> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.rows.get(y)?.get(x).copied()
    }

    /// Returns `true` for in-bounds empty cells only.
    #[must_use]
    pub fn is_vacant(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == Some(EMPTY_CELL)
    }

    pub fn set_cell(&mut self, x: usize, y: usize, id: u8) {
        self.rows[y][x] = id;
    }

    pub fn rows(&self) -> impl Iterator<Item = &GridRow> {
        self.rows.iter()
    }

    /// Writes the piece's cells into the grid.
    ///
    /// Cells that fall outside the board are ignored; callers only lock pieces
    /// that passed [`Piece::is_colliding`].
    pub fn lock_piece(&mut self, piece: &Piece) {
        for (x, y, id) in piece.occupied_cells() {
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y))
                && x < GRID_WIDTH
                && y < GRID_HEIGHT
            {
                self.rows[y][x] = id;
            }
        }
    }

    /// Returns a scratch copy of this grid with the piece locked in.
    #[must_use]
    pub fn with_piece(&self, piece: &Piece) -> Self {
        let mut grid = self.clone();
        grid.lock_piece(piece);
        grid
    }

    #[must_use]
    pub fn is_row_filled(&self, y: usize) -> bool {
        self.rows[y].iter().all(|&c| c != EMPTY_CELL)
    }

    /// Number of completely filled rows.
    #[must_use]
    pub fn filled_rows(&self) -> usize {
        (0..GRID_HEIGHT).filter(|&y| self.is_row_filled(y)).count()
    }

    /// Number of non-empty cells on the board.
    #[must_use]
    pub fn filled_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|&&c| c != EMPTY_CELL)
            .count()
    }

    /// Row index of the topmost filled cell in column `x`.
    #[must_use]
    pub fn column_top(&self, x: usize) -> Option<usize> {
        (0..GRID_HEIGHT).find(|&y| self.rows[y][x] != EMPTY_CELL)
    }

    /// Removes filled rows and returns how many were removed.
    ///
    /// Remaining rows keep their order and move down; the same number of empty
    /// rows is inserted at the top.
    pub fn clear_lines(&mut self) -> usize {
        let mut count = 0;
        for y in (0..GRID_HEIGHT).rev() {
            if self.is_row_filled(y) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y + count] = self.rows[y];
            }
        }
        self.rows[..count].fill([EMPTY_CELL; GRID_WIDTH]);
        count
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for &cell in row {
                let ch = if cell == EMPTY_CELL {
                    '.'
                } else {
                    char::from(b'0' + cell)
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
