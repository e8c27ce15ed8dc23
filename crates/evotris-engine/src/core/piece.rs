use serde::{Deserialize, Serialize};

use super::{GRID_WIDTH, grid::Grid};

const MAX_SHAPE_SIZE: usize = 4;

/// The seven tetromino kinds.
///
/// The discriminant order is also the base order of a fresh piece bag and
/// determines each kind's color id (`I = 1` .. `Z = 7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    pub const LEN: usize = 7;
    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::J,
        Self::L,
        Self::O,
        Self::S,
        Self::T,
        Self::Z,
    ];

    #[must_use]
    pub const fn color_id(self) -> u8 {
        self as u8 + 1
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::I => 'I',
            Self::J => 'J',
            Self::L => 'L',
            Self::O => 'O',
            Self::S => 'S',
            Self::T => 'T',
            Self::Z => 'Z',
        }
    }

    /// Spawn orientation of this kind.
    #[must_use]
    pub fn shape(self) -> Shape {
        let rows: &[&[u8]] = match self {
            Self::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            Self::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
        };
        Shape::from_mask(rows, self.color_id())
    }

    /// Spawn row; the I piece starts one row higher because its top row is blank.
    #[must_use]
    pub const fn spawn_y(self) -> i32 {
        match self {
            Self::I => -1,
            _ => 0,
        }
    }
}

/// A square cell matrix of size 2, 3 or 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    size: usize,
    cells: [[u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    fn from_mask(rows: &[&[u8]], id: u8) -> Self {
        let mut cells = [[0; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), rows.len());
            for (x, &filled) in row.iter().enumerate() {
                cells[y][x] = filled * id;
            }
        }
        Self {
            size: rows.len(),
            cells,
        }
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> u8 {
        self.cells[y][x]
    }

    /// One quarter turn: transpose, then reverse every row.
    #[must_use]
    pub fn rotated(&self) -> Self {
        let n = self.size;
        let mut cells = [[0; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in cells.iter_mut().enumerate().take(n) {
            for (x, cell) in row.iter_mut().enumerate().take(n) {
                *cell = self.cells[n - 1 - x][y];
            }
        }
        Self { size: n, cells }
    }

    /// Iterates `(dx, dy, id)` over the non-empty cells.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        (0..self.size).flat_map(move |y| {
            (0..self.size).filter_map(move |x| {
                let id = self.cells[y][x];
                (id != 0).then_some((x, y, id))
            })
        })
    }
}

/// A piece with its anchor position and rotation.
///
/// `x`/`y` address the top-left corner of the shape matrix and may be negative
/// or past the board edge; whether a state is legal is decided solely by
/// [`Piece::is_colliding`].
///
/// `Piece` is `Copy`, so deriving candidates from a template never shares
/// state between them.
///
/// # Example
///
/// ```
/// use evotris_engine::{Grid, Piece, PieceKind};
///
/// let grid = Grid::EMPTY;
/// let mut piece = Piece::new(PieceKind::T);
/// piece.reset();
/// assert!(piece.try_translate(&grid, -1));
/// assert!(piece.try_rotate(&grid));
/// assert_eq!(piece.rotation(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    shape: Shape,
    x: i32,
    y: i32,
    rotation: u8,
}

impl Piece {
    /// Creates a detached template at `(0, 0)` in spawn orientation.
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            x: 0,
            y: 0,
            rotation: 0,
        }
    }

    /// Returns a fresh template of the same kind, discarding position and rotation.
    #[must_use]
    pub fn original(&self) -> Self {
        Self::new(self.kind)
    }

    /// Moves the piece to its spawn position in spawn orientation.
    pub fn reset(&mut self) {
        *self = self.original();
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let x = ((GRID_WIDTH - self.shape.size) / 2) as i32;
        self.set_position(x, self.kind.spawn_y());
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Rotation index in `0..4`.
    #[must_use]
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Applies `steps` quarter turns without any collision check.
    pub fn rotate(&mut self, steps: u8) {
        for _ in 0..steps % 4 {
            self.shape = self.shape.rotated();
        }
        self.rotation = (self.rotation + steps % 4) % 4;
    }

    /// Iterates `(x, y, id)` board coordinates covered by the piece.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.shape
            .occupied()
            .map(|(dx, dy, id)| (self.x + dx as i32, self.y + dy as i32, id))
    }

    /// Returns `true` if any cell is outside the board or overlaps a filled cell.
    #[must_use]
    pub fn is_colliding(&self, grid: &Grid) -> bool {
        self.occupied_cells().any(|(x, y, _)| !grid.is_vacant(x, y))
    }

    /// Moves one row down; reverts and returns `false` on collision.
    pub fn try_drop(&mut self, grid: &Grid) -> bool {
        self.try_update(grid, |p| p.y += 1)
    }

    /// Moves `dx` columns; reverts and returns `false` on collision.
    pub fn try_translate(&mut self, grid: &Grid, dx: i32) -> bool {
        self.try_update(grid, |p| p.x += dx)
    }

    /// Rotates one step in place (no wall kicks); reverts and returns `false`
    /// on collision.
    pub fn try_rotate(&mut self, grid: &Grid) -> bool {
        self.try_update(grid, |p| p.rotate(1))
    }

    /// Returns `true` if the piece cannot move one row further down.
    #[must_use]
    pub fn is_resting(&self, grid: &Grid) -> bool {
        let mut below = *self;
        below.y += 1;
        below.is_colliding(grid)
    }

    fn try_update<F>(&mut self, grid: &Grid, f: F) -> bool
    where
        F: FnOnce(&mut Self),
    {
        let mut moved = *self;
        f(&mut moved);
        if moved.is_colliding(grid) {
            return false;
        }
        *self = moved;
        true
    }
}
