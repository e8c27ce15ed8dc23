use crate::{
    SpawnCollisionError,
    core::{
        grid::Grid,
        piece::{Piece, PieceKind},
    },
};

use super::piece_bag::{PieceBag, PieceSeed};

/// Grid, falling piece and piece bag of one game.
#[derive(Debug, Clone)]
pub struct GameField {
    grid: Grid,
    falling_piece: Piece,
    piece_bag: PieceBag,
}

impl GameField {
    /// Creates an empty field and spawns the first piece of the seeded bag.
    #[must_use]
    pub fn new(seed: PieceSeed) -> Self {
        Self::with_grid(Grid::EMPTY, seed)
    }

    /// Creates a field with a prepared grid. The first piece is not checked for
    /// collisions; callers inspect [`GameField::is_topped_out`].
    #[must_use]
    pub fn with_grid(grid: Grid, seed: PieceSeed) -> Self {
        let mut piece_bag = PieceBag::new(seed);
        let falling_piece = spawn(piece_bag.pop_next());
        Self {
            grid,
            falling_piece,
            piece_bag,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn falling_piece(&self) -> &Piece {
        &self.falling_piece
    }

    /// The piece that spawns after the current one locks.
    #[must_use]
    pub fn next_piece(&self) -> PieceKind {
        self.piece_bag.peek_next()
    }

    #[must_use]
    pub fn is_topped_out(&self) -> bool {
        self.falling_piece.is_colliding(&self.grid)
    }

    pub fn try_translate(&mut self, dx: i32) -> bool {
        self.falling_piece.try_translate(&self.grid, dx)
    }

    pub fn try_drop(&mut self) -> bool {
        self.falling_piece.try_drop(&self.grid)
    }

    pub fn try_rotate(&mut self) -> bool {
        self.falling_piece.try_rotate(&self.grid)
    }

    /// Locks the falling piece, clears full rows and spawns the next piece.
    ///
    /// Returns the number of cleared rows and an error if the new piece
    /// collides at its spawn position.
    pub fn complete_piece_drop(&mut self) -> (usize, Result<(), SpawnCollisionError>) {
        self.grid.lock_piece(&self.falling_piece);
        let cleared_lines = self.grid.clear_lines();

        self.falling_piece = spawn(self.piece_bag.pop_next());
        if self.is_topped_out() {
            return (cleared_lines, Err(SpawnCollisionError));
        }
        (cleared_lines, Ok(()))
    }
}

fn spawn(kind: PieceKind) -> Piece {
    let mut piece = Piece::new(kind);
    piece.reset();
    piece
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_first_pieces() {
        let a = GameField::new(PieceSeed::from_label("7"));
        let b = GameField::new(PieceSeed::from_label("7"));
        assert_eq!(a.falling_piece(), b.falling_piece());
        assert_eq!(a.next_piece(), b.next_piece());
    }

    #[test]
    fn test_complete_piece_drop_advances_bag() {
        let mut field = GameField::new(PieceSeed::from_label("0"));
        let next = field.next_piece();
        while field.try_drop() {}
        let (cleared, result) = field.complete_piece_drop();
        assert_eq!(cleared, 0);
        assert!(result.is_ok());
        assert_eq!(field.falling_piece().kind(), next);
        assert_eq!(field.grid().filled_cells(), 4);
    }

    #[test]
    fn test_clears_completed_row() {
        let grid = Grid::from_ascii(&["####..####"]).unwrap();
        let mut field = GameField::with_grid(grid, PieceSeed::from_label("0"));
        // Replace the spawned piece with an O hovering over the gap.
        let mut field_piece = Piece::new(PieceKind::O);
        field_piece.set_position(4, 0);
        field.falling_piece = field_piece;
        while field.try_drop() {}
        let (cleared, result) = field.complete_piece_drop();
        assert_eq!(cleared, 1);
        assert!(result.is_ok());
        assert_eq!(field.grid().filled_cells(), 2);
        assert_eq!(field.grid().cell(4, 19), Some(PieceKind::O.color_id()));
    }

    #[test]
    fn test_spawn_collision_is_reported() {
        let rows = vec!["#########."; 20];
        let mut field = GameField::with_grid(
            Grid::from_ascii(&rows).unwrap(),
            PieceSeed::from_label("0"),
        );
        assert!(field.is_topped_out());
        let (_, result) = field.complete_piece_drop();
        assert_eq!(result, Err(SpawnCollisionError));
    }
}
