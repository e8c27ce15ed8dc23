use std::fmt;

use evotris_engine::{Piece, PieceKind};
use serde::{Deserialize, Serialize};

/// A piece state `(x, y, r)`: a node of the placement graph.
///
/// Equality and hashing use the exact coordinate triple, so two positions with
/// the same coordinates are interchangeable map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub r: u8,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32, r: u8) -> Self {
        Self { x, y, r }
    }

    /// Current state of a piece.
    #[must_use]
    pub fn of(piece: &Piece) -> Self {
        Self::new(piece.x(), piece.y(), piece.rotation())
    }

    /// Instantiates a fresh piece of `kind` in this state.
    #[must_use]
    pub fn place(self, kind: PieceKind) -> Piece {
        let mut piece = Piece::new(kind);
        piece.rotate(self.r);
        piece.set_position(self.x, self.y);
        piece
    }

    #[must_use]
    pub const fn left(self) -> Self {
        Self::new(self.x - 1, self.y, self.r)
    }

    #[must_use]
    pub const fn right(self) -> Self {
        Self::new(self.x + 1, self.y, self.r)
    }

    #[must_use]
    pub const fn down(self) -> Self {
        Self::new(self.x, self.y + 1, self.r)
    }

    #[must_use]
    pub const fn rotated(self) -> Self {
        Self::new(self.x, self.y, (self.r + 1) % 4)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.x, self.y, self.r)
    }
}

/// A resting placement together with its lookahead score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub position: Position,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_matches_manual_setup() {
        let pos = Position::new(-1, 7, 3);
        let piece = pos.place(PieceKind::J);
        assert_eq!(Position::of(&piece), pos);

        let mut manual = Piece::new(PieceKind::J);
        manual.rotate(3);
        manual.set_position(-1, 7);
        assert_eq!(piece, manual);
    }

    #[test]
    fn test_rotated_wraps() {
        assert_eq!(Position::new(0, 0, 3).rotated(), Position::new(0, 0, 0));
    }

    #[test]
    fn test_display_key() {
        assert_eq!(Position::new(-2, 5, 1).to_string(), "-2_5_1");
    }
}
