//! Board geometry and game state for the self-playing stacker.
//!
//! - [`core`] - the 10×20 [`Grid`], piece shapes and the [`Piece`] value type
//! - [`engine`] - the seeded 7-piece [`PieceBag`], [`GameField`] and [`GameStats`]
//!
//! Pieces are plain `Copy` values. Every speculative placement works on its own
//! copy, so nothing derived from a template can alias another candidate.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// The freshly spawned piece overlaps the stack (top-out).
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece colliding at spawn position")]
pub struct SpawnCollisionError;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GridParseError {
    #[display("grid fixture has {rows} rows, at most {} allowed", Grid::HEIGHT)]
    TooManyRows { rows: usize },
    #[display("grid fixture row {row} has {len} cells, expected {}", Grid::WIDTH)]
    RowWidth { row: usize, len: usize },
}
