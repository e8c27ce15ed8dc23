//! Game state: the seeded piece bag, the field and per-game statistics.
//!
//! - [`GameField`] - grid, falling piece and piece bag of one game
//! - [`GameStats`] - running score and line-clear counters
//! - [`PieceBag`] - seeded 7-bag piece generation
//! - [`PieceSeed`] - seed derived from a label string

pub use self::{game_field::*, game_stats::*, piece_bag::*};

mod game_field;
mod game_stats;
mod piece_bag;
