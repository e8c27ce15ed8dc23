//! Decision engine of the self-playing stacker.
//!
//! For every falling piece the [`GameDriver`] enumerates all resting
//! placements and scores them with a weighted board evaluator plus a one-piece
//! lookahead, then searches the move graph for a step sequence to the best
//! reachable placement and replays it one action per tick.
//!
//! # Example
//!
//! ```
//! use evotris_ai::{GameDriver, GameEnd, Weights};
//! use evotris_engine::PieceSeed;
//!
//! let mut driver = GameDriver::new(Weights::default(), PieceSeed::from_label("0"));
//! let outcome = driver.run(Some(10)).unwrap();
//! assert_eq!(outcome.end, GameEnd::PieceLimit);
//! assert_eq!(outcome.stats.completed_pieces(), 10);
//! ```

pub use self::{
    board_evaluator::*, driver::*, pathfinding::*, placement_enumerator::*, position::*,
    weights::*,
};

mod board_evaluator;
mod driver;
mod pathfinding;
mod placement_enumerator;
mod position;
mod weights;
