//! Placement enumeration with one-piece lookahead.
//!
//! Every `(x, y, r)` inside the search window is instantiated from a fresh
//! copy of the piece template. Collision-free states become nodes of the
//! placement graph; those that cannot drop any further are candidate final
//! placements.
//!
//! A candidate is scored by locking it into a scratch grid and evaluating
//! that grid, plus the average score over every resting placement of the next
//! piece on top of it:
//!
//! ```text
//! score(c) = evaluate(locked(c)) + mean { evaluate(locked(c, n)) | n resting next-piece placement }
//! ```
//!
//! When the next piece has no resting placement at all, the lookahead term is
//! `0.0`.

use std::{collections::HashSet, ops::RangeInclusive};

use evotris_engine::{Grid, Piece, PieceKind};

use crate::{
    board_evaluator::BoardEvaluator,
    position::{Candidate, Position},
};

/// Anchor columns scanned. Starts left of the board so that shapes with blank
/// leading columns can reach column 0.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const X_RANGE: RangeInclusive<i32> = -2..=(Grid::WIDTH as i32 - 1);

/// Anchor rows scanned.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const Y_RANGE: RangeInclusive<i32> = -1..=(Grid::HEIGHT as i32 - 2);

/// Iterates the search window in row, column, rotation order.
pub fn search_window() -> impl Iterator<Item = Position> {
    Y_RANGE.flat_map(|y| X_RANGE.flat_map(move |x| (0..4).map(move |r| Position::new(x, y, r))))
}

/// Iterates collision-free resting placements of `kind` on `grid`.
pub fn resting_placements(grid: &Grid, kind: PieceKind) -> impl Iterator<Item = Piece> + '_ {
    search_window()
        .map(move |pos| pos.place(kind))
        .filter(move |piece| !piece.is_colliding(grid) && piece.is_resting(grid))
}

/// Result of one enumeration: graph nodes and scored candidates.
#[derive(Debug, Clone, Default)]
pub struct Placements {
    nodes: HashSet<Position>,
    candidates: Vec<Candidate>,
}

impl Placements {
    /// All collision-free states in the search window.
    #[must_use]
    pub fn nodes(&self) -> &HashSet<Position> {
        &self.nodes
    }

    /// Resting placements, best first. Equal scores keep enumeration order.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Enumerates and scores placements with a board evaluator.
#[derive(Debug, Clone, Copy)]
pub struct PlacementEnumerator<'a> {
    evaluator: &'a dyn BoardEvaluator,
}

impl<'a> PlacementEnumerator<'a> {
    #[must_use]
    pub fn new(evaluator: &'a dyn BoardEvaluator) -> Self {
        Self { evaluator }
    }

    /// Enumerates placements of `piece` on `grid`.
    ///
    /// `next` enables the lookahead term. A spawn state that already collides
    /// is not an error; the result simply has fewer (or no) candidates, and
    /// callers treat an empty candidate list as game over.
    #[must_use]
    pub fn enumerate(&self, grid: &Grid, piece: &Piece, next: Option<PieceKind>) -> Placements {
        let mut placements = Placements::default();
        for pos in search_window() {
            let candidate = pos.place(piece.kind());
            if candidate.is_colliding(grid) {
                continue;
            }
            placements.nodes.insert(pos);
            if !candidate.is_resting(grid) {
                continue;
            }
            let locked = grid.with_piece(&candidate);
            let lookahead = next.map_or(0.0, |next| self.lookahead(&locked, next));
            placements.candidates.push(Candidate {
                position: pos,
                score: self.evaluator.evaluate(&locked) + lookahead,
            });
        }
        placements
            .candidates
            .sort_by(|a, b| b.score.total_cmp(&a.score));
        placements
    }

    /// Mean score over every resting placement of `next` on `grid`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn lookahead(&self, grid: &Grid, next: PieceKind) -> f32 {
        let (total, count) = resting_placements(grid, next)
            .map(|piece| self.evaluator.evaluate(&grid.with_piece(&piece)))
            .fold((0.0, 0_u32), |(total, count), score| (total + score, count + 1));
        if count == 0 {
            log::debug!("no resting placement for next piece {next:?}, lookahead term is 0");
            return 0.0;
        }
        total / count as f32
    }
}
