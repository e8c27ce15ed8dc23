//! Board evaluation: scoring a hypothetical locked board.
//!
//! The score is a linear combination of four metrics:
//!
//! ```text
//! score = height·w_height + bumpiness·w_bump + holes·w_hole + cleared_lines·w_line
//! ```
//!
//! - **height** - sum of column heights (`HEIGHT - top row`, 0 for empty columns)
//! - **holes** - empty cells below the topmost filled cell of their column
//! - **bumpiness** - sum of absolute height differences of adjacent columns
//! - **cleared lines** - rows that are completely filled
//!
//! Only emptiness matters for the first three metrics; color ids never change
//! a score.

use std::fmt;

use evotris_engine::{EMPTY_CELL, Grid};

use crate::weights::Weights;

/// Scores boards. Higher is better.
pub trait BoardEvaluator: fmt::Debug {
    fn evaluate(&self, grid: &Grid) -> f32;
}

/// Raw board metrics of a single grid snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardMetrics {
    pub aggregate_height: u32,
    pub holes: u32,
    pub bumpiness: u32,
    pub cleared_lines: u32,
}

impl BoardMetrics {
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let heights: [u32; Grid::WIDTH] = std::array::from_fn(|x| {
            grid.column_top(x)
                .map_or(0, |top| (Grid::HEIGHT - top) as u32)
        });

        let aggregate_height = heights.iter().sum();
        let bumpiness = heights.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
        let holes = (0..Grid::WIDTH)
            .filter_map(|x| grid.column_top(x).map(|top| (x, top)))
            .map(|(x, top)| {
                grid.rows()
                    .skip(top + 1)
                    .filter(|row| row[x] == EMPTY_CELL)
                    .count() as u32
            })
            .sum();
        let cleared_lines = grid.filled_rows() as u32;

        Self {
            aggregate_height,
            holes,
            bumpiness,
            cleared_lines,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn weighted_sum(&self, weights: &Weights) -> f32 {
        self.aggregate_height as f32 * weights.height
            + self.bumpiness as f32 * weights.bump
            + self.holes as f32 * weights.hole
            + self.cleared_lines as f32 * weights.line
    }
}

/// Scores a grid with a weight vector.
#[must_use]
pub fn evaluate(grid: &Grid, weights: &Weights) -> f32 {
    BoardMetrics::from_grid(grid).weighted_sum(weights)
}

/// [`BoardEvaluator`] backed by a genome's weight vector.
#[derive(Debug, Clone, Copy)]
pub struct WeightedBoardEvaluator {
    weights: Weights,
}

impl WeightedBoardEvaluator {
    #[must_use]
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }
}

impl BoardEvaluator for WeightedBoardEvaluator {
    #[inline]
    fn evaluate(&self, grid: &Grid) -> f32 {
        evaluate(grid, &self.weights)
    }
}

#[cfg(test)]
mod tests {
    use evotris_engine::{Piece, PieceKind};

    use super::*;

    #[test]
    fn test_empty_grid() {
        assert_eq!(BoardMetrics::from_grid(&Grid::EMPTY), BoardMetrics::default());
        assert!(evaluate(&Grid::EMPTY, &Weights::default()).abs() < f32::EPSILON);
    }

    #[test]
    fn test_o_piece_on_floor() {
        let mut piece = Piece::new(PieceKind::O);
        piece.set_position(0, 18);
        let grid = Grid::EMPTY.with_piece(&piece);
        let metrics = BoardMetrics::from_grid(&grid);
        assert_eq!(
            metrics,
            BoardMetrics {
                aggregate_height: 4,
                holes: 0,
                bumpiness: 2,
                cleared_lines: 0,
            }
        );
    }

    #[test]
    fn test_bumpiness_sums_every_adjacent_pair() {
        let grid = Grid::from_ascii(&[
            "#.........",
            "#.#.......",
            "#.#.#.....",
        ])
        .unwrap();
        let metrics = BoardMetrics::from_grid(&grid);
        // heights: 3 0 2 0 1 0 0 0 0 0
        assert_eq!(metrics.aggregate_height, 6);
        assert_eq!(metrics.bumpiness, 3 + 2 + 2 + 1 + 1);
    }

    #[test]
    fn test_holes_below_top_only() {
        let grid = Grid::from_ascii(&[
            ".#........",
            "..........",
            ".#.......#",
            "##.......#",
        ])
        .unwrap();
        let metrics = BoardMetrics::from_grid(&grid);
        assert_eq!(metrics.holes, 1);
        assert_eq!(metrics.aggregate_height, 1 + 4 + 2);
    }

    #[test]
    fn test_cleared_lines() {
        let grid = Grid::from_ascii(&["##########", "#########.", "##########"]).unwrap();
        assert_eq!(BoardMetrics::from_grid(&grid).cleared_lines, 2);
    }

    #[test]
    fn test_color_ids_do_not_matter() {
        let a = Grid::from_ascii(&["1.2.......", "3456777..1"]).unwrap();
        let b = Grid::from_ascii(&["#.#.......", "#######..#"]).unwrap();
        assert_eq!(BoardMetrics::from_grid(&a), BoardMetrics::from_grid(&b));
    }

    #[test]
    fn test_weighted_sum() {
        let metrics = BoardMetrics {
            aggregate_height: 10,
            holes: 2,
            bumpiness: 3,
            cleared_lines: 1,
        };
        let weights = Weights {
            line: 1.0,
            height: -0.5,
            hole: -2.0,
            bump: -1.0,
        };
        assert!((metrics.weighted_sum(&weights) - (1.0 - 5.0 - 4.0 - 3.0)).abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let grid = Grid::from_ascii(&["#.#.#.#.#.", "##.##.##.#"]).unwrap();
        let before = grid.clone();
        let evaluator = WeightedBoardEvaluator::new(Weights::default());
        let first = evaluator.evaluate(&grid);
        let second = evaluator.evaluate(&grid);
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(grid, before);
    }
}
