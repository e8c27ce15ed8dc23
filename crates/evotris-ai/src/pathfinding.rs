//! Move graph search: turning a goal placement into a step sequence.
//!
//! The graph's nodes are the collision-free states produced by the placement
//! enumerator. Each node has up to four outgoing edges, one per elementary
//! move: right, left, down and a single rotation step. Every edge target is
//! validated by placing a fresh copy of the piece; the template is never
//! mutated.
//!
//! The search is best-first over unit-cost edges with `f = g + h`, where
//!
//! ```text
//! h(p) = |p.x - goal.x| + |p.y - goal.y| · |sin(p.r·π/2) - sin(goal.r·π/2)|
//! ```
//!
//! The vertical term only counts while the rotation phase differs, so the
//! search prefers to settle rotation before covering vertical distance. `h` is
//! not admissible and paths are not guaranteed to be globally shortest; they
//! tend to look like the moves a human would make. Ties on `f` go to the state
//! that entered the open set first, which keeps results deterministic.

use std::{
    collections::{HashMap, HashSet},
    hash::BuildHasher,
};

use arrayvec::ArrayVec;
use evotris_engine::{Grid, Piece, PieceKind};

use crate::position::Position;

/// `sin(r·π/2)` for each rotation index.
const ROTATION_PHASE: [f32; 4] = [0.0, 1.0, 0.0, -1.0];

/// Heuristic distance from `pos` to `goal`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn heuristic(pos: Position, goal: Position) -> f32 {
    let dx = pos.x.abs_diff(goal.x);
    let dy = pos.y.abs_diff(goal.y);
    let phase = (ROTATION_PHASE[usize::from(pos.r % 4)] - ROTATION_PHASE[usize::from(goal.r % 4)])
        .abs();
    dx as f32 + dy as f32 * phase
}

/// Directed graph of single-step moves between collision-free states.
#[derive(Debug, Clone, Default)]
pub struct MoveGraph {
    edges: HashMap<Position, ArrayVec<Position, 4>>,
}

impl MoveGraph {
    /// Connects every node to the states reachable by one legal move.
    #[must_use]
    pub fn build<S>(grid: &Grid, kind: PieceKind, nodes: &HashSet<Position, S>) -> Self
    where
        S: BuildHasher,
    {
        let edges = nodes
            .iter()
            .map(|&node| {
                let neighbors = [node.right(), node.left(), node.down(), node.rotated()]
                    .into_iter()
                    .filter(|next| !next.place(kind).is_colliding(grid))
                    .collect();
                (node, neighbors)
            })
            .collect();
        Self { edges }
    }

    /// Outgoing edges of `pos`, in right, left, down, rotate order.
    #[must_use]
    pub fn neighbors(&self, pos: Position) -> &[Position] {
        self.edges.get(&pos).map_or(&[], |n| n.as_slice())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Finds a path from `start` to `goal`, both ends included.
    ///
    /// Returns `None` when the open set runs dry without reaching `goal`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn search(&self, start: Position, goal: Position) -> Option<Vec<Position>> {
        let mut open = vec![start];
        let mut came_from = HashMap::new();
        let mut g_score = HashMap::from([(start, 0_u32)]);
        let mut f_score = HashMap::from([(start, heuristic(start, goal))]);

        while let Some(index) = lowest_f_score(&open, &f_score) {
            let current = open.remove(index);
            if current == goal {
                return Some(build_path(&came_from, current));
            }

            let tentative = g_score[&current] + 1;
            for &next in self.neighbors(current) {
                if tentative >= g_score.get(&next).copied().unwrap_or(u32::MAX) {
                    continue;
                }
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                f_score.insert(next, tentative as f32 + heuristic(next, goal));
                if !open.contains(&next) {
                    open.push(next);
                }
            }
        }
        None
    }
}

/// Builds the move graph for `piece` and searches from its current state.
#[must_use]
pub fn find_path<S>(
    grid: &Grid,
    piece: &Piece,
    goal: Position,
    nodes: &HashSet<Position, S>,
) -> Option<Vec<Position>>
where
    S: BuildHasher,
{
    MoveGraph::build(grid, piece.kind(), nodes).search(Position::of(piece), goal)
}

fn lowest_f_score(open: &[Position], f_score: &HashMap<Position, f32>) -> Option<usize> {
    let f = |pos: &Position| f_score.get(pos).copied().unwrap_or(f32::INFINITY);
    open.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| f(a).total_cmp(&f(b)))
        .map(|(index, _)| index)
}

fn build_path(came_from: &HashMap<Position, Position>, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use crate::{
        board_evaluator::WeightedBoardEvaluator, placement_enumerator::PlacementEnumerator,
        weights::Weights,
    };

    use super::*;

    fn spawned(kind: PieceKind) -> Piece {
        let mut piece = Piece::new(kind);
        piece.reset();
        piece
    }

    fn nodes(grid: &Grid, piece: &Piece) -> HashSet<Position> {
        let evaluator = WeightedBoardEvaluator::new(Weights::default());
        PlacementEnumerator::new(&evaluator)
            .enumerate(grid, piece, None)
            .nodes()
            .clone()
    }

    fn assert_valid_path(graph: &MoveGraph, path: &[Position], start: Position, goal: Position) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for step in path.windows(2) {
            assert!(
                graph.neighbors(step[0]).contains(&step[1]),
                "{} -> {} is not an edge",
                step[0],
                step[1]
            );
        }
    }

    #[test]
    fn test_heuristic() {
        let goal = Position::new(5, 10, 1);
        assert!((heuristic(Position::new(5, 10, 1), goal)).abs() < f32::EPSILON);
        assert!((heuristic(Position::new(2, 0, 1), goal) - 3.0).abs() < f32::EPSILON);
        assert!((heuristic(Position::new(2, 0, 0), goal) - 13.0).abs() < f32::EPSILON);
        assert!((heuristic(Position::new(2, 0, 3), goal) - 23.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_edges_are_single_legal_moves() {
        let grid = Grid::from_ascii(&["#...#.....", "##.###..##"]).unwrap();
        let piece = spawned(PieceKind::T);
        let nodes = nodes(&grid, &piece);
        let graph = MoveGraph::build(&grid, piece.kind(), &nodes);
        assert_eq!(graph.node_count(), nodes.len());
        for &node in &nodes {
            for &next in graph.neighbors(node) {
                assert!(!next.place(PieceKind::T).is_colliding(&grid));
                let moves = [node.right(), node.left(), node.down(), node.rotated()];
                assert!(moves.contains(&next));
            }
        }
    }

    #[test]
    fn test_straight_drop() {
        let grid = Grid::EMPTY;
        let piece = spawned(PieceKind::O);
        let nodes = nodes(&grid, &piece);
        let goal = Position::new(4, 18, 0);
        let path = find_path(&grid, &piece, goal, &nodes).unwrap();
        assert_eq!(path.len(), 19);
        assert!(path.iter().all(|p| p.x == 4 && p.r == 0));
    }

    #[test]
    fn test_path_with_rotation_and_shift() {
        let grid = Grid::from_ascii(&["#.........", "##.....###"]).unwrap();
        let piece = spawned(PieceKind::L);
        let nodes = nodes(&grid, &piece);
        let graph = MoveGraph::build(&grid, piece.kind(), &nodes);
        let start = Position::of(&piece);
        for goal in [Position::new(0, 15, 1), Position::new(6, 17, 2), Position::new(-1, 16, 1)] {
            if !nodes.contains(&goal) {
                continue;
            }
            if let Some(path) = graph.search(start, goal) {
                assert_valid_path(&graph, &path, start, goal);
            }
        }
        let goal = Position::new(5, 17, 2);
        assert!(nodes.contains(&goal));
        let path = graph.search(start, goal).unwrap();
        assert_valid_path(&graph, &path, start, goal);
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = Grid::EMPTY;
        let piece = spawned(PieceKind::S);
        let nodes = nodes(&grid, &piece);
        let start = Position::of(&piece);
        assert_eq!(find_path(&grid, &piece, start, &nodes), Some(vec![start]));
    }

    #[test]
    fn test_walled_off_goal_has_no_path() {
        let grid = Grid::from_ascii(&[
            "##########",
            "..........",
            "..........",
            "..........",
            "..........",
        ])
        .unwrap();
        let piece = spawned(PieceKind::O);
        let nodes = nodes(&grid, &piece);
        let goal = Position::new(0, 18, 0);
        assert!(nodes.contains(&goal));
        assert_eq!(find_path(&grid, &piece, goal, &nodes), None);
    }

    #[test]
    fn test_search_is_deterministic() {
        let grid = Grid::from_ascii(&["..#.......", "#.##..#..#", "####.####."]).unwrap();
        let piece = spawned(PieceKind::J);
        let nodes = nodes(&grid, &piece);
        let evaluator = WeightedBoardEvaluator::new(Weights::default());
        let placements = PlacementEnumerator::new(&evaluator).enumerate(&grid, &piece, None);
        for candidate in placements.candidates() {
            let a = find_path(&grid, &piece, candidate.position, &nodes);
            let b = find_path(&grid, &piece, candidate.position, &nodes);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_every_floor_candidate_reachable_on_empty_grid() {
        let grid = Grid::EMPTY;
        for kind in PieceKind::ALL {
            let piece = spawned(kind);
            let evaluator = WeightedBoardEvaluator::new(Weights::default());
            let placements = PlacementEnumerator::new(&evaluator).enumerate(&grid, &piece, None);
            let graph = MoveGraph::build(&grid, kind, placements.nodes());
            let start = Position::of(&piece);
            for candidate in placements.candidates() {
                let path = graph.search(start, candidate.position);
                assert!(path.is_some(), "{kind:?} {}", candidate.position);
            }
        }
    }
}
