use std::{cmp::Ordering, collections::VecDeque, time::Instant};

use evotris_engine::{GameField, GameStats, Grid, PieceKind, PieceSeed};
use serde::{Deserialize, Serialize};

use crate::{
    board_evaluator::WeightedBoardEvaluator,
    pathfinding::MoveGraph,
    placement_enumerator::PlacementEnumerator,
    position::Position,
    weights::Weights,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum DriverState {
    AwaitingPath,
    ExecutingPath,
    Locking,
    GameOver,
}

/// The single action performed by one [`GameDriver::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TickOutcome {
    Planned { goal: Position, steps: usize },
    Translated { dx: i32 },
    Rotated,
    Dropped,
    Locked { cleared_lines: usize },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ViolationKind {
    #[display("none of {candidates} candidate placements is reachable")]
    NoReachableCandidate { candidates: usize },
    #[display("path step {step} cannot be applied")]
    IllegalStep { step: Position },
}

/// Enumeration and search disagree with the live board.
///
/// Carries the falling piece, the goal it was heading for and a copy of the
/// grid at the time of failure.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{kind}: {piece:?} at {position}, goal {goal}")]
pub struct InvariantViolation {
    kind: ViolationKind,
    piece: PieceKind,
    position: Position,
    goal: Position,
    grid: Box<Grid>,
}

impl InvariantViolation {
    #[must_use]
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    #[must_use]
    pub fn piece(&self) -> PieceKind {
        self.piece
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn goal(&self) -> Position {
        self.goal
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "kebab-case")]
pub enum GameEnd {
    ToppedOut,
    PieceLimit,
}

/// Result of [`GameDriver::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub stats: GameStats,
    pub end: GameEnd,
}

impl GameOutcome {
    #[must_use]
    pub fn score(&self) -> usize {
        self.stats.score()
    }
}

/// Read-only view of a running game for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub grid: Grid,
    pub piece: PieceKind,
    pub position: Position,
    pub next_piece: PieceKind,
    pub goal: Option<Position>,
    pub path: Vec<Position>,
    pub score: usize,
    pub completed_pieces: usize,
    pub state: DriverState,
    pub weights: Weights,
}

/// Plays one game with a fixed weight vector, one action per tick.
#[derive(Debug, Clone)]
pub struct GameDriver {
    evaluator: WeightedBoardEvaluator,
    field: GameField,
    stats: GameStats,
    state: DriverState,
    goal: Option<Position>,
    path: VecDeque<Position>,
}

impl GameDriver {
    #[must_use]
    pub fn new(weights: Weights, seed: PieceSeed) -> Self {
        Self::with_field(weights, GameField::new(seed))
    }

    /// Starts from a prepared field. A field whose first piece already
    /// collides starts in [`DriverState::GameOver`].
    #[must_use]
    pub fn with_field(weights: Weights, field: GameField) -> Self {
        let state = if field.is_topped_out() {
            DriverState::GameOver
        } else {
            DriverState::AwaitingPath
        };
        Self {
            evaluator: WeightedBoardEvaluator::new(weights),
            field,
            stats: GameStats::new(),
            state,
            goal: None,
            path: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn field(&self) -> &GameField {
        &self.field
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.stats.score()
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[must_use]
    pub fn weights(&self) -> &Weights {
        self.evaluator.weights()
    }

    #[must_use]
    pub fn goal(&self) -> Option<Position> {
        self.goal
    }

    /// Remaining steps of the planned path.
    pub fn path(&self) -> impl Iterator<Item = Position> + '_ {
        self.path.iter().copied()
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let piece = self.field.falling_piece();
        GameSnapshot {
            grid: self.field.grid().clone(),
            piece: piece.kind(),
            position: Position::of(piece),
            next_piece: self.field.next_piece(),
            goal: self.goal,
            path: self.path().collect(),
            score: self.stats.score(),
            completed_pieces: self.stats.completed_pieces(),
            state: self.state,
            weights: *self.weights(),
        }
    }

    /// Advances the game by exactly one action.
    pub fn tick(&mut self) -> Result<TickOutcome, InvariantViolation> {
        match self.state {
            DriverState::AwaitingPath => self.plan(),
            DriverState::ExecutingPath => self.execute_step(),
            DriverState::Locking => Ok(self.lock()),
            DriverState::GameOver => Ok(TickOutcome::GameOver),
        }
    }

    /// Ticks until game over, or until `piece_limit` pieces have been locked.
    pub fn run(&mut self, piece_limit: Option<usize>) -> Result<GameOutcome, InvariantViolation> {
        loop {
            if self.state.is_game_over() {
                return Ok(self.outcome(GameEnd::ToppedOut));
            }
            if piece_limit.is_some_and(|limit| self.stats.completed_pieces() >= limit) {
                return Ok(self.outcome(GameEnd::PieceLimit));
            }
            self.tick()?;
        }
    }

    fn outcome(&self, end: GameEnd) -> GameOutcome {
        GameOutcome {
            stats: self.stats.clone(),
            end,
        }
    }

    fn plan(&mut self) -> Result<TickOutcome, InvariantViolation> {
        let started = Instant::now();
        let grid = self.field.grid();
        let piece = *self.field.falling_piece();
        let start = Position::of(&piece);
        let placements = PlacementEnumerator::new(&self.evaluator).enumerate(
            grid,
            &piece,
            Some(self.field.next_piece()),
        );
        let Some(best) = placements.candidates().first() else {
            log::debug!("no placement for {:?}, game over", piece.kind());
            self.state = DriverState::GameOver;
            return Ok(TickOutcome::GameOver);
        };

        let graph = MoveGraph::build(grid, piece.kind(), placements.nodes());
        let found = placements.candidates().iter().find_map(|candidate| {
            let path = graph.search(start, candidate.position);
            if path.is_none() {
                log::debug!(
                    "{:?} cannot reach {} from {start}, trying next candidate",
                    piece.kind(),
                    candidate.position
                );
            }
            path.map(|path| (candidate.position, path))
        });
        let Some((goal, path)) = found else {
            let kind = ViolationKind::NoReachableCandidate {
                candidates: placements.candidates().len(),
            };
            return Err(self.violation(kind, best.position));
        };

        log::debug!(
            "planned {:?} -> {goal} in {} steps ({} nodes, {} candidates, {:?})",
            piece.kind(),
            path.len() - 1,
            placements.nodes().len(),
            placements.candidates().len(),
            started.elapsed()
        );
        self.goal = Some(goal);
        self.path = path.into();
        let steps = self.skip_reached_steps();
        self.state = if steps == 0 {
            DriverState::Locking
        } else {
            DriverState::ExecutingPath
        };
        Ok(TickOutcome::Planned { goal, steps })
    }

    fn execute_step(&mut self) -> Result<TickOutcome, InvariantViolation> {
        let current = Position::of(self.field.falling_piece());
        let Some(&head) = self.path.front() else {
            self.state = DriverState::Locking;
            return Ok(self.lock());
        };

        let outcome = match head.y.cmp(&current.y) {
            Ordering::Greater => self.field.try_drop().then_some(TickOutcome::Dropped),
            Ordering::Less => None,
            Ordering::Equal => {
                let dx = head.x - current.x;
                let dr = (head.r + 4 - current.r % 4) % 4;
                match (dx, dr) {
                    (-1 | 1, 0) => self
                        .field
                        .try_translate(dx)
                        .then_some(TickOutcome::Translated { dx }),
                    (0, 1) => self.field.try_rotate().then_some(TickOutcome::Rotated),
                    _ => None,
                }
            }
        };
        let Some(outcome) = outcome else {
            let goal = self.goal.unwrap_or(head);
            return Err(self.violation(ViolationKind::IllegalStep { step: head }, goal));
        };

        if self.skip_reached_steps() == 0 {
            self.state = DriverState::Locking;
        }
        Ok(outcome)
    }

    fn lock(&mut self) -> TickOutcome {
        let (cleared_lines, result) = self.field.complete_piece_drop();
        self.stats.complete_piece_drop(cleared_lines);
        self.goal = None;
        self.path.clear();
        self.state = match result {
            Ok(()) => DriverState::AwaitingPath,
            Err(e) => {
                log::debug!("{e} after {} pieces", self.stats.completed_pieces());
                DriverState::GameOver
            }
        };
        TickOutcome::Locked { cleared_lines }
    }

    /// Pops path heads the piece already occupies and returns the number of
    /// steps left.
    fn skip_reached_steps(&mut self) -> usize {
        let current = Position::of(self.field.falling_piece());
        while self.path.front() == Some(&current) {
            self.path.pop_front();
        }
        self.path.len()
    }

    fn violation(&self, kind: ViolationKind, goal: Position) -> InvariantViolation {
        let piece = self.field.falling_piece();
        let violation = InvariantViolation {
            kind,
            piece: piece.kind(),
            position: Position::of(piece),
            goal,
            grid: Box::new(self.field.grid().clone()),
        };
        log::error!("{violation}\n{}", violation.grid);
        violation
    }
}
