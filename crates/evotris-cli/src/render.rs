use evotris_ai::{GameSnapshot, InvariantViolation, Position};
use evotris_engine::{EMPTY_CELL, Grid, PieceKind};

const FALLING: char = '@';
const GOAL: char = '+';

fn cell_char(id: u8) -> char {
    match id {
        EMPTY_CELL => '.',
        id => PieceKind::ALL
            .get(usize::from(id - 1))
            .map_or('#', |kind| kind.as_char()),
    }
}

fn board_lines(grid: &Grid) -> Vec<Vec<char>> {
    grid.rows()
        .map(|row| row.iter().copied().map(cell_char).collect())
        .collect()
}

fn overlay(lines: &mut [Vec<char>], kind: PieceKind, pos: Position, mark: char) {
    for (x, y, _) in pos.place(kind).occupied_cells() {
        if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y))
            && let Some(cell) = lines.get_mut(y).and_then(|line| line.get_mut(x))
        {
            *cell = mark;
        }
    }
}

/// Renders the board with the falling piece (`@`) and its goal (`+`), plus a
/// side panel.
pub fn snapshot(snapshot: &GameSnapshot) -> String {
    let mut lines = board_lines(&snapshot.grid);
    if let Some(goal) = snapshot.goal {
        overlay(&mut lines, snapshot.piece, goal, GOAL);
    }
    overlay(&mut lines, snapshot.piece, snapshot.position, FALLING);

    let panel = [
        format!("score: {}", snapshot.score),
        format!("pieces: {}", snapshot.completed_pieces),
        format!("piece: {}", snapshot.piece.as_char()),
        format!("next: {}", snapshot.next_piece.as_char()),
        format!("state: {:?}", snapshot.state),
    ];
    let board = lines.iter().enumerate().map(|(y, line)| {
        let row = line.iter().collect::<String>();
        let side = panel.get(y).map_or("", String::as_str);
        format!("|{row}|  {side}")
    });
    board
        .chain([format!("+{}+", "-".repeat(Grid::WIDTH))])
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the diagnostic of an aborted game.
pub fn violation(violation: &InvariantViolation) -> String {
    let mut lines = board_lines(violation.grid());
    overlay(&mut lines, violation.piece(), violation.goal(), GOAL);
    overlay(&mut lines, violation.piece(), violation.position(), FALLING);
    let board = lines
        .iter()
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");
    format!("invariant violation: {violation}\n{board}")
}
