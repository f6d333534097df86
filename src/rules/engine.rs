//! Legality, move application, and termination.
//!
//! All operations take the active modifier (if any) explicitly: twists
//! are enforced here, never by the UI. `apply_move` rejects illegal
//! coordinates without touching the state.

use thiserror::Error;

use crate::core::{Outcome, Player};
use crate::modifiers::Modifier;

use super::board::{SmallBoard, SmallStatus};
use super::state::{ActiveBoard, Coord, MatchState, Move};

/// Rejection of an illegal move request. The state is unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("coordinate {0} out of range")]
    OutOfRange(Coord),
    #[error("it is not {0}'s turn")]
    NotYourTurn(Player),
    #[error("board {0} is already resolved")]
    BoardResolved(u8),
    #[error("cell {0} is occupied")]
    CellOccupied(Coord),
    #[error("move {coord} violates the forced board {forced}")]
    OutsideConstraint { coord: Coord, forced: u8 },
    #[error("cell {0} is forbidden by the active twist")]
    CellForbidden(Coord),
}

/// What a successfully applied move did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveReport {
    pub mv: Move,
    /// Status the target board resolved to, if this move resolved it.
    pub claimed: Option<SmallStatus>,
    /// Constraint imposed on the next move.
    pub next: ActiveBoard,
    /// Terminal outcome, if the match just ended.
    pub outcome: Option<Outcome>,
}

/// Enumerate every legal (board, cell) for the side to move.
///
/// A coordinate is legal when its board is open, the cell is empty,
/// the board satisfies the active-board constraint, and the active
/// modifier's legality filter admits it.
///
/// A cumulative cell-blocking twist can empty the forced board without
/// resolving it; in that case the constraint relaxes to any open board
/// so the match cannot wedge.
#[must_use]
pub fn legal_moves(state: &MatchState, modifier: Option<&Modifier>) -> Vec<Coord> {
    if match_winner(state, modifier).is_some() {
        return Vec::new();
    }

    let mut moves = collect_moves(state, modifier, false);
    if moves.is_empty() && matches!(state.active, ActiveBoard::Board(_)) {
        moves = collect_moves(state, modifier, true);
    }
    moves
}

fn collect_moves(
    state: &MatchState,
    modifier: Option<&Modifier>,
    ignore_constraint: bool,
) -> Vec<Coord> {
    let mut out = Vec::new();
    for board in 0..9u8 {
        if !state.board(board as usize).is_open() {
            continue;
        }
        if !ignore_constraint && !state.constraint_allows(board) {
            continue;
        }
        for cell in 0..9u8 {
            if state.board(board as usize).cell(cell as usize).is_some() {
                continue;
            }
            let coord = Coord::new(board, cell);
            if modifier.is_some_and(|m| !m.allows(coord)) {
                continue;
            }
            out.push(coord);
        }
    }
    out
}

/// Apply a move, or reject it leaving the state untouched.
pub fn apply_move(
    state: &mut MatchState,
    mv: Move,
    modifier: Option<&Modifier>,
) -> Result<MoveReport, RulesError> {
    let coord = mv.coord();
    if !coord.in_range() {
        return Err(RulesError::OutOfRange(coord));
    }
    if mv.player != state.turn {
        return Err(RulesError::NotYourTurn(mv.player));
    }
    if !state.board(mv.board as usize).is_open() {
        return Err(RulesError::BoardResolved(mv.board));
    }
    if state.board(mv.board as usize).cell(mv.cell as usize).is_some() {
        return Err(RulesError::CellOccupied(coord));
    }
    if let ActiveBoard::Board(forced) = state.active {
        if forced != mv.board {
            // The forced board may have been emptied by a blocking
            // twist; legal_moves relaxes to Any in that case, and so
            // must validation.
            if collect_moves(state, modifier, false)
                .iter()
                .any(|c| c.board == forced)
            {
                return Err(RulesError::OutsideConstraint { coord, forced });
            }
        }
    }
    if modifier.is_some_and(|m| !m.allows(coord)) {
        return Err(RulesError::CellForbidden(coord));
    }

    Ok(apply_move_unchecked(state, mv, modifier))
}

/// Apply a move already known to be legal.
///
/// Used on the search's hot path, where every candidate comes straight
/// out of `legal_moves`.
pub(crate) fn apply_move_unchecked(
    state: &mut MatchState,
    mv: Move,
    modifier: Option<&Modifier>,
) -> MoveReport {
    let status = state.board_mut(mv.board as usize).place(mv.cell as usize, mv.player);
    let claimed = (!status.is_open()).then_some(status);

    state.history.push(mv);
    state.turn = mv.player.other();

    // The played cell index points at the next forced board, unless
    // that board is already resolved (a full board is Drawn, so "full"
    // is covered by "resolved").
    state.active = if state.board(mv.cell as usize).is_open() {
        ActiveBoard::Board(mv.cell)
    } else {
        ActiveBoard::Any
    };

    let outcome = match_winner(state, modifier);

    MoveReport {
        mv,
        claimed,
        next: state.active,
        outcome,
    }
}

/// Terminal outcome, if the match is over.
///
/// The active modifier's terminal override (sudden death) wins over
/// the standard meta-board check.
#[must_use]
pub fn match_winner(state: &MatchState, modifier: Option<&Modifier>) -> Option<Outcome> {
    if let Some(outcome) = modifier.and_then(|m| m.terminal_override(state)) {
        return Some(outcome);
    }

    if let Some(winner) = SmallBoard::grid_winner(&state.meta_grid()) {
        return Some(Outcome::Won(winner));
    }

    if state.meta_statuses().iter().all(|s| !s.is_open()) {
        return Some(Outcome::Draw);
    }

    None
}

/// Coordinates where `player` would win the match in one move.
///
/// Ignores the active-board constraint and whose turn it is: used both
/// for the AI's own winning moves and for spotting the human's threats
/// a turn ahead. The modifier's legality filter still applies, since a
/// forbidden cell cannot be played by either side.
#[must_use]
pub fn winning_coords(
    state: &MatchState,
    player: Player,
    modifier: Option<&Modifier>,
) -> Vec<Coord> {
    let sudden_death = modifier.is_some_and(|m| m.ends_on_first_claim());
    let meta = state.meta_grid();

    let mut out = Vec::new();
    for board in 0..9u8 {
        let small = state.board(board as usize);
        if !small.is_open() {
            continue;
        }
        for cell in 0..9u8 {
            let coord = Coord::new(board, cell);
            if modifier.is_some_and(|m| !m.allows(coord)) {
                continue;
            }
            if !small.wins_if_placed(cell as usize, player) {
                continue;
            }
            // Winning the small board wins the match under sudden
            // death, or when it completes a meta line.
            if sudden_death {
                out.push(coord);
                continue;
            }
            let mut grid = meta;
            grid[board as usize] = Some(player);
            if SmallBoard::grid_winner(&grid) == Some(player) {
                out.push(coord);
            }
        }
    }
    out
}

/// Swap the full cell contents of two open boards.
///
/// The chaos-shuffle primitive. Meta statuses are untouched (only open
/// boards are eligible, and open boards hold no completed line), and
/// the active-board constraint is positional, so it is not remapped.
pub fn swap_board_contents(state: &mut MatchState, a: u8, b: u8) {
    debug_assert!(a != b);
    debug_assert!(state.board(a as usize).is_open());
    debug_assert!(state.board(b as usize).is_open());

    let cells_a = *state.board(a as usize).cells();
    let cells_b = *state.board(b as usize).cells();
    state.board_mut(a as usize).set_cells(cells_b);
    state.board_mut(b as usize).set_cells(cells_a);
}
