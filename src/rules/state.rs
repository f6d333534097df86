//! Match state: the nine boards, the active-board constraint, turn owner.

use serde::{Deserialize, Serialize};

use crate::core::Player;

use super::board::{SmallBoard, SmallStatus};

/// A (board, cell) coordinate, both 0-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub board: u8,
    pub cell: u8,
}

impl Coord {
    #[must_use]
    pub const fn new(board: u8, cell: u8) -> Self {
        Self { board, cell }
    }

    /// Both indices within 0-8?
    #[must_use]
    pub const fn in_range(self) -> bool {
        self.board < 9 && self.cell < 9
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}c{}", self.board, self.cell)
    }
}

/// A move: a coordinate plus the side making it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub board: u8,
    pub cell: u8,
    pub player: Player,
}

impl Move {
    #[must_use]
    pub const fn new(board: u8, cell: u8, player: Player) -> Self {
        Self {
            board,
            cell,
            player,
        }
    }

    #[must_use]
    pub const fn coord(self) -> Coord {
        Coord::new(self.board, self.cell)
    }
}

/// Where the next move must land.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveBoard {
    /// Any open board.
    Any,
    /// A specific forced board.
    Board(u8),
}

/// Full mutable state of one match.
///
/// Cloned freely during search; everything here is a small fixed-size
/// array or a short vector, so a clone costs a few hundred bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    boards: [SmallBoard; 9],
    /// Constraint on the next move.
    pub active: ActiveBoard,
    /// Side to move.
    pub turn: Player,
    /// Every move played so far, in order.
    pub history: Vec<Move>,
}

impl MatchState {
    /// Fresh match: all boards open, no constraint, `first` to move.
    #[must_use]
    pub fn new(first: Player) -> Self {
        Self {
            boards: [SmallBoard::new(); 9],
            active: ActiveBoard::Any,
            turn: first,
            history: Vec::new(),
        }
    }

    /// A small board by index.
    #[must_use]
    pub fn board(&self, idx: usize) -> &SmallBoard {
        &self.boards[idx]
    }

    pub(crate) fn board_mut(&mut self, idx: usize) -> &mut SmallBoard {
        &mut self.boards[idx]
    }

    /// Statuses of the nine boards, in index order.
    #[must_use]
    pub fn meta_statuses(&self) -> [SmallStatus; 9] {
        std::array::from_fn(|i| self.boards[i].status())
    }

    /// Meta-board view: each resolved-won board as its winner.
    #[must_use]
    pub fn meta_grid(&self) -> [Option<Player>; 9] {
        std::array::from_fn(|i| match self.boards[i].status() {
            SmallStatus::Won(p) => Some(p),
            _ => None,
        })
    }

    /// Indices of boards still open.
    pub fn open_boards(&self) -> impl Iterator<Item = usize> + '_ {
        (0..9).filter(|&i| self.boards[i].is_open())
    }

    /// Does the active-board constraint admit `board`?
    #[must_use]
    pub fn constraint_allows(&self, board: u8) -> bool {
        match self.active {
            ActiveBoard::Any => true,
            ActiveBoard::Board(b) => b == board,
        }
    }

    /// Total moves played.
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.history.len()
    }
}
