//! Small (3x3) board model.

use serde::{Deserialize, Serialize};

use crate::core::Player;

/// The 8 winning lines of a 3x3 grid (rows, columns, diagonals).
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Status of a small board. One-way: once non-open it never reverts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmallStatus {
    Open,
    Won(Player),
    Drawn,
}

impl SmallStatus {
    /// Is the board still accepting moves?
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, SmallStatus::Open)
    }
}

/// One of the nine 3x3 boards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmallBoard {
    cells: [Option<Player>; 9],
    status: SmallStatus,
}

impl Default for SmallBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SmallBoard {
    /// An empty, open board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: [None; 9],
            status: SmallStatus::Open,
        }
    }

    /// Occupant of a cell.
    #[must_use]
    pub fn cell(&self, idx: usize) -> Option<Player> {
        self.cells[idx]
    }

    /// All 9 cells.
    #[must_use]
    pub fn cells(&self) -> &[Option<Player>; 9] {
        &self.cells
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SmallStatus {
        self.status
    }

    /// Still open for play?
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Every cell occupied?
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Write `player` into `cell` and re-evaluate the status.
    ///
    /// Callers must have checked legality; placing on an occupied cell
    /// or a resolved board is a logic error upstream. The status
    /// transition is one-way: a non-open board is never written.
    pub fn place(&mut self, cell: usize, player: Player) -> SmallStatus {
        debug_assert!(self.status.is_open());
        debug_assert!(self.cells[cell].is_none());

        self.cells[cell] = Some(player);

        if Self::line_winner(&self.cells) == Some(player) {
            self.status = SmallStatus::Won(player);
        } else if self.is_full() {
            self.status = SmallStatus::Drawn;
        }
        self.status
    }

    /// Would `player` complete a line by taking `cell`?
    #[must_use]
    pub fn wins_if_placed(&self, cell: usize, player: Player) -> bool {
        if !self.status.is_open() || self.cells[cell].is_some() {
            return false;
        }
        LINES.iter().any(|line| {
            line.contains(&cell)
                && line
                    .iter()
                    .all(|&i| i == cell || self.cells[i] == Some(player))
        })
    }

    /// Winner over the board's own cells, if any line is complete.
    fn line_winner(cells: &[Option<Player>; 9]) -> Option<Player> {
        for line in &LINES {
            if let Some(p) = cells[line[0]] {
                if cells[line[1]] == Some(p) && cells[line[2]] == Some(p) {
                    return Some(p);
                }
            }
        }
        None
    }

    /// Winner over an arbitrary 9-slot status-like grid.
    ///
    /// Shared with the meta-board check, which runs over small-board
    /// statuses instead of cell occupants.
    #[must_use]
    pub fn grid_winner(grid: &[Option<Player>; 9]) -> Option<Player> {
        Self::line_winner(grid)
    }

    /// Replace the cell contents wholesale, keeping the status.
    ///
    /// Only used by the chaos-shuffle effect, which swaps the contents
    /// of two open boards. Open boards contain no completed line, so
    /// the status stays correct.
    pub(crate) fn set_cells(&mut self, cells: [Option<Player>; 9]) {
        debug_assert!(self.status.is_open());
        self.cells = cells;
    }
}
