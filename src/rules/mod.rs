//! Board representation, legality, and terminal-state detection.

mod board;
pub mod engine;
mod state;

pub use board::{SmallBoard, SmallStatus, LINES};
pub use engine::{MoveReport, RulesError};
pub use state::{ActiveBoard, Coord, MatchState, Move};
