//! Player identity and match outcomes.

use serde::{Deserialize, Serialize};

/// One of the two sides of a match.
///
/// The rules layer is symmetric; which side is the human and which is
/// the AI is decided by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The opposing side.
    #[must_use]
    pub const fn other(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// 0-based index, for array-backed tallies.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::One => write!(f, "P1"),
            Player::Two => write!(f, "P2"),
        }
    }
}

/// Result of a finished match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won(Player),
    Draw,
}

impl Outcome {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(self, player: Player) -> bool {
        matches!(self, Outcome::Won(p) if p == player)
    }

    /// Reward value in {1, 0.5, 0} from `player`'s perspective.
    #[must_use]
    pub fn value_for(self, player: Player) -> f64 {
        match self {
            Outcome::Won(p) if p == player => 1.0,
            Outcome::Won(_) => 0.0,
            Outcome::Draw => 0.5,
        }
    }
}
