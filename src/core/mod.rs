//! Core primitives: players, match outcomes, deterministic RNG.

mod player;
mod rng;

pub use player::{Outcome, Player};
pub use rng::{MatchRng, MatchRngState};
