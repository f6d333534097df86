//! # ninetwist
//!
//! Rules engine and adaptive MCTS opponent for a nine-board
//! "ultimate tic-tac-toe" variant with randomized per-match rule
//! modifiers ("twists").
//!
//! ## Design Principles
//!
//! 1. **Pure library**: the engine performs no I/O. It reads a persisted
//!    profile record at match start and returns an updated copy at match
//!    end for the caller to store.
//!
//! 2. **Deterministic**: every source of randomness (modifier roll,
//!    rollouts, final move sampling) flows through an explicit seedable
//!    RNG, so tests can reproduce exact searches and modifier outcomes.
//!
//! 3. **Single-owner search state**: each search call owns its node arena
//!    exclusively and discards it afterwards. Nothing is shared between
//!    invocations.
//!
//! ## Modules
//!
//! - `core`: players, outcomes, deterministic RNG
//! - `rules`: board model, legality, move application, termination
//! - `modifiers`: per-match rule twists (legality filters, board effects,
//!   terminal overrides, turn structure)
//! - `difficulty`: skill scalar -> search/heuristic parameter curve
//! - `profile`: persisted player model and opening book
//! - `search`: heuristic short-circuits and MCTS
//! - `controller`: match orchestration and profile fold-back

pub mod core;
pub mod rules;
pub mod modifiers;
pub mod difficulty;
pub mod profile;
pub mod search;
pub mod controller;

// Re-export commonly used types
pub use crate::core::{MatchRng, MatchRngState, Outcome, Player};

pub use crate::rules::{
    ActiveBoard, Coord, MatchState, Move, MoveReport, RulesError, SmallBoard, SmallStatus,
};

pub use crate::modifiers::{Modifier, ModifierEvent, ModifierId};

pub use crate::difficulty::{curve, skill_to_t_for_tier, tier_for, DifficultyProfile, MAX_SKILL};

pub use crate::profile::{OpeningStats, PlayerModel, SavedProfile};

pub use crate::search::{SearchEngine, SearchStats};

pub use crate::controller::{MatchController, MatchPhase, TurnReport, AI, HUMAN};
