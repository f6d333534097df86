//! The AI opponent: heuristic short-circuits plus MCTS.
//!
//! Each search call owns its node arena exclusively; nothing persists
//! between invocations.

mod engine;
mod node;
mod rollout;
mod stats;
mod tree;

pub use engine::SearchEngine;
pub use node::{NodeId, SearchNode};
pub use rollout::{rollout, ROLLOUT_PLY_CAP};
pub use stats::SearchStats;
pub use tree::SearchTree;
