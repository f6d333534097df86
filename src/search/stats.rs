//! Per-call search statistics.

use serde::{Deserialize, Serialize};

/// Counters for one `SearchEngine::choose_move` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Completed MCTS iterations.
    pub iterations: u32,
    /// Rollouts run (terminal nodes reuse their stored outcome).
    pub rollouts: u32,
    /// Nodes added to the arena, root excluded.
    pub nodes_expanded: u32,
    /// Deepest node touched.
    pub max_depth: u16,
    /// Wall-clock time of the call, microseconds.
    pub time_us: u64,
}

impl SearchStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
