//! Move selection: heuristic short-circuits in front of MCTS.
//!
//! Order of play (spec'd by the difficulty profile):
//! 1. take an immediate match-winning move, with `spot_win_probability`;
//! 2. block the opponent's immediate match-winning threat, with
//!    `spot_block_probability`;
//! 3. with `pattern_exploitation_weight * 0.3`, bypass search and play
//!    into the board the human has historically played least;
//! 4. while in book, prefer an opening line that has favored the AI;
//! 5. otherwise run MCTS for `simulation_budget` iterations.

use std::time::{Duration, Instant};

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::core::MatchRng;
use crate::difficulty::DifficultyProfile;
use crate::modifiers::Modifier;
use crate::profile::{opening_key, OpeningStats, SavedProfile, OPENING_KEY_PLIES};
use crate::rules::engine::{apply_move_unchecked, legal_moves, match_winner, winning_coords};
use crate::rules::{Coord, MatchState, Move};

use super::node::SearchNode;
use super::rollout::{rollout, ROLLOUT_PLY_CAP};
use super::stats::SearchStats;
use super::tree::SearchTree;

/// Minimum samples before an opening-book entry is trusted.
const BOOK_MIN_SAMPLES: u32 = 3;
/// Book entries below this AI win rate are ignored.
const BOOK_MIN_WIN_RATE: f64 = 0.55;

/// Default defensive wall-clock cap per search call. The simulation
/// budget already bounds work; this is a backstop.
const DEFAULT_TIME_CAP: Duration = Duration::from_secs(2);

/// The AI opponent's move selector.
///
/// Owns its RNG; everything else (state, modifier, difficulty,
/// profile) is passed per call and read-only.
pub struct SearchEngine {
    rng: MatchRng,
    time_cap: Duration,
    stats: SearchStats,
}

impl SearchEngine {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: MatchRng::new(seed),
            time_cap: DEFAULT_TIME_CAP,
            stats: SearchStats::default(),
        }
    }

    /// Override the defensive wall-clock cap.
    #[must_use]
    pub fn with_time_cap(mut self, cap: Duration) -> Self {
        self.time_cap = cap;
        self
    }

    /// Statistics from the most recent call.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Choose a move for the side to move in `state`.
    ///
    /// Returns `None` only when no legal move exists; the controller
    /// treats that as a stalemate draw.
    pub fn choose_move(
        &mut self,
        state: &MatchState,
        modifier: Option<&Modifier>,
        difficulty: &DifficultyProfile,
        saved: &SavedProfile,
    ) -> Option<Move> {
        let me = state.turn;
        let legal = legal_moves(state, modifier);
        if legal.is_empty() {
            warn!("no legal move for {me} in a non-terminal state; stalemate");
            return None;
        }
        self.stats.reset();

        // 1. Immediate win.
        let wins: Vec<Coord> = winning_coords(state, me, modifier)
            .into_iter()
            .filter(|c| legal.contains(c))
            .collect();
        if !wins.is_empty() && self.rng.gen_bool(difficulty.spot_win_probability) {
            let coord = *self.rng.choose(&wins)?;
            trace!(%coord, "taking immediate win");
            return Some(Move::new(coord.board, coord.cell, me));
        }

        // 2. Immediate block.
        let threats: Vec<Coord> = winning_coords(state, me.other(), modifier)
            .into_iter()
            .filter(|c| legal.contains(c))
            .collect();
        if !threats.is_empty() && self.rng.gen_bool(difficulty.spot_block_probability) {
            let coord = *self.rng.choose(&threats)?;
            trace!(%coord, "blocking immediate threat");
            return Some(Move::new(coord.board, coord.cell, me));
        }

        // 3. Pattern exploitation: steer into the human's least-played
        // board, bypassing search entirely.
        if saved.player_profile.has_pattern_sample()
            && self
                .rng
                .gen_bool(difficulty.pattern_exploitation_weight * 0.3)
        {
            if let Some(coord) = self.exploit_pattern(&legal, saved) {
                trace!(%coord, "exploiting board preference pattern");
                return Some(Move::new(coord.board, coord.cell, me));
            }
        }

        // 4. Opening book.
        if difficulty.opening_book_enabled && state.history.len() < OPENING_KEY_PLIES {
            if let Some(coord) = book_move(state, &legal, saved) {
                trace!(%coord, "playing book move");
                return Some(Move::new(coord.board, coord.cell, me));
            }
        }

        // 5. Full search.
        self.mcts(state, modifier, difficulty, legal)
    }

    /// Inverse-frequency weighted board choice, then any legal move
    /// within it.
    fn exploit_pattern(&mut self, legal: &[Coord], saved: &SavedProfile) -> Option<Coord> {
        let inverse = saved.player_profile.inverse_board_weights();

        let mut boards: SmallVec<[u8; 9]> = SmallVec::new();
        for c in legal {
            if !boards.contains(&c.board) {
                boards.push(c.board);
            }
        }

        let weights: Vec<f64> = boards.iter().map(|&b| inverse[b as usize]).collect();
        let target = boards[self.rng.choose_weighted(&weights)?];

        let in_board: Vec<Coord> = legal.iter().copied().filter(|c| c.board == target).collect();
        self.rng.choose(&in_board).copied()
    }

    fn mcts(
        &mut self,
        state: &MatchState,
        modifier: Option<&Modifier>,
        difficulty: &DifficultyProfile,
        legal: Vec<Coord>,
    ) -> Option<Move> {
        let start = Instant::now();
        let me = state.turn;
        let temperature = difficulty.exploration_temperature;

        let untried: SmallVec<[Coord; 8]> = legal.iter().copied().collect();
        let mut tree = SearchTree::new(SearchNode::root(me, untried));

        for _ in 0..difficulty.simulation_budget {
            if start.elapsed() >= self.time_cap {
                break;
            }

            let mut sim = state.clone();

            // Selection: descend while fully expanded.
            let mut node_id = tree.root();
            loop {
                let node = tree.get(node_id);
                if node.terminal.is_some()
                    || !node.untried.is_empty()
                    || node.children.is_empty()
                {
                    break;
                }
                let Some(next) = tree.best_child_ucb1(node_id, temperature) else {
                    break;
                };
                node_id = next;
                if let Some(coord) = tree.get(node_id).mv {
                    let mover = sim.turn;
                    apply_move_unchecked(
                        &mut sim,
                        Move::new(coord.board, coord.cell, mover),
                        modifier,
                    );
                }
            }

            // Expansion: instantiate one untried child.
            if tree.get(node_id).terminal.is_none() && !tree.get(node_id).untried.is_empty() {
                let untried_len = tree.get(node_id).untried.len();
                let idx = self.rng.gen_range(0..untried_len);
                let coord = tree.get_mut(node_id).untried.swap_remove(idx);

                let mover = sim.turn;
                apply_move_unchecked(
                    &mut sim,
                    Move::new(coord.board, coord.cell, mover),
                    modifier,
                );

                let terminal = match_winner(&sim, modifier);
                let untried_child: SmallVec<[Coord; 8]> = if terminal.is_some() {
                    SmallVec::new()
                } else {
                    legal_moves(&sim, modifier).into_iter().collect()
                };

                let depth = tree.get(node_id).depth + 1;
                let child = SearchNode::new(node_id, coord, mover, depth, untried_child, terminal);
                let child_id = tree.alloc(child);
                tree.get_mut(node_id).children.push(child_id);

                self.stats.nodes_expanded += 1;
                if depth > self.stats.max_depth {
                    self.stats.max_depth = depth;
                }
                node_id = child_id;
            }

            // Rollout (terminal nodes reuse their stored outcome).
            let outcome = match tree.get(node_id).terminal {
                Some(outcome) => outcome,
                None => {
                    self.stats.rollouts += 1;
                    let mut rollout_rng = self.rng.fork();
                    rollout(
                        &mut sim,
                        modifier,
                        &mut rollout_rng,
                        ROLLOUT_PLY_CAP,
                        difficulty.heuristic_depth,
                    )
                }
            };

            // Backpropagation: each node scores the result from its
            // own mover's perspective, flipping level by level.
            let mut cur = node_id;
            loop {
                let node = tree.get_mut(cur);
                node.visits += 1;
                node.wins += outcome.value_for(node.mover);
                if node.parent.is_none() {
                    break;
                }
                cur = node.parent;
            }

            self.stats.iterations += 1;
        }

        // Budget or clock exhausted before any expansion: fall back
        // to a uniform legal move rather than returning nothing.
        let chosen = match self.pick_root_child(&tree, temperature) {
            Some(coord) => coord,
            None => legal[self.rng.gen_range(0..legal.len())],
        };

        self.stats.time_us = start.elapsed().as_micros() as u64;
        trace!(
            coord = %chosen,
            iterations = self.stats.iterations,
            nodes = tree.len(),
            "search complete"
        );
        Some(Move::new(chosen.board, chosen.cell, me))
    }

    /// Final selection from the root: visit-weighted sampling when the
    /// temperature is high (keeps weak opponents from always playing
    /// the optimum), greedy most-visited otherwise.
    fn pick_root_child(&mut self, tree: &SearchTree, temperature: f64) -> Option<Coord> {
        let root = tree.root();
        let children = &tree.get(root).children;
        if children.is_empty() {
            return None;
        }

        let id = if temperature > 0.5 {
            let weights: Vec<f64> = children
                .iter()
                .map(|&c| f64::from(tree.get(c).visits))
                .collect();
            match self.rng.choose_weighted(&weights) {
                Some(idx) => children[idx],
                None => tree.most_visited_child(root)?,
            }
        } else {
            tree.most_visited_child(root)?
        };

        tree.get(id).mv
    }
}

/// A legal move whose opening line has historically favored the AI.
///
/// Ledger keys are full six-ply lines; the current history plus a
/// candidate move forms a prefix, and every line sharing it is
/// aggregated. Entries need `BOOK_MIN_SAMPLES` samples and a win rate
/// above `BOOK_MIN_WIN_RATE` to qualify.
fn book_move(state: &MatchState, legal: &[Coord], saved: &SavedProfile) -> Option<Coord> {
    if saved.opening_book.is_empty() {
        return None;
    }

    let prefix = opening_key(&state.history);
    let mut best: Option<(Coord, f64)> = None;

    for &coord in legal {
        let line = if prefix.is_empty() {
            coord.to_string()
        } else {
            format!("{prefix}-{coord}")
        };

        let mut agg = OpeningStats::default();
        for (key, stats) in &saved.opening_book {
            if key.starts_with(&line) {
                agg.wins += stats.wins;
                agg.losses += stats.losses;
                agg.draws += stats.draws;
            }
        }

        if agg.samples() < BOOK_MIN_SAMPLES {
            continue;
        }
        let rate = agg.win_rate();
        if rate <= BOOK_MIN_WIN_RATE {
            continue;
        }
        if best.map_or(true, |(_, r)| rate > r) {
            best = Some((coord, rate));
        }
    }

    best.map(|(coord, _)| coord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Player;
    use crate::difficulty::curve;

    fn hard() -> DifficultyProfile {
        curve(1.0)
    }

    fn profile_with_budget(budget: u32) -> DifficultyProfile {
        let mut p = hard();
        p.simulation_budget = budget;
        p
    }

    #[test]
    fn test_returns_legal_move_with_budget_one() {
        let state = MatchState::new(Player::Two);
        let saved = SavedProfile::default();
        let mut engine = SearchEngine::new(1);

        let mut p = profile_with_budget(1);
        p.spot_win_probability = 0.0;
        p.spot_block_probability = 0.0;
        p.pattern_exploitation_weight = 0.0;
        p.opening_book_enabled = false;

        for temperature in [0.0, 0.3, 1.2] {
            p.exploration_temperature = temperature;
            let mv = engine.choose_move(&state, None, &p, &saved).unwrap();
            assert!(legal_moves(&state, None).contains(&mv.coord()));
            assert_eq!(mv.player, Player::Two);
        }
    }

    #[test]
    fn test_takes_forced_win() {
        // P2 (to move) wins boards 0 and 1; board 2 needs one more
        // P2 stone at cell 2 to complete both the small board and the
        // top meta row.
        let mut state = MatchState::new(Player::Two);
        for b in [0usize, 1] {
            for cell in [0usize, 1, 2] {
                state.board_mut(b).place(cell, Player::Two);
            }
        }
        state.board_mut(2).place(0, Player::Two);
        state.board_mut(2).place(1, Player::Two);

        let mut p = hard();
        p.spot_win_probability = 1.0;

        let saved = SavedProfile::default();
        let mut engine = SearchEngine::new(7);
        let mv = engine.choose_move(&state, None, &p, &saved).unwrap();

        assert_eq!(mv.coord(), Coord::new(2, 2));
    }

    #[test]
    fn test_blocks_forced_loss() {
        // P1 threatens to finish the top meta row at (2, 2); P2 must
        // block when spot_block_probability is 1 and no own win exists.
        let mut state = MatchState::new(Player::Two);
        for b in [0usize, 1] {
            for cell in [0usize, 1, 2] {
                state.board_mut(b).place(cell, Player::One);
            }
        }
        state.board_mut(2).place(0, Player::One);
        state.board_mut(2).place(1, Player::One);

        let mut p = hard();
        p.spot_win_probability = 1.0;
        p.spot_block_probability = 1.0;

        let saved = SavedProfile::default();
        let mut engine = SearchEngine::new(7);
        let mv = engine.choose_move(&state, None, &p, &saved).unwrap();

        assert_eq!(mv.coord(), Coord::new(2, 2));
    }

    #[test]
    fn test_no_legal_moves_returns_none() {
        let mut state = MatchState::new(Player::Two);
        // Resolve every board so nothing is legal.
        for b in 0..9usize {
            for cell in [0usize, 1, 2] {
                state.board_mut(b).place(cell, Player::One);
            }
        }
        let saved = SavedProfile::default();
        let mut engine = SearchEngine::new(7);
        assert!(engine.choose_move(&state, None, &hard(), &saved).is_none());
    }

    #[test]
    fn test_deterministic_with_seed() {
        let state = MatchState::new(Player::Two);
        let saved = SavedProfile::default();

        let mut p = profile_with_budget(200);
        p.exploration_temperature = 0.0;

        let mut e1 = SearchEngine::new(99);
        let mut e2 = SearchEngine::new(99);

        let m1 = e1.choose_move(&state, None, &p, &saved);
        let m2 = e2.choose_move(&state, None, &p, &saved);
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_pattern_exploitation_targets_least_played_board() {
        let state = MatchState::new(Player::Two);

        let mut saved = SavedProfile::default();
        // Human has pounded every board except board 7.
        for b in 0..9 {
            saved.player_profile.board_preferences[b] = if b == 7 { 0 } else { 500 };
        }
        saved.player_profile.total_moves = 4000;

        let mut p = profile_with_budget(10);
        p.spot_win_probability = 0.0;
        p.spot_block_probability = 0.0;
        p.pattern_exploitation_weight = 1.0;
        p.opening_book_enabled = false;

        let mut engine = SearchEngine::new(13);
        let mut hits = 0;
        for _ in 0..200 {
            let mv = engine.choose_move(&state, None, &p, &saved).unwrap();
            // The bias fires with probability 0.3; when it does, board
            // 7 dominates the inverse-frequency weights.
            if mv.board == 7 {
                hits += 1;
            }
        }
        assert!(hits > 20, "pattern bias never fired ({hits}/200)");
    }

    #[test]
    fn test_book_move_prefers_winning_line() {
        let state = MatchState::new(Player::Two);

        let mut saved = SavedProfile::default();
        saved.opening_book.insert(
            "b4c4-b4c0-b0c4-b4c8-b8c4-b4c2".into(),
            OpeningStats { wins: 8, losses: 1, draws: 1 },
        );
        saved.opening_book.insert(
            "b0c0-b0c1-b1c0-b0c2-b2c0-b0c3".into(),
            OpeningStats { wins: 1, losses: 9, draws: 0 },
        );

        let legal = legal_moves(&state, None);
        let coord = book_move(&state, &legal, &saved).unwrap();
        assert_eq!(coord, Coord::new(4, 4));
    }

    #[test]
    fn test_book_move_ignores_thin_samples() {
        let state = MatchState::new(Player::Two);
        let mut saved = SavedProfile::default();
        saved.opening_book.insert(
            "b4c4-b4c0-b0c4-b4c8-b8c4-b4c2".into(),
            OpeningStats { wins: 1, losses: 0, draws: 0 },
        );

        let legal = legal_moves(&state, None);
        assert!(book_move(&state, &legal, &saved).is_none());
    }
}
