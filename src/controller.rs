//! Match orchestration: turn order, modifier effects, search
//! invocation, and the end-of-match profile fold.
//!
//! Thin glue by design. The controller owns the only mutable
//! references to `MatchState` and the active `Modifier`; the saved
//! profile is read during play and written exactly once, in
//! `finish_profile`.

use tracing::warn;

use crate::core::{MatchRng, Outcome, Player};
use crate::difficulty::{award_points, curve, skill_to_t_for_tier, DifficultyProfile};
use crate::modifiers::{roll_modifier, Modifier, ModifierEvent, ModifierId};
use crate::profile::{opening_key, SavedProfile};
use crate::rules::engine::{apply_move, legal_moves, winning_coords};
use crate::rules::{ActiveBoard, Coord, MatchState, Move, MoveReport, RulesError, SmallStatus};
use crate::search::{SearchEngine, SearchStats};

/// The human always plays first and is always side One.
pub const HUMAN: Player = Player::One;
pub const AI: Player = Player::Two;

/// Minimum total moves before a match contributes to the opening ledger.
const OPENING_LEDGER_MIN_MOVES: usize = 4;

/// Lifecycle of one match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    Idle,
    ModifierRolled,
    InProgress,
    Terminal(Outcome),
    ProfileUpdated,
}

/// What one half-move did, for the UI.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnReport {
    /// The move made; `None` on the defensive stalemate path.
    pub mv: Option<Move>,
    /// Status the target board resolved to, if it resolved.
    pub claimed: Option<SmallStatus>,
    /// Constraint now in force.
    pub next: ActiveBoard,
    /// Terminal outcome, if the match just ended.
    pub outcome: Option<Outcome>,
    /// Modifier events fired at the start of the following turn.
    pub events: Vec<ModifierEvent>,
    /// The same side moves again (double-move twist).
    pub extra_move_pending: bool,
}

/// Orchestrates one match at a time.
pub struct MatchController {
    state: MatchState,
    modifier: Option<Modifier>,
    saved: SavedProfile,
    difficulty: DifficultyProfile,
    search: SearchEngine,
    rng: MatchRng,
    phase: MatchPhase,
    human_moves: Vec<Move>,
    blocks: u32,
    misses: u32,
    moves_left: u32,
}

impl MatchController {
    /// Build a controller for a match against opponent tier `tier`
    /// (0-9). The saved profile is read-only until `finish_profile`.
    #[must_use]
    pub fn new(saved: SavedProfile, tier: u32, seed: u64) -> Self {
        let t = skill_to_t_for_tier(saved.skill_points, tier);
        let mut rng = MatchRng::new(seed);
        let search = SearchEngine::new(rng.fork().state().seed);

        Self {
            state: MatchState::new(HUMAN),
            modifier: None,
            saved,
            difficulty: curve(t),
            search,
            rng,
            phase: MatchPhase::Idle,
            human_moves: Vec::new(),
            blocks: 0,
            misses: 0,
            moves_left: 1,
        }
    }

    /// Roll this match's modifier and open play. Returns the rolled
    /// identity and any effects already applied to the first turn.
    pub fn start_match(&mut self) -> (ModifierId, Vec<ModifierEvent>) {
        self.state = MatchState::new(HUMAN);
        self.human_moves.clear();
        self.blocks = 0;
        self.misses = 0;

        self.modifier = roll_modifier(&mut self.rng);
        let id = self.modifier.as_ref().map_or(ModifierId::None, Modifier::id);
        self.phase = MatchPhase::ModifierRolled;

        self.moves_left = self.moves_per_turn();
        let events = self.run_turn_effects();
        self.phase = MatchPhase::InProgress;
        (id, events)
    }

    /// Legal moves for the side currently to move.
    #[must_use]
    pub fn legal_moves(&self) -> Vec<Coord> {
        legal_moves(&self.state, self.modifier.as_ref())
    }

    /// Apply the human's move.
    pub fn submit_human_move(&mut self, board: u8, cell: u8) -> Result<TurnReport, RulesError> {
        if self.phase != MatchPhase::InProgress || self.state.turn != HUMAN {
            return Err(RulesError::NotYourTurn(HUMAN));
        }

        // Threat bookkeeping before the move mutates the state. Only
        // threats the human could actually occupy count toward the
        // block/miss tally; a threat locked behind the active-board
        // constraint is not a missed block.
        let legal = legal_moves(&self.state, self.modifier.as_ref());
        let threats: Vec<Coord> = winning_coords(&self.state, AI, self.modifier.as_ref())
            .into_iter()
            .filter(|c| legal.contains(c))
            .collect();

        let mv = Move::new(board, cell, HUMAN);
        let report = apply_move(&mut self.state, mv, self.modifier.as_ref())?;

        self.human_moves.push(mv);
        if !threats.is_empty() {
            if threats.contains(&mv.coord()) {
                self.blocks += 1;
            } else {
                self.misses += 1;
            }
        }

        Ok(self.after_move(HUMAN, report))
    }

    /// Run one AI half-move.
    ///
    /// The defensive stalemate path (no legal move in a non-terminal
    /// state) resolves as a draw and is logged, never propagated.
    pub fn play_ai_turn(&mut self) -> TurnReport {
        debug_assert_eq!(self.state.turn, AI);
        debug_assert_eq!(self.phase, MatchPhase::InProgress);

        let chosen = self.search.choose_move(
            &self.state,
            self.modifier.as_ref(),
            &self.difficulty,
            &self.saved,
        );

        let Some(mv) = chosen else {
            return self.stalemate("search found no legal move");
        };

        match apply_move(&mut self.state, mv, self.modifier.as_ref()) {
            Ok(report) => self.after_move(AI, report),
            Err(err) => {
                // Should be unreachable: the search only returns moves
                // drawn from legal_moves.
                warn!(%err, "search produced an illegal move");
                self.stalemate("illegal move from search")
            }
        }
    }

    /// Fold the finished match into the profile and hand back the
    /// updated record for the caller to persist.
    ///
    /// This is the single write to the player model.
    pub fn finish_profile(&mut self) -> SavedProfile {
        let MatchPhase::Terminal(outcome) = self.phase else {
            return self.saved.clone();
        };

        self.saved.player_profile.fold_moves(&self.human_moves);
        self.saved.player_profile.blocks_when_threatened.blocks += self.blocks;
        self.saved.player_profile.blocks_when_threatened.misses += self.misses;

        if self.state.history.len() >= OPENING_LEDGER_MIN_MOVES {
            let key = opening_key(&self.state.history);
            self.saved.record_opening(key, outcome, AI);
        }

        self.saved.skill_points = award_points(self.saved.skill_points, outcome, HUMAN);

        self.phase = MatchPhase::ProfileUpdated;
        self.saved.clone()
    }

    /// Return to `Idle`, ready for the next match.
    pub fn reset(&mut self) {
        self.phase = MatchPhase::Idle;
    }

    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Identity of this match's twist.
    #[must_use]
    pub fn active_modifier(&self) -> ModifierId {
        self.modifier.as_ref().map_or(ModifierId::None, Modifier::id)
    }

    #[must_use]
    pub fn difficulty(&self) -> &DifficultyProfile {
        &self.difficulty
    }

    #[must_use]
    pub fn search_stats(&self) -> &SearchStats {
        self.search.stats()
    }

    // === internals ===

    fn moves_per_turn(&self) -> u32 {
        self.modifier.as_ref().map_or(1, Modifier::moves_per_turn)
    }

    /// Shared post-move bookkeeping: terminal detection, double-move
    /// structure, and next-turn modifier effects.
    fn after_move(&mut self, mover: Player, report: MoveReport) -> TurnReport {
        if let Some(outcome) = report.outcome {
            self.phase = MatchPhase::Terminal(outcome);
            return TurnReport {
                mv: Some(report.mv),
                claimed: report.claimed,
                next: report.next,
                outcome: Some(outcome),
                events: Vec::new(),
                extra_move_pending: false,
            };
        }

        self.moves_left -= 1;
        if self.moves_left > 0 {
            // Same side moves again, unless nothing remains for it.
            self.state.turn = mover;
            if legal_moves(&self.state, self.modifier.as_ref()).is_empty() {
                self.state.turn = mover.other();
                self.moves_left = 0;
            } else {
                return TurnReport {
                    mv: Some(report.mv),
                    claimed: report.claimed,
                    next: report.next,
                    outcome: None,
                    events: Vec::new(),
                    extra_move_pending: true,
                };
            }
        }

        // A new turn begins for the other side.
        self.moves_left = self.moves_per_turn();
        let events = self.run_turn_effects();

        let outcome = if legal_moves(&self.state, self.modifier.as_ref()).is_empty() {
            // A turn-start effect can strand the new mover with no
            // move; resolve as a stalemate rather than wedging.
            warn!("no legal move after turn-start effects; stalemate");
            self.phase = MatchPhase::Terminal(Outcome::Draw);
            Some(Outcome::Draw)
        } else {
            None
        };

        TurnReport {
            mv: Some(report.mv),
            claimed: report.claimed,
            next: report.next,
            outcome,
            events,
            extra_move_pending: false,
        }
    }

    fn run_turn_effects(&mut self) -> Vec<ModifierEvent> {
        match self.modifier.as_mut() {
            Some(m) => m.on_turn_start(&mut self.state, &mut self.rng),
            None => Vec::new(),
        }
    }

    fn stalemate(&mut self, reason: &str) -> TurnReport {
        warn!(reason, "resolving match as a stalemate draw");
        self.phase = MatchPhase::Terminal(Outcome::Draw);
        TurnReport {
            mv: None,
            claimed: None,
            next: self.state.active,
            outcome: Some(Outcome::Draw),
            events: Vec::new(),
            extra_move_pending: false,
        }
    }
}
