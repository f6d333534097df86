//! Per-match rule modifiers ("twists").
//!
//! Exactly one modifier (or none) is drawn at match start from a fixed
//! weighted table. A modifier is a closed tagged variant carrying its
//! own per-match mutable state, and exposes a small effect interface:
//!
//! - a legality filter (`allows`) consulted by the rules engine,
//! - a per-turn board effect (`on_turn_start`) that may mutate the
//!   boards without changing whose turn it is,
//! - a terminal override (`terminal_override`) replacing the normal
//!   win condition,
//! - a turn-structure effect (`moves_per_turn`).
//!
//! Fog, blackout, and countdown are presentation-only: the engine
//! reports their identity and implements no behavior for them.

use serde::{Deserialize, Serialize};

use crate::core::{MatchRng, Outcome};
use crate::rules::engine::swap_board_contents;
use crate::rules::{Coord, MatchState, SmallStatus};

/// How many turns pass between blocking waves.
const BLOCK_INTERVAL: u32 = 4;
/// Cells blocked per wave.
const BLOCK_WAVE: usize = 2;
/// How many turns pass between board shuffles.
const SHUFFLE_INTERVAL: u32 = 4;

/// Stable identity of a modifier, for the UI and for persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierId {
    None,
    BlockedCells,
    ForbiddenCell,
    ChaosShuffle,
    SuddenDeath,
    DoubleMove,
    Fog,
    Blackout,
    Countdown,
}

impl ModifierId {
    /// Identifier string, matching the persisted/UI spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModifierId::None => "none",
            ModifierId::BlockedCells => "blocked_cells",
            ModifierId::ForbiddenCell => "forbidden_cell",
            ModifierId::ChaosShuffle => "chaos_shuffle",
            ModifierId::SuddenDeath => "sudden_death",
            ModifierId::DoubleMove => "double_move",
            ModifierId::Fog => "fog",
            ModifierId::Blackout => "blackout",
            ModifierId::Countdown => "countdown",
        }
    }

    /// Parse an identifier. Unrecognized strings fall back to `None`
    /// rather than failing: an unknown twist must never wedge a match.
    #[must_use]
    pub fn parse(s: &str) -> ModifierId {
        match s {
            "blocked_cells" => ModifierId::BlockedCells,
            "forbidden_cell" => ModifierId::ForbiddenCell,
            "chaos_shuffle" => ModifierId::ChaosShuffle,
            "sudden_death" => ModifierId::SuddenDeath,
            "double_move" => ModifierId::DoubleMove,
            "fog" => ModifierId::Fog,
            "blackout" => ModifierId::Blackout,
            "countdown" => ModifierId::Countdown,
            _ => ModifierId::None,
        }
    }
}

/// Weighted roll table. Weights sum to 100; "none" holds the majority.
const ROLL_TABLE: [(ModifierId, u32); 9] = [
    (ModifierId::None, 52),
    (ModifierId::BlockedCells, 6),
    (ModifierId::ForbiddenCell, 6),
    (ModifierId::ChaosShuffle, 6),
    (ModifierId::SuddenDeath, 6),
    (ModifierId::DoubleMove, 6),
    (ModifierId::Fog, 6),
    (ModifierId::Blackout, 6),
    (ModifierId::Countdown, 6),
];

/// Discrete modifier events, surfaced for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierEvent {
    /// Cells newly and permanently blocked.
    CellsBlocked(Vec<Coord>),
    /// The forbidden cell moved here for this turn.
    ForbiddenMoved(Coord),
    /// The contents of two boards were swapped.
    BoardsSwapped(u8, u8),
}

/// An active modifier instance with its per-match state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// Permanently blocks a small random set of open cells every few
    /// turns, cumulatively.
    BlockedCells { blocked: Vec<Coord>, turns: u32 },
    /// One open cell is forbidden each turn and relocates every turn.
    ForbiddenCell { forbidden: Option<Coord> },
    /// Every few turns, swaps the full contents of two still-open boards.
    ChaosShuffle { turns: u32 },
    /// The first small board won decides the match.
    SuddenDeath,
    /// Each side makes two consecutive moves per turn.
    DoubleMove,
    /// Presentation-only.
    Fog,
    /// Presentation-only.
    Blackout,
    /// Presentation-only.
    Countdown,
}

impl Modifier {
    /// Instantiate the modifier for an identity. `None` for the
    /// no-modifier identity.
    #[must_use]
    pub fn from_id(id: ModifierId) -> Option<Modifier> {
        match id {
            ModifierId::None => None,
            ModifierId::BlockedCells => Some(Modifier::BlockedCells {
                blocked: Vec::new(),
                turns: 0,
            }),
            ModifierId::ForbiddenCell => Some(Modifier::ForbiddenCell { forbidden: None }),
            ModifierId::ChaosShuffle => Some(Modifier::ChaosShuffle { turns: 0 }),
            ModifierId::SuddenDeath => Some(Modifier::SuddenDeath),
            ModifierId::DoubleMove => Some(Modifier::DoubleMove),
            ModifierId::Fog => Some(Modifier::Fog),
            ModifierId::Blackout => Some(Modifier::Blackout),
            ModifierId::Countdown => Some(Modifier::Countdown),
        }
    }

    /// This modifier's identity.
    #[must_use]
    pub fn id(&self) -> ModifierId {
        match self {
            Modifier::BlockedCells { .. } => ModifierId::BlockedCells,
            Modifier::ForbiddenCell { .. } => ModifierId::ForbiddenCell,
            Modifier::ChaosShuffle { .. } => ModifierId::ChaosShuffle,
            Modifier::SuddenDeath => ModifierId::SuddenDeath,
            Modifier::DoubleMove => ModifierId::DoubleMove,
            Modifier::Fog => ModifierId::Fog,
            Modifier::Blackout => ModifierId::Blackout,
            Modifier::Countdown => ModifierId::Countdown,
        }
    }

    /// Legality filter: does this modifier admit `coord`?
    #[must_use]
    pub fn allows(&self, coord: Coord) -> bool {
        match self {
            Modifier::BlockedCells { blocked, .. } => !blocked.contains(&coord),
            Modifier::ForbiddenCell { forbidden } => *forbidden != Some(coord),
            _ => true,
        }
    }

    /// Moves each side makes per turn.
    #[must_use]
    pub fn moves_per_turn(&self) -> u32 {
        match self {
            Modifier::DoubleMove => 2,
            _ => 1,
        }
    }

    /// Does the match end the moment any small board is won?
    #[must_use]
    pub fn ends_on_first_claim(&self) -> bool {
        matches!(self, Modifier::SuddenDeath)
    }

    /// Terminal override, replacing the meta-board check when present.
    ///
    /// A single move touches exactly one small board, so at most one
    /// board can be newly won here; no tie-break exists or is needed.
    #[must_use]
    pub fn terminal_override(&self, state: &MatchState) -> Option<Outcome> {
        if !self.ends_on_first_claim() {
            return None;
        }
        state.meta_statuses().iter().find_map(|s| match s {
            SmallStatus::Won(p) => Some(Outcome::Won(*p)),
            _ => None,
        })
    }

    /// Per-turn effect, run at the start of each turn before the mover
    /// acts. Mutates modifier state and possibly the boards; never
    /// changes whose turn it is. Returns events for rendering.
    pub fn on_turn_start(&mut self, state: &mut MatchState, rng: &mut MatchRng) -> Vec<ModifierEvent> {
        match self {
            Modifier::BlockedCells { blocked, turns } => {
                *turns += 1;
                if *turns % BLOCK_INTERVAL != 0 {
                    return Vec::new();
                }
                let candidates = open_empty_cells(state, blocked);
                let mut wave = Vec::new();
                let mut pool = candidates;
                for _ in 0..BLOCK_WAVE {
                    if pool.is_empty() {
                        break;
                    }
                    let idx = rng.gen_range(0..pool.len());
                    wave.push(pool.swap_remove(idx));
                }
                if wave.is_empty() {
                    return Vec::new();
                }
                blocked.extend_from_slice(&wave);
                vec![ModifierEvent::CellsBlocked(wave)]
            }
            Modifier::ForbiddenCell { forbidden } => {
                let candidates = open_empty_cells(state, &[]);
                *forbidden = rng.choose(&candidates).copied();
                match *forbidden {
                    Some(coord) => vec![ModifierEvent::ForbiddenMoved(coord)],
                    None => Vec::new(),
                }
            }
            Modifier::ChaosShuffle { turns } => {
                *turns += 1;
                if *turns % SHUFFLE_INTERVAL != 0 {
                    return Vec::new();
                }
                let open: Vec<usize> = state.open_boards().collect();
                if open.len() < 2 {
                    return Vec::new();
                }
                let i = rng.gen_range(0..open.len());
                let mut j = rng.gen_range(0..open.len() - 1);
                if j >= i {
                    j += 1;
                }
                let (a, b) = (open[i] as u8, open[j] as u8);
                swap_board_contents(state, a, b);
                vec![ModifierEvent::BoardsSwapped(a, b)]
            }
            _ => Vec::new(),
        }
    }
}

/// Empty cells of open boards, excluding already-blocked coords.
fn open_empty_cells(state: &MatchState, exclude: &[Coord]) -> Vec<Coord> {
    let mut out = Vec::new();
    for board in 0..9u8 {
        if !state.board(board as usize).is_open() {
            continue;
        }
        for cell in 0..9u8 {
            if state.board(board as usize).cell(cell as usize).is_some() {
                continue;
            }
            let coord = Coord::new(board, cell);
            if exclude.contains(&coord) {
                continue;
            }
            out.push(coord);
        }
    }
    out
}

/// Draw this match's modifier from the weighted table.
#[must_use]
pub fn roll_modifier(rng: &mut MatchRng) -> Option<Modifier> {
    let weights: Vec<f64> = ROLL_TABLE.iter().map(|(_, w)| *w as f64).collect();
    let idx = rng.choose_weighted(&weights).unwrap_or(0);
    Modifier::from_id(ROLL_TABLE[idx].0)
}
