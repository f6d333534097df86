//! Persisted player model and opening book.
//!
//! The engine never touches storage. It is handed the decoded record
//! at match start, reads it during search, and returns an updated copy
//! at match end for the caller to persist. The record is mutated in
//! exactly one place: the end-of-match fold.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Outcome, Player};
use crate::rules::Move;

/// Minimum tracked human moves before pattern exploitation engages.
pub const MIN_PATTERN_SAMPLE: u32 = 30;

/// How many half-moves key the opening ledger.
pub const OPENING_KEY_PLIES: usize = 6;

/// Block/miss tally for positions where the human was threatened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStats {
    pub blocks: u32,
    pub misses: u32,
}

/// Outcome tally for one opening line, from the AI's perspective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl OpeningStats {
    #[must_use]
    pub fn samples(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Win rate for the AI, counting draws as half.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        let n = self.samples();
        if n == 0 {
            return 0.5;
        }
        (f64::from(self.wins) + 0.5 * f64::from(self.draws)) / f64::from(n)
    }
}

/// Aggregate statistics about the human's move tendencies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerModel {
    /// Which board the human's first move lands in, per match.
    pub first_move_boards: [u32; 9],
    /// Which cell the human's first move lands in, per match.
    pub first_move_cells: [u32; 9],
    /// Board frequency over every tracked human move.
    pub board_preferences: [u32; 9],
    /// Cell frequency over every tracked human move.
    pub cell_preferences: [u32; 9],
    pub blocks_when_threatened: BlockStats,
    pub total_moves: u32,
    pub games_played: u32,
}

impl PlayerModel {
    /// Fold one match's human moves into the histograms. Called once,
    /// at match end.
    pub fn fold_moves(&mut self, human_moves: &[Move]) {
        if let Some(first) = human_moves.first() {
            self.first_move_boards[first.board as usize] += 1;
            self.first_move_cells[first.cell as usize] += 1;
        }
        for mv in human_moves {
            self.board_preferences[mv.board as usize] += 1;
            self.cell_preferences[mv.cell as usize] += 1;
            self.total_moves += 1;
        }
        self.games_played += 1;
    }

    /// Inverse-frequency weight per board: the less the human has
    /// played a board, the heavier it weighs.
    #[must_use]
    pub fn inverse_board_weights(&self) -> [f64; 9] {
        std::array::from_fn(|i| 1.0 / (1.0 + f64::from(self.board_preferences[i])))
    }

    /// Enough history for pattern exploitation?
    #[must_use]
    pub fn has_pattern_sample(&self) -> bool {
        self.total_moves > MIN_PATTERN_SAMPLE
    }
}

/// The complete persisted record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedProfile {
    pub skill_points: u32,
    pub player_profile: PlayerModel,
    pub opening_book: FxHashMap<String, OpeningStats>,
}

impl SavedProfile {
    /// Decode a persisted record. Missing or unparsable input yields a
    /// fresh default (all histograms zero, skill zero) instead of an
    /// error: a corrupt save must never block play.
    #[must_use]
    pub fn from_json(raw: &str) -> SavedProfile {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Encode for the caller to persist.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Serialization of this record cannot fail: no non-string map
        // keys, no non-finite floats.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Record one opening line's result, from the AI's perspective.
    pub fn record_opening(&mut self, key: String, outcome: Outcome, ai: Player) {
        let entry = self.opening_book.entry(key).or_default();
        match outcome {
            Outcome::Won(p) if p == ai => entry.wins += 1,
            Outcome::Won(_) => entry.losses += 1,
            Outcome::Draw => entry.draws += 1,
        }
    }
}

/// Ledger key: the first `OPENING_KEY_PLIES` half-moves' coordinates,
/// joined in order.
#[must_use]
pub fn opening_key(history: &[Move]) -> String {
    history
        .iter()
        .take(OPENING_KEY_PLIES)
        .map(|m| m.coord().to_string())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(board: u8, cell: u8) -> Move {
        Move::new(board, cell, Player::One)
    }

    #[test]
    fn test_fold_moves_updates_histograms() {
        let mut model = PlayerModel::default();
        model.fold_moves(&[mv(4, 4), mv(4, 0), mv(0, 4)]);

        assert_eq!(model.first_move_boards[4], 1);
        assert_eq!(model.first_move_cells[4], 1);
        assert_eq!(model.board_preferences[4], 2);
        assert_eq!(model.board_preferences[0], 1);
        assert_eq!(model.cell_preferences[4], 2);
        assert_eq!(model.cell_preferences[0], 1);
        assert_eq!(model.total_moves, 3);
        assert_eq!(model.games_played, 1);
    }

    #[test]
    fn test_fold_empty_match_still_counts_game() {
        let mut model = PlayerModel::default();
        model.fold_moves(&[]);
        assert_eq!(model.games_played, 1);
        assert_eq!(model.total_moves, 0);
        assert_eq!(model.first_move_boards, [0; 9]);
    }

    #[test]
    fn test_inverse_board_weights() {
        let mut model = PlayerModel::default();
        model.board_preferences[3] = 9;

        let weights = model.inverse_board_weights();
        assert!((weights[3] - 0.1).abs() < 1e-9);
        assert!((weights[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_opening_key_takes_six_plies() {
        let history: Vec<Move> = (0..8).map(|i| mv(i % 9, (i + 1) % 9)).collect();
        let key = opening_key(&history);
        assert_eq!(key, "b0c1-b1c2-b2c3-b3c4-b4c5-b5c6");

        // Shorter histories key on what exists.
        assert_eq!(opening_key(&history[..4]), "b0c1-b1c2-b2c3-b3c4");
    }

    #[test]
    fn test_record_opening_perspective() {
        let ai = Player::Two;
        let mut profile = SavedProfile::default();
        let key = "b4c4-b4c0".to_string();

        profile.record_opening(key.clone(), Outcome::Won(ai), ai);
        profile.record_opening(key.clone(), Outcome::Won(ai.other()), ai);
        profile.record_opening(key.clone(), Outcome::Draw, ai);

        let stats = profile.opening_book[&key];
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.draws, 1);
        assert!((stats.win_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_json_round_trip() {
        let mut profile = SavedProfile::default();
        profile.skill_points = 17;
        profile.player_profile.fold_moves(&[mv(4, 4), mv(0, 8)]);
        profile
            .opening_book
            .insert("b4c4-b4c0".into(), OpeningStats { wins: 3, losses: 1, draws: 2 });

        let json = profile.to_json();
        let back = SavedProfile::from_json(&json);
        assert_eq!(profile, back);
    }

    #[test]
    fn test_unparsable_json_yields_default() {
        assert_eq!(SavedProfile::from_json(""), SavedProfile::default());
        assert_eq!(SavedProfile::from_json("{not json"), SavedProfile::default());
    }

    #[test]
    fn test_record_field_names_match_contract() {
        let profile = SavedProfile::default();
        let json = profile.to_json();
        for key in [
            "skillPoints",
            "playerProfile",
            "firstMoveBoards",
            "firstMoveCells",
            "boardPreferences",
            "cellPreferences",
            "blocksWhenThreatened",
            "totalMoves",
            "gamesPlayed",
            "openingBook",
        ] {
            assert!(json.contains(key), "missing field {key} in {json}");
        }
    }
}
