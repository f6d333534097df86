//! The difficulty curve: a pure map from the persistent skill scalar
//! to concrete search and heuristic parameters.
//!
//! Each axis uses its own easing so perceived difficulty ramps
//! unevenly: win/block spotting is near-linear and saturates early,
//! while raw search depth (cubic) and strategic board targeting
//! (quadratic) keep sharpening late.

use serde::{Deserialize, Serialize};

use crate::core::Outcome;

/// Skill-point cap. Points only ever accumulate, never decay.
pub const MAX_SKILL: u32 = 200;

/// Number of selectable opponent tiers.
pub const TIER_COUNT: u32 = 10;

/// Points spanned by each tier before the next unlocks.
pub const POINTS_PER_TIER: u32 = MAX_SKILL / TIER_COUNT;

/// Points awarded for a completed match.
pub const POINTS_WIN: u32 = 2;
pub const POINTS_DRAW: u32 = 1;

/// Search and heuristic parameters derived from the skill scalar.
/// Never persisted; recomputed at every match start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// MCTS iterations per AI move.
    pub simulation_budget: u32,
    /// Probability of taking an immediate match-winning move.
    pub spot_win_probability: f64,
    /// Probability of blocking an immediate opposing threat.
    pub spot_block_probability: f64,
    /// Scales the UCB1 exploration term; above 0.5 the final move is
    /// sampled by visit count instead of played greedily.
    pub exploration_temperature: f64,
    /// Drives how often search is bypassed to target the human's
    /// historically weakest board.
    pub pattern_exploitation_weight: f64,
    /// Whether the opening ledger is consulted at all.
    pub opening_book_enabled: bool,
    /// Depth of the positional evaluation used when rollouts hit the
    /// ply cap (1 = flat draw, deeper = board-count margin).
    pub heuristic_depth: u32,
}

fn ease_in_quad(t: f64) -> f64 {
    t * t
}

fn ease_in_cubic(t: f64) -> f64 {
    t * t * t
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Map the normalized skill scalar `t` in [0, 1] to a profile.
///
/// Monotone per axis: every axis is non-decreasing in `t` except
/// `exploration_temperature`, which is non-increasing (high
/// temperature is what makes a low-skill opponent sample its move
/// rather than always play the best one).
#[must_use]
pub fn curve(t: f64) -> DifficultyProfile {
    let t = t.clamp(0.0, 1.0);

    DifficultyProfile {
        // 30 at t=0, ~4000 at t=1; cubic so raw strength keeps growing late
        simulation_budget: 30 + (ease_in_cubic(t) * 3970.0) as u32,
        // near-linear, saturating early relative to the budget
        spot_win_probability: lerp(0.35, 1.0, t),
        spot_block_probability: lerp(0.25, 0.95, t),
        exploration_temperature: lerp(1.2, 0.1, t),
        // quadratic: strategic manipulation arrives in the late game
        pattern_exploitation_weight: ease_in_quad(t),
        opening_book_enabled: t >= 0.5,
        heuristic_depth: 1 + (ease_in_quad(t) * 3.0) as u32,
    }
}

/// Normalize accumulated skill points to the curve input, clamped by
/// the selected tier: tier `k` plays at most `(k+1) * POINTS_PER_TIER`
/// points' worth of strength, so earlier tiers stay beatable after the
/// player has banked points.
#[must_use]
pub fn skill_to_t_for_tier(points: u32, tier: u32) -> f64 {
    let tier = tier.min(TIER_COUNT - 1);
    let cap = (tier + 1) * POINTS_PER_TIER;
    let effective = points.min(MAX_SKILL).min(cap);
    f64::from(effective) / f64::from(MAX_SKILL)
}

/// Highest tier unlocked by `points`.
#[must_use]
pub fn tier_for(points: u32) -> u32 {
    (points.min(MAX_SKILL) / POINTS_PER_TIER).min(TIER_COUNT - 1)
}

/// Fold a completed match into the skill scalar: win +2, draw +1,
/// capped. Progression is scored from the human side, identified by
/// `human`.
#[must_use]
pub fn award_points(points: u32, outcome: Outcome, human: crate::core::Player) -> u32 {
    let gained = match outcome {
        Outcome::Won(p) if p == human => POINTS_WIN,
        Outcome::Draw => POINTS_DRAW,
        Outcome::Won(_) => 0,
    };
    (points + gained).min(MAX_SKILL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Player;

    #[test]
    fn test_curve_endpoints() {
        let low = curve(0.0);
        assert_eq!(low.simulation_budget, 30);
        assert!(low.exploration_temperature > 0.5);
        assert!(!low.opening_book_enabled);

        let high = curve(1.0);
        assert_eq!(high.simulation_budget, 4000);
        assert!(high.exploration_temperature <= 0.5);
        assert!(high.opening_book_enabled);
        assert!((high.spot_win_probability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_curve_clamps_input() {
        assert_eq!(curve(-0.5), curve(0.0));
        assert_eq!(curve(1.5), curve(1.0));
    }

    #[test]
    fn test_curve_monotone_per_axis() {
        let steps: Vec<DifficultyProfile> =
            (0..=100).map(|i| curve(f64::from(i) / 100.0)).collect();
        for pair in steps.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.simulation_budget <= b.simulation_budget);
            assert!(a.spot_win_probability <= b.spot_win_probability);
            assert!(a.spot_block_probability <= b.spot_block_probability);
            assert!(a.pattern_exploitation_weight <= b.pattern_exploitation_weight);
            assert!(a.heuristic_depth <= b.heuristic_depth);
            assert!(!a.opening_book_enabled || b.opening_book_enabled);
            // Temperature is the one axis that ramps down.
            assert!(a.exploration_temperature >= b.exploration_temperature);
        }
    }

    #[test]
    fn test_tier_clamp() {
        // A maxed player on tier 0 plays at the tier-0 cap.
        let t = skill_to_t_for_tier(MAX_SKILL, 0);
        assert!((t - f64::from(POINTS_PER_TIER) / f64::from(MAX_SKILL)).abs() < 1e-9);

        // On the top tier the clamp is a no-op.
        assert!((skill_to_t_for_tier(MAX_SKILL, TIER_COUNT - 1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_award_points() {
        let human = Player::One;
        assert_eq!(award_points(0, Outcome::Won(human), human), POINTS_WIN);
        assert_eq!(award_points(0, Outcome::Draw, human), POINTS_DRAW);
        assert_eq!(award_points(0, Outcome::Won(human.other()), human), 0);
        // Cap is respected.
        assert_eq!(
            award_points(MAX_SKILL, Outcome::Won(human), human),
            MAX_SKILL
        );
    }

    #[test]
    fn test_tier_for() {
        assert_eq!(tier_for(0), 0);
        assert_eq!(tier_for(POINTS_PER_TIER), 1);
        assert_eq!(tier_for(MAX_SKILL), TIER_COUNT - 1);
    }
}
