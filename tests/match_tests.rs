//! Full-match integration tests: controller lifecycle, profile
//! carry-over across matches, and persistence.

use ninetwist::{
    curve, skill_to_t_for_tier, MatchController, MatchPhase, ModifierId, Outcome, SavedProfile,
    HUMAN, MAX_SKILL,
};

/// Drive one match to its terminal with a first-legal-move human.
fn play_out(controller: &mut MatchController) -> Outcome {
    for _ in 0..400 {
        match controller.phase() {
            MatchPhase::Terminal(outcome) => return outcome,
            MatchPhase::InProgress => {}
            other => panic!("unexpected phase {other:?}"),
        }
        if controller.state().turn == HUMAN {
            let moves = controller.legal_moves();
            assert!(!moves.is_empty(), "human stranded without a move");
            let c = moves[0];
            controller.submit_human_move(c.board, c.cell).unwrap();
        } else {
            controller.play_ai_turn();
        }
    }
    panic!("match did not terminate");
}

fn run_match(saved: SavedProfile, tier: u32, seed: u64) -> (Outcome, SavedProfile, ModifierId) {
    let mut controller = MatchController::new(saved, tier, seed);
    let (id, _events) = controller.start_match();
    let outcome = play_out(&mut controller);
    let updated = controller.finish_profile();
    assert_eq!(controller.phase(), MatchPhase::ProfileUpdated);
    (outcome, updated, id)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_phases_advance_in_order() {
    let mut controller = MatchController::new(SavedProfile::default(), 0, 3);
    assert_eq!(controller.phase(), MatchPhase::Idle);

    controller.start_match();
    assert_eq!(controller.phase(), MatchPhase::InProgress);

    play_out(&mut controller);
    assert!(matches!(controller.phase(), MatchPhase::Terminal(_)));

    controller.finish_profile();
    assert_eq!(controller.phase(), MatchPhase::ProfileUpdated);

    controller.reset();
    assert_eq!(controller.phase(), MatchPhase::Idle);
}

#[test]
fn test_match_deterministic_for_seed() {
    let a = run_match(SavedProfile::default(), 0, 77);
    let b = run_match(SavedProfile::default(), 0, 77);
    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
    assert_eq!(a.2, b.2);
}

// =============================================================================
// Profile Carry-Over
// =============================================================================

#[test]
fn test_profile_accumulates_across_matches() {
    let mut saved = SavedProfile::default();
    let mut last_points = 0;

    for seed in 0..3u64 {
        let (outcome, updated, _id) = run_match(saved, 0, seed);

        assert_eq!(updated.player_profile.games_played, seed as u32 + 1);
        assert!(updated.skill_points >= last_points);
        assert!(updated.skill_points <= MAX_SKILL);
        let gained = updated.skill_points - last_points;
        match outcome {
            Outcome::Won(p) if p == HUMAN => assert_eq!(gained, 2),
            Outcome::Draw => assert_eq!(gained, 1),
            _ => assert_eq!(gained, 0),
        }

        last_points = updated.skill_points;
        saved = updated;
    }

    assert!(saved.player_profile.total_moves > 0);
    let tracked: u32 = saved.player_profile.board_preferences.iter().sum();
    assert_eq!(tracked, saved.player_profile.total_moves);
}

#[test]
fn test_updated_profile_round_trips_through_json() {
    let (_outcome, updated, _id) = run_match(SavedProfile::default(), 0, 5);

    let json = updated.to_json();
    let back = SavedProfile::from_json(&json);
    assert_eq!(updated, back);
}

// =============================================================================
// Tier Clamp
// =============================================================================

#[test]
fn test_tier_caps_effective_strength() {
    let mut maxed = SavedProfile::default();
    maxed.skill_points = MAX_SKILL;

    let low = MatchController::new(maxed.clone(), 0, 1);
    let high = MatchController::new(maxed, 9, 1);

    // A maxed player on tier 0 still faces a gentle opponent.
    assert_eq!(*low.difficulty(), curve(skill_to_t_for_tier(MAX_SKILL, 0)));
    assert!(low.difficulty().simulation_budget < high.difficulty().simulation_budget);
    assert!(low.difficulty().exploration_temperature > high.difficulty().exploration_temperature);
    assert!(!low.difficulty().opening_book_enabled);
    assert!(high.difficulty().opening_book_enabled);
}
