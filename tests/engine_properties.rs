//! Property tests for the rating engine

use league_ratings::rating::{EngineParameters, RatingEngine};
use league_ratings::GameResult;
use proptest::prelude::*;
use std::collections::HashMap;

const TEAMS: usize = 6;

fn team(index: usize) -> String {
    format!("T{}", index)
}

fn arb_game() -> impl Strategy<Value = GameResult> {
    (0..TEAMS, 0..TEAMS - 1, 0u32..150, 0u32..150).prop_map(|(home, offset, hs, aws)| {
        let away = (home + 1 + offset) % TEAMS;
        GameResult::new(team(home), team(away), hs, aws)
    })
}

fn arb_parameters() -> impl Strategy<Value = EngineParameters> {
    (0.0f64..0.5, 0.0f64..8.0).prop_map(|(k, h)| EngineParameters::new(k, h))
}

fn arb_initial() -> impl Strategy<Value = HashMap<String, f64>> {
    prop::collection::vec(-10.0f64..10.0, TEAMS)
        .prop_map(|ratings| ratings.into_iter().enumerate().map(|(i, r)| (team(i), r)).collect())
}

proptest! {
    #[test]
    fn ratings_stay_zero_sum(
        initial in arb_initial(),
        parameters in arb_parameters(),
        games in prop::collection::vec(arb_game(), 0..60),
    ) {
        let starting_total: f64 = initial.values().sum();
        let engine = RatingEngine::replay(initial, HashMap::new(), parameters, games).unwrap();

        prop_assert!((engine.total_rating() - starting_total).abs() < 1e-6);
    }

    #[test]
    fn every_record_is_a_symmetric_update(
        parameters in arb_parameters(),
        games in prop::collection::vec(arb_game(), 1..40),
    ) {
        let engine = RatingEngine::replay(HashMap::new(), HashMap::new(), parameters, games).unwrap();

        for record in engine.games() {
            let expected = record.home_rating_before + parameters.home_advantage
                - record.away_rating_before;
            let delta = parameters.k_factor * (record.actual_mov as f64 - expected);

            prop_assert!((record.expected_mov - expected).abs() < 1e-9);
            prop_assert!((record.rating_delta - delta).abs() < 1e-9);
            prop_assert!((record.home_rating_after - record.home_rating_before - delta).abs() < 1e-9);
            prop_assert!((record.away_rating_after - record.away_rating_before + delta).abs() < 1e-9);
        }
    }

    #[test]
    fn replaying_the_log_is_deterministic(
        initial in arb_initial(),
        games in prop::collection::vec(arb_game(), 0..40),
    ) {
        let parameters = EngineParameters::default();
        let first = RatingEngine::replay(initial.clone(), HashMap::new(), parameters, games).unwrap();
        let logged: Vec<GameResult> = first.games().iter().map(|r| r.result()).collect();
        let second = RatingEngine::replay(initial, HashMap::new(), parameters, logged).unwrap();

        prop_assert_eq!(first.standings(), second.standings());
        prop_assert_eq!(first.games().len(), second.games().len());
    }

    #[test]
    fn standings_are_ordered(
        initial in arb_initial(),
        games in prop::collection::vec(arb_game(), 0..30),
    ) {
        let engine = RatingEngine::replay(initial, HashMap::new(), EngineParameters::default(), games)
            .unwrap();
        let standings = engine.standings();

        prop_assert_eq!(standings.len(), TEAMS);
        for (i, pair) in standings.windows(2).enumerate() {
            prop_assert_eq!(pair[0].rank, i + 1);
            prop_assert!(
                pair[0].rating > pair[1].rating
                    || (pair[0].rating == pair[1].rating && pair[0].team_id < pair[1].team_id)
            );
        }
    }

    #[test]
    fn neutral_site_probabilities_are_complementary(
        home in -20.0f64..20.0,
        away in -20.0f64..20.0,
    ) {
        let initial = HashMap::from([(team(0), home), (team(1), away)]);
        let engine = RatingEngine::new(initial, HashMap::new(), EngineParameters::new(0.05, 0.0));

        let forward = engine.predict(&team(0), &team(1));
        let reverse = engine.predict(&team(1), &team(0));

        prop_assert!(forward.home_win_probability > 0.0 && forward.home_win_probability < 1.0);
        prop_assert!((forward.home_win_probability + reverse.home_win_probability - 1.0).abs() < 1e-9);
        prop_assert_eq!(engine.team_count(), 2);
    }

    #[test]
    fn predictions_do_not_change_state(
        games in prop::collection::vec(arb_game(), 0..20),
        home in 0..TEAMS + 3,
        away in 0..TEAMS + 3,
    ) {
        let engine = RatingEngine::replay(HashMap::new(), HashMap::new(), EngineParameters::default(), games)
            .unwrap();
        let before = engine.standings();

        let _ = engine.predict(&team(home), &team(away));
        let _ = engine.rating_of(&team(home));

        prop_assert_eq!(engine.standings(), before);
    }
}
