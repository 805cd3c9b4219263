//! Engine vs reference scorer over simulated matches

use rally_core::settings::{FinalSetType, SetServerRule};
use rally_core::validation::{CrossValidator, PointGenerator, SimulatorConfig};
use rally_core::MatchSettings;

#[test]
fn simulated_matches_agree_across_variants() {
    let (summary, reports) = CrossValidator::new().run_batch(1_000, 60).unwrap();

    for report in &reports {
        assert!(
            report.is_consistent(),
            "seed {} with {:?}: {:?}",
            report.seed,
            report.settings,
            report.discrepancies
        );
    }
    assert_eq!(summary.matches, 60);
    assert_eq!(summary.completed, 60);
}

#[test]
fn long_deuce_games_agree() {
    // No aces or return errors, so every point is an even rally
    let config = SimulatorConfig {
        ace_rate: 0.0,
        return_error_rate: 0.0,
        ..SimulatorConfig::default()
    };
    let validator = CrossValidator::with_config(config);
    let settings = MatchSettings::builder()
        .number_of_sets(5)
        .final_set_type(FinalSetType::SuperTieBreak)
        .super_tie_break(15, true)
        .set_server_rule(SetServerRule::ContinueRotation)
        .build()
        .unwrap();

    for seed in 0..5 {
        let report = validator.run(seed, &settings).unwrap();
        assert!(report.completed);
        assert!(report.is_consistent(), "seed {}: {:?}", seed, report.discrepancies);
    }
}

#[test]
fn single_game_sets_agree() {
    let settings = MatchSettings::builder()
        .number_of_sets(3)
        .games_per_set(1)
        .tie_break(5, false)
        .build()
        .unwrap();

    for seed in 0..20 {
        let report = CrossValidator::new().run(seed, &settings).unwrap();
        assert!(report.is_consistent(), "seed {}: {:?}", seed, report.discrepancies);
    }
}

#[test]
fn random_settings_are_reproducible() {
    let first = PointGenerator::new(SimulatorConfig::seeded(5)).random_settings();
    let second = PointGenerator::new(SimulatorConfig::seeded(5)).random_settings();
    assert_eq!(first, second);
}
