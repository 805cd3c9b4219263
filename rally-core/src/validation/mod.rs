//! Cross-Validation Harness
//!
//! Plays randomly generated matches through the engine and through an
//! independent integer-count scorer, then compares them entry by entry.
//! Statistics are checked the same way against an independent recount.
//!
//! ```rust
//! use rally_core::settings::MatchSettings;
//! use rally_core::validation::CrossValidator;
//!
//! let report = CrossValidator::new().run(42, &MatchSettings::default()).unwrap();
//! assert!(report.is_consistent(), "{:?}", report.discrepancies);
//! ```

mod reference;
mod reference_stats;
mod simulator;

pub use reference::{ExpectedEntry, ReferenceScorer};
pub use reference_stats::ReferenceTotals;
pub use simulator::{PointGenerator, SimulatorConfig};

use serde::{Deserialize, Serialize};

use crate::engine::{apply_point, MatchState};
use crate::error::Result;
use crate::log::LogEntry;
use crate::point::Player;
use crate::replay;
use crate::settings::MatchSettings;
use crate::stats::compute_stats;

/// One disagreement between the engine and the reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Log index, or `None` for whole-match checks
    pub index: Option<usize>,
    pub field: String,
    pub engine: String,
    pub reference: String,
}

impl Discrepancy {
    fn at(index: usize, field: &str, engine: impl std::fmt::Debug, reference: impl std::fmt::Debug) -> Self {
        Self {
            index: Some(index),
            field: field.to_string(),
            engine: format!("{:?}", engine),
            reference: format!("{:?}", reference),
        }
    }

    fn overall(field: &str, engine: impl std::fmt::Debug, reference: impl std::fmt::Debug) -> Self {
        Self {
            index: None,
            field: field.to_string(),
            engine: format!("{:?}", engine),
            reference: format!("{:?}", reference),
        }
    }
}

/// Result of one simulated match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub seed: u64,
    pub settings: MatchSettings,
    pub points_recorded: usize,
    pub completed: bool,
    pub winner: Option<Player>,
    pub discrepancies: Vec<Discrepancy>,
}

impl ValidationReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Summary over many seeds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub matches: usize,
    pub completed: usize,
    pub total_points: usize,
    pub inconsistent_seeds: Vec<u64>,
}

/// Runs the engine and the reference side by side
#[derive(Debug, Clone, Default)]
pub struct CrossValidator {
    config: SimulatorConfig,
}

impl CrossValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Simulate one match with `settings` and compare both scorers
    pub fn run(&self, seed: u64, settings: &MatchSettings) -> Result<ValidationReport> {
        settings.validate()?;

        let config = SimulatorConfig {
            seed: Some(seed),
            ..self.config.clone()
        };
        let max_points = config.max_points;
        let generator = PointGenerator::new(config);

        let mut state = MatchState::new(settings.clone());
        let mut reference = ReferenceScorer::new(settings);
        let mut expected = Vec::new();
        let mut discrepancies = Vec::new();

        for (index, input) in generator.take(max_points).enumerate() {
            if state.is_completed() {
                break;
            }
            if let Err(e) = apply_point(&mut state, &input, PointGenerator::timestamp_for(index)) {
                discrepancies.push(Discrepancy::at(index, "accepted", e.to_string(), "accepted"));
                break;
            }
            match reference.expect(&input) {
                Some(entry) => expected.push(entry),
                None => {
                    discrepancies.push(Discrepancy::at(index, "accepted", true, false));
                    break;
                }
            }
        }

        for (index, (entry, exp)) in state.log.iter().zip(&expected).enumerate() {
            compare_entry(index, entry, exp, &mut discrepancies);
        }

        if state.winner != reference.winner() {
            discrepancies.push(Discrepancy::overall("winner", state.winner, reference.winner()));
        }
        if state.sets_won() != reference.sets_won() {
            discrepancies.push(Discrepancy::overall("sets_won", state.sets_won(), reference.sets_won()));
        }

        check_stats(&state, &expected, &mut discrepancies);

        match replay::rebuild(&state) {
            Ok(rebuilt) => {
                let diff = replay::diff_logs(state.log.entries(), rebuilt.log.entries());
                for d in &diff.differences {
                    discrepancies.push(Discrepancy::at(
                        d.index,
                        &format!("replay.{}", d.field),
                        &d.first_value,
                        &d.second_value,
                    ));
                }
                if diff.differences.is_empty() && (!diff.identical || rebuilt != state) {
                    discrepancies.push(Discrepancy::overall("replay", "differs", "identical"));
                }
            }
            Err(e) => discrepancies.push(Discrepancy::overall("replay", e.to_string(), "identical")),
        }

        let report = ValidationReport {
            seed,
            settings: settings.clone(),
            points_recorded: state.point_count(),
            completed: state.is_completed(),
            winner: state.winner,
            discrepancies,
        };

        if report.is_consistent() {
            tracing::debug!(seed, points = report.points_recorded, "Cross-validation passed");
        } else {
            tracing::warn!(
                seed,
                discrepancies = report.discrepancies.len(),
                "Cross-validation found discrepancies"
            );
        }
        Ok(report)
    }

    /// Run `count` matches from consecutive seeds, drawing settings per seed
    pub fn run_batch(&self, first_seed: u64, count: usize) -> Result<(BatchSummary, Vec<ValidationReport>)> {
        let mut summary = BatchSummary::default();
        let mut reports = Vec::with_capacity(count);

        for seed in (first_seed..).take(count) {
            let settings = PointGenerator::new(SimulatorConfig::seeded(seed)).random_settings();
            let report = self.run(seed, &settings)?;

            summary.matches += 1;
            summary.total_points += report.points_recorded;
            if report.completed {
                summary.completed += 1;
            }
            if !report.is_consistent() {
                summary.inconsistent_seeds.push(seed);
            }
            reports.push(report);
        }

        tracing::info!(
            matches = summary.matches,
            completed = summary.completed,
            inconsistent = summary.inconsistent_seeds.len(),
            "Cross-validation batch finished"
        );
        Ok((summary, reports))
    }
}

fn compare_entry(index: usize, entry: &LogEntry, exp: &ExpectedEntry, out: &mut Vec<Discrepancy>) {
    macro_rules! check {
        ($field:literal, $engine:expr, $reference:expr) => {
            if $engine != $reference {
                out.push(Discrepancy::at(index, $field, &$engine, &$reference));
            }
        };
    }

    check!("outcome", entry.outcome(), exp.outcome);
    check!("winner", entry.winner(), exp.winner);
    check!("server", entry.server_at_time(), exp.server);
    check!("serve_attempt", entry.serve_attempt(), exp.serve_attempt);
    check!("acting_player", entry.acting_player, exp.acting_player);
    check!("set_number", entry.set_number, exp.set_number);
    check!("game_number", entry.game_number, exp.game_number);
    check!("in_tie_break", entry.in_tie_break, exp.in_tie_break);
    check!("game_score_after", entry.game_score_after, exp.score);
    check!("games_score_after", entry.games_score_after, exp.games);
    check!("sets_score_after", entry.sets_score_after, exp.sets);
    check!("is_break_point", entry.is_break_point, exp.break_point);
}

fn check_stats(state: &MatchState, expected: &[ExpectedEntry], out: &mut Vec<Discrepancy>) {
    let stats = compute_stats(state.log.entries());

    for player in [Player::A, Player::B] {
        let engine = stats.player(player);
        let reference = ReferenceTotals::for_player(expected, player);
        for (field, engine_value, reference_value) in reference.differences(engine) {
            out.push(Discrepancy::overall(
                &format!("stats.{}.{}", player.as_str(), field),
                engine_value,
                reference_value,
            ));
        }

        if engine.points_won_on_serve + engine.points_won_on_return != engine.points_won {
            out.push(Discrepancy::overall(
                &format!("stats.{}.serve_plus_return", player.as_str()),
                engine.points_won_on_serve + engine.points_won_on_return,
                engine.points_won,
            ));
        }
    }

    let shots = stats.a.total_shots() + stats.b.total_shots();
    if shots > stats.total_points {
        out.push(Discrepancy::overall("stats.total_shots", shots, stats.total_points));
    }
    let winners = expected.iter().filter(|e| e.winner.is_some()).count() as u32;
    if stats.total_points != winners {
        out.push(Discrepancy::overall("stats.total_points", stats.total_points, winners));
    }
}
