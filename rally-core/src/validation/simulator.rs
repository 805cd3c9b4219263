//! Random legal point generator
//!
//! The generator tracks the serve attempt itself so it never needs the
//! engine's state. Second-serve faults are emitted as `ServeFault`; the engine
//! turns them into double faults.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::point::{OutcomeKind, Player, PointInput, ShotKind};
use crate::settings::{
    FinalSetType, MatchSettings, SetServerRule, SUPER_TIE_BREAK_TARGETS, TIE_BREAK_TARGETS,
};

/// Probabilities used when generating points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Fixed seed for reproducible runs; `None` draws from entropy
    pub seed: Option<u64>,
    pub first_serve_fault_rate: f64,
    pub second_serve_fault_rate: f64,
    pub ace_rate: f64,
    pub return_error_rate: f64,
    /// Chance that a rally point carries a shot annotation
    pub shot_rate: f64,
    /// Hard stop for a single simulated match
    pub max_points: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            first_serve_fault_rate: 0.35,
            second_serve_fault_rate: 0.1,
            ace_rate: 0.07,
            return_error_rate: 0.08,
            shot_rate: 0.6,
            max_points: 5_000,
        }
    }
}

impl SimulatorConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

/// Infinite stream of legal point inputs
#[derive(Debug, Clone)]
pub struct PointGenerator {
    config: SimulatorConfig,
    rng: ChaCha8Rng,
    on_second_serve: bool,
}

impl PointGenerator {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            rng,
            on_second_serve: false,
        }
    }

    /// Draw settings covering every configurable variant
    pub fn random_settings(&mut self) -> MatchSettings {
        let rng = &mut self.rng;
        MatchSettings {
            first_server: if rng.gen_bool(0.5) { Player::A } else { Player::B },
            number_of_sets: *[1u8, 3, 5].choose(rng).unwrap_or(&3),
            games_per_set: if rng.gen_bool(0.6) { 6 } else { rng.gen_range(1..=8) },
            ad_scoring: rng.gen_bool(0.7),
            final_set_type: if rng.gen_bool(0.5) {
                FinalSetType::SuperTieBreak
            } else {
                FinalSetType::NormalFinalSet
            },
            tie_break_target: *TIE_BREAK_TARGETS.choose(rng).unwrap_or(&7),
            tie_break_win_by_two: rng.gen_bool(0.8),
            super_tie_break_target: *SUPER_TIE_BREAK_TARGETS.choose(rng).unwrap_or(&10),
            super_tie_break_win_by_two: rng.gen_bool(0.8),
            set_server_rule: if rng.gen_bool(0.5) {
                SetServerRule::AlternateFirstServer
            } else {
                SetServerRule::ContinueRotation
            },
        }
    }

    fn maybe_shot(&mut self, candidates: &[ShotKind]) -> Option<ShotKind> {
        if self.rng.gen_bool(self.config.shot_rate) {
            candidates.choose(&mut self.rng).copied()
        } else {
            None
        }
    }

    fn next_input(&mut self) -> PointInput {
        let fault_rate = if self.on_second_serve {
            self.config.second_serve_fault_rate
        } else {
            self.config.first_serve_fault_rate
        };

        if self.rng.gen_bool(fault_rate) {
            self.on_second_serve = !self.on_second_serve;
            return PointInput::serve_fault();
        }
        self.on_second_serve = false;

        let roll: f64 = self.rng.gen();
        if roll < self.config.ace_rate {
            let mut input = PointInput::ace();
            input.shot = self.maybe_shot(&[ShotKind::Serve]);
            return input;
        }
        if roll < self.config.ace_rate + self.config.return_error_rate {
            return PointInput::return_error();
        }

        // Rallies go to either side at even odds
        let winner = if self.rng.gen_bool(0.5) { Player::A } else { Player::B };
        let outcome = *[
            OutcomeKind::Winner,
            OutcomeKind::UnforcedError,
            OutcomeKind::ForcedError,
        ]
        .choose(&mut self.rng)
        .unwrap_or(&OutcomeKind::Winner);

        let mut input = PointInput::new(outcome, Some(winner));
        input.shot = self.maybe_shot(&ShotKind::ALL[..7]);
        input
    }

    /// Deterministic timestamp for the `index`th generated point
    pub fn timestamp_for(index: usize) -> DateTime<Utc> {
        let base = Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap_or_else(Utc::now);
        base + Duration::seconds(25 * index as i64)
    }
}

impl Iterator for PointGenerator {
    type Item = PointInput;

    fn next(&mut self) -> Option<PointInput> {
        Some(self.next_input())
    }
}
