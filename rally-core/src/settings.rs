//! Match settings
//!
//! Settings are fixed for the lifetime of a match. They are validated once,
//! before a match is started; the engine itself assumes valid settings.

use serde::{Deserialize, Serialize};

use crate::error::{RallyError, Result};
use crate::point::Player;

/// Allowed targets for a regular tie-break
pub const TIE_BREAK_TARGETS: [u32; 3] = [5, 7, 10];

/// Allowed targets for a super tie-break
pub const SUPER_TIE_BREAK_TARGETS: [u32; 3] = [7, 10, 15];

/// How the deciding set is finished when games reach games-all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSetType {
    /// Regular tie-break, same as every other set
    #[default]
    NormalFinalSet,
    /// Super tie-break to `super_tie_break_target`
    SuperTieBreak,
}

/// Who serves first in sets after the first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetServerRule {
    /// First server of set N is the opponent of set N-1's first server
    #[default]
    AlternateFirstServer,
    /// Service order carries over from the previous set
    ContinueRotation,
}

/// Match settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Who serves the first game of the match
    #[serde(default = "default_first_server")]
    pub first_server: Player,

    /// Best-of count (1, 3 or 5)
    #[serde(default = "default_number_of_sets")]
    pub number_of_sets: u8,

    /// Games needed to win a set (1..=8)
    #[serde(default = "default_games_per_set")]
    pub games_per_set: u8,

    /// Deuce/advantage scoring; `false` plays sudden-death at 40-40
    #[serde(default = "default_true")]
    pub ad_scoring: bool,

    #[serde(default)]
    pub final_set_type: FinalSetType,

    #[serde(default = "default_tie_break_target")]
    pub tie_break_target: u32,

    #[serde(default = "default_true")]
    pub tie_break_win_by_two: bool,

    #[serde(default = "default_super_tie_break_target")]
    pub super_tie_break_target: u32,

    #[serde(default = "default_true")]
    pub super_tie_break_win_by_two: bool,

    #[serde(default)]
    pub set_server_rule: SetServerRule,
}

fn default_first_server() -> Player { Player::A }
fn default_number_of_sets() -> u8 { 3 }
fn default_games_per_set() -> u8 { 6 }
fn default_true() -> bool { true }
fn default_tie_break_target() -> u32 { 7 }
fn default_super_tie_break_target() -> u32 { 10 }

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            first_server: Player::A,
            number_of_sets: 3,
            games_per_set: 6,
            ad_scoring: true,
            final_set_type: FinalSetType::NormalFinalSet,
            tie_break_target: 7,
            tie_break_win_by_two: true,
            super_tie_break_target: 10,
            super_tie_break_win_by_two: true,
            set_server_rule: SetServerRule::AlternateFirstServer,
        }
    }
}

impl MatchSettings {
    /// Create a settings builder starting from the defaults
    pub fn builder() -> MatchSettingsBuilder {
        MatchSettingsBuilder::default()
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.number_of_sets, 1 | 3 | 5) {
            return Err(invalid(format!(
                "number_of_sets must be 1, 3 or 5, got {}",
                self.number_of_sets
            )));
        }
        if !(1..=8).contains(&self.games_per_set) {
            return Err(invalid(format!(
                "games_per_set must be between 1 and 8, got {}",
                self.games_per_set
            )));
        }
        if !TIE_BREAK_TARGETS.contains(&self.tie_break_target) {
            return Err(invalid(format!(
                "tie_break_target must be one of {:?}, got {}",
                TIE_BREAK_TARGETS, self.tie_break_target
            )));
        }
        if !SUPER_TIE_BREAK_TARGETS.contains(&self.super_tie_break_target) {
            return Err(invalid(format!(
                "super_tie_break_target must be one of {:?}, got {}",
                SUPER_TIE_BREAK_TARGETS, self.super_tie_break_target
            )));
        }
        Ok(())
    }

    /// Sets a player must win to take the match
    pub fn sets_to_win(&self) -> u32 {
        (u32::from(self.number_of_sets) + 1) / 2
    }

    /// Whether `set_number` (1-based) is the last possible set
    pub fn is_deciding_set(&self, set_number: u32) -> bool {
        set_number == u32::from(self.number_of_sets)
    }
}

fn invalid(reason: String) -> RallyError {
    RallyError::InvalidSettings { reason }
}

/// Builder for MatchSettings
#[derive(Debug, Default)]
pub struct MatchSettingsBuilder {
    settings: MatchSettings,
}

impl MatchSettingsBuilder {
    pub fn first_server(mut self, player: Player) -> Self {
        self.settings.first_server = player;
        self
    }

    pub fn number_of_sets(mut self, sets: u8) -> Self {
        self.settings.number_of_sets = sets;
        self
    }

    pub fn games_per_set(mut self, games: u8) -> Self {
        self.settings.games_per_set = games;
        self
    }

    pub fn ad_scoring(mut self, enabled: bool) -> Self {
        self.settings.ad_scoring = enabled;
        self
    }

    pub fn final_set_type(mut self, final_set_type: FinalSetType) -> Self {
        self.settings.final_set_type = final_set_type;
        self
    }

    pub fn tie_break(mut self, target: u32, win_by_two: bool) -> Self {
        self.settings.tie_break_target = target;
        self.settings.tie_break_win_by_two = win_by_two;
        self
    }

    pub fn super_tie_break(mut self, target: u32, win_by_two: bool) -> Self {
        self.settings.super_tie_break_target = target;
        self.settings.super_tie_break_win_by_two = win_by_two;
        self
    }

    pub fn set_server_rule(mut self, rule: SetServerRule) -> Self {
        self.settings.set_server_rule = rule;
        self
    }

    /// Build and validate the settings
    pub fn build(self) -> Result<MatchSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
