//! Statistics Aggregator
//!
//! [`compute_stats`] is a pure fold over log entries. It never looks at the
//! game and set containers, so any two components holding the same log agree
//! on the numbers.
//!
//! Attribution rules:
//! - point-type counters (aces, winners, errors, faults) go to the acting player
//! - points won go to the winner, split by whether the winner was serving
//! - serve counters are bucketed by the entry's server, return counters by the
//!   receiver
//! - entries without a winner (first-serve faults) only feed serve counters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::log::LogEntry;
use crate::point::{OutcomeKind, Player, ServeAttempt, ShotKind};

/// Counters and derived percentages for one player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub points_won: u32,
    pub points_won_on_serve: u32,
    pub points_won_on_return: u32,

    // Point types, by acting player
    pub aces: u32,
    pub double_faults: u32,
    pub winners: u32,
    pub unforced_errors: u32,
    pub forced_errors: u32,
    pub return_errors: u32,

    // Serve, by server
    pub first_serves: u32,
    pub first_serves_in: u32,
    pub first_serve_faults: u32,
    pub first_serve_points_won: u32,
    pub second_serves: u32,
    pub second_serves_in: u32,
    pub second_serve_points_won: u32,
    pub service_points_played: u32,

    // Return, by receiver
    pub return_points_played: u32,
    pub return_points_won: u32,
    pub first_serve_return_points_played: u32,
    pub first_serve_return_points_won: u32,
    pub second_serve_return_points_played: u32,
    pub second_serve_return_points_won: u32,

    // Break points
    pub break_point_opportunities: u32,
    pub break_points_converted: u32,
    pub break_points_faced: u32,
    pub break_points_saved: u32,

    pub shots: BTreeMap<ShotKind, u32>,

    pub max_consecutive_points_won: u32,

    pub percentages: Percentages,
}

/// Ratios derived from [`PlayerStats`] counters, 0-100
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentages {
    pub first_serve_in: f64,
    pub first_serve_points_won: f64,
    pub second_serve_points_won: f64,
    pub service_points_won: f64,
    pub return_points_won: f64,
    pub break_point_conversion: f64,
    pub break_points_saved: f64,
    pub points_won: f64,
}

impl PlayerStats {
    pub fn shot_count(&self, shot: ShotKind) -> u32 {
        self.shots.get(&shot).copied().unwrap_or(0)
    }

    pub fn total_shots(&self) -> u32 {
        self.shots.values().sum()
    }

    fn derive_percentages(&mut self, total_points: u32) {
        self.percentages = Percentages {
            first_serve_in: ratio(self.first_serves_in, self.first_serves),
            first_serve_points_won: ratio(self.first_serve_points_won, self.first_serves_in),
            second_serve_points_won: ratio(self.second_serve_points_won, self.second_serves),
            service_points_won: ratio(self.points_won_on_serve, self.service_points_played),
            return_points_won: ratio(self.return_points_won, self.return_points_played),
            break_point_conversion: ratio(
                self.break_points_converted,
                self.break_point_opportunities,
            ),
            break_points_saved: ratio(self.break_points_saved, self.break_points_faced),
            points_won: ratio(self.points_won, total_points),
        };
    }
}

/// Percentage of `numerator` over `denominator`; 0 when nothing was played
pub fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) * 100.0 / f64::from(denominator)
    }
}

/// Statistics for both players
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub a: PlayerStats,
    pub b: PlayerStats,
    /// Entries with a resolved winner
    pub total_points: u32,
}

impl MatchStats {
    pub fn player(&self, player: Player) -> &PlayerStats {
        match player {
            Player::A => &self.a,
            Player::B => &self.b,
        }
    }

    fn player_mut(&mut self, player: Player) -> &mut PlayerStats {
        match player {
            Player::A => &mut self.a,
            Player::B => &mut self.b,
        }
    }
}

/// Fold a log into per-player statistics
pub fn compute_stats(entries: &[LogEntry]) -> MatchStats {
    let mut stats = MatchStats::default();
    let mut streak_a = 0u32;
    let mut streak_b = 0u32;

    for entry in entries {
        let server = entry.server_at_time();
        let receiver = entry.receiver();
        let attempt = entry.serve_attempt();
        let winner = entry.winner();

        {
            let serving = stats.player_mut(server);
            match attempt {
                ServeAttempt::First => {
                    serving.first_serves += 1;
                    if entry.outcome() == OutcomeKind::ServeFault {
                        serving.first_serve_faults += 1;
                    } else {
                        serving.first_serves_in += 1;
                    }
                }
                ServeAttempt::Second => {
                    serving.second_serves += 1;
                    if entry.outcome() != OutcomeKind::DoubleFault {
                        serving.second_serves_in += 1;
                    }
                }
            }
        }

        let Some(winner) = winner else {
            continue;
        };
        stats.total_points += 1;

        let acting = stats.player_mut(entry.acting_player);
        match entry.outcome() {
            OutcomeKind::Ace => acting.aces += 1,
            OutcomeKind::DoubleFault => acting.double_faults += 1,
            OutcomeKind::Winner => acting.winners += 1,
            OutcomeKind::UnforcedError => acting.unforced_errors += 1,
            OutcomeKind::ForcedError => acting.forced_errors += 1,
            OutcomeKind::ReturnError => acting.return_errors += 1,
            OutcomeKind::ServeFault => {}
        }
        if let Some(shot) = entry.shot() {
            *acting.shots.entry(shot).or_insert(0) += 1;
        }

        let server_won = winner == server;
        {
            let winning = stats.player_mut(winner);
            winning.points_won += 1;
            if server_won {
                winning.points_won_on_serve += 1;
            } else {
                winning.points_won_on_return += 1;
            }
        }

        {
            let serving = stats.player_mut(server);
            serving.service_points_played += 1;
            if server_won {
                match attempt {
                    ServeAttempt::First => serving.first_serve_points_won += 1,
                    ServeAttempt::Second => serving.second_serve_points_won += 1,
                }
            }
            if entry.is_break_point {
                serving.break_points_faced += 1;
                if server_won {
                    serving.break_points_saved += 1;
                }
            }
        }

        {
            let returning = stats.player_mut(receiver);
            returning.return_points_played += 1;
            match attempt {
                ServeAttempt::First => returning.first_serve_return_points_played += 1,
                ServeAttempt::Second => returning.second_serve_return_points_played += 1,
            }
            if !server_won {
                returning.return_points_won += 1;
                match attempt {
                    ServeAttempt::First => returning.first_serve_return_points_won += 1,
                    ServeAttempt::Second => returning.second_serve_return_points_won += 1,
                }
            }
            if entry.is_break_point {
                returning.break_point_opportunities += 1;
                if !server_won {
                    returning.break_points_converted += 1;
                }
            }
        }

        let (won, lost) = match winner {
            Player::A => (&mut streak_a, &mut streak_b),
            Player::B => (&mut streak_b, &mut streak_a),
        };
        *won += 1;
        *lost = 0;
        let best = stats.player(winner).max_consecutive_points_won.max(*won);
        stats.player_mut(winner).max_consecutive_points_won = best;
    }

    let total = stats.total_points;
    stats.a.derive_percentages(total);
    stats.b.derive_percentages(total);
    stats
}
