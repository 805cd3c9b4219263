//! Independent statistics over reference entries
//!
//! Each counter is a separate filter over the expected entries, rather than
//! the single-pass fold used by [`compute_stats`](crate::stats::compute_stats).

use crate::point::{OutcomeKind, Player, ServeAttempt};
use crate::stats::PlayerStats;

use super::reference::ExpectedEntry;

/// Counters recomputed for one player
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTotals {
    pub points_won: u32,
    pub points_won_on_serve: u32,
    pub points_won_on_return: u32,
    pub aces: u32,
    pub double_faults: u32,
    pub winners: u32,
    pub unforced_errors: u32,
    pub forced_errors: u32,
    pub return_errors: u32,
    pub first_serves: u32,
    pub first_serves_in: u32,
    pub second_serves: u32,
    pub break_point_opportunities: u32,
    pub break_points_converted: u32,
    pub break_points_faced: u32,
    pub break_points_saved: u32,
    pub max_consecutive_points_won: u32,
}

fn count<F>(entries: &[ExpectedEntry], predicate: F) -> u32
where
    F: Fn(&ExpectedEntry) -> bool,
{
    entries.iter().filter(|e| predicate(e)).count() as u32
}

fn acted(entries: &[ExpectedEntry], player: Player, outcome: OutcomeKind) -> u32 {
    count(entries, |e| {
        e.winner.is_some() && e.acting_player == player && e.outcome == outcome
    })
}

impl ReferenceTotals {
    pub fn for_player(entries: &[ExpectedEntry], player: Player) -> Self {
        let won = |e: &ExpectedEntry| e.winner == Some(player);
        let serving = |e: &ExpectedEntry| e.server == player;

        let mut longest = 0;
        let mut run = 0;
        for winner in entries.iter().filter_map(|e| e.winner) {
            run = if winner == player { run + 1 } else { 0 };
            longest = longest.max(run);
        }

        Self {
            points_won: count(entries, won),
            points_won_on_serve: count(entries, |e| won(e) && serving(e)),
            points_won_on_return: count(entries, |e| won(e) && !serving(e)),
            aces: acted(entries, player, OutcomeKind::Ace),
            double_faults: acted(entries, player, OutcomeKind::DoubleFault),
            winners: acted(entries, player, OutcomeKind::Winner),
            unforced_errors: acted(entries, player, OutcomeKind::UnforcedError),
            forced_errors: acted(entries, player, OutcomeKind::ForcedError),
            return_errors: acted(entries, player, OutcomeKind::ReturnError),
            first_serves: count(entries, |e| {
                serving(e) && e.serve_attempt == ServeAttempt::First
            }),
            first_serves_in: count(entries, |e| {
                serving(e) && e.serve_attempt == ServeAttempt::First && e.winner.is_some()
            }),
            second_serves: count(entries, |e| {
                serving(e) && e.serve_attempt == ServeAttempt::Second
            }),
            break_point_opportunities: count(entries, |e| {
                e.break_point && !serving(e) && e.winner.is_some()
            }),
            break_points_converted: count(entries, |e| e.break_point && !serving(e) && won(e)),
            break_points_faced: count(entries, |e| {
                e.break_point && serving(e) && e.winner.is_some()
            }),
            break_points_saved: count(entries, |e| e.break_point && serving(e) && won(e)),
            max_consecutive_points_won: longest,
        }
    }

    /// Fields where `stats` disagrees, as (field, engine, reference)
    pub fn differences(&self, stats: &PlayerStats) -> Vec<(&'static str, u32, u32)> {
        let pairs = [
            ("points_won", stats.points_won, self.points_won),
            ("points_won_on_serve", stats.points_won_on_serve, self.points_won_on_serve),
            ("points_won_on_return", stats.points_won_on_return, self.points_won_on_return),
            ("aces", stats.aces, self.aces),
            ("double_faults", stats.double_faults, self.double_faults),
            ("winners", stats.winners, self.winners),
            ("unforced_errors", stats.unforced_errors, self.unforced_errors),
            ("forced_errors", stats.forced_errors, self.forced_errors),
            ("return_errors", stats.return_errors, self.return_errors),
            ("first_serves", stats.first_serves, self.first_serves),
            ("first_serves_in", stats.first_serves_in, self.first_serves_in),
            ("second_serves", stats.second_serves, self.second_serves),
            (
                "break_point_opportunities",
                stats.break_point_opportunities,
                self.break_point_opportunities,
            ),
            ("break_points_converted", stats.break_points_converted, self.break_points_converted),
            ("break_points_faced", stats.break_points_faced, self.break_points_faced),
            ("break_points_saved", stats.break_points_saved, self.break_points_saved),
            (
                "max_consecutive_points_won",
                stats.max_consecutive_points_won,
                self.max_consecutive_points_won,
            ),
        ];
        pairs.into_iter().filter(|(_, engine, reference)| engine != reference).collect()
    }
}
