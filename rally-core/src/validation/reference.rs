//! Independent reference scorer
//!
//! Counts raw points per player as plain integers and derives the tennis
//! display ("15", "40", "AD") only when asked. It shares no scoring code with
//! the engine, so agreement between the two is meaningful.

use crate::log::ScoreLine;
use crate::point::{OutcomeKind, Player, PointInput, ServeAttempt};
use crate::score::{GameScore, Tally};
use crate::settings::{FinalSetType, MatchSettings, SetServerRule};

/// What the reference expects a log entry to contain
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedEntry {
    pub outcome: OutcomeKind,
    pub winner: Option<Player>,
    pub server: Player,
    pub serve_attempt: ServeAttempt,
    pub acting_player: Player,
    pub set_number: u32,
    pub game_number: u32,
    pub in_tie_break: bool,
    pub score: ScoreLine,
    pub games: Tally,
    pub sets: Tally,
    pub break_point: bool,
}

#[derive(Debug, Clone, Copy)]
struct ReferenceTieBreak {
    first_server: Player,
    target: u32,
    win_by_two: bool,
}

/// Integer-count scorer fed with the same inputs as the engine
#[derive(Debug, Clone)]
pub struct ReferenceScorer {
    settings: MatchSettings,
    server: Player,
    second_serve: bool,
    set_number: u32,
    set_first_server: Player,
    points: [u32; 2],
    games: [u32; 2],
    sets: [u32; 2],
    tie_break: Option<ReferenceTieBreak>,
    winner: Option<Player>,
}

fn slot(player: Player) -> usize {
    match player {
        Player::A => 0,
        Player::B => 1,
    }
}

fn tally(counts: [u32; 2]) -> Tally {
    Tally::new(counts[0], counts[1])
}

fn call(points: u32) -> GameScore {
    match points {
        0 => GameScore::Love,
        1 => GameScore::Fifteen,
        2 => GameScore::Thirty,
        _ => GameScore::Forty,
    }
}

impl ReferenceScorer {
    pub fn new(settings: &MatchSettings) -> Self {
        Self {
            settings: settings.clone(),
            server: settings.first_server,
            second_serve: false,
            set_number: 1,
            set_first_server: settings.first_server,
            points: [0, 0],
            games: [0, 0],
            sets: [0, 0],
            tie_break: None,
            winner: None,
        }
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn sets_won(&self) -> Tally {
        tally(self.sets)
    }

    /// Feed one input; `None` once the match is over
    pub fn expect(&mut self, input: &PointInput) -> Option<ExpectedEntry> {
        if self.winner.is_some() {
            return None;
        }

        let server = self.server;
        let receiver = server.opponent();
        let serve_attempt = if self.second_serve {
            ServeAttempt::Second
        } else {
            ServeAttempt::First
        };
        let break_point = self.tie_break.is_none() && self.wins_game_with_next_point(receiver);
        let set_number = self.set_number;
        let game_number = self.games[0] + self.games[1] + 1;

        let (outcome, winner) = match input.outcome {
            OutcomeKind::ServeFault if self.second_serve => (OutcomeKind::DoubleFault, Some(receiver)),
            OutcomeKind::ServeFault => (OutcomeKind::ServeFault, None),
            OutcomeKind::DoubleFault => (OutcomeKind::DoubleFault, Some(receiver)),
            OutcomeKind::Ace | OutcomeKind::ReturnError => (input.outcome, Some(server)),
            other => (other, input.winner),
        };

        let acting_player = match (outcome, winner) {
            (OutcomeKind::ReturnError, _) => receiver,
            (OutcomeKind::Winner, Some(w)) => w,
            (OutcomeKind::UnforcedError | OutcomeKind::ForcedError, Some(w)) => w.opponent(),
            _ => server,
        };

        let mut expected = ExpectedEntry {
            outcome,
            winner,
            server,
            serve_attempt,
            acting_player,
            set_number,
            game_number,
            in_tie_break: self.tie_break.is_some(),
            score: self.score_line(),
            games: tally(self.games),
            sets: tally(self.sets),
            break_point,
        };

        let Some(winner) = winner else {
            self.second_serve = true;
            return Some(expected);
        };
        self.second_serve = false;

        match self.tie_break {
            Some(tb) => self.tie_break_point(tb, winner, &mut expected),
            None => self.game_point(winner, &mut expected),
        }
        expected.sets = tally(self.sets);
        Some(expected)
    }

    fn score_line(&self) -> ScoreLine {
        match self.tie_break {
            Some(_) => ScoreLine::TieBreak {
                a: self.points[0],
                b: self.points[1],
            },
            None => ScoreLine::Regular {
                a: self.display(Player::A),
                b: self.display(Player::B),
            },
        }
    }

    fn display(&self, player: Player) -> GameScore {
        let own = self.points[slot(player)];
        let other = self.points[slot(player.opponent())];
        if self.settings.ad_scoring && own >= 3 && other >= 3 {
            if own > other {
                GameScore::Advantage
            } else {
                GameScore::Forty
            }
        } else {
            call(own)
        }
    }

    fn game_won_at(&self, own: u32, other: u32) -> bool {
        if self.settings.ad_scoring {
            own >= 4 && own >= other + 2
        } else {
            own >= 4
        }
    }

    fn game_is_won_by(&self, player: Player) -> bool {
        self.game_won_at(self.points[slot(player)], self.points[slot(player.opponent())])
    }

    fn wins_game_with_next_point(&self, player: Player) -> bool {
        self.game_won_at(self.points[slot(player)] + 1, self.points[slot(player.opponent())])
    }

    fn game_point(&mut self, winner: Player, expected: &mut ExpectedEntry) {
        let before = self.score_line();
        self.points[slot(winner)] += 1;

        if !self.game_is_won_by(winner) {
            expected.score = self.score_line();
            return;
        }

        // A won game keeps the score it had before the winning point
        expected.score = before;
        self.points = [0, 0];
        self.games[slot(winner)] += 1;
        expected.games = tally(self.games);
        self.server = self.server.opponent();

        let target = u32::from(self.settings.games_per_set);
        let (own, other) = (self.games[slot(winner)], self.games[slot(winner.opponent())]);
        if own >= target && own >= other + 2 {
            self.close_set(winner);
        } else if self.games == [target, target] {
            let deciding = self.set_number == u32::from(self.settings.number_of_sets);
            self.tie_break = Some(
                if deciding && self.settings.final_set_type == FinalSetType::SuperTieBreak {
                    ReferenceTieBreak {
                        first_server: self.server,
                        target: self.settings.super_tie_break_target,
                        win_by_two: self.settings.super_tie_break_win_by_two,
                    }
                } else {
                    ReferenceTieBreak {
                        first_server: self.server,
                        target: self.settings.tie_break_target,
                        win_by_two: self.settings.tie_break_win_by_two,
                    }
                },
            );
        }
    }

    fn tie_break_point(&mut self, tb: ReferenceTieBreak, winner: Player, expected: &mut ExpectedEntry) {
        self.points[slot(winner)] += 1;
        expected.score = self.score_line();

        let own = self.points[slot(winner)];
        let other = self.points[slot(winner.opponent())];
        let lead = if tb.win_by_two { 2 } else { 1 };

        if own >= tb.target && own >= other + lead {
            self.games[slot(winner)] += 1;
            expected.games = tally(self.games);
            self.close_set(winner);
        } else if (self.points[0] + self.points[1]) % 2 == 1 {
            self.server = self.server.opponent();
        }
    }

    fn close_set(&mut self, winner: Player) {
        self.sets[slot(winner)] += 1;
        let needed = u32::from(self.settings.number_of_sets) / 2 + 1;
        if self.sets[slot(winner)] >= needed {
            self.winner = Some(winner);
            return;
        }

        let next_server = match (self.settings.set_server_rule, self.tie_break) {
            (SetServerRule::AlternateFirstServer, _) => self.set_first_server.opponent(),
            (SetServerRule::ContinueRotation, Some(tb)) => tb.first_server.opponent(),
            (SetServerRule::ContinueRotation, None) => self.server,
        };

        self.set_number += 1;
        self.set_first_server = next_server;
        self.server = next_server;
        self.points = [0, 0];
        self.games = [0, 0];
        self.tie_break = None;
    }
}
