//! Scoring State Machine
//!
//! The engine is a pure transition function:
//!
//! ```text
//! record_point(&MatchState, &PointInput, timestamp) -> Result<MatchState>
//! ```
//!
//! Callers hold the latest [`MatchState`] explicitly. Each call validates the
//! input before touching anything, so a rejected point leaves no trace.
//!
//! Each accepted call appends exactly one [`LogEntry`](crate::log::LogEntry) to
//! the match log, including first-serve faults that leave the score unchanged.

pub mod rules;
mod scoreboard;

pub use scoreboard::Scoreboard;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RallyError, Result};
use crate::log::{LogEntry, MatchLog, ScoreLine};
use crate::point::{acting_player, Player, Point, PointInput, ServeAttempt};
use crate::score::{Set, Tally, TieBreak, TieBreakKind};
use crate::settings::{FinalSetType, MatchSettings, SetServerRule};

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    InProgress,
    Completed,
}

/// Complete scoring state of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub settings: MatchSettings,
    pub status: MatchStatus,
    pub sets: Vec<Set>,
    pub current_server: Player,
    pub current_serve_attempt: ServeAttempt,
    pub winner: Option<Player>,
    /// Timestamp of the match-winning point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub log: MatchLog,
}

impl MatchState {
    /// Initial state: first set and first game open, nothing recorded
    pub fn new(settings: MatchSettings) -> Self {
        let first_server = settings.first_server;
        Self {
            settings,
            status: MatchStatus::InProgress,
            sets: vec![Set::new(1, first_server)],
            current_server: first_server,
            current_serve_attempt: ServeAttempt::First,
            winner: None,
            ended_at: None,
            log: MatchLog::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Sets won by each player
    pub fn sets_won(&self) -> Tally {
        let mut tally = Tally::default();
        for winner in self.sets.iter().filter_map(|s| s.winner) {
            tally.increment(winner);
        }
        tally
    }

    /// The set currently being played, or the last set of a finished match
    ///
    /// `None` only for a state deserialized without sets.
    pub fn current_set(&self) -> Option<&Set> {
        self.sets.last()
    }

    /// Number of log entries recorded so far
    pub fn point_count(&self) -> usize {
        self.log.len()
    }

    /// Whether the next point is a break point for the receiver
    pub fn is_break_point(&self) -> bool {
        let Some(set) = self.current_set() else {
            return false;
        };
        if self.is_completed() || set.active_tie_break().is_some() {
            return false;
        }
        set.current_game()
            .map(|game| rules::is_break_point(game, self.settings.ad_scoring))
            .unwrap_or(false)
    }

    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard::from_state(self)
    }
}

/// Record one point and return the resulting state
///
/// `state` is left untouched; the returned value is the new snapshot.
pub fn record_point(state: &MatchState, input: &PointInput, at: DateTime<Utc>) -> Result<MatchState> {
    let mut next = state.clone();
    apply_point(&mut next, input, at)?;
    Ok(next)
}

/// Apply one point in place
///
/// Validation happens before any field is written, so on error `state` is
/// unchanged.
pub(crate) fn apply_point(state: &mut MatchState, input: &PointInput, at: DateTime<Utc>) -> Result<()> {
    if state.is_completed() {
        tracing::warn!("Rejected point on completed match");
        return Err(RallyError::MatchCompleted);
    }

    let server = state.current_server;
    let attempt = state.current_serve_attempt;
    let (outcome, winner) = input.resolve(server, attempt)?;

    let is_break_point = state.is_break_point();
    let point = Point {
        sequence: state.log.len() as u64,
        winner,
        outcome,
        shot: input.shot,
        server,
        serve_attempt: attempt,
        timestamp: at,
    };

    tracing::debug!(
        sequence = point.sequence,
        outcome = %point.outcome,
        server = %server,
        "Recording point"
    );

    let placement = match winner {
        None => record_first_fault(state, point.clone())?,
        Some(winner) => {
            let in_tie_break = current_set_mut(state)?.active_tie_break().is_some();
            state.current_serve_attempt = ServeAttempt::First;
            if in_tie_break {
                score_in_tie_break(state, point.clone(), winner)?
            } else {
                score_in_game(state, point.clone(), winner)?
            }
        }
    };

    if let Some(set_winner) = placement.set_won_by {
        close_set(state, set_winner, at)?;
    }

    let entry = LogEntry {
        acting_player: acting_player(point.outcome, point.winner, point.server),
        point,
        set_number: placement.set_number,
        game_number: placement.game_number,
        in_tie_break: placement.in_tie_break,
        game_score_after: placement.score_line,
        games_score_after: placement.games,
        sets_score_after: state.sets_won(),
        is_break_point,
        entry_hash: String::new(),
        previous_hash: String::new(),
    };
    state.log.append(entry);

    Ok(())
}

/// Where a point landed and what it changed
struct Placement {
    set_number: u32,
    game_number: u32,
    in_tie_break: bool,
    score_line: ScoreLine,
    games: Tally,
    set_won_by: Option<Player>,
}

fn no_sets() -> RallyError {
    RallyError::InternalError {
        reason: "match has no sets".to_string(),
    }
}

fn current_set_mut(state: &mut MatchState) -> Result<&mut Set> {
    state.sets.last_mut().ok_or_else(no_sets)
}

fn record_first_fault(state: &mut MatchState, point: Point) -> Result<Placement> {
    let set = current_set_mut(state)?;
    let games = set.games();
    let set_number = set.number;
    let next_game_number = set.games.len() as u32 + 1;

    if let Some(tb) = set.tie_break.as_mut().filter(|tb| tb.is_active()) {
        tb.points.push(point);
        let score_line = ScoreLine::TieBreak {
            a: tb.points_a,
            b: tb.points_b,
        };
        state.current_serve_attempt = ServeAttempt::Second;
        return Ok(Placement {
            set_number,
            game_number: next_game_number,
            in_tie_break: true,
            score_line,
            games,
            set_won_by: None,
        });
    }

    let (game_number, score_line) = match set.games.last_mut() {
        Some(game) => {
            game.points.push(point);
            (
                game.number,
                ScoreLine::Regular {
                    a: game.score_a,
                    b: game.score_b,
                },
            )
        }
        None => (next_game_number, ScoreLine::default()),
    };

    state.current_serve_attempt = ServeAttempt::Second;
    Ok(Placement {
        set_number,
        game_number,
        in_tie_break: false,
        score_line,
        games,
        set_won_by: None,
    })
}

fn score_in_game(state: &mut MatchState, point: Point, winner: Player) -> Result<Placement> {
    let settings = state.settings.clone();
    let set = current_set_mut(state)?;

    let game = set.games.last_mut().ok_or_else(|| RallyError::InternalError {
        reason: format!("set {} has no open game", set.number),
    })?;
    game.points.push(point);
    let game_won = rules::score_game_point(game, winner, settings.ad_scoring);
    let game_number = game.number;
    let score_line = ScoreLine::Regular {
        a: game.score_a,
        b: game.score_b,
    };
    let game_server = game.server;

    let mut placement = Placement {
        set_number: set.number,
        game_number,
        in_tie_break: false,
        score_line,
        games: set.games(),
        set_won_by: None,
    };

    if !game_won {
        return Ok(placement);
    }

    match winner {
        Player::A => set.games_a += 1,
        Player::B => set.games_b += 1,
    }
    placement.games = set.games();

    let receiver = game_server.opponent();
    tracing::info!(
        set = set.number,
        game = game_number,
        winner = %winner,
        games = %set.games(),
        "Game won"
    );

    if let Some(set_winner) = rules::set_winner(set.games_a, set.games_b, &settings) {
        set.winner = Some(set_winner);
        placement.set_won_by = Some(set_winner);
    } else if rules::needs_tie_break(set.games_a, set.games_b, &settings) {
        let deciding = settings.is_deciding_set(set.number);
        let tie_break = if deciding && settings.final_set_type == FinalSetType::SuperTieBreak {
            TieBreak::new(
                TieBreakKind::Super,
                receiver,
                settings.super_tie_break_target,
                settings.super_tie_break_win_by_two,
            )
        } else {
            TieBreak::new(
                TieBreakKind::Regular,
                receiver,
                settings.tie_break_target,
                settings.tie_break_win_by_two,
            )
        };
        tracing::info!(set = set.number, kind = ?tie_break.kind, "Tie-break started");
        set.tie_break = Some(tie_break);
    } else {
        let number = set.games.len() as u32 + 1;
        set.games.push(crate::score::Game::new(number, receiver));
    }

    state.current_server = receiver;
    Ok(placement)
}

fn score_in_tie_break(state: &mut MatchState, point: Point, winner: Player) -> Result<Placement> {
    let set = current_set_mut(state)?;
    let set_number = set.number;
    let game_number = set.games.len() as u32 + 1;

    let tb = set
        .tie_break
        .as_mut()
        .ok_or_else(|| RallyError::InternalError {
            reason: format!("set {} has no tie-break", set_number),
        })?;
    tb.points.push(point);
    let won = rules::score_tie_break_point(tb, winner);
    let score_line = ScoreLine::TieBreak {
        a: tb.points_a,
        b: tb.points_b,
    };
    let server_changes = rules::tie_break_server_changes(tb.total_points());

    let mut placement = Placement {
        set_number,
        game_number,
        in_tie_break: true,
        score_line,
        games: set.games(),
        set_won_by: None,
    };

    if won {
        match winner {
            Player::A => set.games_a += 1,
            Player::B => set.games_b += 1,
        }
        set.winner = Some(winner);
        placement.games = set.games();
        placement.set_won_by = Some(winner);
        tracing::info!(set = set_number, winner = %winner, score = %score_line, "Tie-break won");
    } else if server_changes {
        state.current_server = state.current_server.opponent();
    }

    Ok(placement)
}

/// Finish a won set: either end the match or open the next set
fn close_set(state: &mut MatchState, set_winner: Player, at: DateTime<Utc>) -> Result<()> {
    let sets_won = state.sets_won();
    let finished = state.sets.last().ok_or_else(no_sets)?;
    tracing::info!(
        set = finished.number,
        winner = %set_winner,
        games = %finished.games(),
        sets = %sets_won,
        "Set won"
    );

    if sets_won.get(set_winner) >= state.settings.sets_to_win() {
        state.status = MatchStatus::Completed;
        state.winner = Some(set_winner);
        state.ended_at = Some(at);
        state.current_serve_attempt = ServeAttempt::First;
        tracing::info!(winner = %set_winner, sets = %sets_won, "Match completed");
        return Ok(());
    }

    let next_server = match state.settings.set_server_rule {
        SetServerRule::AlternateFirstServer => finished.first_server.opponent(),
        SetServerRule::ContinueRotation => match &finished.tie_break {
            Some(tb) => tb.first_server.opponent(),
            None => state.current_server,
        },
    };
    let number = finished.number + 1;

    state.sets.push(Set::new(number, next_server));
    state.current_server = next_server;
    state.current_serve_attempt = ServeAttempt::First;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::OutcomeKind;
    use crate::score::GameScore;

    fn play(state: &MatchState, inputs: &[PointInput]) -> MatchState {
        inputs.iter().fold(state.clone(), |s, input| {
            record_point(&s, input, Utc::now()).unwrap()
        })
    }

    fn wins(player: Player, n: usize) -> Vec<PointInput> {
        vec![PointInput::winner(player); n]
    }

    #[test]
    fn test_no_ad_game() {
        let settings = MatchSettings::builder().ad_scoring(false).build().unwrap();
        let state = play(&MatchState::new(settings), &wins(Player::A, 4));

        let game = &state.sets[0].games[0];
        assert_eq!(game.winner, Some(Player::A));
        assert_eq!(game.score_a, GameScore::Forty);
        assert_eq!(state.sets[0].games_a, 1);
        assert_eq!(state.current_server, Player::B);
        assert!(state
            .log
            .iter()
            .all(|e| !matches!(e.game_score_after, ScoreLine::Regular { a: GameScore::Advantage, .. })));
    }

    #[test]
    fn test_ad_game_path() {
        let mut state = play(
            &MatchState::new(MatchSettings::default()),
            &[
                PointInput::winner(Player::A),
                PointInput::winner(Player::B),
                PointInput::winner(Player::A),
                PointInput::winner(Player::B),
                PointInput::winner(Player::A),
                PointInput::winner(Player::B),
            ],
        );
        let game = &state.sets[0].games[0];
        assert_eq!((game.score_a, game.score_b), (GameScore::Forty, GameScore::Forty));

        state = play(&state, &[PointInput::winner(Player::A)]);
        let game = &state.sets[0].games[0];
        assert_eq!((game.score_a, game.score_b), (GameScore::Advantage, GameScore::Forty));

        state = play(&state, &[PointInput::winner(Player::A)]);
        assert_eq!(state.sets[0].games[0].winner, Some(Player::A));
    }

    #[test]
    fn test_first_fault_leaves_score() {
        let state = play(&MatchState::new(MatchSettings::default()), &[PointInput::serve_fault()]);

        assert_eq!(state.current_serve_attempt, ServeAttempt::Second);
        assert_eq!(state.log.len(), 1);
        let entry = &state.log.entries()[0];
        assert!(entry.is_score_neutral());
        assert_eq!(entry.game_score_after, ScoreLine::default());
        assert_eq!(state.sets[0].games[0].points.len(), 1);
    }

    #[test]
    fn test_double_fault() {
        let state = play(
            &MatchState::new(MatchSettings::default()),
            &[PointInput::serve_fault(), PointInput::serve_fault()],
        );

        assert_eq!(state.log.len(), 2);
        let entry = &state.log.entries()[1];
        assert_eq!(entry.outcome(), OutcomeKind::DoubleFault);
        assert_eq!(entry.winner(), Some(Player::B));
        assert_eq!(entry.acting_player, Player::A);
        assert_eq!(
            entry.game_score_after,
            ScoreLine::Regular {
                a: GameScore::Love,
                b: GameScore::Fifteen
            }
        );
        let scoring: Vec<_> = state.log.iter().filter(|e| !e.is_score_neutral()).collect();
        assert_eq!(scoring.len(), 1);
        assert_eq!(state.current_serve_attempt, ServeAttempt::First);
    }

    #[test]
    fn test_rejected_point_is_atomic() {
        let state = play(&MatchState::new(MatchSettings::default()), &wins(Player::A, 2));
        let bad = PointInput::new(OutcomeKind::Winner, None);

        assert!(record_point(&state, &bad, Utc::now()).is_err());

        let mut in_place = state.clone();
        assert!(apply_point(&mut in_place, &bad, Utc::now()).is_err());
        assert_eq!(in_place, state);
    }

    #[test]
    fn test_tie_break_trigger_and_rotation() {
        let settings = MatchSettings::default();
        let mut state = MatchState::new(settings);
        // Hold serve alternately to 6-6
        for game in 0..12 {
            let server = if game % 2 == 0 { Player::A } else { Player::B };
            state = play(&state, &wins(server, 4));
        }

        let set = &state.sets[0];
        assert_eq!(set.games(), Tally::new(6, 6));
        let tb = set.active_tie_break().expect("tie-break at 6-6");
        // B served the twelfth game, so A receives it and serves first
        assert_eq!(tb.first_server, Player::A);
        assert_eq!(state.current_server, Player::A);

        state = play(&state, &wins(Player::A, 1));
        assert_eq!(state.current_server, Player::B);
        state = play(&state, &wins(Player::A, 1));
        assert_eq!(state.current_server, Player::B);
        state = play(&state, &wins(Player::A, 1));
        assert_eq!(state.current_server, Player::A);
    }

    #[test]
    fn test_no_tie_break_at_seven_five() {
        let mut state = MatchState::new(MatchSettings::default());
        for game in 0..10 {
            let server = if game % 2 == 0 { Player::A } else { Player::B };
            state = play(&state, &wins(server, 4));
        }
        // 5-5, then A wins two more games
        state = play(&state, &wins(Player::A, 8));

        assert_eq!(state.sets[0].games(), Tally::new(7, 5));
        assert!(state.sets[0].tie_break.is_none());
        assert_eq!(state.sets[0].winner, Some(Player::A));
        assert_eq!(state.sets.len(), 2);
    }

    #[test]
    fn test_match_completion_rejects_points() {
        let settings = MatchSettings::builder().number_of_sets(1).games_per_set(1).build().unwrap();
        // 1-0 is not a two-game lead, 2-0 is
        let state = play(&MatchState::new(settings), &wins(Player::B, 8));

        assert!(state.is_completed());
        assert_eq!(state.winner, Some(Player::B));
        assert!(state.ended_at.is_some());
        assert!(matches!(
            record_point(&state, &PointInput::ace(), Utc::now()),
            Err(RallyError::MatchCompleted)
        ));
    }

    #[test]
    fn test_alternating_first_server_per_set() {
        let settings = MatchSettings::builder().games_per_set(1).build().unwrap();
        // A wins two games love: set 1 is 2-0 and set 2 starts with B serving
        let state = play(&MatchState::new(settings), &wins(Player::A, 8));

        assert_eq!(state.sets.len(), 2);
        assert_eq!(state.sets[1].first_server, Player::B);
        assert_eq!(state.current_server, Player::B);
    }

    #[test]
    fn test_continue_rotation_rule() {
        let settings = MatchSettings::builder()
            .games_per_set(2)
            .set_server_rule(SetServerRule::ContinueRotation)
            .build()
            .unwrap();
        let state = play(&MatchState::new(settings), &wins(Player::A, 8));

        assert_eq!(state.sets[0].games(), Tally::new(2, 0));
        // A served game 1, B served game 2, so A is due to serve next
        assert_eq!(state.sets[1].first_server, Player::A);
    }

    #[test]
    fn test_break_point_flag() {
        let state = play(
            &MatchState::new(MatchSettings::default()),
            &[
                PointInput::winner(Player::B),
                PointInput::winner(Player::B),
                PointInput::winner(Player::B),
                PointInput::winner(Player::A),
            ],
        );

        let flags: Vec<bool> = state.log.iter().map(|e| e.is_break_point).collect();
        assert_eq!(flags, vec![false, false, false, true]);
        assert!(state.is_break_point());
    }

    #[test]
    fn test_state_without_sets_is_an_error() {
        let mut json = serde_json::to_value(MatchState::new(MatchSettings::default())).unwrap();
        json["sets"] = serde_json::json!([]);
        let state: MatchState = serde_json::from_value(json).unwrap();

        for input in [PointInput::serve_fault(), PointInput::ace()] {
            let result = record_point(&state, &input, Utc::now());
            assert!(matches!(result, Err(RallyError::InternalError { .. })));
        }
        assert!(state.current_set().is_none());
        assert!(!state.is_break_point());
        assert_eq!(state.scoreboard().current, ScoreLine::default());
    }
}
