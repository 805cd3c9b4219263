//! Display projection of a match state

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::log::ScoreLine;
use crate::point::{Player, ServeAttempt};
use crate::score::Tally;

use super::{MatchState, MatchStatus};

/// What a scoreboard shows at a given moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub status: MatchStatus,
    pub winner: Option<Player>,
    /// Games per set, in order
    pub set_scores: Vec<Tally>,
    pub sets_won: Tally,
    /// Score of the game or tie-break in progress
    pub current: ScoreLine,
    pub server: Player,
    pub serve_attempt: ServeAttempt,
    pub break_point: bool,
    pub points_recorded: usize,
}

impl Scoreboard {
    pub fn from_state(state: &MatchState) -> Self {
        let current = match state.current_set().map(|set| (set.active_tie_break(), set.current_game())) {
            Some((Some(tb), _)) => ScoreLine::TieBreak {
                a: tb.points_a,
                b: tb.points_b,
            },
            Some((None, Some(game))) if !game.is_won() => ScoreLine::Regular {
                a: game.score_a,
                b: game.score_b,
            },
            _ => ScoreLine::default(),
        };

        Self {
            status: state.status,
            winner: state.winner,
            set_scores: state.sets.iter().map(|s| s.games()).collect(),
            sets_won: state.sets_won(),
            current,
            server: state.current_server,
            serve_attempt: state.current_serve_attempt,
            break_point: state.is_break_point(),
            points_recorded: state.point_count(),
        }
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets: Vec<String> = self.set_scores.iter().map(|t| t.to_string()).collect();
        write!(f, "Sets {} | {}", self.sets_won, sets.join(" "))?;

        match (self.status, self.winner) {
            (MatchStatus::Completed, Some(winner)) => write!(f, " | Winner: {}", winner),
            _ => {
                write!(
                    f,
                    " | {} | {} serving ({} serve)",
                    self.current,
                    self.server,
                    match self.serve_attempt {
                        ServeAttempt::First => "1st",
                        ServeAttempt::Second => "2nd",
                    }
                )?;
                if self.break_point {
                    write!(f, " | BREAK POINT")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::record_point;
    use crate::point::PointInput;
    use crate::score::GameScore;
    use crate::settings::MatchSettings;
    use chrono::Utc;

    #[test]
    fn test_scoreboard_tracks_current_game() {
        let mut state = MatchState::new(MatchSettings::default());
        for input in [PointInput::winner(Player::A), PointInput::serve_fault()] {
            state = record_point(&state, &input, Utc::now()).unwrap();
        }

        let board = state.scoreboard();
        assert_eq!(
            board.current,
            ScoreLine::Regular {
                a: GameScore::Fifteen,
                b: GameScore::Love
            }
        );
        assert_eq!(board.serve_attempt, ServeAttempt::Second);
        assert_eq!(board.points_recorded, 2);
        assert!(board.to_string().contains("15-0"));
    }
}
