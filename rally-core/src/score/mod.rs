//! Score containers: games, tie-breaks and sets
//!
//! These are plain data. Only the engine mutates them, and only while they are
//! unresolved; once a winner is set a container is never touched again.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::point::{Player, Point};

/// Score of one player inside a regular game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameScore {
    #[default]
    Love,
    Fifteen,
    Thirty,
    Forty,
    Advantage,
}

impl GameScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameScore::Love => "0",
            GameScore::Fifteen => "15",
            GameScore::Thirty => "30",
            GameScore::Forty => "40",
            GameScore::Advantage => "AD",
        }
    }

    /// Next value in the 0 → 15 → 30 → 40 sequence; `None` from 40 or AD
    pub fn next(self) -> Option<GameScore> {
        match self {
            GameScore::Love => Some(GameScore::Fifteen),
            GameScore::Fifteen => Some(GameScore::Thirty),
            GameScore::Thirty => Some(GameScore::Forty),
            GameScore::Forty | GameScore::Advantage => None,
        }
    }
}

impl fmt::Display for GameScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-player pair of counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tally {
    pub a: u32,
    pub b: u32,
}

impl Tally {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    pub fn get(&self, player: Player) -> u32 {
        match player {
            Player::A => self.a,
            Player::B => self.b,
        }
    }

    pub fn increment(&mut self, player: Player) {
        match player {
            Player::A => self.a += 1,
            Player::B => self.b += 1,
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// A regular game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// 1-based number within the set
    pub number: u32,
    pub score_a: GameScore,
    pub score_b: GameScore,
    pub winner: Option<Player>,
    pub server: Player,
    pub points: Vec<Point>,
}

impl Game {
    pub fn new(number: u32, server: Player) -> Self {
        Self {
            number,
            score_a: GameScore::Love,
            score_b: GameScore::Love,
            winner: None,
            server,
            points: Vec::new(),
        }
    }

    pub fn score(&self, player: Player) -> GameScore {
        match player {
            Player::A => self.score_a,
            Player::B => self.score_b,
        }
    }

    pub fn set_score(&mut self, player: Player, score: GameScore) {
        match player {
            Player::A => self.score_a = score,
            Player::B => self.score_b = score,
        }
    }

    pub fn is_won(&self) -> bool {
        self.winner.is_some()
    }
}

/// Regular or super tie-break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakKind {
    Regular,
    Super,
}

/// A tie-break played at games-all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieBreak {
    pub kind: TieBreakKind,
    pub points_a: u32,
    pub points_b: u32,
    pub winner: Option<Player>,
    /// Server of the first tie-break point
    pub first_server: Player,
    pub target: u32,
    pub win_by_two: bool,
    pub points: Vec<Point>,
}

impl TieBreak {
    pub fn new(kind: TieBreakKind, first_server: Player, target: u32, win_by_two: bool) -> Self {
        Self {
            kind,
            points_a: 0,
            points_b: 0,
            winner: None,
            first_server,
            target,
            win_by_two,
            points: Vec::new(),
        }
    }

    pub fn points_for(&self, player: Player) -> u32 {
        match player {
            Player::A => self.points_a,
            Player::B => self.points_b,
        }
    }

    /// Points played so far (faults excluded)
    pub fn total_points(&self) -> u32 {
        self.points_a + self.points_b
    }

    pub fn is_active(&self) -> bool {
        self.winner.is_none()
    }
}

/// A set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    /// 1-based number within the match
    pub number: u32,
    pub games_a: u32,
    pub games_b: u32,
    pub winner: Option<Player>,
    /// Server of the first game of the set
    pub first_server: Player,
    pub games: Vec<Game>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<TieBreak>,
}

impl Set {
    /// A new set with its first game already open
    pub fn new(number: u32, first_server: Player) -> Self {
        Self {
            number,
            games_a: 0,
            games_b: 0,
            winner: None,
            first_server,
            games: vec![Game::new(1, first_server)],
            tie_break: None,
        }
    }

    pub fn games(&self) -> Tally {
        Tally::new(self.games_a, self.games_b)
    }

    pub fn is_won(&self) -> bool {
        self.winner.is_some()
    }

    /// The unresolved tie-break, if one is being played
    pub fn active_tie_break(&self) -> Option<&TieBreak> {
        self.tie_break.as_ref().filter(|tb| tb.is_active())
    }

    pub fn current_game(&self) -> Option<&Game> {
        self.games.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_score_sequence() {
        assert_eq!(GameScore::Love.next(), Some(GameScore::Fifteen));
        assert_eq!(GameScore::Thirty.next(), Some(GameScore::Forty));
        assert_eq!(GameScore::Forty.next(), None);
        assert_eq!(GameScore::Advantage.to_string(), "AD");
    }

    #[test]
    fn test_new_set_opens_first_game() {
        let set = Set::new(2, Player::B);
        assert_eq!(set.games.len(), 1);
        assert_eq!(set.games[0].server, Player::B);
        assert!(set.active_tie_break().is_none());
        assert_eq!(set.games().to_string(), "0-0");
    }
}
