//! Points - the atomic events of a match
//!
//! A [`PointInput`] is what the caller supplies (how the rally ended and, where
//! relevant, who won it). The engine turns it into a [`Point`] by attaching the
//! server, the serve attempt, a sequence number and the resolved winner.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RallyError, Result};

/// One of the two players in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    /// The other player
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::A => "A",
            Player::B => "B",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Player {
    type Err = RallyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(Player::A),
            "B" | "b" => Ok(Player::B),
            other => Err(RallyError::invalid_point(format!(
                "unknown player '{}', expected A or B",
                other
            ))),
        }
    }
}

/// How a point ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Ace,
    Winner,
    ServeFault,
    DoubleFault,
    ReturnError,
    UnforcedError,
    ForcedError,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Ace => "ace",
            OutcomeKind::Winner => "winner",
            OutcomeKind::ServeFault => "serve_fault",
            OutcomeKind::DoubleFault => "double_fault",
            OutcomeKind::ReturnError => "return_error",
            OutcomeKind::UnforcedError => "unforced_error",
            OutcomeKind::ForcedError => "forced_error",
        }
    }

    /// Faults never carry a shot classification
    pub fn is_fault(&self) -> bool {
        matches!(self, OutcomeKind::ServeFault | OutcomeKind::DoubleFault)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeKind {
    type Err = RallyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ace" => Ok(OutcomeKind::Ace),
            "winner" => Ok(OutcomeKind::Winner),
            "serve_fault" | "fault" => Ok(OutcomeKind::ServeFault),
            "double_fault" => Ok(OutcomeKind::DoubleFault),
            "return_error" => Ok(OutcomeKind::ReturnError),
            "unforced_error" => Ok(OutcomeKind::UnforcedError),
            "forced_error" => Ok(OutcomeKind::ForcedError),
            _ => Err(RallyError::UnknownOutcome {
                value: s.to_string(),
            }),
        }
    }
}

/// Shot classification for the stroke that ended a rally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotKind {
    Forehand,
    Backhand,
    Volley,
    Overhead,
    DropShot,
    Lob,
    Passing,
    Serve,
}

impl ShotKind {
    pub const ALL: [ShotKind; 8] = [
        ShotKind::Forehand,
        ShotKind::Backhand,
        ShotKind::Volley,
        ShotKind::Overhead,
        ShotKind::DropShot,
        ShotKind::Lob,
        ShotKind::Passing,
        ShotKind::Serve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShotKind::Forehand => "forehand",
            ShotKind::Backhand => "backhand",
            ShotKind::Volley => "volley",
            ShotKind::Overhead => "overhead",
            ShotKind::DropShot => "drop_shot",
            ShotKind::Lob => "lob",
            ShotKind::Passing => "passing",
            ShotKind::Serve => "serve",
        }
    }
}

impl fmt::Display for ShotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShotKind {
    type Err = RallyError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ShotKind::ALL
            .iter()
            .copied()
            .find(|shot| shot.as_str() == normalized)
            .ok_or_else(|| RallyError::UnknownShot {
                value: s.to_string(),
            })
    }
}

/// Which serve of the point is being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeAttempt {
    First,
    Second,
}

impl ServeAttempt {
    pub fn number(&self) -> u8 {
        match self {
            ServeAttempt::First => 1,
            ServeAttempt::Second => 2,
        }
    }
}

/// Caller-supplied description of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointInput {
    pub outcome: OutcomeKind,

    /// Who won the rally. Required for winners and errors during a rally,
    /// derived by the engine for aces, return errors and faults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Player>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot: Option<ShotKind>,
}

impl PointInput {
    pub fn new(outcome: OutcomeKind, winner: Option<Player>) -> Self {
        Self {
            outcome,
            winner,
            shot: None,
        }
    }

    /// A rally won outright by `player`
    pub fn winner(player: Player) -> Self {
        Self::new(OutcomeKind::Winner, Some(player))
    }

    pub fn ace() -> Self {
        Self::new(OutcomeKind::Ace, None)
    }

    pub fn serve_fault() -> Self {
        Self::new(OutcomeKind::ServeFault, None)
    }

    pub fn return_error() -> Self {
        Self::new(OutcomeKind::ReturnError, None)
    }

    /// `winner` won because the opponent made an unforced error
    pub fn unforced_error(winner: Player) -> Self {
        Self::new(OutcomeKind::UnforcedError, Some(winner))
    }

    /// `winner` won by forcing an error from the opponent
    pub fn forced_error(winner: Player) -> Self {
        Self::new(OutcomeKind::ForcedError, Some(winner))
    }

    pub fn with_shot(mut self, shot: ShotKind) -> Self {
        self.shot = Some(shot);
        self
    }

    /// Validate this input against the serve state and resolve it
    ///
    /// Returns the outcome to record (a second-serve fault becomes a double
    /// fault) and the winner (`None` only for a first-serve fault).
    pub fn resolve(
        &self,
        server: Player,
        attempt: ServeAttempt,
    ) -> Result<(OutcomeKind, Option<Player>)> {
        let receiver = server.opponent();

        if self.outcome.is_fault() && self.shot.is_some() {
            return Err(RallyError::invalid_point(format!(
                "{} cannot carry a shot classification",
                self.outcome
            )));
        }

        match self.outcome {
            OutcomeKind::ServeFault => {
                if self.winner.is_some() {
                    return Err(RallyError::invalid_point(
                        "a serve fault has no winner; the engine decides double faults",
                    ));
                }
                match attempt {
                    ServeAttempt::First => Ok((OutcomeKind::ServeFault, None)),
                    ServeAttempt::Second => Ok((OutcomeKind::DoubleFault, Some(receiver))),
                }
            }
            OutcomeKind::DoubleFault => {
                if attempt == ServeAttempt::First {
                    return Err(RallyError::invalid_point(
                        "a double fault needs a first-serve fault before it",
                    ));
                }
                expect_winner(self.winner, receiver, "double fault")?;
                Ok((OutcomeKind::DoubleFault, Some(receiver)))
            }
            OutcomeKind::Ace => {
                expect_winner(self.winner, server, "ace")?;
                Ok((OutcomeKind::Ace, Some(server)))
            }
            OutcomeKind::ReturnError => {
                expect_winner(self.winner, server, "return error")?;
                Ok((OutcomeKind::ReturnError, Some(server)))
            }
            OutcomeKind::Winner | OutcomeKind::UnforcedError | OutcomeKind::ForcedError => {
                let winner = self.winner.ok_or_else(|| {
                    RallyError::invalid_point(format!("{} requires a winner", self.outcome))
                })?;
                Ok((self.outcome, Some(winner)))
            }
        }
    }
}

fn expect_winner(supplied: Option<Player>, expected: Player, what: &str) -> Result<()> {
    match supplied {
        Some(player) if player != expected => Err(RallyError::invalid_point(format!(
            "{} must be won by {}, got {}",
            what, expected, player
        ))),
        _ => Ok(()),
    }
}

/// A recorded point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Position in the match log, starting at 0
    pub sequence: u64,

    /// `None` only for a first-serve fault
    pub winner: Option<Player>,

    pub outcome: OutcomeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot: Option<ShotKind>,

    pub server: Player,

    pub serve_attempt: ServeAttempt,

    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// The player who performed the deciding action
    ///
    /// Serves and faults belong to the server, a return error to the receiver,
    /// errors during the rally to the player who lost it.
    pub fn acting_player(&self) -> Player {
        acting_player(self.outcome, self.winner, self.server)
    }

    /// Reconstruct the caller input that produced this point
    pub fn as_input(&self) -> PointInput {
        PointInput {
            outcome: self.outcome,
            winner: self.winner,
            shot: self.shot,
        }
    }
}

pub(crate) fn acting_player(outcome: OutcomeKind, winner: Option<Player>, server: Player) -> Player {
    match outcome {
        OutcomeKind::Ace | OutcomeKind::ServeFault | OutcomeKind::DoubleFault => server,
        OutcomeKind::ReturnError => server.opponent(),
        OutcomeKind::Winner => winner.unwrap_or(server),
        OutcomeKind::UnforcedError | OutcomeKind::ForcedError => {
            winner.map(Player::opponent).unwrap_or(server)
        }
    }
}
