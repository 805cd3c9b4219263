//! The match log
//!
//! The log is an append-only sequence of [`LogEntry`] records, one per recorded
//! event (first-serve faults included). It is the single source of truth for
//! undo, replay and statistics: games and sets are a projection of it.
//!
//! ## Key Properties
//!
//! - **Append-Only**: entries are added, never modified or removed in place
//! - **Hash Chain**: each entry includes the hash of the previous entry
//! - **Replayable**: the raw points in the log rebuild the full match state
//!
//! Undo does not pop from the log; it replays every entry but the last into a
//! fresh state (see [`crate::replay`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::point::{OutcomeKind, Player, Point, ServeAttempt, ShotKind};
use crate::score::{GameScore, Tally};

/// Previous-hash value of the first entry in every log
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Score of the game or tie-break a point was played in, after the point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreLine {
    Regular { a: GameScore, b: GameScore },
    TieBreak { a: u32, b: u32 },
}

impl Default for ScoreLine {
    fn default() -> Self {
        ScoreLine::Regular {
            a: GameScore::Love,
            b: GameScore::Love,
        }
    }
}

impl fmt::Display for ScoreLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreLine::Regular { a, b } => write!(f, "{}-{}", a, b),
            ScoreLine::TieBreak { a, b } => write!(f, "TB {}-{}", a, b),
        }
    }
}

/// One enriched record in the match log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The raw point as recorded
    pub point: Point,

    /// Who performed the deciding action (may differ from the winner)
    pub acting_player: Player,

    pub set_number: u32,

    /// Game number within the set; a tie-break counts as the next game
    pub game_number: u32,

    pub in_tie_break: bool,

    pub game_score_after: ScoreLine,

    pub games_score_after: Tally,

    pub sets_score_after: Tally,

    /// Whether the receiver would have won the game by winning this point
    pub is_break_point: bool,

    /// SHA-256 hash of this entry
    pub entry_hash: String,

    /// SHA-256 hash of the preceding entry
    pub previous_hash: String,
}

impl LogEntry {
    pub fn sequence(&self) -> u64 {
        self.point.sequence
    }

    pub fn winner(&self) -> Option<Player> {
        self.point.winner
    }

    pub fn outcome(&self) -> OutcomeKind {
        self.point.outcome
    }

    pub fn shot(&self) -> Option<ShotKind> {
        self.point.shot
    }

    pub fn server_at_time(&self) -> Player {
        self.point.server
    }

    pub fn receiver(&self) -> Player {
        self.point.server.opponent()
    }

    pub fn serve_attempt(&self) -> ServeAttempt {
        self.point.serve_attempt
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.point.timestamp
    }

    /// A first-serve fault: recorded for bookkeeping, no score effect
    pub fn is_score_neutral(&self) -> bool {
        self.point.winner.is_none()
    }

    /// Compute the SHA-256 hash of this entry
    ///
    /// Hash is computed over every field except `entry_hash` itself, ending with
    /// `previous_hash`.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        let point = &self.point;

        hasher.update(point.sequence.to_string().as_bytes());
        hasher.update(point.timestamp.to_rfc3339().as_bytes());
        hasher.update(point.outcome.as_str().as_bytes());
        hasher.update(point.winner.map(|p| p.as_str()).unwrap_or("-").as_bytes());
        hasher.update(point.shot.map(|s| s.as_str()).unwrap_or("-").as_bytes());
        hasher.update(point.server.as_str().as_bytes());
        hasher.update([point.serve_attempt.number()]);
        hasher.update(self.acting_player.as_str().as_bytes());
        hasher.update(format!("{}/{}", self.set_number, self.game_number).as_bytes());
        hasher.update([u8::from(self.in_tie_break), u8::from(self.is_break_point)]);
        hasher.update(self.game_score_after.to_string().as_bytes());
        hasher.update(self.games_score_after.to_string().as_bytes());
        hasher.update(self.sets_score_after.to_string().as_bytes());
        hasher.update(self.previous_hash.as_bytes());

        hex::encode(hasher.finalize())
    }

    /// Verify this entry's hash
    pub fn verify_hash(&self) -> bool {
        self.entry_hash == self.compute_hash()
    }
}

/// Result of verifying a log's hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub is_valid: bool,
    pub entry_count: usize,
    /// Index of the first bad entry
    pub first_invalid_index: Option<usize>,
    pub error_message: Option<String>,
}

/// Append-only, hash-chained sequence of log entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchLog {
    entries: Vec<LogEntry>,
}

impl MatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain `entry` to the current tail and append it
    pub fn append(&mut self, mut entry: LogEntry) -> &LogEntry {
        entry.previous_hash = self.last_hash().to_string();
        entry.entry_hash = entry.compute_hash();
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// Hash of the tail entry, or the genesis hash for an empty log
    pub fn last_hash(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.entry_hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    /// Walk the chain and check sequence numbers, links and hashes
    pub fn verify_chain(&self) -> ChainVerification {
        let mut expected_previous = GENESIS_HASH;

        for (i, entry) in self.entries.iter().enumerate() {
            let failure = if entry.point.sequence != i as u64 {
                Some(format!(
                    "sequence {} found where {} was expected",
                    entry.point.sequence, i
                ))
            } else if entry.previous_hash != expected_previous {
                Some("previous hash does not match the preceding entry".to_string())
            } else if !entry.verify_hash() {
                Some("entry hash does not match its contents".to_string())
            } else {
                None
            };

            if let Some(message) = failure {
                return ChainVerification {
                    is_valid: false,
                    entry_count: self.entries.len(),
                    first_invalid_index: Some(i),
                    error_message: Some(message),
                };
            }
            expected_previous = entry.entry_hash.as_str();
        }

        ChainVerification {
            is_valid: true,
            entry_count: self.entries.len(),
            first_invalid_index: None,
            error_message: None,
        }
    }
}

impl<'a> IntoIterator for &'a MatchLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
