//! Match Sessions
//!
//! A [`MatchSession`] is the caller-held handle on one match. It owns the
//! latest [`Match`] record, routes every mutation through the pure engine, and
//! hands the result to a [`MatchStore`].
//!
//! Persistence never gates scoring: when a save fails the new state is kept in
//! memory and the failure is reported in [`RecordOutcome::persist`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{self, MatchState, Scoreboard};
use crate::error::Result;
use crate::point::{Player, PointInput};
use crate::replay;
use crate::settings::MatchSettings;
use crate::stats::{compute_stats, MatchStats};
use crate::storage::MatchStore;

/// Display names of both players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub a: String,
    pub b: String,
}

impl Players {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self { a: a.into(), b: b.into() }
    }

    pub fn name(&self, player: Player) -> &str {
        match player {
            Player::A => &self.a,
            Player::B => &self.b,
        }
    }
}

impl Default for Players {
    fn default() -> Self {
        Self::new("Player A", "Player B")
    }
}

/// A stored match: identity, bookkeeping and scoring state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub players: Players,
    pub created_at: DateTime<Utc>,
    /// Last time the state changed; used to merge imports
    pub updated_at: DateTime<Utc>,
    pub state: MatchState,
}

impl Match {
    /// New match with a fresh id; settings are not validated here
    pub fn new(players: Players, settings: MatchSettings) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            players,
            created_at: now,
            updated_at: now,
            state: MatchState::new(settings),
        }
    }

    /// Display name of the match winner, if any
    pub fn winner_name(&self) -> Option<&str> {
        self.state.winner.map(|w| self.players.name(w))
    }

    fn replace_state(&mut self, state: MatchState, at: DateTime<Utc>) {
        self.state = state;
        self.updated_at = at.max(self.updated_at);
    }
}

/// Result of handing a record to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistStatus {
    Saved,
    /// The record did not change, so nothing was written
    Unchanged,
    Failed { code: String, message: String },
}

impl PersistStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistStatus::Saved)
    }
}

/// What a caller gets back after a successful mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub scoreboard: Scoreboard,
    pub persist: PersistStatus,
}

/// Caller-held session for one match
pub struct MatchSession {
    record: Match,
    store: Arc<dyn MatchStore>,
}

impl std::fmt::Debug for MatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSession")
            .field("record", &self.record)
            .field("store", &self.store.name())
            .finish()
    }
}

impl MatchSession {
    /// Start a new match and persist its empty state
    pub fn start(
        settings: MatchSettings,
        players: Players,
        store: Arc<dyn MatchStore>,
    ) -> Result<(Self, PersistStatus)> {
        settings.validate()?;

        let record = Match::new(players, settings);
        tracing::info!(
            match_id = %record.id,
            player_a = %record.players.a,
            player_b = %record.players.b,
            store = store.name(),
            "Match started"
        );

        let session = Self { record, store };
        let persist = session.persist();
        Ok((session, persist))
    }

    /// Resume a stored match, checking its log before trusting it
    pub fn resume(store: Arc<dyn MatchStore>, id: &str) -> Result<Self> {
        let record = store.load(id)?;
        replay::verify_log(&record.state)?;
        tracing::debug!(match_id = %id, points = record.state.point_count(), "Match resumed");
        Ok(Self { record, store })
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn record(&self) -> &Match {
        &self.record
    }

    pub fn state(&self) -> &MatchState {
        &self.record.state
    }

    /// Record a point timestamped now
    pub fn record_point(&mut self, input: &PointInput) -> Result<RecordOutcome> {
        self.record_point_at(input, Utc::now())
    }

    /// Record a point with an explicit timestamp
    pub fn record_point_at(&mut self, input: &PointInput, at: DateTime<Utc>) -> Result<RecordOutcome> {
        let next = engine::record_point(&self.record.state, input, at)?;
        self.record.replace_state(next, at);
        Ok(self.outcome())
    }

    /// Remove the most recent entry; a no-op on a match with no points
    pub fn undo_last_point(&mut self) -> Result<RecordOutcome> {
        if self.record.state.log.is_empty() {
            return Ok(RecordOutcome {
                scoreboard: self.scoreboard(),
                persist: PersistStatus::Unchanged,
            });
        }

        let previous = replay::undo_last_point(&self.record.state)?;
        self.record.replace_state(previous, Utc::now());
        tracing::info!(
            match_id = %self.record.id,
            points = self.record.state.point_count(),
            "Point undone"
        );
        Ok(self.outcome())
    }

    pub fn stats(&self) -> MatchStats {
        compute_stats(self.record.state.log.entries())
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.record.state.scoreboard()
    }

    fn outcome(&self) -> RecordOutcome {
        RecordOutcome {
            scoreboard: self.scoreboard(),
            persist: self.persist(),
        }
    }

    fn persist(&self) -> PersistStatus {
        match self.store.save(&self.record) {
            Ok(()) => PersistStatus::Saved,
            Err(e) => {
                tracing::warn!(
                    match_id = %self.record.id,
                    store = self.store.name(),
                    error = %e,
                    "Failed to persist match"
                );
                PersistStatus::Failed {
                    code: e.error_code().to_string(),
                    message: e.to_string(),
                }
            }
        }
    }
}
