//! Undo / Replay
//!
//! Match state is always rebuilt from the raw points in the log; there is no
//! incremental "remove the last score effect" path. Undo is "replay every entry
//! except the last" into a fresh state built from the same settings.
//!
//! Replay also checks its own output: every regenerated entry must equal the
//! stored one. A mismatch is reported as [`RallyError::ReplayIntegrity`] rather
//! than papered over.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{apply_point, MatchState};
use crate::error::{RallyError, Result};
use crate::log::LogEntry;
use crate::settings::MatchSettings;

/// Rebuild a match from stored log entries and check the result
pub fn replay(settings: &MatchSettings, entries: &[LogEntry]) -> Result<MatchState> {
    let mut state = MatchState::new(settings.clone());

    for (index, stored) in entries.iter().enumerate() {
        let point = &stored.point;
        apply_point(&mut state, &point.as_input(), point.timestamp).map_err(|e| {
            RallyError::ReplayIntegrity {
                index,
                reason: format!("point could not be re-applied: {}", e),
            }
        })?;

        let regenerated = &state.log.entries()[index];
        if regenerated != stored {
            let fields: Vec<String> = entry_differences(index, regenerated, stored)
                .into_iter()
                .map(|d| d.field)
                .collect();
            return Err(RallyError::ReplayIntegrity {
                index,
                reason: format!("stored entry disagrees with replay on {}", fields.join(", ")),
            });
        }
    }

    tracing::debug!(entries = entries.len(), "Replayed match log");
    Ok(state)
}

/// Rebuild `state` from its own log
pub fn rebuild(state: &MatchState) -> Result<MatchState> {
    replay(&state.settings, state.log.entries())
}

/// Remove the most recent log entry by replaying everything before it
///
/// Undo on a match with no points returns the state unchanged.
pub fn undo_last_point(state: &MatchState) -> Result<MatchState> {
    let entries = state.log.entries();
    let Some((last, kept)) = entries.split_last() else {
        return Ok(state.clone());
    };

    tracing::debug!(sequence = last.point.sequence, outcome = %last.point.outcome, "Undoing point");
    replay(&state.settings, kept)
}

/// Check a stored state end to end: hash chain, then full replay
pub fn verify_log(state: &MatchState) -> Result<()> {
    let chain = state.log.verify_chain();
    if !chain.is_valid {
        return Err(RallyError::LogChainBroken {
            index: chain.first_invalid_index.unwrap_or(0),
            reason: chain
                .error_message
                .unwrap_or_else(|| "chain verification failed".to_string()),
        });
    }

    let rebuilt = rebuild(state)?;
    if rebuilt != *state {
        return Err(RallyError::ReplayIntegrity {
            index: state.log.len(),
            reason: "stored sets and games disagree with the replayed log".to_string(),
        });
    }
    Ok(())
}

/// One field that differs between two log entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDifference {
    pub index: usize,
    pub field: String,
    pub first_value: Value,
    pub second_value: Value,
}

/// Difference between two logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDiff {
    pub identical: bool,
    pub first_count: usize,
    pub second_count: usize,
    /// First index at which the logs disagree
    pub divergence_point: Option<usize>,
    pub differences: Vec<EntryDifference>,
}

/// Compare two logs entry by entry, ignoring hashes
pub fn diff_logs(first: &[LogEntry], second: &[LogEntry]) -> LogDiff {
    let mut differences = Vec::new();
    for (index, (a, b)) in first.iter().zip(second.iter()).enumerate() {
        differences.extend(entry_differences(index, a, b));
    }

    let common = first.len().min(second.len());
    let divergence_point = differences
        .first()
        .map(|d| d.index)
        .or(if first.len() != second.len() { Some(common) } else { None });

    LogDiff {
        identical: divergence_point.is_none(),
        first_count: first.len(),
        second_count: second.len(),
        divergence_point,
        differences,
    }
}

fn entry_differences(index: usize, a: &LogEntry, b: &LogEntry) -> Vec<EntryDifference> {
    let fields: [(&str, Value, Value); 12] = [
        ("winner", to_value(&a.point.winner), to_value(&b.point.winner)),
        ("outcome", to_value(&a.point.outcome), to_value(&b.point.outcome)),
        ("shot", to_value(&a.point.shot), to_value(&b.point.shot)),
        ("server", to_value(&a.point.server), to_value(&b.point.server)),
        ("serve_attempt", to_value(&a.point.serve_attempt), to_value(&b.point.serve_attempt)),
        ("acting_player", to_value(&a.acting_player), to_value(&b.acting_player)),
        ("set_number", to_value(&a.set_number), to_value(&b.set_number)),
        ("game_number", to_value(&a.game_number), to_value(&b.game_number)),
        ("game_score_after", to_value(&a.game_score_after), to_value(&b.game_score_after)),
        ("games_score_after", to_value(&a.games_score_after), to_value(&b.games_score_after)),
        ("sets_score_after", to_value(&a.sets_score_after), to_value(&b.sets_score_after)),
        ("is_break_point", to_value(&a.is_break_point), to_value(&b.is_break_point)),
    ];

    let mut differences: Vec<EntryDifference> = fields
        .into_iter()
        .filter(|(_, first, second)| first != second)
        .map(|(field, first_value, second_value)| EntryDifference {
            index,
            field: field.to_string(),
            first_value,
            second_value,
        })
        .collect();

    if a.point.timestamp != b.point.timestamp {
        differences.push(EntryDifference {
            index,
            field: "timestamp".to_string(),
            first_value: Value::String(a.point.timestamp.to_rfc3339()),
            second_value: Value::String(b.point.timestamp.to_rfc3339()),
        });
    }
    if a.point.sequence != b.point.sequence || a.in_tie_break != b.in_tie_break {
        differences.push(EntryDifference {
            index,
            field: "position".to_string(),
            first_value: serde_json::json!([a.point.sequence, a.in_tie_break]),
            second_value: serde_json::json!([b.point.sequence, b.in_tie_break]),
        });
    }
    differences
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
