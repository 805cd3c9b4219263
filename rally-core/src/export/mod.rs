//! Export / Import
//!
//! An [`ExportBundle`] is a versioned JSON snapshot of stored matches. Import
//! never trusts a bundle blindly: each match's hash chain is checked and its
//! log is replayed before the record may touch the store.
//!
//! Merge rule per match id:
//! - unknown id: insert
//! - known id with a strictly newer `updated_at`: replace
//! - otherwise: skip
//!
//! A replacement whose log disagrees with the stored one before the stored
//! log ends (an undo followed by different points) is listed in
//! [`ImportReport::rewritten`] with the first divergent index.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RallyError, Result};
use crate::replay;
use crate::session::Match;
use crate::storage::MatchStore;

/// Current bundle format
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Serializable snapshot of a set of matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub matches: Vec<Match>,
}

impl ExportBundle {
    pub fn new(matches: Vec<Match>) -> Self {
        Self {
            format_version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            matches,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a bundle, rejecting unknown format versions
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: ExportBundle = serde_json::from_str(json)?;
        bundle.check_version()?;
        Ok(bundle)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let bundle: ExportBundle = serde_json::from_reader(reader)?;
        bundle.check_version()?;
        Ok(bundle)
    }

    fn check_version(&self) -> Result<()> {
        if self.format_version != EXPORT_FORMAT_VERSION {
            return Err(RallyError::UnsupportedExportVersion {
                version: self.format_version,
            });
        }
        Ok(())
    }
}

/// Export every match in `store`
pub fn export_all(store: &dyn MatchStore) -> Result<ExportBundle> {
    let ids = store.list_ids()?;
    export_matches(store, &ids)
}

/// Export the listed matches; unknown ids are an error
pub fn export_matches(store: &dyn MatchStore, ids: &[String]) -> Result<ExportBundle> {
    let matches = ids
        .iter()
        .map(|id| store.load(id))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(matches = matches.len(), store = store.name(), "Exported matches");
    Ok(ExportBundle::new(matches))
}

/// What an import did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Updated match ids whose stored points were replaced, with the first
    /// index that differs
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rewritten: BTreeMap<String, usize>,
}

/// Verify and merge a bundle into `store`
///
/// Every match is verified before any is written, so a bundle with one bad
/// match imports nothing.
pub fn import_bundle(store: &dyn MatchStore, bundle: &ExportBundle) -> Result<ImportReport> {
    bundle.check_version()?;

    for record in &bundle.matches {
        replay::verify_log(&record.state).map_err(|e| {
            tracing::warn!(match_id = %record.id, error = %e, "Rejected imported match");
            e
        })?;
    }

    let mut report = ImportReport::default();
    for record in &bundle.matches {
        match store.load(&record.id) {
            Ok(existing) if record.updated_at > existing.updated_at => {
                let diff = replay::diff_logs(existing.state.log.entries(), record.state.log.entries());
                if let Some(index) = diff.divergence_point.filter(|&i| i < existing.state.log.len()) {
                    tracing::warn!(match_id = %record.id, index, "Import replaces recorded points");
                    report.rewritten.insert(record.id.clone(), index);
                }
                store.save(record)?;
                report.updated += 1;
            }
            Ok(_) => report.skipped += 1,
            Err(RallyError::MatchNotFound { .. }) => {
                store.save(record)?;
                report.inserted += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        "Imported matches"
    );
    Ok(report)
}
