//! Pluggable Match Storage
//!
//! The scoring core never touches persistence directly. A [`MatchSession`]
//! hands the latest [`Match`] record to a [`MatchStore`] after every mutation.
//!
//! # Example
//!
//! ```rust
//! use rally_core::storage::{InMemoryStore, MatchStore};
//!
//! let store = InMemoryStore::new();
//! assert!(store.list_ids().unwrap().is_empty());
//!
//! // Or keep one JSON file per match on disk
//! // let store = FileStore::new("./matches")?;
//! ```
//!
//! [`MatchSession`]: crate::session::MatchSession

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{RallyError, Result};
use crate::session::Match;

/// Storage backend trait for match records
///
/// All methods take `&self` so a store can be shared between sessions.
pub trait MatchStore: Send + Sync {
    /// Insert or replace a match record
    fn save(&self, record: &Match) -> Result<()>;

    /// Load a match record by id
    fn load(&self, id: &str) -> Result<Match>;

    /// Ids of every stored match, sorted
    fn list_ids(&self) -> Result<Vec<String>>;

    /// Remove a match; removing an unknown id is not an error
    fn delete(&self, id: &str) -> Result<()>;

    /// Check if backend is healthy
    fn health_check(&self) -> Result<()>;

    /// Get backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// In-memory storage backend
///
/// Records are lost on restart. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    matches: RwLock<HashMap<String, Match>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            matches: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.matches.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchStore for InMemoryStore {
    fn save(&self, record: &Match) -> Result<()> {
        let mut matches = self.matches.write().map_err(|_| RallyError::StorageLocked)?;
        matches.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Match> {
        let matches = self.matches.read().map_err(|_| RallyError::StorageLocked)?;
        matches.get(id).cloned().ok_or_else(|| RallyError::MatchNotFound {
            match_id: id.to_string(),
        })
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let matches = self.matches.read().map_err(|_| RallyError::StorageLocked)?;
        let mut ids: Vec<String> = matches.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut matches = self.matches.write().map_err(|_| RallyError::StorageLocked)?;
        matches.remove(id);
        Ok(())
    }

    fn health_check(&self) -> Result<()> {
        let _matches = self.matches.read().map_err(|_| RallyError::StorageLocked)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

/// File-based storage backend
///
/// One pretty-printed JSON file per match, named `<id>.json`. Writes go to a
/// temporary file first and are renamed into place, so a crash mid-write
/// leaves the previous version intact.
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Create a file store in the given directory, creating it if needed
    pub fn new<P: Into<PathBuf>>(directory: P) -> Result<Self> {
        let dir = directory.into();
        std::fs::create_dir_all(&dir).map_err(|e| RallyError::IoError {
            message: format!("Failed to create storage directory: {}", e),
        })?;
        Ok(Self { directory: dir })
    }

    fn match_file(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RallyError::IoError {
                message: format!("Invalid match id for file storage: {:?}", id),
            });
        }
        Ok(self.directory.join(format!("{}.json", id)))
    }
}

impl MatchStore for FileStore {
    fn save(&self, record: &Match) -> Result<()> {
        let path = self.match_file(&record.id)?;
        let temp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&temp, json).map_err(|e| RallyError::IoError {
            message: format!("Failed to write {}: {}", temp.display(), e),
        })?;
        std::fs::rename(&temp, &path).map_err(|e| RallyError::IoError {
            message: format!("Failed to move {} into place: {}", path.display(), e),
        })?;

        tracing::debug!(match_id = %record.id, path = %path.display(), "Saved match");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Match> {
        let path = self.match_file(id)?;
        if !path.exists() {
            return Err(RallyError::MatchNotFound {
                match_id: id.to_string(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| RallyError::IoError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.directory).map_err(|e| RallyError::IoError {
            message: format!("Failed to list storage directory: {}", e),
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RallyError::IoError {
                message: format!("Failed to read directory entry: {}", e),
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let path = self.match_file(id)?;
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| RallyError::IoError {
                message: format!("Failed to delete file: {}", e),
            })?;
        }
        Ok(())
    }

    fn health_check(&self) -> Result<()> {
        if self.directory.is_dir() {
            Ok(())
        } else {
            Err(RallyError::IoError {
                message: "Storage directory does not exist".to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Null storage backend (discards all records)
///
/// Useful for simulations and tests that only care about the scoring.
#[derive(Debug, Default, Clone)]
pub struct NullStore;

impl NullStore {
    pub fn new() -> Self {
        Self
    }
}

impl MatchStore for NullStore {
    fn save(&self, _record: &Match) -> Result<()> {
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Match> {
        Err(RallyError::MatchNotFound {
            match_id: id.to_string(),
        })
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn delete(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Players;
    use crate::settings::MatchSettings;

    fn test_match() -> Match {
        Match::new(Players::new("Ana", "Bea"), MatchSettings::default())
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryStore::new();
        let record = test_match();

        store.save(&record).unwrap();
        assert_eq!(store.load(&record.id).unwrap(), record);
        assert_eq!(store.list_ids().unwrap(), vec![record.id.clone()]);

        store.delete(&record.id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.load(&record.id),
            Err(RallyError::MatchNotFound { .. })
        ));
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let record = test_match();

        store.save(&record).unwrap();
        // Saving again overwrites in place
        store.save(&record).unwrap();

        assert_eq!(store.load(&record.id).unwrap(), record);
        assert_eq!(store.list_ids().unwrap(), vec![record.id.clone()]);
        assert!(!dir.path().join(format!("{}.json.tmp", record.id)).exists());

        store.delete(&record.id).unwrap();
        assert!(store.list_ids().unwrap().is_empty());
        assert!(store.health_check().is_ok());
    }

    #[test]
    fn test_file_store_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        assert!(matches!(store.load("../escape"), Err(RallyError::IoError { .. })));
    }

    #[test]
    fn test_null_store() {
        let store = NullStore::new();
        let record = test_match();

        store.save(&record).unwrap();
        assert!(store.load(&record.id).is_err());
        assert!(store.list_ids().unwrap().is_empty());
    }
}
