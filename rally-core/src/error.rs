//! Error types for Rally operations
//!
//! Errors fall into a small taxonomy that callers can switch on:
//! - **Validation**: malformed settings or point data, rejected before any mutation
//! - **Precondition**: the operation is not legal in the current match state
//! - **NotFound**: a stored match does not exist
//! - **Integrity**: a stored log cannot be reconstructed by replay
//! - **Persistence**: the storage backend failed; never fatal to in-memory state
//!
//! Each variant also has a stable error code (e.g. `MATCH_COMPLETED`) for
//! front ends that map errors to their own messages.
//!
//! # Example
//!
//! ```rust
//! use rally_core::error::{RallyError, ErrorCategory};
//!
//! fn handle_error(err: RallyError) {
//!     match err.category() {
//!         ErrorCategory::Validation => println!("Fix the input: {}", err),
//!         ErrorCategory::Persistence => println!("Score kept, save failed"),
//!         _ => println!("Other error: {}", err.error_code()),
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Rally operations
pub type Result<T> = std::result::Result<T, RallyError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Input validation failed
    Validation,
    /// Operation not allowed in the current match state
    Precondition,
    /// Stored match not found
    NotFound,
    /// Stored data is inconsistent
    Integrity,
    /// Storage backend failure
    Persistence,
    /// Bug in the library
    Internal,
}

/// Errors that can occur in Rally operations
#[derive(Error, Debug)]
pub enum RallyError {
    // ═══════════════════════════════════════════════════════════════════════
    // Validation errors (rejected before mutation)
    // ═══════════════════════════════════════════════════════════════════════

    /// Match settings are out of range
    #[error("Invalid match settings: {reason}")]
    InvalidSettings { reason: String },

    /// Point data is inconsistent with the outcome or the serve state
    #[error("Invalid point: {reason}")]
    InvalidPoint { reason: String },

    /// Outcome kind could not be parsed
    #[error("Unknown outcome kind: '{value}'. Expected one of ace, winner, serve_fault, double_fault, return_error, unforced_error, forced_error.")]
    UnknownOutcome { value: String },

    /// Shot kind could not be parsed
    #[error("Unknown shot kind: '{value}'")]
    UnknownShot { value: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Precondition violations
    // ═══════════════════════════════════════════════════════════════════════

    /// Attempted to record a point after the match ended
    #[error("Match already completed: no further points can be recorded. Undo the last point to reopen it.")]
    MatchCompleted,

    // ═══════════════════════════════════════════════════════════════════════
    // Storage lookups
    // ═══════════════════════════════════════════════════════════════════════

    /// Match with the specified ID doesn't exist in the store
    #[error("Match not found: '{match_id}'")]
    MatchNotFound { match_id: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Integrity errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Replaying the stored points did not reproduce the stored log
    #[error("Replay integrity failure at entry {index}: {reason}")]
    ReplayIntegrity { index: usize, reason: String },

    /// Log hash chain verification failed
    #[error("Log chain broken at entry {index}: {reason}. The point log may have been edited outside the engine.")]
    LogChainBroken { index: usize, reason: String },

    /// Export bundle has a format version this build cannot read
    #[error("Unsupported export format version: {version}")]
    UnsupportedExportVersion { version: u32 },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors (serialization, storage, I/O)
    // ═══════════════════════════════════════════════════════════════════════

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Storage backend lock is poisoned (panic occurred while holding lock)
    #[error("Storage backend lock poisoned. This is a bug; please report it.")]
    StorageLocked,

    /// I/O operation failed
    #[error("IO error: {message}")]
    IoError { message: String },

    /// Internal error that shouldn't happen
    #[error("Internal error: {reason}. This is a bug; please report it.")]
    InternalError { reason: String },
}

impl RallyError {
    /// Shorthand for an [`RallyError::InvalidPoint`]
    pub fn invalid_point(reason: impl Into<String>) -> Self {
        RallyError::InvalidPoint {
            reason: reason.into(),
        }
    }

    /// Returns true if this error might succeed on retry
    ///
    /// Only storage failures are transient; everything else needs different
    /// input or a different match state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RallyError::StorageLocked | RallyError::IoError { .. }
        )
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            RallyError::InvalidSettings { .. }
            | RallyError::InvalidPoint { .. }
            | RallyError::UnknownOutcome { .. }
            | RallyError::UnknownShot { .. } => ErrorCategory::Validation,

            RallyError::MatchCompleted => ErrorCategory::Precondition,

            RallyError::MatchNotFound { .. } => ErrorCategory::NotFound,

            RallyError::ReplayIntegrity { .. }
            | RallyError::LogChainBroken { .. }
            | RallyError::UnsupportedExportVersion { .. } => ErrorCategory::Integrity,

            RallyError::JsonError(_)
            | RallyError::StorageLocked
            | RallyError::IoError { .. } => ErrorCategory::Persistence,

            RallyError::InternalError { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RallyError::InvalidSettings { .. } => "INVALID_SETTINGS",
            RallyError::InvalidPoint { .. } => "INVALID_POINT",
            RallyError::UnknownOutcome { .. } => "UNKNOWN_OUTCOME",
            RallyError::UnknownShot { .. } => "UNKNOWN_SHOT",
            RallyError::MatchCompleted => "MATCH_COMPLETED",
            RallyError::MatchNotFound { .. } => "MATCH_NOT_FOUND",
            RallyError::ReplayIntegrity { .. } => "REPLAY_INTEGRITY",
            RallyError::LogChainBroken { .. } => "LOG_CHAIN_BROKEN",
            RallyError::UnsupportedExportVersion { .. } => "UNSUPPORTED_EXPORT_VERSION",
            RallyError::JsonError(_) => "JSON_ERROR",
            RallyError::StorageLocked => "STORAGE_LOCKED",
            RallyError::IoError { .. } => "IO_ERROR",
            RallyError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "MATCH_COMPLETED")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Whether retry might succeed
    pub recoverable: bool,
}
