//! # Rally Core - point-by-point tennis scoring
//!
//! Rally records tennis matches one point at a time and derives everything
//! else from that record:
//!
//! - **Engine**: a pure state machine for games, sets, tie-breaks, super
//!   tie-breaks, server rotation and serve faults
//! - **Log**: an append-only, hash-chained list of every point with the score
//!   it produced
//! - **Replay**: state is rebuilt from the log; undo is "replay all but the
//!   last point"
//! - **Stats**: serve, return, break point and shot analytics folded from the
//!   log alone
//!
//! ## Core Principle
//!
//! > The log is the match. Everything else is a projection of it.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use rally_core::{record_point, compute_stats, MatchSettings, MatchState, Player, PointInput};
//!
//! let settings = MatchSettings::builder().ad_scoring(false).build().unwrap();
//! let mut state = MatchState::new(settings);
//!
//! for input in [PointInput::ace(), PointInput::serve_fault(), PointInput::serve_fault()] {
//!     state = record_point(&state, &input, Utc::now()).unwrap();
//! }
//!
//! // Three log entries, one of them score-neutral
//! assert_eq!(state.log.len(), 3);
//! println!("{}", state.scoreboard());
//!
//! let stats = compute_stats(state.log.entries());
//! assert_eq!(stats.player(Player::A).aces, 1);
//! assert_eq!(stats.player(Player::A).double_faults, 1);
//!
//! // Undo the double fault; the first-serve fault is back on top
//! let state = rally_core::undo_last_point(&state).unwrap();
//! assert_eq!(state.log.len(), 2);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod log;
pub mod point;
pub mod replay;
pub mod score;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod validation;

// Re-export main types
pub use config::RallyConfig;
pub use engine::{record_point, MatchState, MatchStatus, Scoreboard};
pub use error::{ErrorCategory, ErrorDetail, ErrorResponse, RallyError, Result};
pub use export::{export_all, import_bundle, ExportBundle, ImportReport};
pub use log::{ChainVerification, LogEntry, MatchLog, ScoreLine};
pub use point::{OutcomeKind, Player, Point, PointInput, ServeAttempt, ShotKind};
pub use replay::{diff_logs, replay, undo_last_point, verify_log, LogDiff};
pub use score::{Game, GameScore, Set, Tally, TieBreak, TieBreakKind};
pub use session::{Match, MatchSession, PersistStatus, Players, RecordOutcome};
pub use settings::{FinalSetType, MatchSettings, SetServerRule};
pub use stats::{compute_stats, MatchStats, PlayerStats};
pub use storage::{FileStore, InMemoryStore, MatchStore, NullStore};
pub use validation::{CrossValidator, ValidationReport};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_full_workflow() {
        let store = Arc::new(InMemoryStore::new());
        let settings = MatchSettings::builder().games_per_set(2).build().unwrap();
        let (mut session, _) =
            MatchSession::start(settings, Players::new("Ana", "Bea"), store.clone()).unwrap();

        // A wins every point: two love service games per set, 2-0 in sets
        while !session.state().is_completed() {
            session.record_point(&PointInput::winner(Player::A)).unwrap();
        }

        let record = session.record();
        assert_eq!(record.winner_name(), Some("Ana"));
        assert_eq!(record.state.sets_won(), Tally::new(2, 0));
        assert!(verify_log(&record.state).is_ok());

        let stats = session.stats();
        assert_eq!(stats.a.points_won, 16);
        assert_eq!(stats.b.points_won, 0);
        assert_eq!(stats.total_points, 16);

        let bundle = export_all(store.as_ref()).unwrap();
        let copy = InMemoryStore::new();
        let report = import_bundle(&copy, &bundle).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(copy.load(session.id()).unwrap(), *session.record());
    }

    #[test]
    fn test_scoreboard_display() {
        let state = record_point(
            &MatchState::new(MatchSettings::default()),
            &PointInput::winner(Player::B),
            chrono::Utc::now(),
        )
        .unwrap();
        let board = state.scoreboard().to_string();
        assert!(board.contains("0-15"), "{}", board);
    }
}
