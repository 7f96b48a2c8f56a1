//! Core persistence and journal logic for the food journal.
//! This crate is the single source of truth for storage invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{StoreConfig, StoreLocation};
pub use db::{
    QueryExecutionError, QueryResult, Row, SqlValue, StatementKind, Store,
    StoreInitializationError, StoreTransaction,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::journal::{
    Category, CategoryFilter, JournalEntry, JournalEntryId, JournalEntryUpdate,
    JournalValidationError, NewJournalEntry,
};
pub use model::user::User;
pub use repo::journal_repo::{JournalRepository, StoreJournalRepository};
pub use repo::user_repo::{StoreUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::journal_service::{JournalService, JournalServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
