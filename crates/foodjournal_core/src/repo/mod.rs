//! Repository layer over the store's query-execution contract.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for journal callers.
//! - Keep SQL text inside the core persistence boundary.
//!
//! # Invariants
//! - Repositories talk to storage only through `Store::execute`.
//! - Write paths validate input before any SQL runs.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::QueryExecutionError;
use crate::model::journal::{JournalEntryId, JournalValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod journal_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for journal and user persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(JournalValidationError),
    Query(QueryExecutionError),
    NotFound(JournalEntryId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "journal entry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<JournalValidationError> for RepoError {
    fn from(value: JournalValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryExecutionError> for RepoError {
    fn from(value: QueryExecutionError) -> Self {
        Self::Query(value)
    }
}
