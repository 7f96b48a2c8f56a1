//! Journal use-case service.
//!
//! # Responsibility
//! - Provide the record/edit/remove/browse flows of the journal screen.
//! - Normalize form input and stamp capture dates.
//!
//! # Invariants
//! - Descriptions are stored trimmed.
//! - `date` is assigned here, once, in UTC with millisecond precision.
//! - Category filtering with `All` happens in memory over the full list.

use crate::model::journal::{
    CategoryFilter, JournalEntry, JournalEntryId, JournalEntryUpdate, JournalValidationError,
    NewJournalEntry,
};
use crate::repo::journal_repo::JournalRepository;
use crate::repo::RepoError;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for journal use-cases.
#[derive(Debug)]
pub enum JournalServiceError {
    /// Form input rejected before reaching storage.
    Validation(JournalValidationError),
    /// Target entry does not exist.
    EntryNotFound(JournalEntryId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for JournalServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EntryNotFound(id) => write!(f, "journal entry not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent journal state: {details}"),
        }
    }
}

impl Error for JournalServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for JournalServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::EntryNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Journal service facade over repository implementations.
pub struct JournalService<R: JournalRepository> {
    repo: R,
    clock: fn() -> DateTime<Utc>,
}

impl<R: JournalRepository> JournalService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, Utc::now)
    }

    /// Creates a service whose capture dates come from `clock`.
    pub fn with_clock(repo: R, clock: fn() -> DateTime<Utc>) -> Self {
        Self { repo, clock }
    }

    /// Records a new entry captured now and returns the stored row.
    pub fn record_entry(
        &self,
        user_id: i64,
        image: &str,
        description: &str,
        category: &str,
    ) -> Result<JournalEntry, JournalServiceError> {
        let entry = NewJournalEntry {
            user_id,
            image: image.to_string(),
            description: description.trim().to_string(),
            date: (self.clock)().to_rfc3339_opts(SecondsFormat::Millis, true),
            category: category.to_string(),
        };

        let id = self.repo.create_entry(&entry)?;
        info!("event=journal_record module=service status=ok entry_id={id} user_id={user_id}");
        self.repo
            .get_entry(id)?
            .ok_or(JournalServiceError::InconsistentState(
                "recorded entry not found in read-back",
            ))
    }

    /// Replaces image, description and category of an existing entry.
    pub fn edit_entry(
        &self,
        id: JournalEntryId,
        image: &str,
        description: &str,
        category: &str,
    ) -> Result<JournalEntry, JournalServiceError> {
        let update = JournalEntryUpdate {
            image: image.to_string(),
            description: description.trim().to_string(),
            category: category.to_string(),
        };

        self.repo.update_entry(id, &update)?;
        self.repo
            .get_entry(id)?
            .ok_or(JournalServiceError::InconsistentState(
                "edited entry not found in read-back",
            ))
    }

    /// Deletes an entry; returns `false` when it was already gone.
    pub fn remove_entry(&self, id: JournalEntryId) -> Result<bool, JournalServiceError> {
        let removed = self.repo.delete_entry(id)?;
        info!("event=journal_remove module=service status=ok entry_id={id} removed={removed}");
        Ok(removed)
    }

    pub fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, JournalServiceError> {
        Ok(self.repo.get_entry(id)?)
    }

    /// Loads every entry of `user_id`, newest first, then applies `filter`.
    pub fn entries_for_user(
        &self,
        user_id: i64,
        filter: &CategoryFilter,
    ) -> Result<Vec<JournalEntry>, JournalServiceError> {
        let mut entries = self.repo.list_entries_for_user(user_id)?;
        entries.retain(|entry| filter.matches(&entry.category));
        Ok(entries)
    }
}
