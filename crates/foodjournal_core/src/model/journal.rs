//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the persisted entry shape and its create/update inputs.
//! - Provide the category vocabulary shown to users.
//!
//! # Invariants
//! - An entry always carries an image reference and a non-blank description.
//! - `date` is an RFC 3339 / ISO-8601 timestamp assigned once at creation.
//! - Updates only touch `image`, `description` and `category`.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned journal entry identifier.
pub type JournalEntryId = i64;

/// Meal categories offered by the journal screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Snacks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::Snacks => "Snacks",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label of the pseudo-category that disables filtering.
pub const ALL_CATEGORIES_LABEL: &str = "All";

/// In-memory category filter over an already loaded entry list.
///
/// The store has no notion of `All`; callers either filter here or pass
/// an explicit predicate in SQL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Maps a picker label to a filter; `All` disables filtering.
    pub fn from_label(label: &str) -> Self {
        if label == ALL_CATEGORIES_LABEL {
            Self::All
        } else {
            Self::Only(label.to_string())
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == category,
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(value: Category) -> Self {
        Self::Only(value.as_str().to_string())
    }
}

/// Row of the `journals` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub user_id: i64,
    /// Image URI or path; never interpreted by the core.
    pub image: String,
    pub description: String,
    pub date: String,
    pub category: String,
}

/// Insert input: every entry field except the store-assigned `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    pub user_id: i64,
    pub image: String,
    pub description: String,
    pub date: String,
    pub category: String,
}

impl NewJournalEntry {
    pub fn validate(&self) -> Result<(), JournalValidationError> {
        validate_content(&self.image, &self.description)?;
        if DateTime::parse_from_rfc3339(&self.date).is_err() {
            return Err(JournalValidationError::InvalidDate(self.date.clone()));
        }
        Ok(())
    }
}

/// Mutable fields of an existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntryUpdate {
    pub image: String,
    pub description: String,
    pub category: String,
}

impl JournalEntryUpdate {
    pub fn validate(&self) -> Result<(), JournalValidationError> {
        validate_content(&self.image, &self.description)
    }
}

/// Entry input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalValidationError {
    MissingImage,
    EmptyDescription,
    InvalidDate(String),
}

impl Display for JournalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingImage => write!(f, "journal entry requires an image"),
            Self::EmptyDescription => write!(f, "journal entry requires a description"),
            Self::InvalidDate(value) => {
                write!(f, "journal entry date `{value}` is not an ISO-8601 timestamp")
            }
        }
    }
}

impl Error for JournalValidationError {}

fn validate_content(image: &str, description: &str) -> Result<(), JournalValidationError> {
    if image.trim().is_empty() {
        return Err(JournalValidationError::MissingImage);
    }
    if description.trim().is_empty() {
        return Err(JournalValidationError::EmptyDescription);
    }
    Ok(())
}
