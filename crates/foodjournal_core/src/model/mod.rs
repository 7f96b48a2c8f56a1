//! Journal domain model.
//!
//! # Responsibility
//! - Define the records the core persists (`User`, `JournalEntry`).
//! - Define the caller-known category vocabulary and its `All` filter.
//!
//! # Invariants
//! - `JournalEntry.id`, `user_id` and `date` never change after creation.
//! - The store accepts any category string; the closed set lives here only.

pub mod journal;
pub mod user;
