//! Journal entry repository contracts and store-backed implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `journals` table.
//! - Map normalized `Row`s back into `JournalEntry` values.
//!
//! # Invariants
//! - `update_entry` never writes `id`, `userId` or `date`.
//! - Listing order is `date DESC, id DESC`.

use crate::db::{QueryResult, Row, SqlValue, Store};
use crate::model::journal::{JournalEntry, JournalEntryId, JournalEntryUpdate, NewJournalEntry};
use crate::repo::{RepoError, RepoResult};

const ENTRY_SELECT_SQL: &str = "SELECT id, userId, image, description, date, category FROM journals";

/// Repository interface for journal entry CRUD operations.
pub trait JournalRepository {
    fn create_entry(&self, entry: &NewJournalEntry) -> RepoResult<JournalEntryId>;
    fn update_entry(&self, id: JournalEntryId, update: &JournalEntryUpdate) -> RepoResult<()>;
    /// Returns `false` when no entry had this id.
    fn delete_entry(&self, id: JournalEntryId) -> RepoResult<bool>;
    fn get_entry(&self, id: JournalEntryId) -> RepoResult<Option<JournalEntry>>;
    fn list_entries_for_user(&self, user_id: i64) -> RepoResult<Vec<JournalEntry>>;
    /// Same ordering as `list_entries_for_user`, filtered in SQL.
    fn list_entries_in_category(
        &self,
        user_id: i64,
        category: &str,
    ) -> RepoResult<Vec<JournalEntry>>;
}

/// Journal repository issuing every statement through `Store::execute`.
pub struct StoreJournalRepository<'store> {
    store: &'store Store,
}

impl<'store> StoreJournalRepository<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }
}

impl JournalRepository for StoreJournalRepository<'_> {
    fn create_entry(&self, entry: &NewJournalEntry) -> RepoResult<JournalEntryId> {
        entry.validate()?;

        let result = self.store.execute(
            "INSERT INTO journals (userId, image, description, category, date)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            &[
                SqlValue::from(entry.user_id),
                SqlValue::from(entry.image.as_str()),
                SqlValue::from(entry.description.as_str()),
                SqlValue::from(entry.category.as_str()),
                SqlValue::from(entry.date.as_str()),
            ],
        )?;

        result
            .insert_id
            .ok_or_else(|| RepoError::InvalidData("journal insert reported no row id".to_string()))
    }

    fn update_entry(&self, id: JournalEntryId, update: &JournalEntryUpdate) -> RepoResult<()> {
        update.validate()?;

        let result = self.store.execute(
            "UPDATE journals
             SET image = ?1, description = ?2, category = ?3
             WHERE id = ?4;",
            &[
                SqlValue::from(update.image.as_str()),
                SqlValue::from(update.description.as_str()),
                SqlValue::from(update.category.as_str()),
                SqlValue::from(id),
            ],
        )?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_entry(&self, id: JournalEntryId) -> RepoResult<bool> {
        let result = self
            .store
            .execute("DELETE FROM journals WHERE id = ?1;", &[SqlValue::from(id)])?;
        Ok(result.rows_affected > 0)
    }

    fn get_entry(&self, id: JournalEntryId) -> RepoResult<Option<JournalEntry>> {
        let result = self.store.execute(
            &format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"),
            &[SqlValue::from(id)],
        )?;
        result.first().map(parse_entry_row).transpose()
    }

    fn list_entries_for_user(&self, user_id: i64) -> RepoResult<Vec<JournalEntry>> {
        let result = self.store.execute(
            &format!("{ENTRY_SELECT_SQL} WHERE userId = ?1 ORDER BY date DESC, id DESC;"),
            &[SqlValue::from(user_id)],
        )?;
        parse_entry_rows(&result)
    }

    fn list_entries_in_category(
        &self,
        user_id: i64,
        category: &str,
    ) -> RepoResult<Vec<JournalEntry>> {
        let result = self.store.execute(
            &format!(
                "{ENTRY_SELECT_SQL} WHERE userId = ?1 AND category = ?2 ORDER BY date DESC, id DESC;"
            ),
            &[SqlValue::from(user_id), SqlValue::from(category)],
        )?;
        parse_entry_rows(&result)
    }
}

fn parse_entry_rows(result: &QueryResult) -> RepoResult<Vec<JournalEntry>> {
    result.rows.iter().map(parse_entry_row).collect()
}

fn parse_entry_row(row: &Row) -> RepoResult<JournalEntry> {
    Ok(JournalEntry {
        id: required_i64(row, "id")?,
        user_id: required_i64(row, "userId")?,
        image: required_text(row, "image")?,
        description: required_text(row, "description")?,
        date: required_text(row, "date")?,
        category: required_text(row, "category")?,
    })
}

fn required_i64(row: &Row, column: &str) -> RepoResult<i64> {
    row.get_i64(column).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "expected integer in journals.{column}, got {:?}",
            row.get(column)
        ))
    })
}

fn required_text(row: &Row, column: &str) -> RepoResult<String> {
    row.get_str(column).map(str::to_string).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "expected text in journals.{column}, got {:?}",
            row.get(column)
        ))
    })
}
