//! Journal schema definition and creation.
//!
//! # Responsibility
//! - Create the `users` and `journals` tables if they are absent.
//! - Stamp the schema version into `PRAGMA user_version`.
//!
//! # Invariants
//! - Creation is create-if-absent, so repeated runs never conflict.
//! - Both tables are created inside one exclusive transaction.
//! - Files stamped by a newer binary are rejected, never rewritten.

use crate::db::{InitResult, StoreInitializationError};
use rusqlite::{Connection, TransactionBehavior};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

/// Tables every initialized store contains.
pub const TABLES: &[&str] = &["users", "journals"];

/// Creates the journal schema on `conn` if it is not present yet.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was stamped by a newer schema.
/// - `Schema` when any statement fails; nothing is committed in that case.
pub fn apply_schema(conn: &mut Connection) -> InitResult<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Exclusive)
        .map_err(StoreInitializationError::Schema)?;

    let current_version = current_user_version(&tx).map_err(StoreInitializationError::Schema)?;
    if current_version > SCHEMA_VERSION {
        return Err(StoreInitializationError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    tx.execute_batch(SCHEMA_SQL)
        .map_err(StoreInitializationError::Schema)?;
    if current_version < SCHEMA_VERSION {
        tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))
            .map_err(StoreInitializationError::Schema)?;
    }

    tx.commit().map_err(StoreInitializationError::Schema)
}

/// Reads `PRAGMA user_version` from the given connection.
pub fn current_user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
}

#[cfg(test)]
mod tests {
    use super::{apply_schema, current_user_version, SCHEMA_VERSION, TABLES};
    use crate::db::StoreInitializationError;
    use rusqlite::Connection;

    fn table_sql(conn: &Connection, table: &str) -> String {
        conn.query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn apply_schema_creates_tables_and_stamps_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_schema(&mut conn).unwrap();

        for table in TABLES {
            assert!(!table_sql(&conn, table).is_empty());
        }
        assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn apply_schema_twice_keeps_identical_definitions() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_schema(&mut conn).unwrap();
        let first = table_sql(&conn, "journals");

        apply_schema(&mut conn).unwrap();
        assert_eq!(table_sql(&conn, "journals"), first);
    }

    #[test]
    fn apply_schema_rejects_newer_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 7;").unwrap();

        let err = apply_schema(&mut conn).unwrap_err();
        assert!(matches!(
            err,
            StoreInitializationError::UnsupportedSchemaVersion {
                db_version: 7,
                latest_supported: SCHEMA_VERSION,
            }
        ));
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'journals';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }
}
