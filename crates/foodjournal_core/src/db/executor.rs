//! Transactional statement execution and result normalization.
//!
//! # Responsibility
//! - Run caller statements inside exclusive transactions.
//! - Collapse select/insert/update/delete outcomes into `QueryResult`.
//!
//! # Invariants
//! - Every statement runs while the store handle is locked, so executions
//!   never interleave.
//! - A transaction commits only when all of its work succeeded; any error
//!   drops it, which rolls it back.
//! - `rows` is always present; `insert_id` is set only for an insert that
//!   created exactly one row.
//! - Inside `within_transaction` only the `StoreTransaction` handle may touch
//!   the store; nested `Store` calls from the same thread fail fast.

use super::store::Store;
use super::value::{Row, SqlValue};
use super::{ExecResult, QueryExecutionError};
use log::{debug, error};
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::cell::RefCell;
use std::time::Instant;

thread_local! {
    // Addresses of stores whose transaction scope is open on this thread.
    static OPEN_SCOPES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Normalized outcome of one statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Result rows in engine order; empty for write statements.
    pub rows: Vec<Row>,
    /// Row id assigned by a single-row insert.
    pub insert_id: Option<i64>,
    /// Rows changed by an insert/update/delete; `0` for everything else.
    pub rows_affected: u64,
}

impl QueryResult {
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }
}

/// Statement category, derived from the leading SQL keyword.
///
/// CTE-prefixed statements are classified by the verb after the `WITH` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Insert,
    Update,
    Delete,
    /// DDL, pragmas and anything unrecognized.
    Other,
}

impl StatementKind {
    pub fn classify(statement: &str) -> Self {
        let mut keywords = TopLevelKeywords::new(statement).map(|word| word.to_ascii_uppercase());
        match keywords.next().as_deref() {
            Some("WITH") => keywords
                .find_map(|word| Self::from_verb(&word))
                .unwrap_or(Self::Other),
            Some(word) => Self::from_verb(word).unwrap_or(Self::Other),
            None => Self::Other,
        }
    }

    fn from_verb(word: &str) -> Option<Self> {
        match word {
            "SELECT" | "VALUES" => Some(Self::Read),
            "INSERT" | "REPLACE" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other => "other",
        }
    }

    fn reports_changes(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

/// Exclusive transaction handed to `Store::within_transaction` closures.
pub struct StoreTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl StoreTransaction<'_> {
    /// Runs one statement inside this transaction.
    ///
    /// The transaction stays open; the enclosing scope decides commit.
    pub fn execute(&self, statement: &str, params: &[SqlValue]) -> ExecResult<QueryResult> {
        run_statement(&self.tx, statement, params)
    }
}

impl Store {
    /// Runs one parameterized statement in its own exclusive transaction.
    ///
    /// Initializes the store first when needed. `params` bind to positional
    /// placeholders in order and may be empty.
    ///
    /// # Errors
    /// Returns `QueryExecutionError` wrapping the cause; the transaction has
    /// been rolled back and nothing from the statement persists.
    pub fn execute(&self, statement: &str, params: &[SqlValue]) -> ExecResult<QueryResult> {
        let started_at = Instant::now();
        let kind = StatementKind::classify(statement);

        let outcome = self.within_transaction(|tx| tx.execute(statement, params));
        match &outcome {
            Ok(result) => debug!(
                "event=db_execute module=db status=ok kind={} duration_ms={} rows={} rows_affected={}",
                kind.as_str(),
                started_at.elapsed().as_millis(),
                result.rows.len(),
                result.rows_affected
            ),
            Err(err) => error!(
                "event=db_execute module=db status=error kind={} duration_ms={} error_code={} error={}",
                kind.as_str(),
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        outcome
    }

    /// Runs `work` inside one exclusive transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back otherwise. Use this to
    /// make several statements atomic together.
    ///
    /// Inside `work`, use only the `StoreTransaction` handle. Calling back
    /// into this `Store` (directly or through a repository) returns
    /// `QueryExecutionError::NestedTransaction` instead of blocking on the
    /// handle this scope already holds.
    pub fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&StoreTransaction<'_>) -> Result<T, E>,
        E: From<QueryExecutionError>,
    {
        let _scope = ScopeGuard::enter(self)?;
        let handle = self.handle().map_err(QueryExecutionError::from)?;
        let mut conn = handle
            .lock()
            .map_err(|_| QueryExecutionError::HandlePoisoned)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)
            .map_err(QueryExecutionError::from)?;

        let scoped = StoreTransaction { tx };
        let value = work(&scoped)?;
        scoped.tx.commit().map_err(QueryExecutionError::from)?;
        Ok(value)
    }
}

/// Marks a store's transaction scope as open on the current thread.
struct ScopeGuard {
    key: usize,
}

impl ScopeGuard {
    fn enter(store: &Store) -> ExecResult<Self> {
        let key = store as *const Store as usize;
        OPEN_SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            if scopes.contains(&key) {
                return Err(QueryExecutionError::NestedTransaction);
            }
            scopes.push(key);
            Ok(Self { key })
        })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        OPEN_SCOPES.with(|scopes| scopes.borrow_mut().retain(|key| *key != self.key));
    }
}

fn run_statement(conn: &Connection, statement: &str, params: &[SqlValue]) -> ExecResult<QueryResult> {
    let kind = StatementKind::classify(statement);
    let rowid_before = conn.last_insert_rowid();
    let mut stmt = conn.prepare(statement)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let changed = if columns.is_empty() {
        stmt.execute(params_from_iter(params.iter()))?
    } else {
        let mut cursor = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = cursor.next()? {
            rows.push(Row::from_sqlite(row, &columns)?);
        }
        // `RETURNING` yields one row per changed row.
        rows.len()
    };

    let rows_affected = if kind.reports_changes() {
        changed as u64
    } else {
        0
    };
    // An upsert that takes its `DO UPDATE` branch reports one change but
    // leaves the last insert rowid untouched.
    let rowid_after = conn.last_insert_rowid();
    let created_one_row =
        kind == StatementKind::Insert && rows_affected == 1 && rowid_after != rowid_before;
    let insert_id = created_one_row.then_some(rowid_after);

    Ok(QueryResult {
        rows,
        insert_id,
        rows_affected,
    })
}

/// Bare words at parenthesis depth zero, skipping comments and quoted text.
struct TopLevelKeywords<'a> {
    rest: &'a str,
    depth: usize,
}

impl<'a> TopLevelKeywords<'a> {
    fn new(statement: &'a str) -> Self {
        Self {
            rest: statement,
            depth: 0,
        }
    }

    fn skip_past<'s>(rest: &'s str, terminator: &str) -> &'s str {
        rest.split_once(terminator).map_or("", |(_, tail)| tail)
    }
}

impl<'a> Iterator for TopLevelKeywords<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let rest = self.rest;
            let first = rest.chars().next()?;
            if let Some(after) = rest.strip_prefix("--") {
                self.rest = Self::skip_past(after, "\n");
            } else if let Some(after) = rest.strip_prefix("/*") {
                self.rest = Self::skip_past(after, "*/");
            } else if let Some(terminator) = match first {
                '\'' => Some("'"),
                '"' => Some("\""),
                '`' => Some("`"),
                '[' => Some("]"),
                _ => None,
            } {
                self.rest = Self::skip_past(&rest[1..], terminator);
            } else if first == '(' {
                self.depth += 1;
                self.rest = &rest[1..];
            } else if first == ')' {
                self.depth = self.depth.saturating_sub(1);
                self.rest = &rest[1..];
            } else if first.is_ascii_alphabetic() || first == '_' {
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                self.rest = &rest[end..];
                if self.depth == 0 {
                    return Some(&rest[..end]);
                }
            } else {
                self.rest = &rest[first.len_utf8()..];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatementKind;

    #[test]
    fn classify_reads_leading_keyword_case_insensitively() {
        assert_eq!(StatementKind::classify("select * from journals"), StatementKind::Read);
        assert_eq!(StatementKind::classify("  INSERT INTO users"), StatementKind::Insert);
        assert_eq!(StatementKind::classify("replace into users"), StatementKind::Insert);
        assert_eq!(StatementKind::classify("Update journals"), StatementKind::Update);
        assert_eq!(StatementKind::classify("DELETE FROM journals"), StatementKind::Delete);
        assert_eq!(StatementKind::classify("CREATE TABLE t (a)"), StatementKind::Other);
        assert_eq!(StatementKind::classify(""), StatementKind::Other);
    }

    #[test]
    fn classify_skips_leading_comments() {
        assert_eq!(
            StatementKind::classify("-- load\n/* newest first */ SELECT 1"),
            StatementKind::Read
        );
        assert_eq!(StatementKind::classify("-- only a comment"), StatementKind::Other);
    }

    #[test]
    fn classify_uses_main_verb_after_cte_list() {
        assert_eq!(
            StatementKind::classify(
                "WITH doomed AS (SELECT id FROM journals) DELETE FROM journals WHERE id IN doomed"
            ),
            StatementKind::Delete
        );
        assert_eq!(
            StatementKind::classify(
                "with recursive a(n) as (select 1 union all select n + 1 from a where n < 3), \
                 b as materialized (select 'update' as word) \
                 update journals set description = (select word from b)"
            ),
            StatementKind::Update
        );
        assert_eq!(
            StatementKind::classify("WITH src AS (SELECT 1 AS id) INSERT INTO t SELECT id FROM src"),
            StatementKind::Insert
        );
        assert_eq!(
            StatementKind::classify("WITH x AS (DELETE FROM t) SELECT * FROM x"),
            StatementKind::Read
        );
        assert_eq!(StatementKind::classify("WITH"), StatementKind::Other);
    }

    #[test]
    fn classify_ignores_keywords_inside_quotes() {
        assert_eq!(
            StatementKind::classify("/* 'delete' */ WITH \"insert\" AS (SELECT 1) SELECT * FROM \"insert\""),
            StatementKind::Read
        );
    }
}
