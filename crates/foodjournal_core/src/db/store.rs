//! Lazy store initialization.
//!
//! # Responsibility
//! - Own the single SQLite handle of a journal store.
//! - Open and configure it on first use, then create the schema.
//!
//! # Invariants
//! - Initialization runs at most once successfully per `Store` value, even
//!   when several threads race on the first call.
//! - Returned handles have `foreign_keys=ON` and the schema fully applied.
//! - A failed initialization leaves the handle unset so the next call retries.

use super::schema::apply_schema;
use super::{InitResult, StoreInitializationError};
use crate::config::{StoreConfig, StoreLocation};
use log::{debug, error, info};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::sync::Mutex;
use std::time::Instant;

/// Journal store owned by the application's composition root.
///
/// Construction performs no I/O; the database is opened by the first
/// `ensure_ready` or `execute` call.
pub struct Store {
    config: StoreConfig,
    handle: OnceCell<Mutex<Connection>>,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns whether the store has been initialized successfully.
    pub fn is_ready(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Opens the store and creates its schema if that has not happened yet.
    ///
    /// # Side effects
    /// - First successful call opens the backing file, switches it to WAL
    ///   journaling and creates the schema in one exclusive transaction.
    /// - Emits `store_init` logging events with duration and status.
    ///
    /// # Errors
    /// Returns the underlying cause; the store stays uninitialized.
    pub fn ensure_ready(&self) -> InitResult<()> {
        self.handle().map(|_| ())
    }

    pub(super) fn handle(&self) -> InitResult<&Mutex<Connection>> {
        self.handle
            .get_or_try_init(|| open_store(&self.config).map(Mutex::new))
    }
}

fn open_store(config: &StoreConfig) -> InitResult<Connection> {
    let started_at = Instant::now();
    let mode = config.mode();
    info!("event=store_init module=db status=start mode={mode}");

    let opened = match &config.location {
        StoreLocation::File(path) => Connection::open(path),
        StoreLocation::Memory => Connection::open_in_memory(),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            let err = StoreInitializationError::Open(err);
            error!(
                "event=store_init module=db status=error mode={mode} duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            );
            return Err(err);
        }
    };

    match bootstrap_connection(&mut conn, config) {
        Ok(()) => {
            info!(
                "event=store_init module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=store_init module=db status=error mode={mode} duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, config: &StoreConfig) -> InitResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(StoreInitializationError::Configure)?;
    conn.busy_timeout(config.busy_timeout)
        .map_err(StoreInitializationError::Configure)?;

    // In-memory databases report `memory` here; only files switch to WAL.
    let journal_mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(StoreInitializationError::Configure)?;
    debug!("event=store_journal_mode module=db journal_mode={journal_mode}");

    apply_schema(conn)
}
