//! SQLite store bootstrap and statement execution entry points.
//!
//! # Responsibility
//! - Own the single database handle and initialize it lazily, once.
//! - Run caller statements inside exclusive transactions.
//! - Normalize per-statement results into one caller-facing shape.
//!
//! # Invariants
//! - Callers never see the raw connection; `Store::execute` is the only door.
//! - Core code must not read/write journal data before schema creation succeeds.
//! - A failed statement leaves no partial effect on disk.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod executor;
pub mod schema;
mod store;
mod value;

pub use executor::{QueryResult, StatementKind, StoreTransaction};
pub use store::Store;
pub use value::{Row, SqlValue};

pub type InitResult<T> = Result<T, StoreInitializationError>;
pub type ExecResult<T> = Result<T, QueryExecutionError>;

/// Failure to bring the store into a usable state.
///
/// The store stays uninitialized after any of these, so a later call retries.
#[derive(Debug)]
pub enum StoreInitializationError {
    /// Backing file could not be opened or created.
    Open(rusqlite::Error),
    /// Connection pragmas (foreign keys, busy timeout, journal mode) failed.
    Configure(rusqlite::Error),
    /// Schema statements failed; the schema transaction was rolled back.
    Schema(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for StoreInitializationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "failed to open store: {err}"),
            Self::Configure(err) => write!(f, "failed to configure store connection: {err}"),
            Self::Schema(err) => write!(f, "failed to create store schema: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for StoreInitializationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) | Self::Configure(err) | Self::Schema(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl StoreInitializationError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open(_) => "store_open_failed",
            Self::Configure(_) => "store_configure_failed",
            Self::Schema(_) => "store_schema_failed",
            Self::UnsupportedSchemaVersion { .. } => "store_schema_unsupported",
        }
    }
}

/// Failure of one submitted statement.
///
/// The enclosing transaction has been rolled back when this is returned.
#[derive(Debug)]
pub enum QueryExecutionError {
    /// The store could not be initialized before running the statement.
    StoreUnavailable(StoreInitializationError),
    /// Insert/update referenced a row that does not exist (e.g. unknown user).
    ReferentialIntegrity(rusqlite::Error),
    /// Any other constraint failure (unique, not null, check).
    Constraint(rusqlite::Error),
    /// Malformed SQL, parameter count mismatch, I/O and other engine errors.
    Sqlite(rusqlite::Error),
    /// A previous caller panicked while holding the handle.
    HandlePoisoned,
    /// The store was called from inside its own open transaction scope.
    NestedTransaction,
}

impl QueryExecutionError {
    pub fn is_referential_integrity(&self) -> bool {
        matches!(self, Self::ReferentialIntegrity(_))
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::ReferentialIntegrity(_) => "referential_integrity",
            Self::Constraint(_) => "constraint_violation",
            Self::Sqlite(_) => "sqlite_error",
            Self::HandlePoisoned => "handle_poisoned",
            Self::NestedTransaction => "nested_transaction",
        }
    }
}

impl Display for QueryExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::ReferentialIntegrity(err) => {
                write!(f, "referenced row does not exist: {err}")
            }
            Self::Constraint(err) => write!(f, "constraint violation: {err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::HandlePoisoned => write!(f, "store handle is poisoned"),
            Self::NestedTransaction => write!(
                f,
                "store used inside its own transaction scope; use the scope's transaction handle"
            ),
        }
    }
}

impl Error for QueryExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::ReferentialIntegrity(err) | Self::Constraint(err) | Self::Sqlite(err) => {
                Some(err)
            }
            Self::HandlePoisoned | Self::NestedTransaction => None,
        }
    }
}

impl From<StoreInitializationError> for QueryExecutionError {
    fn from(value: StoreInitializationError) -> Self {
        Self::StoreUnavailable(value)
    }
}

impl From<rusqlite::Error> for QueryExecutionError {
    fn from(value: rusqlite::Error) -> Self {
        let constraint_code = match &value {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Some(failure.extended_code)
            }
            _ => None,
        };

        match constraint_code {
            Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => Self::ReferentialIntegrity(value),
            Some(_) => Self::Constraint(value),
            None => Self::Sqlite(value),
        }
    }
}
