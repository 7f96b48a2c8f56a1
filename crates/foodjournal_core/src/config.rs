//! Store configuration.
//!
//! # Responsibility
//! - Describe where the journal store lives and how its connection behaves.
//! - Resolve the default location from the process environment.
//!
//! # Invariants
//! - File-backed stores always use the fixed `FoodJournal.db` file name.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed file name of the journal store inside its data directory.
pub const STORE_FILE_NAME: &str = "FoodJournal.db";
/// Environment variable naming the directory that holds the store file.
pub const DATA_DIR_ENV: &str = "FOODJOURNAL_DATA_DIR";

/// Directory, next to the store file, that receives rolling log files.
pub const LOG_DIR_NAME: &str = "logs";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Backing storage for a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Private in-memory database; contents vanish with the store.
    Memory,
}

/// Connection settings consumed by `Store::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a statement waits on a file lock held by another process.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// Store file `FoodJournal.db` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(STORE_FILE_NAME))
    }

    /// Store file at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Resolves the data directory from `FOODJOURNAL_DATA_DIR`, falling back
    /// to the current working directory.
    pub fn from_env() -> Self {
        resolve_from_env_value(std::env::var(DATA_DIR_ENV).ok().as_deref())
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Log directory beside the store file; `None` for in-memory stores.
    ///
    /// Relative store paths yield a relative directory; callers resolve it
    /// before handing it to `init_logging`.
    pub fn log_dir(&self) -> Option<PathBuf> {
        match &self.location {
            StoreLocation::File(path) => Some(
                path.parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(LOG_DIR_NAME),
            ),
            StoreLocation::Memory => None,
        }
    }

    /// Short label used in log events (`file` or `memory`).
    pub fn mode(&self) -> &'static str {
        match self.location {
            StoreLocation::File(_) => "file",
            StoreLocation::Memory => "memory",
        }
    }
}

fn resolve_from_env_value(value: Option<&str>) -> StoreConfig {
    match value.map(str::trim) {
        Some(dir) if !dir.is_empty() => StoreConfig::in_dir(dir),
        _ => StoreConfig::in_dir("."),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_from_env_value, StoreConfig, StoreLocation, STORE_FILE_NAME};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn in_dir_appends_fixed_file_name() {
        let config = StoreConfig::in_dir("/var/lib/journal");
        assert_eq!(
            config.location,
            StoreLocation::File(PathBuf::from("/var/lib/journal").join(STORE_FILE_NAME))
        );
        assert_eq!(config.mode(), "file");
    }

    #[test]
    fn env_value_falls_back_to_current_dir_when_blank() {
        assert_eq!(resolve_from_env_value(None), StoreConfig::in_dir("."));
        assert_eq!(resolve_from_env_value(Some("  ")), StoreConfig::in_dir("."));
        assert_eq!(
            resolve_from_env_value(Some(" /data ")),
            StoreConfig::in_dir("/data")
        );
    }

    #[test]
    fn busy_timeout_is_overridable() {
        let config = StoreConfig::in_memory().with_busy_timeout(Duration::from_millis(250));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.mode(), "memory");
    }

    #[test]
    fn log_dir_sits_beside_the_store_file() {
        assert_eq!(
            StoreConfig::in_dir("/var/lib/journal").log_dir(),
            Some(PathBuf::from("/var/lib/journal/logs"))
        );
        assert_eq!(
            StoreConfig::at_path("FoodJournal.db").log_dir(),
            Some(PathBuf::from("logs"))
        );
        assert_eq!(StoreConfig::in_memory().log_dir(), None);
    }
}
