//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`: field names are
//! camelCase on disk and missing fields take their compiled default.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Log levels accepted in `logging.level` and `logging.moduleLevels`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root settings type.
///
/// Loaded from `~/.tabula/settings.json` with defaults applied for missing
/// fields; `TABULA_*` environment variables override specific values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabulaSettings {
    /// Storage engine tuning.
    pub store: StoreSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl TabulaSettings {
    /// Reject values that parse but cannot be applied.
    pub fn validate(&self) -> Result<()> {
        if self.store.cache_size_kib == 0 {
            return Err(SettingsError::InvalidValue(
                "store.cacheSizeKib must be positive".into(),
            ));
        }
        let levels = std::iter::once(("logging.level", &self.logging.level)).chain(
            self.logging
                .module_levels
                .values()
                .map(|level| ("logging.moduleLevels", level)),
        );
        for (field, level) in levels {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(SettingsError::InvalidValue(format!(
                    "{field}: unknown log level '{level}'"
                )));
            }
        }
        Ok(())
    }
}

/// Storage engine tuning, applied as pragmas when a database is opened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Journal mode for file-backed databases.
    pub journal_mode: JournalMode,
    /// Durability level.
    pub synchronous: Synchronous,
    /// Page cache size in KiB.
    pub cache_size_kib: u32,
    /// Whether foreign key constraints are enforced.
    pub foreign_keys: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5000,
            journal_mode: JournalMode::Wal,
            synchronous: Synchronous::Normal,
            cache_size_kib: 8192,
            foreign_keys: true,
        }
    }
}

/// Journal mode pragma values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Write-ahead log.
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
    /// Rollback journal truncated after each transaction.
    Truncate,
    /// Rollback journal kept and its header zeroed.
    Persist,
    /// Journal held in memory.
    Memory,
}

impl JournalMode {
    /// Pragma keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
        }
    }
}

impl fmt::Display for JournalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous pragma values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    /// No syncs.
    Off,
    /// Sync at critical moments.
    Normal,
    /// Sync on every commit.
    Full,
}

impl Synchronous {
    /// Pragma keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
        }
    }
}

impl fmt::Display for Synchronous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Per-module level overrides, e.g. `{"tabula_store": "debug"}`.
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            module_levels: BTreeMap::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
