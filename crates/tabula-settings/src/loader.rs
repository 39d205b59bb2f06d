//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TabulaSettings::default()`]
//! 2. If `~/.tabula/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `TABULA_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{JournalMode, TabulaSettings, LOG_LEVELS};

/// Resolve the path to the settings file (`~/.tabula/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".tabula").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<TabulaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<TabulaSettings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<TabulaSettings> {
    let defaults = serde_json::to_value(TabulaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `TABULA_*` environment variable overrides.
///
/// Invalid values are logged and ignored.
pub fn apply_env_overrides(settings: &mut TabulaSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup` instead of the process environment.
pub fn apply_overrides(settings: &mut TabulaSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Store settings ──────────────────────────────────────────────
    if let Some(val) = read("TABULA_BUSY_TIMEOUT_MS") {
        match parse_u64_range(&val, 0, 600_000) {
            Some(v) => settings.store.busy_timeout_ms = v,
            None => warn!(key = "TABULA_BUSY_TIMEOUT_MS", value = %val, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(val) = read("TABULA_JOURNAL_MODE") {
        match parse_journal_mode(&val) {
            Some(mode) => settings.store.journal_mode = mode,
            None => warn!(key = "TABULA_JOURNAL_MODE", value = %val, "invalid journal mode, ignoring"),
        }
    }

    // ── Logging settings ────────────────────────────────────────────
    if let Some(val) = read("TABULA_LOG_LEVEL") {
        let level = val.to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            settings.logging.level = level;
        } else {
            warn!(key = "TABULA_LOG_LEVEL", value = %val, "invalid log level, ignoring");
        }
    }
    if let Some(val) = read("TABULA_LOG_JSON") {
        match parse_bool(&val) {
            Some(v) => settings.logging.json = v,
            None => warn!(key = "TABULA_LOG_JSON", value = %val, "invalid boolean env var, ignoring"),
        }
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a journal mode name, case-insensitively.
pub fn parse_journal_mode(val: &str) -> Option<JournalMode> {
    serde_json::from_value(Value::String(val.to_lowercase())).ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
