//! # tabula-settings
//!
//! Layered configuration for the tabula table store.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`TabulaSettings::default()`]
//! 2. **User file** — `~/.tabula/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `TABULA_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    settings_path,
};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_under_home_dir() {
        let path = settings_path();
        assert!(path.ends_with(".tabula/settings.json"));
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = TabulaSettings::default();
        assert_eq!(settings.store.busy_timeout_ms, 5000);
        assert_eq!(settings.store.journal_mode, JournalMode::Wal);
        assert!(settings.store.foreign_keys);
        assert!(!settings.logging.json);
        assert!(settings.validate().is_ok());
    }
}
