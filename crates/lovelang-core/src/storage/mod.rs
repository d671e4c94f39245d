mod config;
pub mod database;

pub use config::{AccessConfig, Config, RemindersConfig, TrialConfig};
pub use database::{Database, ProfileStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/lovelang[-dev]/` based on LOVELANG_ENV.
///
/// Set LOVELANG_ENV=dev to use the development data directory, or
/// LOVELANG_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("LOVELANG_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LOVELANG_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("lovelang-dev")
            } else {
                base_dir.join("lovelang")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
