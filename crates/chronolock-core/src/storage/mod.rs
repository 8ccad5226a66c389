mod config;

pub use config::{Config, IntegrityConfig, LockConfig, OracleConfig, PositionsConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/chronolock[-dev]/` based on CHRONOLOCK_ENV.
///
/// Set CHRONOLOCK_ENV=dev to use development data directory.
/// CHRONOLOCK_CONFIG_DIR, when set, replaces the directory entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os("CHRONOLOCK_CONFIG_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)
            .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CHRONOLOCK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("chronolock-dev")
    } else {
        base_dir.join("chronolock")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
