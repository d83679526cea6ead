mod config;
mod kill_file;

pub use config::{Config, DisplayConfig, SessionConfig};
pub use kill_file::{KillFile, KilledDraft};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/draftclock[-dev]/` based on DRAFTCLOCK_ENV.
///
/// Set DRAFTCLOCK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DRAFTCLOCK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("draftclock-dev")
    } else {
        base_dir.join("draftclock")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
