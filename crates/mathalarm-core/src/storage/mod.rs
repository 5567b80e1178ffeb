mod config;
pub mod database;

pub use config::{AlarmDefaults, Config};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `MATHALARM_DATA_DIR` overrides the location outright. Otherwise it is
/// `~/.config/mathalarm[-dev]/`, with `MATHALARM_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("MATHALARM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("MATHALARM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("mathalarm-dev")
            } else {
                base_dir.join("mathalarm")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
