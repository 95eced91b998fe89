mod config;

pub use config::{Config, StatusConfig, TrackingConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/hydrotrack[-dev]/` based on HYDROTRACK_ENV.
///
/// Set HYDROTRACK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HYDROTRACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("hydrotrack-dev")
    } else {
        base_dir.join("hydrotrack")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
