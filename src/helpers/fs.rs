//! File System Utilities
//!
//! Configuration and log directory resolution.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "fieldops", "fieldops").ok_or_else(|| Error::Invalid {
        message: "Could not determine project directories".to_string(),
    })
}

/// Get the application's configuration directory (not created)
///
/// Platform-specific locations:
/// - **Linux**: `~/.config/fieldops/` or `$XDG_CONFIG_HOME/fieldops/`
/// - **macOS**: `~/Library/Application Support/com.fieldops.fieldops/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\fieldops\fieldops\config\`
pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Default location of `config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get or create the directory used for rolling log files
pub fn get_or_create_log_dir() -> Result<PathBuf> {
    let log_dir = project_dirs()?.data_local_dir().join("logs");

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    Ok(log_dir)
}

/// Check if running in development mode
pub fn is_development() -> bool {
    cfg!(debug_assertions)
}
