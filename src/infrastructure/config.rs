//! Configuration file management.
//!
//! Handles loading and creating the TOML configuration file.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Voice Memo Export Configuration
# Auto-generated - edit as needed. Command-line flags take precedence.

[export]
# Folder for exported files (default: ~/Voice Memos Export)
# export_dir = "/Users/me/Voice Memos Export"

# Export every memo without prompting
include_all = false

# Prefix file names with the recording date
prefix_date = false

# strftime format for the date prefix
date_format = "%Y-%m-%d-%H-%M-%S_"

# Open the export folder when done
open_file_browser = true

# Time zone for dates in file names: "local" or "utc"
timezone = "local"

[database]
# Path to CloudRecordings.db (default: auto-detected)
# path = "/Users/me/Library/Group Containers/group.com.apple.VoiceMemos.shared/Recordings/CloudRecordings.db"
"#;

/// Load configuration from the default location, or defaults if absent.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = AppConfig::config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Create the default configuration file at `path` if it doesn't exist.
///
/// Returns `true` if a file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");

    Ok(true)
}
