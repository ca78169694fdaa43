//! Configuration models.
//!
//! `AppConfig` mirrors the optional TOML file; `ExportConfig` is the fully
//! resolved set of options the export pipeline runs with.

use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};
use super::timestamp::DisplayZone;

/// Default strftime format for the optional filename date prefix.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S_";

/// Export defaults from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Export directory (defaults to `~/Voice Memos Export`).
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Export every recording without prompting.
    #[serde(default)]
    pub include_all: bool,

    /// Prefix filenames with the recording date.
    #[serde(default)]
    pub prefix_date: bool,

    /// strftime format used for the date prefix.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Open the export directory in the file browser when done.
    #[serde(default = "default_open_file_browser")]
    pub open_file_browser: bool,

    /// Time zone for rendered dates.
    #[serde(default)]
    pub timezone: DisplayZone,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            export_dir: None,
            include_all: false,
            prefix_date: false,
            date_format: default_date_format(),
            open_file_browser: default_open_file_browser(),
            timezone: DisplayZone::default(),
        }
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

const fn default_open_file_browser() -> bool {
    true
}

/// Database location from the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// Explicit path to `CloudRecordings.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Export defaults.
    #[serde(default)]
    pub export: ExportSection,

    /// Database location.
    #[serde(default)]
    pub database: DatabaseSection,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".voice-memo-export")
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Default export directory when none is configured.
    #[must_use]
    pub fn default_export_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Voice Memos Export")
    }
}

/// Resolved options for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory receiving the exported files.
    pub export_directory: PathBuf,
    /// Export every recording without prompting.
    pub include_all: bool,
    /// Prefix filenames with the recording date.
    pub prefix_date: bool,
    /// strftime format for the prefix.
    pub date_format: String,
    /// Time zone for rendered dates.
    pub timezone: DisplayZone,
    /// Open the export directory in the file browser when done.
    pub open_file_browser: bool,
}

impl ExportConfig {
    /// Builds a config after validating the date format.
    ///
    /// # Errors
    /// Returns `Config` error if the date format has invalid specifiers.
    pub fn new(
        export_directory: PathBuf,
        include_all: bool,
        prefix_date: bool,
        date_format: String,
        timezone: DisplayZone,
    ) -> Result<Self> {
        validate_date_format(&date_format)?;
        Ok(Self {
            export_directory,
            include_all,
            prefix_date,
            date_format,
            timezone,
            open_file_browser: true,
        })
    }

    /// Sets whether the file browser is opened after the run.
    #[must_use]
    pub fn with_file_browser(mut self, open: bool) -> Self {
        self.open_file_browser = open;
        self
    }
}

/// Checks a strftime format string for unsupported specifiers.
///
/// # Errors
/// Returns `Config` error naming the format.
pub fn validate_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(AppError::Config {
            message: format!("Invalid date format: {format}"),
        });
    }
    Ok(())
}
