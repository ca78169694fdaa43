//! CLI interface using clap.
//!
//! Running without a subcommand exports recordings; flags override the
//! values from the config file.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;
use crate::domain::{AppConfig, AppError, DisplayZone, ExportConfig, Result};
use crate::infrastructure::find_memo_database;

/// Export audio files from the Voice Memos app with the right file name
/// and creation date.
#[derive(Parser, Debug)]
#[command(name = "voice-memo-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the Voice Memos database.
    #[arg(short, long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Folder for exported files.
    #[arg(short, long)]
    pub export_path: Option<PathBuf>,

    /// Export all memos without prompting.
    #[arg(short, long)]
    pub all: bool,

    /// Include the recording date in the file name.
    #[arg(long)]
    pub date_in_name: bool,

    /// Date format for the file name prefix (strftime syntax).
    #[arg(long)]
    pub date_in_name_format: Option<String>,

    /// Don't open the export folder in the file browser afterwards.
    #[arg(long)]
    pub no_finder: bool,

    /// Render dates in UTC instead of local time.
    #[arg(long, global = true)]
    pub utc: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List recordings without exporting anything.
    List {
        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show the database locations being considered.
    Paths,

    /// Write a default config file if none exists.
    InitConfig,
}

impl Cli {
    /// Time zone for rendered dates.
    #[must_use]
    pub const fn zone(&self, file: &AppConfig) -> DisplayZone {
        if self.utc {
            DisplayZone::Utc
        } else {
            file.export.timezone
        }
    }

    /// Database path from flags, config file, or auto-detection.
    ///
    /// # Errors
    /// Returns error if no path is given and the home directory is unknown.
    pub fn database_path(&self, file: &AppConfig) -> Result<PathBuf> {
        match self.db_path.as_ref().or(file.database.path.as_ref()) {
            Some(path) => absolutize(path),
            None => find_memo_database(),
        }
    }

    /// Resolved export settings.
    ///
    /// # Errors
    /// Returns `Config` error for an invalid date format.
    pub fn export_config(&self, file: &AppConfig) -> Result<ExportConfig> {
        let export_dir = self
            .export_path
            .clone()
            .or_else(|| file.export.export_dir.clone())
            .unwrap_or_else(AppConfig::default_export_dir);

        ExportConfig::new(
            absolutize(&export_dir)?,
            self.all || file.export.include_all,
            self.date_in_name || file.export.prefix_date,
            self.date_in_name_format
                .clone()
                .unwrap_or_else(|| file.export.date_format.clone()),
            self.zone(file),
        )
        .map(|config| config.with_file_browser(!self.no_finder && file.export.open_file_browser))
    }
}

/// Parse the `list` output format argument.
///
/// # Errors
/// Returns `Config` error for unknown formats.
pub fn parse_format(format: &str) -> Result<OutputFormat> {
    format
        .parse()
        .map_err(|message| AppError::Config { message })
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| AppError::io("Failed to determine current directory", e))?;
    Ok(cwd.join(path))
}
