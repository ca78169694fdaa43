//! Domain-level error types for voice-memo-export.
//!
//! All errors are typed with `thiserror`. Each variant knows whether it
//! aborts the whole run or only the record being processed.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The recordings database could not be opened or is locked.
    #[error("Database unavailable at {path}: {message}")]
    DatabaseUnavailable { path: PathBuf, message: String },

    /// Neither the modern nor the legacy recordings table exists.
    #[error("No recordings table found in {path}")]
    SchemaNotFound { path: PathBuf },

    /// The audio file backing a recording is missing or unreadable.
    #[error("Source audio missing: {path}")]
    SourceAssetMissing { path: PathBuf },

    /// The export directory cannot be created or written to.
    #[error("Export directory not writable: {path}: {message}")]
    ExportDirectory { path: PathBuf, message: String },

    /// A file appeared at the planned destination before it could be claimed.
    #[error("Destination already exists: {path}")]
    DestinationOccupied { path: PathBuf },

    /// Failed to query the database.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Reading the operator's decision failed.
    #[error("Interaction error: {message}")]
    Interaction { message: String },

    /// JSON serialization failed.
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a database error from rusqlite error.
    pub fn database(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a database-unavailable error for the given file.
    pub fn unavailable(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::DatabaseUnavailable {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an export-directory error for the given path.
    pub fn export_dir(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::ExportDirectory {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a JSON error.
    pub fn json(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Whether this error aborts the run rather than a single record.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::SourceAssetMissing { .. } | Self::DestinationOccupied { .. }
        )
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
