//! Domain layer - core types, errors and pure conversions.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (DB, IO, etc.).

pub mod config;
pub mod error;
pub mod models;
pub mod timestamp;

pub use config::{AppConfig, ExportConfig};
pub use error::{AppError, Result};
pub use models::{
    Decision, ExportStats, Folder, RecordStatus, Recording, SchemaVariant, SelectionState,
};
pub use timestamp::DisplayZone;
