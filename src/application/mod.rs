//! Application layer - use cases and orchestration.
//!
//! This layer contains the export pipeline: label resolution,
//! selection, destination planning, and output formatting.

pub mod catalog;
pub mod exporter;
pub mod formatter;
pub mod label;
pub mod planner;
pub mod selection;

pub use catalog::list_recordings;
pub use exporter::ExportService;
pub use formatter::{
    format_recordings_json, format_recordings_table, format_status_line, format_summary,
    OutputFormat,
};
pub use selection::{PromptDecisions, SelectionController};
