//! Infrastructure layer - external adapters (database, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod file_browser;
pub mod materializer;
pub mod memo_db;
pub mod memo_paths;

pub use config::{ensure_config_exists, load_config};
pub use file_browser::open_directory;
pub use materializer::{materialize, prepare_export_dir};
pub use memo_db::MemoDbReader;
pub use memo_paths::{candidate_databases, check_database_access, find_memo_database};
