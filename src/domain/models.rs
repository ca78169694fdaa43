//! Domain models for Voice Memos data.
//!
//! These models are read-only projections of rows in the recordings
//! database, normalized across its schema generations.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::{AppError, Result};
use super::timestamp;

/// Which physical table a recording was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// `ZCLOUDRECORDING`, used since iCloud sync was introduced.
    Cloud,
    /// `ZRECORDING`, used by older releases.
    Legacy,
}

impl SchemaVariant {
    /// Name of the backing table.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Cloud => "ZCLOUDRECORDING",
            Self::Legacy => "ZRECORDING",
        }
    }
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloud => write!(f, "cloud"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// A single voice memo.
#[derive(Debug, Clone, Serialize)]
pub struct Recording {
    /// Primary key within the database.
    pub id: i64,
    /// Containing folder, if filed.
    pub folder_id: Option<i64>,
    /// Recording time in vendor-epoch seconds.
    pub recorded_at: f64,
    /// Length in seconds, informational only.
    pub duration_seconds: Option<f64>,
    /// Title from the current schema generation.
    pub label_primary: Option<String>,
    /// Title from the older schema generation.
    pub label_legacy: Option<String>,
    /// Audio path relative to the database directory.
    pub relative_audio_path: Option<String>,
    /// Stable UUID-like identifier.
    pub unique_id: Option<String>,
    /// Table the row was read from.
    pub variant: SchemaVariant,
}

impl Recording {
    /// Recording time as a calendar timestamp.
    #[must_use]
    pub fn recorded_datetime(&self) -> Option<DateTime<Utc>> {
        timestamp::to_datetime(self.recorded_at)
    }

    /// Absolute path of the backing audio file, if the row names one.
    ///
    /// # Errors
    /// Returns `SourceAssetMissing` if the stored path is absolute or
    /// climbs out of `db_dir`.
    pub fn source_path(&self, db_dir: &Path) -> Result<Option<PathBuf>> {
        let Some(rel) = self
            .relative_audio_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        else {
            return Ok(None);
        };

        let rel = Path::new(rel);
        let contained = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(AppError::SourceAssetMissing {
                path: rel.to_path_buf(),
            });
        }

        Ok(Some(db_dir.join(rel)))
    }

    /// Extension of the backing audio file including the leading dot.
    #[must_use]
    pub fn audio_extension(&self) -> String {
        self.relative_audio_path
            .as_deref()
            .and_then(|p| Path::new(p).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}

/// A user-created folder grouping recordings.
#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    /// Primary key within the database.
    pub id: i64,
    /// Display name; absent on some versions or when encrypted.
    pub name: Option<String>,
    /// Sort position in the app's sidebar.
    pub display_rank: Option<i64>,
    /// Number of recordings the app reports for this folder.
    pub recording_count: Option<i64>,
}

/// Operator decision for one pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Export this record.
    Include,
    /// Leave this record out.
    Skip,
    /// Leave this and every remaining record out.
    AbortRemaining,
}

/// Selection state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    /// Not yet decided.
    Pending,
    /// Will be exported.
    Included,
    /// Will not be exported.
    Skipped,
}

impl SelectionState {
    /// Whether the state can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Final status of one record in an export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Written to the given path.
    Exported(PathBuf),
    /// Left out by the operator.
    Skipped,
    /// Could not be exported; the reason is kept for the report.
    Failed(String),
}

/// Summary counts for an export run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportStats {
    /// Records read from the database.
    pub total: usize,
    /// Files written.
    pub exported: usize,
    /// Records the operator left out.
    pub skipped: usize,
    /// Records that failed per-record.
    pub errored: usize,
}

impl ExportStats {
    /// Tallies one record outcome.
    pub fn record(&mut self, status: &RecordStatus) {
        self.total += 1;
        match status {
            RecordStatus::Exported(_) => self.exported += 1,
            RecordStatus::Skipped => self.skipped += 1,
            RecordStatus::Failed(_) => self.errored += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(path: Option<&str>) -> Recording {
        Recording {
            id: 1,
            folder_id: None,
            recorded_at: 0.0,
            duration_seconds: None,
            label_primary: None,
            label_legacy: None,
            relative_audio_path: path.map(String::from),
            unique_id: None,
            variant: SchemaVariant::Cloud,
        }
    }

    #[test]
    fn test_audio_extension() {
        assert_eq!(recording(Some("20230308 202640.m4a")).audio_extension(), ".m4a");
        assert_eq!(recording(Some("noext")).audio_extension(), "");
        assert_eq!(recording(None).audio_extension(), "");
    }

    #[test]
    fn test_source_path_resolves_against_db_dir() {
        let rec = recording(Some("a.m4a"));
        assert_eq!(
            rec.source_path(Path::new("/data/Recordings")).unwrap(),
            Some(PathBuf::from("/data/Recordings/a.m4a"))
        );
        assert_eq!(
            recording(Some("./sub/b.m4a"))
                .source_path(Path::new("/data"))
                .unwrap(),
            Some(PathBuf::from("/data/./sub/b.m4a"))
        );
        assert_eq!(recording(Some("  ")).source_path(Path::new("/x")).unwrap(), None);
        assert_eq!(recording(None).source_path(Path::new("/x")).unwrap(), None);
    }

    #[test]
    fn test_source_path_stays_inside_db_dir() {
        for escaping in ["/etc/passwd", "../other.m4a", "sub/../../x.m4a"] {
            let result = recording(Some(escaping)).source_path(Path::new("/data/Recordings"));
            assert!(
                matches!(result, Err(AppError::SourceAssetMissing { .. })),
                "{escaping} should be rejected"
            );
        }
    }

    #[test]
    fn test_stats_tally() {
        let mut stats = ExportStats::default();
        stats.record(&RecordStatus::Exported(PathBuf::from("a")));
        stats.record(&RecordStatus::Skipped);
        stats.record(&RecordStatus::Failed("gone".into()));
        assert_eq!(stats.total, 3);
        assert_eq!(stats.exported, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errored, 1);
    }

    #[test]
    fn test_selection_terminal_states() {
        assert!(!SelectionState::Pending.is_terminal());
        assert!(SelectionState::Included.is_terminal());
        assert!(SelectionState::Skipped.is_terminal());
    }
}
