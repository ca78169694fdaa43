//! Export pipeline.
//!
//! Reads recordings in date order and, for each one, resolves its label,
//! asks the selection controller, plans a destination and writes the file.
//! Per-record failures are reported and the run continues; database and
//! export-directory failures end the run.

use std::path::{Path, PathBuf};

use crate::domain::{
    AppError, ExportConfig, ExportStats, RecordStatus, Recording, Result, SelectionState,
};
use crate::infrastructure::{materialize, prepare_export_dir, MemoDbReader};

use super::label::LabelResolver;
use super::planner::{DirectoryListing, ExportPlanner};
use super::selection::{PendingRecord, SelectionController};

/// Attempts to claim a free name when files appear under our feet.
const MAX_CLAIM_ATTEMPTS: usize = 8;

/// Outcome of one record, in read order.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub id: i64,
    pub label: String,
    pub status: RecordStatus,
}

/// Result of an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub stats: ExportStats,
    pub outcomes: Vec<RecordOutcome>,
    /// Whether the operator stopped the run early.
    pub aborted: bool,
}

/// Runs exports with a fixed configuration.
pub struct ExportService {
    config: ExportConfig,
}

impl ExportService {
    /// Create a new export service.
    #[must_use]
    pub const fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// The configuration this service runs with.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports recordings from the database at `db_path`.
    ///
    /// `on_record` is called after each record is settled.
    ///
    /// # Errors
    /// Returns error if the database cannot be read or the export directory
    /// cannot be written. Files already written stay in place.
    pub fn run(
        &self,
        db_path: &Path,
        selection: &mut SelectionController,
        mut on_record: impl FnMut(&RecordOutcome),
    ) -> Result<ExportReport> {
        let reader = MemoDbReader::open(db_path)?;
        let export_dir = &self.config.export_directory;
        prepare_export_dir(export_dir)?;

        tracing::info!(
            db = %reader.path().display(),
            variant = %reader.variant(),
            export_dir = %export_dir.display(),
            "Starting export"
        );

        let resolver = LabelResolver::new(self.config.timezone);
        let planner = ExportPlanner::new(&self.config);
        let mut listing = DirectoryListing::read(export_dir)?;
        let mut report = ExportReport::default();

        let mut query = reader.recordings()?;
        for item in query.iter()? {
            let recording = item?;
            let label = resolver.resolve(&recording).text;

            let status = self.process(
                &recording,
                &label,
                reader.db_dir(),
                selection,
                &planner,
                &mut listing,
            )?;

            report.stats.record(&status);
            let outcome = RecordOutcome {
                id: recording.id,
                label,
                status,
            };
            on_record(&outcome);
            report.outcomes.push(outcome);
        }

        report.aborted = selection.is_aborted();
        tracing::debug!(decided = selection.outcomes().len(), "Selection complete");

        tracing::info!(
            exported = report.stats.exported,
            skipped = report.stats.skipped,
            errored = report.stats.errored,
            "Export finished"
        );

        Ok(report)
    }

    /// Settles one record. Only fatal errors are returned as `Err`.
    fn process(
        &self,
        recording: &Recording,
        label: &str,
        db_dir: &Path,
        selection: &mut SelectionController,
        planner: &ExportPlanner<'_>,
        listing: &mut DirectoryListing,
    ) -> Result<RecordStatus> {
        let pending = PendingRecord { recording, label };
        if selection.is_aborted() {
            selection.select(&pending)?;
            return Ok(RecordStatus::Skipped);
        }

        let source = match recording.source_path(db_dir) {
            Ok(Some(source)) => source,
            Ok(None) => {
                tracing::warn!(id = recording.id, "Recording has no audio path");
                return Ok(RecordStatus::Failed("no audio file recorded".into()));
            }
            Err(e) => {
                tracing::warn!(id = recording.id, "{}", e);
                return Ok(RecordStatus::Failed(e.to_string()));
            }
        };

        if selection.select(&pending)? == SelectionState::Skipped {
            return Ok(RecordStatus::Skipped);
        }

        match self.claim_and_write(recording, label, &source, planner, listing) {
            Ok(dest) => Ok(RecordStatus::Exported(dest)),
            Err(e) if !e.is_fatal() => {
                tracing::warn!(id = recording.id, "{}", e);
                Ok(RecordStatus::Failed(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn claim_and_write(
        &self,
        recording: &Recording,
        label: &str,
        source: &Path,
        planner: &ExportPlanner<'_>,
        listing: &mut DirectoryListing,
    ) -> Result<PathBuf> {
        let mut last_err = None;

        for _ in 0..MAX_CLAIM_ATTEMPTS {
            listing.refresh()?;
            let dest = planner.plan(recording, label, listing);

            match materialize(source, &dest, recording.recorded_at) {
                Ok(()) => {
                    if let Some(name) = dest.file_name() {
                        listing.insert(&name.to_string_lossy());
                    }
                    return Ok(dest);
                }
                Err(AppError::DestinationOccupied { path }) => {
                    tracing::debug!(path = %path.display(), "Name taken during write, re-planning");
                    last_err = Some(AppError::DestinationOccupied { path });
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::export_dir(
            &self.config.export_directory,
            "no free file name",
        )))
    }
}
