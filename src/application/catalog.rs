//! Read-only catalog of recordings for the `list` command.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{DisplayZone, Result};
use crate::infrastructure::MemoDbReader;

use super::formatter::RecordingRow;
use super::label::LabelResolver;

/// Reads every recording with its resolved label and folder name.
///
/// # Errors
/// Returns error if the database cannot be opened or queried.
pub fn list_recordings(db_path: &Path, zone: DisplayZone) -> Result<Vec<RecordingRow>> {
    let reader = MemoDbReader::open(db_path)?;

    let folders: HashMap<i64, String> = reader
        .folders()?
        .into_iter()
        .filter_map(|f| f.name.map(|name| (f.id, name)))
        .collect();

    let resolver = LabelResolver::new(zone);
    let mut rows = Vec::new();

    let mut query = reader.recordings()?;
    for item in query.iter()? {
        let rec = item?;
        rows.push(RecordingRow {
            id: rec.id,
            recorded_at: rec.recorded_datetime(),
            duration_seconds: rec.duration_seconds,
            folder: rec.folder_id.and_then(|id| folders.get(&id).cloned()),
            label: resolver.resolve(&rec).text,
            audio_path: rec.relative_audio_path.clone(),
        });
    }

    tracing::info!("Listed {} recordings", rows.len());
    Ok(rows)
}
