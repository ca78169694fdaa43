//! Output formatting for listings, progress lines and run summaries.

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::domain::{DisplayZone, ExportStats, RecordStatus};

/// Date format shown to the operator.
const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Output format options for `list`.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// JSON format for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: table, json")),
        }
    }
}

/// One recording as shown by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingRow {
    pub id: i64,
    pub recorded_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub folder: Option<String>,
    pub label: String,
    pub audio_path: Option<String>,
}

/// Formats seconds as `HH:MM:SS.cc`.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.trunc() as u64;
    let centis = ((seconds - seconds.trunc()) * 100.0) as u64;
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        whole / 3600,
        (whole % 3600) / 60,
        whole % 60,
        centis.min(99)
    )
}

/// Formats a recording time for display in the given zone.
#[must_use]
pub fn format_recorded_at(dt: DateTime<Utc>, zone: DisplayZone) -> String {
    zone.format(dt, DISPLAY_DATE_FORMAT)
        .unwrap_or_else(|| dt.to_rfc3339())
}

/// Formats the status line printed after each record.
#[must_use]
pub fn format_status_line(label: &str, status: &RecordStatus) -> String {
    match status {
        RecordStatus::Exported(path) => {
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());
            format!("{} {} → {}", "Exported!".green().bold(), label, name.cyan())
        }
        RecordStatus::Skipped => format!("{} {}", "Skipped".yellow(), label),
        RecordStatus::Failed(reason) => {
            format!("{} {} ({})", "No File".red().bold(), label, reason.dimmed())
        }
    }
}

/// Formats a table listing of recordings.
#[must_use]
pub fn format_recordings_table(rows: &[RecordingRow], zone: DisplayZone) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Date", "Duration", "Folder", "Label", "Audio"]);

    for row in rows {
        let date = row
            .recorded_at
            .map_or_else(|| "-".to_string(), |dt| format_recorded_at(dt, zone));
        let duration = row
            .duration_seconds
            .map_or_else(|| "-".to_string(), format_duration);
        let folder = row.folder.clone().unwrap_or_else(|| "-".to_string());
        let audio = row
            .audio_path
            .as_deref()
            .map_or_else(|| "No File".to_string(), |p| truncate_start(p, 32));

        table.add_row(vec![
            date,
            duration,
            truncate(&folder, 20),
            truncate(&row.label, 40),
            audio,
        ]);
    }

    table.to_string()
}

/// Formats recordings as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_recordings_json(rows: &[RecordingRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

/// Formats export statistics for display.
#[must_use]
pub fn format_summary(stats: &ExportStats, export_dir: &std::path::Path) -> String {
    format!(
        "{}\n  Recordings: {}\n  Exported: {}\n  Skipped: {}\n  Errored: {}\n  Export folder: {}",
        "📊 Summary".bold(),
        stats.total.to_string().cyan(),
        stats.exported.to_string().green(),
        stats.skipped.to_string().yellow(),
        stats.errored.to_string().red(),
        export_dir.display()
    )
}

/// Truncates a string to max characters with ellipsis.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Keeps the end of a path-like string, which is the informative part.
fn truncate_start(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().skip(count - max_chars.saturating_sub(3)).collect();
        format!("...{kept}")
    }
}
