//! Voice Memos path discovery.
//!
//! Handles locating the recordings database across macOS releases.

use std::path::{Path, PathBuf};

use crate::domain::{AppError, Result};

/// Known database locations relative to the home directory, newest first.
const DB_CANDIDATES: &[&str] = &[
    // macOS 14 (Sonoma) and later
    "Library/Group Containers/group.com.apple.VoiceMemos.shared/Recordings/CloudRecordings.db",
    // Earlier releases
    "Library/Application Support/com.apple.voicememos/Recordings/CloudRecordings.db",
];

/// All candidate database paths for the current user.
///
/// # Errors
/// Returns error if the home directory cannot be determined.
pub fn candidate_databases() -> Result<Vec<PathBuf>> {
    let home = dirs::home_dir().ok_or_else(|| AppError::Config {
        message: "Could not determine home directory".into(),
    })?;

    Ok(DB_CANDIDATES.iter().map(|rel| home.join(rel)).collect())
}

/// Picks the first existing candidate, or the newest location if none exist.
///
/// # Errors
/// Returns error if the home directory cannot be determined.
pub fn find_memo_database() -> Result<PathBuf> {
    let candidates = candidate_databases()?;
    let found = pick_existing(&candidates);

    tracing::debug!(path = %found.display(), "Resolved recordings database");
    Ok(found)
}

fn pick_existing(candidates: &[PathBuf]) -> PathBuf {
    candidates
        .iter()
        .find(|p| p.is_file())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_default()
}

/// Verifies the database file can be read before opening it.
///
/// # Errors
/// Returns `DatabaseUnavailable` with guidance about Full Disk Access.
pub fn check_database_access(path: &Path) -> Result<()> {
    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Err(AppError::unavailable(
            path,
            "permission denied. Grant your terminal Full Disk Access \
             (System Settings > Privacy & Security > Full Disk Access), or copy the \
             Recordings folder elsewhere and pass --db-path pointing to the copy",
        )),
        Err(e) => Err(AppError::unavailable(path, e)),
    }
}
