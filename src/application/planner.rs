//! Destination planning for exported recordings.
//!
//! Builds `<date prefix><label><ext>` and, when that name is taken,
//! appends ` (2)`, ` (3)`, ... before the extension.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, ExportConfig, Recording, Result};

use super::label::replace_illegal;

/// Snapshot of file names present in the export directory.
///
/// Names are compared case-insensitively, as on the default macOS volume.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    dir: PathBuf,
    names: HashSet<String>,
}

impl DirectoryListing {
    /// Reads the current contents of `dir`.
    ///
    /// # Errors
    /// Returns `ExportDirectory` error if the directory cannot be listed.
    pub fn read(dir: &Path) -> Result<Self> {
        let mut listing = Self {
            dir: dir.to_path_buf(),
            names: HashSet::new(),
        };
        listing.refresh()?;
        Ok(listing)
    }

    /// Re-reads the directory to pick up files written since the last read.
    ///
    /// # Errors
    /// Returns `ExportDirectory` error if the directory cannot be listed.
    pub fn refresh(&mut self) -> Result<()> {
        let entries = fs::read_dir(&self.dir).map_err(|e| AppError::export_dir(&self.dir, e))?;

        self.names = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| fold_case(&entry.file_name().to_string_lossy()))
            .collect();

        Ok(())
    }

    /// Whether a file with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&fold_case(name))
    }

    /// Records a name as taken without touching the disk.
    pub fn insert(&mut self, name: &str) {
        self.names.insert(fold_case(name));
    }

    /// Directory this listing describes.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Plans collision-free destination paths.
#[derive(Debug, Clone, Copy)]
pub struct ExportPlanner<'a> {
    config: &'a ExportConfig,
}

impl<'a> ExportPlanner<'a> {
    /// Create a planner for the given export settings.
    #[must_use]
    pub const fn new(config: &'a ExportConfig) -> Self {
        Self { config }
    }

    /// Builds the file name stem: optional date prefix plus label.
    #[must_use]
    pub fn file_stem(&self, recording: &Recording, label: &str) -> String {
        if !self.config.prefix_date {
            return label.to_string();
        }

        let prefix = recording
            .recorded_datetime()
            .and_then(|dt| self.config.timezone.format(dt, &self.config.date_format));

        match prefix {
            Some(prefix) => format!("{}{label}", replace_illegal(&prefix)),
            None => {
                tracing::warn!(id = recording.id, "Could not render date prefix");
                label.to_string()
            }
        }
    }

    /// Picks a destination in the listing's directory that is not taken.
    #[must_use]
    pub fn plan(&self, recording: &Recording, label: &str, listing: &DirectoryListing) -> PathBuf {
        let stem = self.file_stem(recording, label);
        let ext = recording.audio_extension();

        let mut name = format!("{stem}{ext}");
        let mut counter = 2_u32;
        while listing.contains(&name) {
            name = format!("{stem} ({counter}){ext}");
            counter += 1;
        }

        tracing::debug!(id = recording.id, file = %name, "Planned destination");
        listing.dir().join(name)
    }
}
