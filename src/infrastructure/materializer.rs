//! Writes exported audio files.
//!
//! Bytes go to a temporary file in the export directory, get stamped with
//! the recording time and are then renamed into place. The rename never
//! replaces an existing file.

use std::fs::{File, FileTimes};
use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::domain::{timestamp, AppError, Result};

const TEMP_PREFIX: &str = ".voice-memo-";
const TEMP_SUFFIX: &str = ".part";
const COPY_BUF_SIZE: usize = 64 * 1024;

/// Copies a recording's audio to its planned destination.
///
/// # Errors
/// - `SourceAssetMissing` if `source` cannot be opened as a file or read.
/// - `DestinationOccupied` if `dest` appeared before the rename.
/// - `ExportDirectory` if the temporary file cannot be written or renamed.
pub fn materialize(source: &Path, dest: &Path, recorded_at: f64) -> Result<()> {
    let mut input = open_source(source)?;

    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| AppError::export_dir(dir, e))?;

    let bytes = copy_source(&mut input, source, tmp.as_file_mut(), dir)?;
    tmp.flush().map_err(|e| AppError::export_dir(dir, e))?;

    stamp(&tmp, recorded_at).map_err(|e| AppError::export_dir(dir, e))?;

    tmp.persist_noclobber(dest).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            AppError::DestinationOccupied {
                path: dest.to_path_buf(),
            }
        } else {
            AppError::export_dir(dir, e.error)
        }
    })?;

    tracing::debug!(dest = %dest.display(), bytes, "Materialized recording");
    Ok(())
}

/// Checks that files can be created in `dir`, creating it if needed.
///
/// # Errors
/// Returns `ExportDirectory` error if the directory is not usable.
pub fn prepare_export_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::export_dir(dir, e))?;

    Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| AppError::export_dir(dir, e))?;

    Ok(())
}

fn open_source(source: &Path) -> Result<File> {
    let missing = || AppError::SourceAssetMissing {
        path: source.to_path_buf(),
    };

    let file = File::open(source).map_err(|e| {
        tracing::debug!(path = %source.display(), "Cannot open source: {}", e);
        missing()
    })?;

    match file.metadata() {
        Ok(meta) if meta.is_file() => Ok(file),
        _ => Err(missing()),
    }
}

/// Copies `input` into `out`, keeping read and write failures apart.
fn copy_source(input: &mut File, source: &Path, out: &mut File, dir: &Path) -> Result<u64> {
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut total = 0u64;

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!(path = %source.display(), "Cannot read source: {}", e);
                return Err(AppError::SourceAssetMissing {
                    path: source.to_path_buf(),
                });
            }
        };

        out.write_all(&buf[..n])
            .map_err(|e| AppError::export_dir(dir, e))?;
        total += n as u64;
    }
}

/// Sets access, modification and (where supported) creation time.
fn stamp(tmp: &NamedTempFile, recorded_at: f64) -> io::Result<()> {
    let Some(time) = timestamp::to_system_time(recorded_at) else {
        tracing::warn!(recorded_at, "Recording time out of range, keeping current time");
        return Ok(());
    };

    let times = FileTimes::new().set_accessed(time).set_modified(time);

    #[cfg(target_os = "macos")]
    let times = {
        use std::os::macos::fs::FileTimesExt;
        times.set_created(time)
    };

    #[cfg(windows)]
    let times = {
        use std::os::windows::fs::FileTimesExt;
        times.set_created(time)
    };

    tmp.as_file().set_times(times)
}
