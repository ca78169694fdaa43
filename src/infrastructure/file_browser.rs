//! Opens a directory in the platform file browser.

use std::path::Path;
use std::process::{Command, Stdio};

/// Command used to reveal a directory on this platform.
const fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}

/// Launches the file browser without waiting for it.
///
/// Failures are logged, never returned.
pub fn open_directory(dir: &Path) {
    let program = opener();
    let spawned = Command::new(program)
        .arg(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(_) => tracing::debug!(program, dir = %dir.display(), "Opened file browser"),
        Err(e) => tracing::warn!(program, "Could not open file browser: {}", e),
    }
}
