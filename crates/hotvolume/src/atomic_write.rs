//! Crash-safe file replacement.

use crate::{AppError, AppResult};

use std::{fs, io::Write, panic::Location, path::Path};

use error_location::ErrorLocation;
use tracing::debug;

/// Replace `path` with `contents`.
///
/// Writes to a temporary sibling, syncs it, then renames over the target so
/// readers see either the old file or the new one, never a partial write.
#[track_caller]
pub(crate) fn write_atomic(path: &Path, contents: &str) -> AppResult<()> {
    let fail = |reason: String| AppError::PersistenceFailed {
        path: path.to_path_buf(),
        reason,
        location: ErrorLocation::from(Location::caller()),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .map_err(|e| fail(format!("Failed to create directory {parent:?}: {e}")))?;
        debug!(dir = ?parent, "Created directory");
    }

    let temp_path = path.with_extension("toml.tmp");

    let mut temp_file = fs::File::create(&temp_path)
        .map_err(|e| fail(format!("Failed to create temp file: {e}")))?;

    temp_file
        .write_all(contents.as_bytes())
        .map_err(|e| fail(format!("Failed to write temp file: {e}")))?;

    temp_file
        .sync_all()
        .map_err(|e| fail(format!("Failed to sync temp file: {e}")))?;

    fs::rename(&temp_path, path)
        .map_err(|e| fail(format!("Failed to rename temp file to final: {e}")))?;

    Ok(())
}
