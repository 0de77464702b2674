//! Single-file state: comparison and atomic replacement.
//!
//! A file is rewritten only when its content or permission bits differ from
//! the desired state. Writes go to a temporary file in the same directory
//! which is synced, given its final mode, and renamed over the target, so
//! the target path never exposes partial content.

use std::fs::{self, Permissions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::debug;

use confine_contracts::{
    error::{ConfineError, ConfineResult},
    state::FileState,
};

/// Permission bits compared against the desired mode.
const MODE_MASK: u32 = 0o7777;

/// Prefix of temporary files; a leading dot keeps them out of tag globs.
const TEMP_PREFIX: &str = ".confine-";

fn io_error(path: &Path, source: std::io::Error) -> ConfineError {
    ConfineError::Reconciliation {
        path: path.to_path_buf(),
        source,
    }
}

/// Whether `path` already holds exactly `state`.
///
/// A missing path, a non-file, a different mode, or different content all
/// count as "differs".
pub fn matches_state(path: &Path, state: &FileState) -> ConfineResult<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(io_error(path, e)),
    };
    if !meta.is_file() {
        return Ok(false);
    }
    if meta.permissions().mode() & MODE_MASK != state.mode & MODE_MASK {
        return Ok(false);
    }
    if meta.len() != state.content.len() as u64 {
        return Ok(false);
    }
    let current = fs::read(path).map_err(|e| io_error(path, e))?;
    Ok(current == state.content)
}

/// Make `path` hold `state`. Returns `true` if the file was written.
///
/// The parent directory must exist.
pub fn ensure_file_state(path: &Path, state: &FileState) -> ConfineResult<bool> {
    if matches_state(path, state)? {
        return Ok(false);
    }
    write_atomic(path, state)?;
    debug!(
        path = %path.display(),
        mode = %format!("{:o}", state.mode),
        sha256 = %state.digest(),
        "file written"
    );
    Ok(true)
}

/// Replace `path` with `state` via create-temp-then-rename.
///
/// The temporary file is removed if anything fails before the rename.
pub fn write_atomic(path: &Path, state: &FileState) -> ConfineResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| io_error(dir, e))?;

    temp.write_all(&state.content)
        .map_err(|e| io_error(temp.path(), e))?;
    temp.as_file()
        .set_permissions(Permissions::from_mode(state.mode & MODE_MASK))
        .map_err(|e| io_error(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| io_error(temp.path(), e))?;

    temp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}
