//! Directory reconciliation scoped by a glob.
//!
//! `ensure_dir_state` makes the files in `dir` that match `glob` exactly the
//! desired set:
//!
//! 1. every desired file that is missing or differs is written atomically
//! 2. every matching file that is not desired is deleted
//! 3. files that already match are left alone
//!
//! Files outside the glob are never touched. There is no cross-file
//! transaction: the first failure aborts the call and earlier changes stay.

use std::fs::{self, DirBuilder};
use std::io::ErrorKind;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, info};

use confine_contracts::{
    error::{ConfineError, ConfineResult},
    state::{ChangeSet, DesiredState},
};

use crate::file::ensure_file_state;

/// Mode of directories created on demand.
pub const DIR_MODE: u32 = 0o755;

/// Compile a bare file-name glob; path separators are not allowed.
pub fn compile_glob(glob: &str) -> ConfineResult<GlobMatcher> {
    if glob.is_empty() || glob.contains('/') {
        return Err(ConfineError::InvalidGlob {
            glob: glob.to_string(),
            reason: "must be a non-empty file name pattern".to_string(),
        });
    }
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| ConfineError::InvalidGlob {
            glob: glob.to_string(),
            reason: e.to_string(),
        })
}

/// Names of the entries in `dir` that match `matcher`, sorted.
///
/// Directories are skipped. A missing `dir` has no entries.
pub fn matching_files(dir: &Path, matcher: &GlobMatcher) -> ConfineResult<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(reconcile_error(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| reconcile_error(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !matcher.is_match(&name) {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| reconcile_error(&entry.path(), e))?;
        if file_type.is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn reconcile_error(path: &Path, source: std::io::Error) -> ConfineError {
    ConfineError::Reconciliation {
        path: path.to_path_buf(),
        source,
    }
}

/// Create `dir` and any missing parents with `DIR_MODE`.
pub fn ensure_dir(dir: &Path) -> ConfineResult<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
        .map_err(|e| reconcile_error(dir, e))
}

/// Synchronize the files of `dir` matching `glob` with `desired`.
///
/// Every desired name must be a bare file name matching `glob`; this is
/// checked before anything is written. `dir` is created when there is
/// something to write. Passing an empty `desired` removes every match.
pub fn ensure_dir_state(
    dir: &Path,
    glob: &str,
    desired: &DesiredState,
) -> ConfineResult<ChangeSet> {
    let matcher = compile_glob(glob)?;
    for name in desired.keys() {
        if name.is_empty() || name.contains('/') || !matcher.is_match(name) {
            return Err(ConfineError::FileOutsideGlob {
                name: name.clone(),
                glob: glob.to_string(),
            });
        }
    }

    let mut changes = ChangeSet::default();

    if !desired.is_empty() {
        ensure_dir(dir)?;
    }
    for (name, state) in desired {
        if ensure_file_state(&dir.join(name), state)? {
            changes.changed.push(name.clone());
        }
    }

    for name in matching_files(dir, &matcher)? {
        if desired.contains_key(&name) {
            continue;
        }
        let path = dir.join(&name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            // Gone already; nothing left to remove.
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(reconcile_error(&path, e)),
        }
        debug!(path = %path.display(), "file removed");
        changes.removed.push(name);
    }

    if changes.is_empty() {
        debug!(dir = %dir.display(), glob = %glob, "directory already up to date");
    } else {
        info!(
            dir = %dir.display(),
            glob = %glob,
            changed = changes.changed.len(),
            removed = changes.removed.len(),
            "directory reconciled"
        );
    }
    Ok(changes)
}
