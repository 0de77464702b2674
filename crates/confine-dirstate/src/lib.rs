//! # confine-dirstate
//!
//! Declarative synchronization of generated profile files onto disk.
//!
//! ## Overview
//!
//! A backend describes the files one snap should have as a
//! [`DesiredState`](confine_contracts::state::DesiredState) and a glob that
//! covers every file the snap may own. [`ensure_dir_state`] then writes what
//! differs, deletes what is no longer wanted, and reports both. Unchanged
//! files are never rewritten, so loaders watching the directory are not
//! triggered needlessly.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confine_dirstate::ensure_dir_state;
//!
//! let changes = ensure_dir_state(Path::new("/var/lib/snapd/seccomp/profiles"), "snap.foo.*", &desired)?;
//! println!("changed {:?}, removed {:?}", changes.changed, changes.removed);
//! ```

pub mod dir;
pub mod file;

pub use dir::{compile_glob, ensure_dir, ensure_dir_state, matching_files};
pub use file::{ensure_file_state, matches_state, write_atomic};

// ── Tests ─────────────────────────────────────────────────────────────────────
