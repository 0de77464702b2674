//! Desired on-disk state and the changes made to reach it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The content and permission bits one file should have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    pub content: Vec<u8>,
    /// Permission bits, e.g. `0o644`.
    pub mode: u32,
}

impl FileState {
    pub fn new(content: impl Into<Vec<u8>>, mode: u32) -> Self {
        Self {
            content: content.into(),
            mode,
        }
    }

    /// Lowercase hex SHA-256 of `content`.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.content))
    }
}

/// Desired files keyed by file name (no directory components).
pub type DesiredState = BTreeMap<String, FileState>;

/// File names written and removed by one reconciliation, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}
