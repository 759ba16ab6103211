use std::path::{Path, PathBuf};

use compio::fs;
use snafu::ResultExt;
use tracing::debug;

use crate::fs::TreeEngine;
use crate::snapshot::codec::{self, ReadSnafu, SnapshotError, WriteSnafu};

/// On-disk location of the snapshot blob.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted tree; `Ok(None)` when no snapshot exists yet.
    pub async fn load(&self) -> Result<Option<TreeEngine>, SnapshotError> {
        if !self.path.exists() {
            debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        }
        let bytes = fs::read(&self.path).await.context(ReadSnafu {
            path: self.path.display().to_string(),
        })?;
        debug!("Read {} snapshot bytes from {}", bytes.len(), self.path.display());
        codec::decode(&bytes).map(Some)
    }

    /// Writes an encoded blob, creating the parent directory if needed.
    pub async fn save(&self, blob: Vec<u8>) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent).await;
            }
        }
        let res = fs::write(&self.path, blob).await;
        res.0.context(WriteSnafu {
            path: self.path.display().to_string(),
        })?;
        debug!("Snapshot written to {}", self.path.display());
        Ok(())
    }
}
