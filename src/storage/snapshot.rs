//! Persisted ranking of the previous run
//!
//! The snapshot is one small JSON document at a fixed path. It is read at
//! the start of a run and replaced at the end. Only one process is expected
//! to write it at a time; there is no locking.
//!
//! # Example
//!
//! ```no_run
//! use weekly_report::storage::{Snapshot, SnapshotStore};
//!
//! # fn example() -> Result<(), weekly_report::storage::SnapshotError> {
//! let store = SnapshotStore::new("snapshot.json");
//! let previous = store.load()?;
//! let next = Snapshot::new(vec!["https://github.com/a/b".to_string()], Some(120));
//! store.save(&next)?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the snapshot store
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-N ranking of the most recent run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Entity keys, best first
    #[serde(rename = "previousTopN")]
    pub previous_top_n: Vec<String>,

    /// Total entity count at the time of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_total_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(previous_top_n: Vec<String>, previous_total_count: Option<usize>) -> Self {
        Self {
            previous_top_n,
            previous_total_count,
            created_at: Some(Utc::now()),
        }
    }
}

/// Reads and replaces the snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot; a missing file is `Ok(None)`
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No previous snapshot");
                return Ok(None);
            }
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let snapshot: Snapshot =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| SnapshotError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            entries = snapshot.previous_top_n.len(),
            "Snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    /// Replace the snapshot, writing a temporary sibling first
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let write_err = |source: std::io::Error| SnapshotError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let file = File::create(&temp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|e| write_err(e.into()))?;
        writer.flush().map_err(write_err)?;

        fs::rename(&temp_path, &self.path).map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), "Snapshot saved");
        Ok(())
    }
}
