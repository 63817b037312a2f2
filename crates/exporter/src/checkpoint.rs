//! Durable checkpoint storage for the host side of the export contract.
//!
//! The exporter only reports positions. Persisting them so that a restarted
//! host can resume after the last acknowledged record is the job of a
//! [`CheckpointStore`]. Stores refuse to move a checkpoint backwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use exporter_core::{Error, Result};

use crate::record::Position;
use crate::reporter::CheckpointReporter;

/// The highest position acknowledged by one exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Exporter the checkpoint belongs to.
    pub exporter_id: String,
    /// Highest acknowledged position.
    pub position: Position,
    /// When the checkpoint was last advanced.
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time.
    pub fn new(exporter_id: impl Into<String>, position: Position) -> Self {
        Self {
            exporter_id: exporter_id.into(),
            position,
            updated_at: Utc::now(),
        }
    }
}

/// Trait for checkpoint storage backends.
pub trait CheckpointStore: Send + Sync {
    /// Load the persisted checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns `Error::CheckpointStore` if stored data is unreadable.
    fn load(&self) -> Result<Option<Checkpoint>>;

    /// Persist a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `Error::CheckpointStore` if the write fails or the new
    /// position is lower than the stored one.
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Forget the persisted checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `Error::CheckpointStore` if the stored data cannot be removed.
    fn clear(&self) -> Result<()>;
}

fn ensure_forward(stored: Option<&Checkpoint>, next: &Checkpoint) -> Result<()> {
    match stored {
        Some(current) if next.position < current.position => Err(Error::checkpoint_store(
            "save",
            format!(
                "checkpoint cannot move backwards from {} to {}",
                current.position, next.position
            ),
        )),
        _ => Ok(()),
    }
}

/// In-memory checkpoint store for tests.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    checkpoint: Mutex<Option<Checkpoint>>,
}

impl InMemoryCheckpointStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a checkpoint.
    #[must_use]
    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            checkpoint: Mutex::new(Some(checkpoint)),
        }
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoint.lock().clone())
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let mut stored = self.checkpoint.lock();
        ensure_forward(stored.as_ref(), checkpoint)?;
        *stored = Some(checkpoint.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.checkpoint.lock() = None;
        Ok(())
    }
}

/// Checkpoint store backed by a JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store for the given file path. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the checkpoint file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map_or_else(
            || std::ffi::OsString::from("checkpoint"),
            std::ffi::OsStr::to_os_string,
        );
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::checkpoint_store(
                    "load",
                    format!("{}: {e}", self.path.display()),
                ));
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            Error::checkpoint_store("load", format!("{}: {e}", self.path.display()))
        })
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        ensure_forward(self.load()?.as_ref(), checkpoint)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::checkpoint_store("save", format!("{}: {e}", parent.display()))
            })?;
        }

        let bytes = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| Error::checkpoint_store("save", e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, bytes)
            .map_err(|e| Error::checkpoint_store("save", format!("{}: {e}", temp.display())))?;
        fs::rename(&temp, &self.path).map_err(|e| {
            Error::checkpoint_store("save", format!("{}: {e}", self.path.display()))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            position = %checkpoint.position,
            "Checkpoint persisted"
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::checkpoint_store(
                "clear",
                format!("{}: {e}", self.path.display()),
            )),
        }
    }
}

/// Reporter that persists every acknowledged position through a store.
pub struct StoreReporter<S: CheckpointStore> {
    exporter_id: String,
    store: Arc<S>,
}

impl<S: CheckpointStore> StoreReporter<S> {
    /// Create a reporter writing checkpoints for `exporter_id` into `store`.
    pub fn new(exporter_id: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            exporter_id: exporter_id.into(),
            store,
        }
    }
}

impl<S: CheckpointStore> CheckpointReporter for StoreReporter<S> {
    fn report_checkpoint(&mut self, position: Position) -> Result<()> {
        self.store
            .save(&Checkpoint::new(self.exporter_id.clone(), position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // ==========================================================================
    // InMemoryCheckpointStore
    // ==========================================================================

    #[test]
    fn test_in_memory_store_starts_empty() -> Result<()> {
        let store = InMemoryCheckpointStore::new();
        assert!(store.load()?.is_none());
        Ok(())
    }

    #[test]
    fn test_in_memory_store_saves_and_clears() -> Result<()> {
        let store = InMemoryCheckpointStore::new();
        store.save(&Checkpoint::new("demo", Position::new(5)))?;
        assert_eq!(store.load()?.map(|c| c.position), Some(Position::new(5)));

        store.clear()?;
        assert!(store.load()?.is_none());
        Ok(())
    }

    #[test]
    fn test_in_memory_store_refuses_to_move_backwards() -> Result<()> {
        let store = InMemoryCheckpointStore::with_checkpoint(Checkpoint::new(
            "demo",
            Position::new(10),
        ));

        let result = store.save(&Checkpoint::new("demo", Position::new(9)));

        assert!(matches!(result, Err(Error::CheckpointStore { .. })));
        assert_eq!(store.load()?.map(|c| c.position), Some(Position::new(10)));
        Ok(())
    }

    #[test]
    fn test_saving_same_position_again_is_allowed() -> Result<()> {
        let store = InMemoryCheckpointStore::new();
        store.save(&Checkpoint::new("demo", Position::new(3)))?;
        store.save(&Checkpoint::new("demo", Position::new(3)))?;
        assert_eq!(store.load()?.map(|c| c.position), Some(Position::new(3)));
        Ok(())
    }

    // ==========================================================================
    // FileCheckpointStore
    // ==========================================================================

    #[test]
    fn test_file_store_missing_file_is_none() -> Result<()> {
        let dir = tempdir()?;
        let store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));
        assert!(store.load()?.is_none());
        Ok(())
    }

    #[test]
    fn test_file_store_round_trip_creates_parent_dirs() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("state").join("checkpoint.json");
        let store = FileCheckpointStore::new(&path);

        let checkpoint = Checkpoint::new("demo", Position::new(77));
        store.save(&checkpoint)?;

        assert!(path.exists());
        assert!(!store.temp_path().exists(), "temp file should be renamed away");
        assert_eq!(store.load()?, Some(checkpoint));
        Ok(())
    }

    #[test]
    fn test_file_store_survives_new_instance() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("checkpoint.json");

        FileCheckpointStore::new(&path).save(&Checkpoint::new("demo", Position::new(12)))?;
        let reopened = FileCheckpointStore::new(&path);

        assert_eq!(reopened.load()?.map(|c| c.position), Some(Position::new(12)));
        Ok(())
    }

    #[test]
    fn test_file_store_refuses_to_move_backwards() -> Result<()> {
        let dir = tempdir()?;
        let store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));
        store.save(&Checkpoint::new("demo", Position::new(20)))?;

        let result = store.save(&Checkpoint::new("demo", Position::new(19)));

        assert!(matches!(result, Err(Error::CheckpointStore { .. })));
        assert_eq!(store.load()?.map(|c| c.position), Some(Position::new(20)));
        Ok(())
    }

    #[test]
    fn test_file_store_corrupt_file_is_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("checkpoint.json");
        fs::write(&path, "not json")?;

        let result = FileCheckpointStore::new(&path).load();

        assert!(matches!(result, Err(Error::CheckpointStore { .. })));
        Ok(())
    }

    #[test]
    fn test_file_store_clear_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let store = FileCheckpointStore::new(dir.path().join("checkpoint.json"));
        store.save(&Checkpoint::new("demo", Position::new(1)))?;

        store.clear()?;
        store.clear()?;

        assert!(store.load()?.is_none());
        Ok(())
    }

    // ==========================================================================
    // StoreReporter
    // ==========================================================================

    #[test]
    fn test_store_reporter_persists_reports() -> Result<()> {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let mut reporter = StoreReporter::new("demo", Arc::clone(&store));

        reporter.report_checkpoint(Position::new(4))?;
        reporter.report_checkpoint(Position::new(8))?;

        let stored = store.load()?;
        assert_eq!(stored.as_ref().map(|c| c.position), Some(Position::new(8)));
        assert_eq!(stored.map(|c| c.exporter_id), Some("demo".to_string()));
        Ok(())
    }
}
