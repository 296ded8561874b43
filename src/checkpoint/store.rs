//! Snapshot persistence.

use super::{Checkpoint, CheckpointError, GraphSnapshot};
use crate::config::{PersistenceConfig, SnapshotFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File extension appended to snapshot names that lack it.
pub const SNAPSHOT_EXTENSION: &str = "gfobject";

/// Somewhere graph snapshots can be saved to and loaded from by name.
pub trait SnapshotStore {
    /// Persist a snapshot, returning where it was written.
    fn save(&self, snapshot: &GraphSnapshot, name: &str) -> Result<PathBuf, CheckpointError>;

    fn load(&self, name: &str) -> Result<GraphSnapshot, CheckpointError>;
}

/// Stores snapshots as files in one directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    directory: PathBuf,
    format: SnapshotFormat,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            directory: directory.into(),
            format,
        }
    }

    pub fn from_config(config: &PersistenceConfig) -> Self {
        Self::new(config.directory.clone(), config.format)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path a snapshot name resolves to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let suffix = format!(".{SNAPSHOT_EXTENSION}");
        if name.ends_with(&suffix) {
            self.directory.join(name)
        } else {
            self.directory.join(format!("{name}{suffix}"))
        }
    }

    fn encode(&self, checkpoint: &Checkpoint) -> Result<Vec<u8>, CheckpointError> {
        match self.format {
            SnapshotFormat::Binary => checkpoint.to_binary(),
            SnapshotFormat::Json => checkpoint.to_json(),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Checkpoint, CheckpointError> {
        match self.format {
            SnapshotFormat::Binary => Checkpoint::from_binary(bytes),
            SnapshotFormat::Json => Checkpoint::from_json(bytes),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CheckpointError + '_ {
    move |source| CheckpointError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl SnapshotStore for FileStore {
    fn save(&self, snapshot: &GraphSnapshot, name: &str) -> Result<PathBuf, CheckpointError> {
        let path = self.path_for(name);
        let checkpoint = Checkpoint::new(snapshot.clone());
        let bytes = self.encode(&checkpoint)?;

        fs::create_dir_all(&self.directory).map_err(io_error(&self.directory))?;
        // staged write, then rename over the target
        let staging = path.with_extension(format!("{SNAPSHOT_EXTENSION}.tmp"));
        fs::write(&staging, &bytes).map_err(io_error(&staging))?;
        fs::rename(&staging, &path).map_err(io_error(&path))?;

        info!(
            path = %path.display(),
            format = ?self.format,
            checkpoint = %checkpoint.id,
            states = snapshot.nodes.len(),
            "Snapshot saved"
        );
        Ok(path)
    }

    fn load(&self, name: &str) -> Result<GraphSnapshot, CheckpointError> {
        let path = self.path_for(name);
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        let checkpoint = self.decode(&bytes)?;
        info!(
            path = %path.display(),
            format = ?self.format,
            checkpoint = %checkpoint.id,
            "Snapshot loaded"
        );
        Ok(checkpoint.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{KindRecord, StateRecord, TransitionRecord};
    use crate::core::StateId;

    fn temp_store(format: SnapshotFormat) -> FileStore {
        let dir = std::env::temp_dir().join(format!("gameflow_store_test_{}", uuid::Uuid::new_v4()));
        FileStore::new(dir, format)
    }

    fn snapshot() -> GraphSnapshot {
        let a = StateId::new(1);
        GraphSnapshot {
            start: Some(a),
            nodes: vec![StateRecord {
                id: a,
                name: "Load".to_string(),
                description: String::new(),
            }],
            transitions: vec![TransitionRecord {
                label: None,
                source: Some(a),
                result: None,
                kind: KindRecord::Always,
            }],
            globals: Vec::new(),
            detached: Vec::new(),
        }
    }

    #[test]
    fn names_get_the_snapshot_extension_once() {
        let store = FileStore::new("/snapshots", SnapshotFormat::Binary);
        assert_eq!(store.path_for("reels"), PathBuf::from("/snapshots/reels.gfobject"));
        assert_eq!(
            store.path_for("reels.gfobject"),
            PathBuf::from("/snapshots/reels.gfobject")
        );
    }

    #[test]
    fn save_then_load_in_both_formats() {
        for format in [SnapshotFormat::Binary, SnapshotFormat::Json] {
            let store = temp_store(format);
            let path = store.save(&snapshot(), "machine").unwrap();
            assert!(path.exists());
            assert_eq!(store.load("machine").unwrap(), snapshot());
            fs::remove_dir_all(store.directory()).unwrap();
        }
    }

    #[test]
    fn loading_missing_snapshot_is_io_error() {
        let store = temp_store(SnapshotFormat::Binary);
        assert!(matches!(store.load("absent"), Err(CheckpointError::Io { .. })));
    }

    #[test]
    fn format_mismatch_fails_to_decode() {
        let dir = std::env::temp_dir().join(format!("gameflow_store_test_{}", uuid::Uuid::new_v4()));
        FileStore::new(&dir, SnapshotFormat::Binary)
            .save(&snapshot(), "machine")
            .unwrap();
        let result = FileStore::new(&dir, SnapshotFormat::Json).load("machine");
        assert!(matches!(result, Err(CheckpointError::DeserializationFailed(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
