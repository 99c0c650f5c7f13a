//! File-backed checkpoint store.
//!
//! Each pending redirect lives in its own JSON file named after the SHA-256
//! digest of its provider reference, so arbitrary provider ids never reach the
//! filesystem as path components.
//!
//! # Atomic Writes
//!
//! 1. Write the record to `{digest}.json.tmp`
//! 2. Sync to disk
//! 3. Rename to `{digest}.json`
//!
//! A crash mid-write leaves at most a stray `.tmp` file, which `list` ignores.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::domain::payment::RedirectCheckpoint;
use crate::ports::{CheckpointError, CheckpointStore};

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Opens (creating if needed) the checkpoint directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(key: &str) -> String {
        format!("{:x}.{}", Sha256::digest(key.as_bytes()), EXTENSION)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }

    fn read_file(path: &Path) -> Result<Option<RedirectCheckpoint>, CheckpointError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn save(&self, checkpoint: &RedirectCheckpoint) -> Result<(), CheckpointError> {
        let final_path = self.path_for(checkpoint.key());
        let temp_path = final_path.with_extension(format!("{}.tmp", EXTENSION));

        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, &final_path)?;

        tracing::debug!(
            attempt_id = %checkpoint.attempt_id,
            path = %final_path.display(),
            "Redirect checkpoint written"
        );
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<RedirectCheckpoint>, CheckpointError> {
        let checkpoint = Self::read_file(&self.path_for(key))?;
        Ok(checkpoint.filter(|cp| cp.key() == key))
    }

    fn remove(&self, key: &str) -> Result<bool, CheckpointError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<RedirectCheckpoint>, CheckpointError> {
        let mut checkpoints = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            match Self::read_file(&path) {
                Ok(Some(checkpoint)) => checkpoints.push(checkpoint),
                Ok(None) => {}
                Err(CheckpointError::Corrupt(e)) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable checkpoint");
                }
                Err(e) => return Err(e),
            }
        }
        checkpoints.sort_by_key(|cp| cp.created_at);
        Ok(checkpoints)
    }
}
