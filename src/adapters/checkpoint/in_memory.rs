//! In-memory checkpoint store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::payment::RedirectCheckpoint;
use crate::ports::{CheckpointError, CheckpointStore};

/// Keeps checkpoints for the lifetime of the process only.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: Arc<Mutex<HashMap<String, RedirectCheckpoint>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, RedirectCheckpoint>> {
        // A panicking test thread must not hide checkpoints from the rest.
        self.checkpoints.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn save(&self, checkpoint: &RedirectCheckpoint) -> Result<(), CheckpointError> {
        self.guard()
            .insert(checkpoint.key().to_string(), checkpoint.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<RedirectCheckpoint>, CheckpointError> {
        Ok(self.guard().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<bool, CheckpointError> {
        Ok(self.guard().remove(key).is_some())
    }

    fn list(&self) -> Result<Vec<RedirectCheckpoint>, CheckpointError> {
        let mut checkpoints: Vec<_> = self.guard().values().cloned().collect();
        checkpoints.sort_by_key(|cp| cp.created_at);
        Ok(checkpoints)
    }
}
