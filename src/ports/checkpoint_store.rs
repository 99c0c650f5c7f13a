//! Port for durable redirect checkpoints.
//!
//! Writes are synchronous: the redirect must not start until the checkpoint
//! is on disk.

use thiserror::Error;

use crate::domain::payment::RedirectCheckpoint;

/// Errors from checkpoint storage.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Local storage for pending redirect attempts, keyed by provider reference.
pub trait CheckpointStore: Send + Sync {
    /// Stores (or replaces) the checkpoint under its key.
    fn save(&self, checkpoint: &RedirectCheckpoint) -> Result<(), CheckpointError>;

    fn load(&self, key: &str) -> Result<Option<RedirectCheckpoint>, CheckpointError>;

    /// Removes the checkpoint. Returns true if one existed.
    fn remove(&self, key: &str) -> Result<bool, CheckpointError>;

    /// Every stored checkpoint, oldest first.
    fn list(&self) -> Result<Vec<RedirectCheckpoint>, CheckpointError>;
}
