//! Checkpoint storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding pending redirect checkpoints
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from(".encore/checkpoints")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.checkpoint_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyCheckpointDir);
        }
        Ok(())
    }
}
