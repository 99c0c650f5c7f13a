//! Step timeout configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Time budgets for provider steps.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSettings {
    /// Budget for server-side steps, in seconds
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,

    /// Budget for steps that wait on the listener (card entry, checkout widget), in seconds
    #[serde(default = "default_interactive_step_timeout")]
    pub interactive_step_timeout_secs: u64,
}

fn default_step_timeout() -> u64 {
    30
}

fn default_interactive_step_timeout() -> u64 {
    600
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout(),
            interactive_step_timeout_secs: default_interactive_step_timeout(),
        }
    }
}

impl OrchestratorSettings {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn interactive_step_timeout(&self) -> Duration {
        Duration::from_secs(self.interactive_step_timeout_secs)
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.step_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("step"));
        }
        if self.interactive_step_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("interactive step"));
        }
        if self.interactive_step_timeout_secs < self.step_timeout_secs {
            return Err(ValidationError::InteractiveTimeoutTooShort);
        }
        Ok(())
    }
}
