//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Backend URL must start with http:// or https://")]
    InvalidBackendUrl,

    #[error("Invalid {0} timeout")]
    InvalidTimeout(&'static str),

    #[error("Interactive step timeout must not be shorter than the step timeout")]
    InteractiveTimeoutTooShort,

    #[error("Redirect gateway needs a return URL")]
    ReturnUrlRequired,

    #[error("Invalid return URL")]
    InvalidReturnUrl,

    #[error("Checkpoint directory must not be empty")]
    EmptyCheckpointDir,
}
