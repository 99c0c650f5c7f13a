//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ENCORE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use encore_billing::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Backend at {}", config.backend.base_url);
//! ```

mod backend;
mod error;
mod gateways;
mod orchestrator;
mod storage;

pub use backend::BackendConfig;
pub use error::{ConfigError, ValidationError};
pub use gateways::GatewaysConfig;
pub use orchestrator::OrchestratorSettings;
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Payments backend connection
    pub backend: BackendConfig,

    /// Provider script keys
    #[serde(default)]
    pub gateways: GatewaysConfig,

    /// Step time budgets
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,

    /// Checkpoint storage
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ENCORE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ENCORE__BACKEND__BASE_URL=https://...` -> `backend.base_url`
    /// - `ENCORE__ORCHESTRATOR__STEP_TIMEOUT_SECS=20` -> `orchestrator.step_timeout_secs`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ENCORE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.backend.validate()?;
        self.gateways.validate()?;
        self.orchestrator.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}
