//! Errors returned by the backend, provider scripts and gateway adapters.

use serde::{Deserialize, Serialize};

/// Errors from payment backend or provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message. For declines this is the provider's text.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create a provider decline.
    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderDeclined, message)
    }

    /// Create a configuration error (missing keys, wrong gateway wiring).
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ConfigurationError, message)
    }

    /// The user closed the provider UI.
    pub fn user_cancelled() -> Self {
        Self::new(PaymentErrorCode::UserCancelled, "cancelled by user")
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create an unexpected provider/backend response error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue or transient backend failure.
    NetworkError,

    /// Provider declined the payment.
    ProviderDeclined,

    /// Missing provider key or invalid integration setup.
    ConfigurationError,

    /// User dismissed the provider widget or page.
    UserCancelled,

    /// Resource not found.
    NotFound,

    /// Unexpected provider or backend response.
    ProviderError,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentErrorCode::NetworkError)
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::ProviderDeclined => "provider_declined",
            PaymentErrorCode::ConfigurationError => "configuration_error",
            PaymentErrorCode::UserCancelled => "user_cancelled",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
