//! Failure taxonomy surfaced for payment attempts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::subscription::PlanError;

/// Category of an attempt failure.
///
/// User abandonment is not a failure; it ends the attempt as cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Backend or provider unreachable. Retry with a new attempt.
    Network,

    /// Provider refused the payment; its message is shown to the user.
    ProviderDeclined,

    /// Missing keys or an unexpected provider contract. Not user-actionable.
    Configuration,

    /// A provider step did not resolve within its time budget.
    Timeout,

    /// Artist has no plan for the requested cycle on this gateway.
    PlanNotFound,

    /// The redirect plan has no registered currencies.
    NoCurrencyOptions,

    /// The requested currency is not registered for the plan.
    CurrencyNotOffered,
}

impl FailureKind {
    /// Whether the UI should offer to try again.
    pub fn retry_offered(&self) -> bool {
        !matches!(self, FailureKind::ProviderDeclined | FailureKind::Configuration)
    }

    /// Whether the failure happened before any provider call.
    pub fn is_pre_provider(&self) -> bool {
        matches!(
            self,
            FailureKind::PlanNotFound | FailureKind::NoCurrencyOptions | FailureKind::CurrencyNotOffered
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Network => "network",
            FailureKind::ProviderDeclined => "provider_declined",
            FailureKind::Configuration => "configuration",
            FailureKind::Timeout => "timeout",
            FailureKind::PlanNotFound => "plan_not_found",
            FailureKind::NoCurrencyOptions => "no_currency_options",
            FailureKind::CurrencyNotOffered => "currency_not_offered",
        };
        write!(f, "{}", s)
    }
}

/// A failure recorded on an attempt.
///
/// `message` is safe to show to the listener; `detail` is for logs only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub kind: FailureKind,
    pub message: String,
    pub detail: String,
}

impl PaymentFailure {
    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Network,
            message: "We couldn't reach the payment service. Please try again.".to_string(),
            detail: detail.into(),
        }
    }

    /// The provider's own message is what the listener sees.
    pub fn declined(provider_message: impl Into<String>) -> Self {
        let provider_message = provider_message.into();
        let message = if provider_message.trim().is_empty() {
            "Your payment was declined.".to_string()
        } else {
            provider_message.clone()
        };
        Self {
            kind: FailureKind::ProviderDeclined,
            message,
            detail: provider_message,
        }
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Configuration,
            message: "Payments are unavailable right now. Please try again later.".to_string(),
            detail: detail.into(),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: "The payment provider did not respond in time. Please try again.".to_string(),
            detail: detail.into(),
        }
    }

    pub fn retry_offered(&self) -> bool {
        self.kind.retry_offered()
    }
}

impl From<&PlanError> for PaymentFailure {
    fn from(err: &PlanError) -> Self {
        let (kind, message) = match err {
            PlanError::PlanNotFound { .. } => (
                FailureKind::PlanNotFound,
                "This artist doesn't offer that billing cycle.",
            ),
            PlanError::NoCurrencyOptions { .. } => (
                FailureKind::NoCurrencyOptions,
                "This plan can't be paid with this payment method yet.",
            ),
            PlanError::CurrencyNotOffered { .. } => (
                FailureKind::CurrencyNotOffered,
                "That currency isn't available for this plan. Please pick another.",
            ),
        };
        Self {
            kind,
            message: message.to_string(),
            detail: err.to_string(),
        }
    }
}

impl fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}
