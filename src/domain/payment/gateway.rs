//! Payment gateways the client can drive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// One external payment provider integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gateway {
    /// Card-vault provider: server-side intents confirmed client-side with a card.
    CardVault,

    /// Order provider with a hosted checkout widget.
    OrderCheckout,

    /// Order/subscription provider that approves via a full-page redirect.
    OrderSubscription,
}

impl Gateway {
    pub const ALL: [Gateway; 3] = [
        Gateway::CardVault,
        Gateway::OrderCheckout,
        Gateway::OrderSubscription,
    ];

    /// Path segment used by the backend (`/payments/{slug}/...`).
    pub fn slug(&self) -> &'static str {
        match self {
            Gateway::CardVault => "card-vault",
            Gateway::OrderCheckout => "order-checkout",
            Gateway::OrderSubscription => "order-subscription",
        }
    }

    /// Whether the second step leaves the app and must be resumed on return.
    pub fn requires_redirect(&self) -> bool {
        matches!(self, Gateway::OrderSubscription)
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Gateway {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gateway::ALL
            .into_iter()
            .find(|gateway| gateway.slug() == s)
            .ok_or_else(|| ValidationError::invalid_format("gateway", format!("unknown gateway '{}'", s)))
    }
}
