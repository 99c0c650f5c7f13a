//! Billing cycle for artist subscriptions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Billing interval of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BillingCycle {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
}

impl BillingCycle {
    pub const ALL: [BillingCycle; 4] = [
        BillingCycle::OneMonth,
        BillingCycle::ThreeMonths,
        BillingCycle::SixMonths,
        BillingCycle::TwelveMonths,
    ];

    /// Number of months billed per renewal.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::OneMonth => 1,
            BillingCycle::ThreeMonths => 3,
            BillingCycle::SixMonths => 6,
            BillingCycle::TwelveMonths => 12,
        }
    }

    /// Short wire label ("1m", "3m", "6m", "12m").
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::OneMonth => "1m",
            BillingCycle::ThreeMonths => "3m",
            BillingCycle::SixMonths => "6m",
            BillingCycle::TwelveMonths => "12m",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = ValidationError;

    /// Accepts the wire label or a bare month count ("3m" or "3").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        let months = trimmed.strip_suffix('m').unwrap_or(&trimmed);
        match months {
            "1" => Ok(BillingCycle::OneMonth),
            "3" => Ok(BillingCycle::ThreeMonths),
            "6" => Ok(BillingCycle::SixMonths),
            "12" => Ok(BillingCycle::TwelveMonths),
            _ => Err(ValidationError::invalid_format(
                "cycle",
                format!("unsupported billing cycle '{}'", s),
            )),
        }
    }
}
