//! Server-confirmed subscription records.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ArtistId, Timestamp};
use crate::domain::payment::Gateway;

use super::BillingCycle;

/// Subscription status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created but first payment not yet confirmed.
    Pending,

    /// Paid and current.
    Active,

    /// Renewal failed, still within the grace period.
    PastDue,

    /// Cancelled by the listener; access continues until period end.
    Cancelled,

    /// Ended. No access.
    Expired,
}

impl SubscriptionStatus {
    /// Returns true if this status grants access to subscriber content.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::PastDue | SubscriptionStatus::Cancelled
        )
    }
}

/// One artist subscription, exactly as the backend last reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub artist_id: ArtistId,
    pub cycle: BillingCycle,
    pub status: SubscriptionStatus,

    /// Gateway that charges renewals.
    pub renewal_gateway: Gateway,

    #[serde(default)]
    pub current_period_end: Option<Timestamp>,
}

impl SubscriptionRecord {
    /// Returns true if the record grants access right now.
    ///
    /// Cancelled subscriptions keep access until the period ends.
    pub fn has_access(&self) -> bool {
        if !self.status.has_access() {
            return false;
        }
        if self.status == SubscriptionStatus::Cancelled {
            return self
                .current_period_end
                .map(|end| !end.is_before(&Timestamp::now()))
                .unwrap_or(false);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: SubscriptionStatus, period_end: Option<Timestamp>) -> SubscriptionRecord {
        SubscriptionRecord {
            artist_id: ArtistId::new("artist-a").unwrap(),
            cycle: BillingCycle::OneMonth,
            status,
            renewal_gateway: Gateway::CardVault,
            current_period_end: period_end,
        }
    }

    #[test]
    fn status_access_checks() {
        assert!(SubscriptionStatus::Active.has_access());
        assert!(SubscriptionStatus::PastDue.has_access());
        assert!(SubscriptionStatus::Cancelled.has_access());
        assert!(!SubscriptionStatus::Pending.has_access());
        assert!(!SubscriptionStatus::Expired.has_access());
    }

    #[test]
    fn cancelled_record_keeps_access_until_period_end() {
        let future = Timestamp::now().add_months(1);
        assert!(record(SubscriptionStatus::Cancelled, Some(future)).has_access());
    }

    #[test]
    fn cancelled_record_loses_access_after_period_end() {
        let past = Timestamp::now().add_months(-1);
        assert!(!record(SubscriptionStatus::Cancelled, Some(past)).has_access());
    }

    #[test]
    fn cancelled_record_without_period_end_has_no_access() {
        assert!(!record(SubscriptionStatus::Cancelled, None).has_access());
    }

    #[test]
    fn active_record_has_access() {
        assert!(record(SubscriptionStatus::Active, None).has_access());
    }
}
