//! Exclusive leases over the providers' process-wide scripts.
//!
//! Each provider ships one widget/script instance per page. An attempt takes
//! its gateway's lease when the gateway is selected and drops it when the
//! attempt ends, so two attempts never drive the same script at once.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::domain::payment::Gateway;

/// One single-permit semaphore per gateway.
#[derive(Debug, Clone)]
pub struct WidgetLeases {
    permits: HashMap<Gateway, Arc<Semaphore>>,
}

/// Held while an attempt owns a gateway's script. Released on drop.
#[derive(Debug)]
pub struct WidgetLease {
    gateway: Gateway,
    _permit: OwnedSemaphorePermit,
}

impl WidgetLease {
    pub fn gateway(&self) -> Gateway {
        self.gateway
    }
}

impl WidgetLeases {
    pub fn new() -> Self {
        let permits = Gateway::ALL
            .into_iter()
            .map(|gateway| (gateway, Arc::new(Semaphore::new(1))))
            .collect();
        Self { permits }
    }

    /// Takes the gateway's lease without waiting. `None` if it is held.
    pub fn try_acquire(&self, gateway: Gateway) -> Option<WidgetLease> {
        let semaphore = self.permits.get(&gateway)?;
        let permit = Arc::clone(semaphore).try_acquire_owned().ok()?;
        Some(WidgetLease {
            gateway,
            _permit: permit,
        })
    }

    pub fn is_held(&self, gateway: Gateway) -> bool {
        self.permits
            .get(&gateway)
            .map(|semaphore| semaphore.available_permits() == 0)
            .unwrap_or(false)
    }
}

impl Default for WidgetLeases {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lease_on_same_gateway_is_refused() {
        let leases = WidgetLeases::new();
        let first = leases.try_acquire(Gateway::CardVault);

        assert!(first.is_some());
        assert!(leases.try_acquire(Gateway::CardVault).is_none());
        assert!(leases.is_held(Gateway::CardVault));
    }

    #[test]
    fn gateways_are_leased_independently() {
        let leases = WidgetLeases::new();
        let _card = leases.try_acquire(Gateway::CardVault).unwrap();

        assert!(leases.try_acquire(Gateway::OrderCheckout).is_some());
    }

    #[test]
    fn dropping_lease_releases_gateway() {
        let leases = WidgetLeases::new();
        let lease = leases.try_acquire(Gateway::OrderSubscription).unwrap();
        assert_eq!(lease.gateway(), Gateway::OrderSubscription);
        drop(lease);

        assert!(!leases.is_held(Gateway::OrderSubscription));
        assert!(leases.try_acquire(Gateway::OrderSubscription).is_some());
    }
}
