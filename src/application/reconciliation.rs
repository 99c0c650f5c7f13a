//! ReconciliationStore - the server-confirmed view of what the listener owns.
//!
//! The UI answers "do I own this?" and "am I subscribed?" from here and never
//! from attempt state. Refreshes replace each set wholesale with what the
//! backend reports. The one exception is the optimistic purchase marker set
//! right after an in-session purchase succeeds, which the next purchase
//! refresh either confirms or retracts.
//!
//! Each refresh takes a ticket before it fetches. A result whose ticket is
//! older than the last one applied for the same set is dropped, so a slow
//! fetch never overwrites a newer answer.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::foundation::{ArtistId, ItemId};
use crate::domain::subscription::SubscriptionRecord;
use crate::ports::{EntitlementReader, PaymentError};

/// How sure the client is that an item is owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Reported by the backend.
    Confirmed,

    /// Marked locally after an in-session success; not yet confirmed.
    Optimistic,
}

/// Point-in-time copy of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementSnapshot {
    pub purchases: BTreeMap<ItemId, Ownership>,
    pub subscriptions: BTreeMap<ArtistId, SubscriptionRecord>,
    pub revision: u64,
}

#[derive(Default)]
struct StoreState {
    purchases: HashMap<ItemId, Ownership>,
    subscriptions: HashMap<ArtistId, SubscriptionRecord>,
    revision: u64,
    purchases_ticket: u64,
    subscriptions_ticket: u64,
}

pub struct ReconciliationStore {
    reader: Arc<dyn EntitlementReader>,
    state: RwLock<StoreState>,
    tickets: AtomicU64,
}

impl ReconciliationStore {
    pub fn new(reader: Arc<dyn EntitlementReader>) -> Self {
        Self {
            reader,
            state: RwLock::new(StoreState::default()),
            tickets: AtomicU64::new(0),
        }
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replaces the purchase set with the backend's. Returns true if it changed.
    ///
    /// Returns false without touching the store when a refresh started later
    /// has already been applied.
    pub async fn refresh_purchases(&self) -> Result<bool, PaymentError> {
        let ticket = self.next_ticket();
        let items = self.reader.purchased_items().await?;
        let fresh: HashMap<ItemId, Ownership> = items
            .into_iter()
            .map(|id| (id, Ownership::Confirmed))
            .collect();

        let mut state = self.state.write().await;
        if ticket < state.purchases_ticket {
            tracing::debug!(ticket, applied = state.purchases_ticket, "Stale purchase refresh dropped");
            return Ok(false);
        }
        state.purchases_ticket = ticket;
        let retracted = state
            .purchases
            .iter()
            .filter(|(id, ownership)| **ownership == Ownership::Optimistic && !fresh.contains_key(*id))
            .count();
        if retracted > 0 {
            tracing::warn!(retracted, "Backend did not confirm optimistically marked purchases");
        }

        if state.purchases == fresh {
            return Ok(false);
        }
        state.purchases = fresh;
        state.revision += 1;
        tracing::debug!(revision = state.revision, "Purchases reconciled");
        Ok(true)
    }

    /// Replaces the subscription map with the backend's. Returns true if it changed.
    pub async fn refresh_subscriptions(&self) -> Result<bool, PaymentError> {
        let ticket = self.next_ticket();
        let records = self.reader.subscriptions().await?;
        let fresh: HashMap<ArtistId, SubscriptionRecord> = records
            .into_iter()
            .map(|record| (record.artist_id.clone(), record))
            .collect();

        let mut state = self.state.write().await;
        if ticket < state.subscriptions_ticket {
            tracing::debug!(ticket, applied = state.subscriptions_ticket, "Stale subscription refresh dropped");
            return Ok(false);
        }
        state.subscriptions_ticket = ticket;
        if state.subscriptions == fresh {
            return Ok(false);
        }
        state.subscriptions = fresh;
        state.revision += 1;
        tracing::debug!(revision = state.revision, "Subscriptions reconciled");
        Ok(true)
    }

    /// Marks an item owned before the backend has confirmed it.
    ///
    /// A no-op if the item is already present in either state.
    pub async fn mark_purchased_optimistically(&self, item_id: ItemId) -> bool {
        let mut state = self.state.write().await;
        if state.purchases.contains_key(&item_id) {
            return false;
        }
        state.purchases.insert(item_id, Ownership::Optimistic);
        state.revision += 1;
        true
    }

    pub async fn is_purchased(&self, item_id: &ItemId) -> bool {
        self.state.read().await.purchases.contains_key(item_id)
    }

    pub async fn ownership(&self, item_id: &ItemId) -> Option<Ownership> {
        self.state.read().await.purchases.get(item_id).copied()
    }

    pub async fn subscription_for(&self, artist_id: &ArtistId) -> Option<SubscriptionRecord> {
        self.state.read().await.subscriptions.get(artist_id).cloned()
    }

    /// True if the listener currently has subscriber access to the artist.
    pub async fn is_subscribed(&self, artist_id: &ArtistId) -> bool {
        self.state
            .read()
            .await
            .subscriptions
            .get(artist_id)
            .map(SubscriptionRecord::has_access)
            .unwrap_or(false)
    }

    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }

    pub async fn snapshot(&self) -> EntitlementSnapshot {
        let state = self.state.read().await;
        EntitlementSnapshot {
            purchases: state.purchases.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            subscriptions: state
                .subscriptions
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            revision: state.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::adapters::mock::MockPaymentBackend;
    use crate::domain::foundation::Timestamp;
    use crate::domain::payment::Gateway;
    use crate::domain::subscription::{BillingCycle, SubscriptionStatus};

    fn item(id: &str) -> ItemId {
        ItemId::new(id).unwrap()
    }

    fn store(backend: &MockPaymentBackend) -> ReconciliationStore {
        ReconciliationStore::new(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn refresh_confirms_optimistic_marker() {
        let backend = MockPaymentBackend::new();
        let store = store(&backend);

        assert!(store.mark_purchased_optimistically(item("song-1")).await);
        assert_eq!(store.ownership(&item("song-1")).await, Some(Ownership::Optimistic));

        backend.add_purchase(item("song-1"));
        assert!(store.refresh_purchases().await.unwrap());
        assert_eq!(store.ownership(&item("song-1")).await, Some(Ownership::Confirmed));
    }

    #[tokio::test]
    async fn refresh_retracts_unconfirmed_marker() {
        let backend = MockPaymentBackend::new();
        let store = store(&backend);
        store.mark_purchased_optimistically(item("song-1")).await;

        store.refresh_purchases().await.unwrap();

        assert!(!store.is_purchased(&item("song-1")).await);
    }

    #[tokio::test]
    async fn revision_only_moves_on_change() {
        let backend = MockPaymentBackend::new();
        backend.add_purchase(item("album-1"));
        let store = store(&backend);

        assert!(store.refresh_purchases().await.unwrap());
        let revision = store.revision().await;
        assert!(!store.refresh_purchases().await.unwrap());
        assert!(!store.refresh_subscriptions().await.unwrap());

        assert_eq!(store.revision().await, revision);
    }

    #[tokio::test]
    async fn marking_an_owned_item_is_a_no_op() {
        let backend = MockPaymentBackend::new();
        backend.add_purchase(item("song-2"));
        let store = store(&backend);
        store.refresh_purchases().await.unwrap();
        let revision = store.revision().await;

        assert!(!store.mark_purchased_optimistically(item("song-2")).await);
        assert_eq!(store.revision().await, revision);
        assert_eq!(store.ownership(&item("song-2")).await, Some(Ownership::Confirmed));
    }

    #[tokio::test]
    async fn subscriptions_follow_backend() {
        let backend = MockPaymentBackend::new();
        let artist = ArtistId::new("artist-a").unwrap();
        backend.add_subscription(
            "sub_1",
            SubscriptionRecord {
                artist_id: artist.clone(),
                cycle: BillingCycle::TwelveMonths,
                status: SubscriptionStatus::Active,
                renewal_gateway: Gateway::OrderCheckout,
                current_period_end: Some(Timestamp::now().add_months(12)),
            },
        );
        let store = store(&backend);

        store.refresh_subscriptions().await.unwrap();

        assert!(store.is_subscribed(&artist).await);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.subscriptions[&artist].cycle, BillingCycle::TwelveMonths);
        assert_eq!(snapshot.revision, 1);
    }

    /// Reader whose first purchase fetch is slow and returns an older list.
    struct LaggingReader {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl EntitlementReader for LaggingReader {
        async fn purchased_items(&self) -> Result<Vec<ItemId>, PaymentError> {
            let first = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls == 1
            };
            if first {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(vec![item("s1")])
            } else {
                Ok(vec![item("s1"), item("s2")])
            }
        }

        async fn subscriptions(&self) -> Result<Vec<SubscriptionRecord>, PaymentError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn slow_older_refresh_does_not_roll_back_newer_one() {
        let store = Arc::new(ReconciliationStore::new(Arc::new(LaggingReader {
            calls: Mutex::new(0),
        })));

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_purchases().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        store.mark_purchased_optimistically(item("s2")).await;
        assert!(store.refresh_purchases().await.unwrap());
        assert_eq!(store.ownership(&item("s2")).await, Some(Ownership::Confirmed));
        let revision = store.revision().await;

        assert!(!slow.await.unwrap().unwrap());
        assert_eq!(store.ownership(&item("s2")).await, Some(Ownership::Confirmed));
        assert_eq!(store.revision().await, revision);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_store_unchanged() {
        let backend = MockPaymentBackend::new();
        backend.add_purchase(item("song-1"));
        let store = store(&backend);
        store.refresh_purchases().await.unwrap();
        let before = store.snapshot().await;

        backend.set_method_error("purchased_items", PaymentError::network("offline"));
        assert!(store.refresh_purchases().await.is_err());

        assert_eq!(store.snapshot().await, before);
    }
}
