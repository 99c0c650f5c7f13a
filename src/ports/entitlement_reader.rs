//! Port for reading what the listener owns, as the backend sees it.

use async_trait::async_trait;

use crate::domain::foundation::ItemId;
use crate::domain::subscription::SubscriptionRecord;

use super::PaymentError;

/// Read side of purchases and subscriptions.
///
/// Results are authoritative: callers replace their local view with them.
#[async_trait]
pub trait EntitlementReader: Send + Sync {
    /// `GET /me/purchases`: ids of every purchased song and album.
    async fn purchased_items(&self) -> Result<Vec<ItemId>, PaymentError>;

    /// `GET /me/subscriptions`: current artist subscriptions.
    async fn subscriptions(&self) -> Result<Vec<SubscriptionRecord>, PaymentError>;
}
