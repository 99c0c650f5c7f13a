//! CancelSubscriptionHandler - Command handler for cancelling artist subscriptions.

use std::sync::Arc;

use crate::application::ReconciliationStore;
use crate::domain::foundation::ArtistId;
use crate::domain::subscription::SubscriptionRecord;
use crate::ports::{PaymentBackend, PaymentError};

/// Command to cancel the listener's subscription to an artist.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub artist_id: ArtistId,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    /// The subscription as the backend reports it after cancelling, if the
    /// refresh succeeded.
    pub subscription: Option<SubscriptionRecord>,
}

/// Handler for cancelling subscriptions.
///
/// Works the same for every gateway: the backend cancels with whichever
/// provider renews the subscription. Access follows whatever the backend
/// reports on the next refresh.
pub struct CancelSubscriptionHandler {
    backend: Arc<dyn PaymentBackend>,
    reconciliation: Arc<ReconciliationStore>,
}

impl CancelSubscriptionHandler {
    pub fn new(backend: Arc<dyn PaymentBackend>, reconciliation: Arc<ReconciliationStore>) -> Self {
        Self {
            backend,
            reconciliation,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, PaymentError> {
        // 1. Cancel server-side
        self.backend.cancel_subscription(&cmd.artist_id).await?;
        tracing::info!(artist_id = %cmd.artist_id, "Subscription cancelled");

        // 2. Converge the local view
        let subscription = match self.reconciliation.refresh_subscriptions().await {
            Ok(_) => self.reconciliation.subscription_for(&cmd.artist_id).await,
            Err(err) => {
                tracing::warn!(artist_id = %cmd.artist_id, error = %err, "Subscription refresh after cancel failed");
                None
            }
        };

        Ok(CancelSubscriptionResult { subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockPaymentBackend;
    use crate::domain::payment::Gateway;
    use crate::domain::subscription::{BillingCycle, SubscriptionStatus};
    use crate::ports::PaymentErrorCode;

    fn artist() -> ArtistId {
        ArtistId::new("artist-a").unwrap()
    }

    fn active_record() -> SubscriptionRecord {
        SubscriptionRecord {
            artist_id: artist(),
            cycle: BillingCycle::OneMonth,
            status: SubscriptionStatus::Active,
            renewal_gateway: Gateway::OrderCheckout,
            current_period_end: None,
        }
    }

    fn handler(backend: &MockPaymentBackend) -> (CancelSubscriptionHandler, Arc<ReconciliationStore>) {
        let store = Arc::new(ReconciliationStore::new(Arc::new(backend.clone())));
        (
            CancelSubscriptionHandler::new(Arc::new(backend.clone()), store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn cancel_reflects_backend_status() {
        let backend = MockPaymentBackend::new();
        backend.add_subscription("sub_1", active_record());
        let (handler, store) = handler(&backend);
        store.refresh_subscriptions().await.unwrap();
        assert!(store.is_subscribed(&artist()).await);

        let result = handler
            .handle(CancelSubscriptionCommand { artist_id: artist() })
            .await
            .unwrap();

        assert_eq!(
            result.subscription.map(|s| s.status),
            Some(SubscriptionStatus::Cancelled)
        );
        assert!(!store.is_subscribed(&artist()).await);
    }

    #[tokio::test]
    async fn cancel_without_subscription_is_not_found() {
        let backend = MockPaymentBackend::new();
        let (handler, store) = handler(&backend);

        let err = handler
            .handle(CancelSubscriptionCommand { artist_id: artist() })
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::NotFound);
        assert_eq!(store.revision().await, 0);
    }

    #[tokio::test]
    async fn failed_refresh_still_reports_cancellation() {
        let backend = MockPaymentBackend::new();
        backend.add_subscription("sub_1", active_record());
        backend.set_method_error("subscriptions", PaymentError::network("offline"));
        let (handler, _store) = handler(&backend);

        let result = handler
            .handle(CancelSubscriptionCommand { artist_id: artist() })
            .await
            .unwrap();

        assert!(result.subscription.is_none());
        assert_eq!(
            backend.subscription("sub_1").map(|s| s.status),
            Some(SubscriptionStatus::Cancelled)
        );
    }
}
