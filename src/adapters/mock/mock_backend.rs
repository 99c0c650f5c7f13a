//! Mock payments backend.
//!
//! Keeps the state a real backend would: intents, orders, subscriptions and
//! confirmed purchases. Create calls are idempotent per attempt id, captures
//! record purchases, activations flip subscriptions to active, and the
//! entitlement endpoints report exactly what was recorded.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{ArtistId, AttemptId, ItemId, Timestamp};
use crate::domain::payment::{Gateway, ItemRef, Subject};
use crate::domain::subscription::{ArtistPlans, BillingCycle, SubscriptionRecord, SubscriptionStatus};
use crate::ports::{
    ActivationStatus, CaptureOrderRequest, CardIntent, ConfirmCardPaymentRequest,
    CreateCardIntentRequest, CreateOrderRequest, CreateRedirectSubscriptionRequest,
    CreateSubscriptionRequest, EntitlementReader, IntentMode, OrderCreated, PaymentBackend,
    PaymentConfirmation, PaymentError, PlanCatalog, RedirectSubscription, SubscriptionCreated,
};

use super::Gates;

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// Mock payments backend for testing.
///
/// # Example
///
/// ```ignore
/// let backend = MockPaymentBackend::new();
/// backend.add_plans(plans);
///
/// // Inject errors
/// backend.set_method_error("capture_order", PaymentError::network("timeout"));
///
/// // Park a call mid-flight
/// backend.gates().hold("activate_subscription");
/// ```
#[derive(Clone, Default)]
pub struct MockPaymentBackend {
    inner: Arc<Mutex<MockState>>,
    gates: Gates,
}

#[derive(Default)]
struct MockState {
    next_id: u64,

    plans: HashMap<ArtistId, ArtistPlans>,

    /// Intent id -> what it pays for.
    intents: HashMap<String, Subject>,

    /// Order id -> item it sells.
    orders: HashMap<String, ItemRef>,

    /// Subscription id -> subscription record.
    subscriptions: HashMap<String, SubscriptionRecord>,

    /// Items the backend has confirmed as purchased.
    purchased: Vec<ItemId>,

    /// Items whose purchase the backend will not record.
    withheld: HashSet<ItemId>,

    /// (method, attempt id) -> id created by the first call.
    idempotency: HashMap<(String, AttemptId), String>,

    next_error: Option<PaymentError>,
    method_errors: HashMap<String, PaymentError>,
    call_log: Vec<MethodCall>,
}

impl MockState {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }

    /// Returns the id stored for this attempt, or creates and stores one.
    fn idempotent_id(&mut self, method: &str, attempt_id: AttemptId, prefix: &str) -> (String, bool) {
        let key = (method.to_string(), attempt_id);
        if let Some(existing) = self.idempotency.get(&key) {
            return (existing.clone(), false);
        }
        let id = self.fresh_id(prefix);
        self.idempotency.insert(key, id.clone());
        (id, true)
    }

    fn record_purchase(&mut self, item: &ItemRef) {
        if self.withheld.contains(&item.id) || self.purchased.contains(&item.id) {
            return;
        }
        self.purchased.push(item.id.clone());
    }

    fn upsert_subscription(
        &mut self,
        subscription_id: &str,
        artist_id: &ArtistId,
        cycle: BillingCycle,
        gateway: Gateway,
        status: SubscriptionStatus,
    ) {
        let current_period_end = if status == SubscriptionStatus::Active {
            Some(Timestamp::now().add_months(i64::from(cycle.months())))
        } else {
            None
        };
        self.subscriptions.insert(
            subscription_id.to_string(),
            SubscriptionRecord {
                artist_id: artist_id.clone(),
                cycle,
                status,
                renewal_gateway: gateway,
                current_period_end,
            },
        );
    }

    fn activate(&mut self, subscription_id: &str) -> Option<ActivationStatus> {
        let record = self.subscriptions.get_mut(subscription_id)?;
        if record.status == SubscriptionStatus::Active {
            return Some(ActivationStatus::AlreadyActive);
        }
        record.status = SubscriptionStatus::Active;
        record.current_period_end = Some(Timestamp::now().add_months(i64::from(record.cycle.months())));
        Some(ActivationStatus::Activated)
    }
}

impl MockPaymentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Registers the plans returned for `plans.artist_id`.
    pub fn add_plans(&self, plans: ArtistPlans) {
        self.state().plans.insert(plans.artist_id.clone(), plans);
    }

    /// Seeds an item as already purchased.
    pub fn add_purchase(&self, item_id: ItemId) {
        let mut state = self.state();
        if !state.purchased.contains(&item_id) {
            state.purchased.push(item_id);
        }
    }

    /// Seeds a subscription record.
    pub fn add_subscription(&self, subscription_id: &str, record: SubscriptionRecord) {
        self.state()
            .subscriptions
            .insert(subscription_id.to_string(), record);
    }

    /// The backend accepts payments for this item but never lists it as
    /// purchased, as if the provider later reversed the charge.
    pub fn withhold_purchase(&self, item_id: ItemId) {
        self.state().withheld.insert(item_id);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    /// Gates for parking calls in flight.
    pub fn gates(&self) -> &Gates {
        &self.gates
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    /// Server-side record for a subscription id.
    pub fn subscription(&self, subscription_id: &str) -> Option<SubscriptionRecord> {
        self.state().subscriptions.get(subscription_id).cloned()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the call, waits at its gate, then applies injected errors.
    async fn enter(&self, method: &str, args: Vec<String>) -> Result<(), PaymentError> {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
        self.gates.pass(method).await;

        let mut state = self.state();
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentBackend for MockPaymentBackend {
    async fn create_card_intent(
        &self,
        request: CreateCardIntentRequest,
    ) -> Result<CardIntent, PaymentError> {
        self.enter(
            "create_card_intent",
            vec![request.attempt_id.to_string(), request.subject.to_string()],
        )
        .await?;

        let mut state = self.state();
        let prefix = match request.mode {
            IntentMode::Payment => "pi",
            IntentMode::Setup => "seti",
        };
        let (intent_id, _) = state.idempotent_id("create_card_intent", request.attempt_id, prefix);
        state.intents.insert(intent_id.clone(), request.subject);

        Ok(CardIntent {
            client_secret: format!("{}_secret", intent_id),
            intent_id,
        })
    }

    async fn confirm_card_payment(
        &self,
        request: ConfirmCardPaymentRequest,
    ) -> Result<PaymentConfirmation, PaymentError> {
        self.enter(
            "confirm_card_payment",
            vec![request.attempt_id.to_string(), request.intent_id.clone()],
        )
        .await?;

        let mut state = self.state();
        if !state.intents.contains_key(&request.intent_id) {
            return Err(PaymentError::not_found("payment intent"));
        }
        state.record_purchase(&request.item);
        let payment_id = state.fresh_id("pay");
        Ok(PaymentConfirmation {
            payment_id: Some(payment_id),
        })
    }

    async fn create_order(
        &self,
        gateway: Gateway,
        request: CreateOrderRequest,
    ) -> Result<OrderCreated, PaymentError> {
        self.enter(
            "create_order",
            vec![
                gateway.to_string(),
                request.attempt_id.to_string(),
                request.item.id.to_string(),
            ],
        )
        .await?;

        let mut state = self.state();
        let (order_id, _) = state.idempotent_id("create_order", request.attempt_id, "order");
        state.orders.insert(order_id.clone(), request.item);

        let approve_url = if gateway.requires_redirect() {
            Some(format!("https://provider.test/checkoutnow?token={}", order_id))
        } else {
            None
        };
        Ok(OrderCreated {
            order_id,
            approve_url,
        })
    }

    async fn capture_order(
        &self,
        gateway: Gateway,
        request: CaptureOrderRequest,
    ) -> Result<PaymentConfirmation, PaymentError> {
        self.enter(
            "capture_order",
            vec![gateway.to_string(), request.reference.clone()],
        )
        .await?;

        let mut state = self.state();
        if let Some(item) = state.orders.get(&request.reference).cloned() {
            state.record_purchase(&item);
        } else if state.activate(&request.reference).is_none() {
            return Err(PaymentError::not_found("order"));
        }

        let payment_id = match request.payment_id {
            Some(id) => id,
            None => state.fresh_id("capture"),
        };
        Ok(PaymentConfirmation {
            payment_id: Some(payment_id),
        })
    }

    async fn create_subscription(
        &self,
        artist_id: &ArtistId,
        request: CreateSubscriptionRequest,
    ) -> Result<SubscriptionCreated, PaymentError> {
        self.enter(
            "create_subscription",
            vec![
                artist_id.to_string(),
                request.gateway.to_string(),
                request.cycle.to_string(),
            ],
        )
        .await?;

        let mut state = self.state();
        let (subscription_id, created) =
            state.idempotent_id("create_subscription", request.attempt_id, "sub");

        // Card subscriptions charge the stored method immediately; checkout
        // subscriptions wait for the widget payment to be captured.
        let status = if request.payment_method.is_some() {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::Pending
        };
        if created {
            state.upsert_subscription(&subscription_id, artist_id, request.cycle, request.gateway, status);
        }

        let status = state
            .subscriptions
            .get(&subscription_id)
            .map(|record| record.status)
            .unwrap_or(status);
        Ok(SubscriptionCreated {
            subscription_id,
            status,
        })
    }

    async fn create_redirect_subscription(
        &self,
        gateway: Gateway,
        artist_id: &ArtistId,
        request: CreateRedirectSubscriptionRequest,
    ) -> Result<RedirectSubscription, PaymentError> {
        self.enter(
            "create_redirect_subscription",
            vec![
                gateway.to_string(),
                artist_id.to_string(),
                request.cycle.to_string(),
                request.plan_ref.clone(),
            ],
        )
        .await?;

        let mut state = self.state();
        let (subscription_id, created) =
            state.idempotent_id("create_redirect_subscription", request.attempt_id, "I-SUB");
        if created {
            state.upsert_subscription(
                &subscription_id,
                artist_id,
                request.cycle,
                gateway,
                SubscriptionStatus::Pending,
            );
        }

        Ok(RedirectSubscription {
            approve_url: format!("https://provider.test/billing/approve?ba_token={}", subscription_id),
            subscription_id,
        })
    }

    async fn activate_subscription(
        &self,
        gateway: Gateway,
        subscription_id: &str,
    ) -> Result<ActivationStatus, PaymentError> {
        self.enter(
            "activate_subscription",
            vec![gateway.to_string(), subscription_id.to_string()],
        )
        .await?;

        self.state()
            .activate(subscription_id)
            .ok_or_else(|| PaymentError::not_found("subscription"))
    }

    async fn cancel_subscription(&self, artist_id: &ArtistId) -> Result<(), PaymentError> {
        self.enter("cancel_subscription", vec![artist_id.to_string()]).await?;

        let mut state = self.state();
        let record = state
            .subscriptions
            .values_mut()
            .find(|record| {
                &record.artist_id == artist_id
                    && matches!(
                        record.status,
                        SubscriptionStatus::Active | SubscriptionStatus::PastDue | SubscriptionStatus::Pending
                    )
            })
            .ok_or_else(|| PaymentError::not_found("subscription"))?;
        record.status = SubscriptionStatus::Cancelled;
        Ok(())
    }
}

#[async_trait]
impl PlanCatalog for MockPaymentBackend {
    async fn artist_plans(&self, artist_id: &ArtistId) -> Result<ArtistPlans, PaymentError> {
        self.enter("artist_plans", vec![artist_id.to_string()]).await?;
        self.state()
            .plans
            .get(artist_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("artist plans"))
    }
}

#[async_trait]
impl EntitlementReader for MockPaymentBackend {
    async fn purchased_items(&self) -> Result<Vec<ItemId>, PaymentError> {
        self.enter("purchased_items", vec![]).await?;
        Ok(self.state().purchased.clone())
    }

    async fn subscriptions(&self) -> Result<Vec<SubscriptionRecord>, PaymentError> {
        self.enter("subscriptions", vec![]).await?;
        let mut records: Vec<_> = self.state().subscriptions.values().cloned().collect();
        records.sort_by(|a, b| a.artist_id.as_str().cmp(b.artist_id.as_str()));
        Ok(records)
    }
}
