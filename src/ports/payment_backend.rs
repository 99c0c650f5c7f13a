//! Payment backend port.
//!
//! The server side of every gateway flow: intents, orders, captures and
//! subscription creation/activation. Create calls carry the attempt id so the
//! backend can deduplicate retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ArtistId, AttemptId, Money};
use crate::domain::payment::{Gateway, ItemRef, Subject};
use crate::domain::subscription::{BillingCycle, SubscriptionStatus};

use super::PaymentError;

/// Port for the platform's payments backend.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// `POST /payments/card-vault/create-payment`: create a payment or setup intent.
    async fn create_card_intent(&self, request: CreateCardIntentRequest)
        -> Result<CardIntent, PaymentError>;

    /// `POST /payments/card-vault/confirm-payment`: confirm a card purchase server-side.
    async fn confirm_card_payment(
        &self,
        request: ConfirmCardPaymentRequest,
    ) -> Result<PaymentConfirmation, PaymentError>;

    /// `POST /payments/{gateway}/create-order`.
    async fn create_order(
        &self,
        gateway: Gateway,
        request: CreateOrderRequest,
    ) -> Result<OrderCreated, PaymentError>;

    /// `POST /payments/{gateway}/capture-order`.
    async fn capture_order(
        &self,
        gateway: Gateway,
        request: CaptureOrderRequest,
    ) -> Result<PaymentConfirmation, PaymentError>;

    /// `POST /subscriptions/artist/{artist_id}`: create or confirm an in-session subscription.
    async fn create_subscription(
        &self,
        artist_id: &ArtistId,
        request: CreateSubscriptionRequest,
    ) -> Result<SubscriptionCreated, PaymentError>;

    /// `POST /subscriptions/{gateway}/artist/{artist_id}`: create a redirect subscription.
    async fn create_redirect_subscription(
        &self,
        gateway: Gateway,
        artist_id: &ArtistId,
        request: CreateRedirectSubscriptionRequest,
    ) -> Result<RedirectSubscription, PaymentError>;

    /// `POST /subscriptions/{gateway}/activate`.
    ///
    /// Activating an already active subscription is not an error.
    async fn activate_subscription(
        &self,
        gateway: Gateway,
        subscription_id: &str,
    ) -> Result<ActivationStatus, PaymentError>;

    /// `DELETE /subscriptions/artist/{artist_id}`.
    async fn cancel_subscription(&self, artist_id: &ArtistId) -> Result<(), PaymentError>;
}

/// Whether a card intent charges now or stores a card for renewals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentMode {
    Payment,
    Setup,
}

/// Request to create a card-vault intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCardIntentRequest {
    /// Idempotency key.
    pub attempt_id: AttemptId,
    pub mode: IntentMode,
    pub subject: Subject,
    pub price: Money,
}

/// Intent created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardIntent {
    pub intent_id: String,

    /// Secret the card-vault script needs to confirm the intent.
    pub client_secret: String,
}

/// Request to confirm a card purchase after the script confirmed the intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmCardPaymentRequest {
    pub attempt_id: AttemptId,
    pub intent_id: String,
    pub item: ItemRef,
}

/// Request to create a provider order for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Idempotency key.
    pub attempt_id: AttemptId,
    pub item: ItemRef,
    pub price: Money,

    /// Where redirect providers send the user back.
    pub return_url: Option<String>,
}

/// Order created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: String,

    /// Present for redirect gateways.
    pub approve_url: Option<String>,
}

/// Request to capture an order (or checkout subscription) server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOrderRequest {
    pub attempt_id: AttemptId,

    /// Provider order id, or the subscription id for checkout subscriptions.
    pub reference: String,

    /// Payment id reported by the checkout widget.
    pub payment_id: Option<String>,

    /// Signature reported by the checkout widget, verified by the backend.
    pub signature: Option<String>,
}

/// Server-side confirmation of a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub payment_id: Option<String>,
}

/// Request to create or confirm an in-session subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Idempotency key.
    pub attempt_id: AttemptId,
    pub gateway: Gateway,
    pub cycle: BillingCycle,

    /// Card-vault payment method confirmed by the script.
    pub payment_method: Option<String>,

    /// Provider price id when the plan carries one.
    pub plan_ref: Option<String>,
}

/// Subscription created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCreated {
    pub subscription_id: String,
    pub status: SubscriptionStatus,
}

/// Request to create a redirect-approved subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRedirectSubscriptionRequest {
    /// Idempotency key.
    pub attempt_id: AttemptId,
    pub cycle: BillingCycle,
    pub plan_ref: String,
    pub return_url: Option<String>,
}

/// Redirect subscription awaiting approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectSubscription {
    pub subscription_id: String,
    pub approve_url: String,
}

/// Outcome of an activation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    Activated,
    AlreadyActive,
}
