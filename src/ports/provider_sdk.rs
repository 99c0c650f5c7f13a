//! Ports for the providers' embedded client-side scripts.
//!
//! Each provider ships one process-wide script object (card element, checkout
//! widget, redirect). The orchestrator serializes access to them through
//! widget leases; these traits only describe the calls.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::{AttemptId, Money};

use super::PaymentError;

/// Card details as captured by the card-vault script's element.
///
/// The token is opaque to the client and never logged.
#[derive(Debug, Clone)]
pub struct CardInput {
    pub token: SecretString,
    pub cardholder_name: Option<String>,
}

impl CardInput {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
            cardholder_name: None,
        }
    }
}

/// Result of confirming a payment intent in the card-vault script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardConfirmation {
    pub intent_id: String,
    pub payment_method: Option<String>,
}

/// Card-vault provider script.
#[async_trait]
pub trait CardVaultSdk: Send + Sync {
    /// Confirms a payment intent with the card. Declines are `ProviderDeclined`.
    async fn confirm_card_payment(
        &self,
        client_secret: &SecretString,
        card: &CardInput,
    ) -> Result<CardConfirmation, PaymentError>;

    /// Confirms a setup intent and returns the stored payment method id.
    async fn confirm_card_setup(
        &self,
        client_secret: &SecretString,
        card: &CardInput,
    ) -> Result<String, PaymentError>;
}

/// What the hosted checkout widget is opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub attempt_id: AttemptId,

    /// Public key id of the checkout provider.
    pub key_id: String,

    /// Order id or subscription id the widget pays.
    pub reference: String,
    pub amount: Money,
}

/// How the checkout widget closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed { payment_id: String, signature: String },
    Dismissed,
}

/// Hosted checkout widget script.
#[async_trait]
pub trait CheckoutWidget: Send + Sync {
    /// Opens the widget and waits for its callback.
    async fn open(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, PaymentError>;
}

/// Full-page navigation to a provider approval page.
#[async_trait]
pub trait RedirectNavigator: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), PaymentError>;
}
