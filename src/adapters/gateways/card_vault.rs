//! Card-vault gateway adapter.
//!
//! Step 1 creates a payment intent (purchases) or setup intent (subscriptions)
//! on the backend. Step 2 confirms the intent in the card script, then asks the
//! backend to confirm the charge or create the subscription.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::payment::{Gateway, Handoff, PaymentAttempt, ProviderRef, ProviderRefKind, Subject};
use crate::ports::{
    CardVaultSdk, ConfirmCardPaymentRequest, CreateCardIntentRequest, CreateSubscriptionRequest,
    GatewayAdapter, IntentMode, PaymentBackend, PaymentError, StepInput, StepResult,
};

use super::{require_cycle, require_key, require_price};

pub struct CardVaultAdapter {
    backend: Arc<dyn PaymentBackend>,
    sdk: Arc<dyn CardVaultSdk>,
    publishable_key: Option<String>,
}

impl CardVaultAdapter {
    pub fn new(
        backend: Arc<dyn PaymentBackend>,
        sdk: Arc<dyn CardVaultSdk>,
        publishable_key: Option<String>,
    ) -> Self {
        Self {
            backend,
            sdk,
            publishable_key,
        }
    }
}

#[async_trait]
impl GatewayAdapter for CardVaultAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::CardVault
    }

    fn step2_is_interactive(&self) -> bool {
        true
    }

    async fn start_step1(&self, attempt: &PaymentAttempt) -> Result<StepResult, PaymentError> {
        require_key(&self.publishable_key, "card-vault publishable key")?;
        let price = require_price(attempt)?;

        let (mode, ref_kind) = match attempt.subject() {
            Subject::Item(_) => (IntentMode::Payment, ProviderRefKind::PaymentIntent),
            Subject::Artist { .. } => (IntentMode::Setup, ProviderRefKind::SetupIntent),
        };

        let intent = self
            .backend
            .create_card_intent(CreateCardIntentRequest {
                attempt_id: attempt.id(),
                mode,
                subject: attempt.subject().clone(),
                price: price.clone(),
            })
            .await?;

        tracing::debug!(attempt_id = %attempt.id(), intent_id = %intent.intent_id, ?mode, "Card intent created");

        Ok(StepResult::default()
            .with_ref(ProviderRef::new(ref_kind, intent.intent_id.clone()))
            .with_handoff(Handoff::ConfirmCard {
                intent_id: intent.intent_id,
                client_secret: SecretString::new(intent.client_secret),
            }))
    }

    async fn start_step2(
        &self,
        attempt: &PaymentAttempt,
        input: StepInput,
    ) -> Result<StepResult, PaymentError> {
        let card = match input {
            StepInput::Card(card) => card,
            _ => return Err(PaymentError::configuration("card details are required")),
        };
        let (intent_id, client_secret) = match attempt.handoff() {
            Some(Handoff::ConfirmCard {
                intent_id,
                client_secret,
            }) => (intent_id.clone(), client_secret),
            _ => return Err(PaymentError::configuration("no card intent to confirm")),
        };

        match attempt.subject() {
            Subject::Item(item) => {
                let confirmation = self.sdk.confirm_card_payment(client_secret, &card).await?;
                let confirmed = self
                    .backend
                    .confirm_card_payment(ConfirmCardPaymentRequest {
                        attempt_id: attempt.id(),
                        intent_id: confirmation.intent_id.clone(),
                        item: item.clone(),
                    })
                    .await?;

                let mut result = StepResult::default()
                    .with_ref(ProviderRef::new(ProviderRefKind::PaymentIntent, intent_id));
                if let Some(method) = confirmation.payment_method {
                    result = result.with_ref(ProviderRef::new(ProviderRefKind::PaymentMethod, method));
                }
                if let Some(payment_id) = confirmed.payment_id {
                    result = result.with_ref(ProviderRef::new(ProviderRefKind::Payment, payment_id));
                }
                Ok(result)
            }
            Subject::Artist { artist_id } => {
                let cycle = require_cycle(attempt)?;
                let payment_method = self.sdk.confirm_card_setup(client_secret, &card).await?;
                let subscription = self
                    .backend
                    .create_subscription(
                        artist_id,
                        CreateSubscriptionRequest {
                            attempt_id: attempt.id(),
                            gateway: Gateway::CardVault,
                            cycle,
                            payment_method: Some(payment_method.clone()),
                            plan_ref: attempt.plan_ref().map(str::to_string),
                        },
                    )
                    .await?;

                tracing::debug!(
                    attempt_id = %attempt.id(),
                    subscription_id = %subscription.subscription_id,
                    status = ?subscription.status,
                    "Card subscription created"
                );

                Ok(StepResult::default()
                    .with_ref(ProviderRef::new(ProviderRefKind::PaymentMethod, payment_method))
                    .with_ref(ProviderRef::new(
                        ProviderRefKind::Subscription,
                        subscription.subscription_id,
                    )))
            }
        }
    }
}
