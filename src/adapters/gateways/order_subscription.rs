//! Redirect-approval gateway adapter.
//!
//! Step 1 creates an order (purchases) or a subscription against a
//! pre-registered plan (subscriptions) and returns the approval URL. The
//! orchestrator checkpoints the attempt and calls [`GatewayAdapter::redirect`].
//! Step 2 runs when the user comes back: capture the order or activate the
//! subscription.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::payment::{Gateway, Handoff, PaymentAttempt, ProviderRef, ProviderRefKind, Subject};
use crate::ports::{
    ActivationStatus, CaptureOrderRequest, CreateOrderRequest, CreateRedirectSubscriptionRequest,
    GatewayAdapter, PaymentBackend, PaymentError, RedirectNavigator, StepInput, StepResult,
};

use super::{require_cycle, require_key, require_price, require_ref};

pub struct OrderSubscriptionAdapter {
    backend: Arc<dyn PaymentBackend>,
    navigator: Arc<dyn RedirectNavigator>,
    client_id: Option<String>,
    return_url: Option<String>,
}

impl OrderSubscriptionAdapter {
    pub fn new(
        backend: Arc<dyn PaymentBackend>,
        navigator: Arc<dyn RedirectNavigator>,
        client_id: Option<String>,
        return_url: Option<String>,
    ) -> Self {
        Self {
            backend,
            navigator,
            client_id,
            return_url,
        }
    }
}

#[async_trait]
impl GatewayAdapter for OrderSubscriptionAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::OrderSubscription
    }

    async fn start_step1(&self, attempt: &PaymentAttempt) -> Result<StepResult, PaymentError> {
        require_key(&self.client_id, "redirect gateway client id")?;
        let price = require_price(attempt)?;

        let (ref_kind, reference, approve_url) = match attempt.subject() {
            Subject::Item(item) => {
                let order = self
                    .backend
                    .create_order(
                        Gateway::OrderSubscription,
                        CreateOrderRequest {
                            attempt_id: attempt.id(),
                            item: item.clone(),
                            price: price.clone(),
                            return_url: self.return_url.clone(),
                        },
                    )
                    .await?;
                let approve_url = order
                    .approve_url
                    .ok_or_else(|| PaymentError::provider("order has no approval link"))?;
                (ProviderRefKind::Order, order.order_id, approve_url)
            }
            Subject::Artist { artist_id } => {
                let plan_ref = attempt
                    .plan_ref()
                    .ok_or_else(|| PaymentError::configuration("redirect subscription has no plan"))?;
                let subscription = self
                    .backend
                    .create_redirect_subscription(
                        Gateway::OrderSubscription,
                        artist_id,
                        CreateRedirectSubscriptionRequest {
                            attempt_id: attempt.id(),
                            cycle: require_cycle(attempt)?,
                            plan_ref: plan_ref.to_string(),
                            return_url: self.return_url.clone(),
                        },
                    )
                    .await?;
                (
                    ProviderRefKind::Subscription,
                    subscription.subscription_id,
                    subscription.approve_url,
                )
            }
        };

        Ok(StepResult::default()
            .with_ref(ProviderRef::new(ref_kind, reference))
            .with_handoff(Handoff::Redirect { approve_url }))
    }

    async fn start_step2(
        &self,
        attempt: &PaymentAttempt,
        input: StepInput,
    ) -> Result<StepResult, PaymentError> {
        if !matches!(input, StepInput::RedirectReturn) {
            return Err(PaymentError::configuration(
                "redirect gateway only completes on return from the provider",
            ));
        }

        match attempt.subject() {
            Subject::Item(_) => {
                let order_id = require_ref(attempt, ProviderRefKind::Order)?;
                let confirmed = self
                    .backend
                    .capture_order(
                        Gateway::OrderSubscription,
                        CaptureOrderRequest {
                            attempt_id: attempt.id(),
                            reference: order_id,
                            payment_id: None,
                            signature: None,
                        },
                    )
                    .await?;
                Ok(match confirmed.payment_id {
                    Some(payment_id) => StepResult::default()
                        .with_ref(ProviderRef::new(ProviderRefKind::Payment, payment_id)),
                    None => StepResult::default(),
                })
            }
            Subject::Artist { .. } => {
                let subscription_id = require_ref(attempt, ProviderRefKind::Subscription)?;
                let status = self
                    .backend
                    .activate_subscription(Gateway::OrderSubscription, &subscription_id)
                    .await?;
                if status == ActivationStatus::AlreadyActive {
                    tracing::info!(
                        attempt_id = %attempt.id(),
                        %subscription_id,
                        "Subscription was already active"
                    );
                }
                Ok(StepResult::default())
            }
        }
    }

    async fn redirect(&self, approve_url: &str) -> Result<(), PaymentError> {
        require_key(&self.client_id, "redirect gateway client id")?;
        self.navigator.navigate(approve_url).await
    }
}
