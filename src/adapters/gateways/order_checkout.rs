//! Hosted-checkout gateway adapter.
//!
//! Step 1 creates an order (purchases) or a checkout subscription on the
//! backend. Step 2 opens the hosted widget and, once it reports a payment,
//! has the backend capture it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::payment::{Gateway, Handoff, PaymentAttempt, ProviderRef, ProviderRefKind, Subject};
use crate::ports::{
    CaptureOrderRequest, CheckoutOutcome, CheckoutRequest, CheckoutWidget, CreateOrderRequest,
    CreateSubscriptionRequest, GatewayAdapter, PaymentBackend, PaymentError, StepInput, StepResult,
};

use super::{require_cycle, require_key, require_price};

pub struct OrderCheckoutAdapter {
    backend: Arc<dyn PaymentBackend>,
    widget: Arc<dyn CheckoutWidget>,
    key_id: Option<String>,
}

impl OrderCheckoutAdapter {
    pub fn new(
        backend: Arc<dyn PaymentBackend>,
        widget: Arc<dyn CheckoutWidget>,
        key_id: Option<String>,
    ) -> Self {
        Self {
            backend,
            widget,
            key_id,
        }
    }
}

#[async_trait]
impl GatewayAdapter for OrderCheckoutAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::OrderCheckout
    }

    fn step2_is_interactive(&self) -> bool {
        true
    }

    async fn start_step1(&self, attempt: &PaymentAttempt) -> Result<StepResult, PaymentError> {
        require_key(&self.key_id, "checkout key id")?;
        let price = require_price(attempt)?;

        let (ref_kind, reference) = match attempt.subject() {
            Subject::Item(item) => {
                let order = self
                    .backend
                    .create_order(
                        Gateway::OrderCheckout,
                        CreateOrderRequest {
                            attempt_id: attempt.id(),
                            item: item.clone(),
                            price: price.clone(),
                            return_url: None,
                        },
                    )
                    .await?;
                (ProviderRefKind::Order, order.order_id)
            }
            Subject::Artist { artist_id } => {
                let subscription = self
                    .backend
                    .create_subscription(
                        artist_id,
                        CreateSubscriptionRequest {
                            attempt_id: attempt.id(),
                            gateway: Gateway::OrderCheckout,
                            cycle: require_cycle(attempt)?,
                            payment_method: None,
                            plan_ref: attempt.plan_ref().map(str::to_string),
                        },
                    )
                    .await?;
                (ProviderRefKind::Subscription, subscription.subscription_id)
            }
        };

        tracing::debug!(attempt_id = %attempt.id(), %reference, "Checkout reference created");

        Ok(StepResult::default()
            .with_ref(ProviderRef::new(ref_kind, reference.clone()))
            .with_handoff(Handoff::OpenCheckout {
                reference,
                amount: price.clone(),
            }))
    }

    async fn start_step2(
        &self,
        attempt: &PaymentAttempt,
        _input: StepInput,
    ) -> Result<StepResult, PaymentError> {
        let key_id = require_key(&self.key_id, "checkout key id")?;
        let (reference, amount) = match attempt.handoff() {
            Some(Handoff::OpenCheckout { reference, amount }) => (reference.clone(), amount.clone()),
            _ => return Err(PaymentError::configuration("no checkout reference to pay")),
        };

        let outcome = self
            .widget
            .open(CheckoutRequest {
                attempt_id: attempt.id(),
                key_id: key_id.to_string(),
                reference: reference.clone(),
                amount,
            })
            .await?;

        let (payment_id, signature) = match outcome {
            CheckoutOutcome::Completed {
                payment_id,
                signature,
            } => (payment_id, signature),
            CheckoutOutcome::Dismissed => return Err(PaymentError::user_cancelled()),
        };

        self.backend
            .capture_order(
                Gateway::OrderCheckout,
                CaptureOrderRequest {
                    attempt_id: attempt.id(),
                    reference,
                    payment_id: Some(payment_id.clone()),
                    signature: Some(signature),
                },
            )
            .await?;

        Ok(StepResult::default().with_ref(ProviderRef::new(ProviderRefKind::Payment, payment_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockCheckoutWidget, MockPaymentBackend};
    use crate::domain::foundation::{ArtistId, AttemptId, Currency, ItemId, Money};
    use crate::domain::payment::{Charge, ItemRef};
    use crate::domain::subscription::{BillingCycle, ResolvedPlan};
    use crate::ports::PaymentErrorCode;

    fn inr(amount: i64) -> Money {
        Money::new(amount, Currency::new("INR").unwrap()).unwrap()
    }

    fn adapter(backend: &MockPaymentBackend, widget: &MockCheckoutWidget) -> OrderCheckoutAdapter {
        OrderCheckoutAdapter::new(
            Arc::new(backend.clone()),
            Arc::new(widget.clone()),
            Some("rzp_test_key".to_string()),
        )
    }

    async fn at_step2(adapter: &OrderCheckoutAdapter, subject: Subject, charge: Charge) -> PaymentAttempt {
        let mut attempt = PaymentAttempt::new(AttemptId::new(), subject);
        attempt.select_gateway(Gateway::OrderCheckout, charge).unwrap();
        attempt.begin_step1().unwrap();
        let result = adapter.start_step1(&attempt).await.unwrap();
        attempt.complete_step1(result.provider_refs, result.handoff).unwrap();
        attempt.begin_step2().unwrap();
        attempt
    }

    fn album() -> Subject {
        Subject::Item(ItemRef::album(ItemId::new("album-9").unwrap()))
    }

    #[tokio::test]
    async fn purchase_pays_in_widget_then_captures() {
        let backend = MockPaymentBackend::new();
        let widget = MockCheckoutWidget::new();
        let adapter = adapter(&backend, &widget);
        let attempt = at_step2(&adapter, album(), Charge::one_off(inr(49900))).await;

        let result = adapter.start_step2(&attempt, StepInput::Proceed).await.unwrap();

        let opened = widget.opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].key_id, "rzp_test_key");
        assert_eq!(opened[0].amount, inr(49900));
        assert!(backend.was_called("capture_order"));
        assert_eq!(result.provider_refs[0].kind, ProviderRefKind::Payment);
    }

    #[tokio::test]
    async fn dismissed_widget_is_user_cancellation() {
        let backend = MockPaymentBackend::new();
        let widget = MockCheckoutWidget::new();
        widget.dismiss();
        let adapter = adapter(&backend, &widget);
        let attempt = at_step2(&adapter, album(), Charge::one_off(inr(100))).await;

        let err = adapter.start_step2(&attempt, StepInput::Proceed).await.unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::UserCancelled);
        assert!(!backend.was_called("capture_order"));
    }

    #[tokio::test]
    async fn subscription_creates_checkout_subscription() {
        let backend = MockPaymentBackend::new();
        let adapter = adapter(&backend, &MockCheckoutWidget::new());
        let plan = ResolvedPlan {
            cycle: BillingCycle::OneMonth,
            price: inr(19900),
            plan_ref: None,
        };
        let subject = Subject::artist(ArtistId::new("artist-b").unwrap());

        let attempt = at_step2(&adapter, subject, plan.into()).await;

        let subscription_id = attempt
            .provider_refs()
            .latest(ProviderRefKind::Subscription)
            .unwrap()
            .to_string();
        assert!(matches!(
            attempt.handoff(),
            Some(Handoff::OpenCheckout { reference, .. }) if reference == &subscription_id
        ));

        adapter.start_step2(&attempt, StepInput::Proceed).await.unwrap();
        assert_eq!(
            backend.subscription(&subscription_id).unwrap().status,
            crate::domain::subscription::SubscriptionStatus::Active
        );
    }

    #[tokio::test]
    async fn missing_key_id_is_configuration_error() {
        let backend = MockPaymentBackend::new();
        let adapter = OrderCheckoutAdapter::new(
            Arc::new(backend.clone()),
            Arc::new(MockCheckoutWidget::new()),
            None,
        );
        let mut attempt = PaymentAttempt::new(AttemptId::new(), album());
        attempt
            .select_gateway(Gateway::OrderCheckout, Charge::one_off(inr(100)))
            .unwrap();

        let err = adapter.start_step1(&attempt).await.unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::ConfigurationError);
        assert!(backend.calls().is_empty());
    }
}
