//! Mock provider scripts: card element, checkout widget and page navigation.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{
    CardConfirmation, CardInput, CardVaultSdk, CheckoutOutcome, CheckoutRequest, CheckoutWidget,
    PaymentError, RedirectNavigator,
};

use super::Gates;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ════════════════════════════════════════════════════════════════════════════
// Card vault
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct CardState {
    decline: Option<String>,
    error: Option<PaymentError>,
    confirmed_secrets: Vec<String>,
}

/// Card-vault script that confirms every intent unless told to decline.
#[derive(Clone, Default)]
pub struct MockCardVaultSdk {
    inner: Arc<Mutex<CardState>>,
    gates: Gates,
}

impl MockCardVaultSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following confirmation is declined with this provider message.
    pub fn decline_with(&self, message: impl Into<String>) {
        lock(&self.inner).decline = Some(message.into());
    }

    /// Every following confirmation fails with this error.
    pub fn fail_with(&self, error: PaymentError) {
        lock(&self.inner).error = Some(error);
    }

    /// Client secrets of intents confirmed so far.
    pub fn confirmed_secrets(&self) -> Vec<String> {
        lock(&self.inner).confirmed_secrets.clone()
    }

    pub fn gates(&self) -> &Gates {
        &self.gates
    }

    async fn confirm(&self, method: &str, client_secret: &SecretString) -> Result<String, PaymentError> {
        self.gates.pass(method).await;

        let mut state = lock(&self.inner);
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        if let Some(message) = &state.decline {
            return Err(PaymentError::declined(message.clone()).with_provider_code("card_declined"));
        }
        let secret = client_secret.expose_secret().clone();
        state.confirmed_secrets.push(secret.clone());

        // Intent ids are the secret's prefix: "{intent_id}_secret".
        Ok(secret.trim_end_matches("_secret").to_string())
    }
}

#[async_trait]
impl CardVaultSdk for MockCardVaultSdk {
    async fn confirm_card_payment(
        &self,
        client_secret: &SecretString,
        _card: &CardInput,
    ) -> Result<CardConfirmation, PaymentError> {
        let intent_id = self.confirm("confirm_card_payment", client_secret).await?;
        Ok(CardConfirmation {
            payment_method: Some(format!("pm_{}", intent_id)),
            intent_id,
        })
    }

    async fn confirm_card_setup(
        &self,
        client_secret: &SecretString,
        _card: &CardInput,
    ) -> Result<String, PaymentError> {
        let intent_id = self.confirm("confirm_card_setup", client_secret).await?;
        Ok(format!("pm_{}", intent_id))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Checkout widget
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct WidgetState {
    dismiss: bool,
    error: Option<PaymentError>,
    opened: Vec<CheckoutRequest>,
}

/// Checkout widget that completes payment unless told to dismiss.
#[derive(Clone, Default)]
pub struct MockCheckoutWidget {
    inner: Arc<Mutex<WidgetState>>,
    gates: Gates,
}

impl MockCheckoutWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user closes the widget without paying.
    pub fn dismiss(&self) {
        lock(&self.inner).dismiss = true;
    }

    pub fn fail_with(&self, error: PaymentError) {
        lock(&self.inner).error = Some(error);
    }

    /// Requests the widget was opened with.
    pub fn opened(&self) -> Vec<CheckoutRequest> {
        lock(&self.inner).opened.clone()
    }

    pub fn gates(&self) -> &Gates {
        &self.gates
    }
}

#[async_trait]
impl CheckoutWidget for MockCheckoutWidget {
    async fn open(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, PaymentError> {
        lock(&self.inner).opened.push(request.clone());
        self.gates.pass("open").await;

        let state = lock(&self.inner);
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        if state.dismiss {
            return Ok(CheckoutOutcome::Dismissed);
        }
        Ok(CheckoutOutcome::Completed {
            payment_id: format!("pay_{}", request.reference),
            signature: format!("sig_{}", request.reference),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Redirect navigation
// ════════════════════════════════════════════════════════════════════════════

/// Records the approval URLs the client was sent to.
#[derive(Clone, Default)]
pub struct MockRedirectNavigator {
    visited: Arc<Mutex<Vec<String>>>,
    error: Arc<Mutex<Option<PaymentError>>>,
}

impl MockRedirectNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: PaymentError) {
        *lock(&self.error) = Some(error);
    }

    pub fn visited(&self) -> Vec<String> {
        lock(&self.visited).clone()
    }
}

#[async_trait]
impl RedirectNavigator for MockRedirectNavigator {
    async fn navigate(&self, url: &str) -> Result<(), PaymentError> {
        if let Some(error) = lock(&self.error).clone() {
            return Err(error);
        }
        lock(&self.visited).push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AttemptId, Currency, Money};
    use crate::ports::PaymentErrorCode;

    #[tokio::test]
    async fn card_sdk_derives_intent_from_secret() {
        let sdk = MockCardVaultSdk::new();
        let secret = SecretString::new("pi_7_secret".to_string());

        let confirmation = sdk
            .confirm_card_payment(&secret, &CardInput::new("tok_visa"))
            .await
            .unwrap();

        assert_eq!(confirmation.intent_id, "pi_7");
        assert_eq!(sdk.confirmed_secrets(), vec!["pi_7_secret".to_string()]);
    }

    #[tokio::test]
    async fn card_sdk_decline_carries_provider_message() {
        let sdk = MockCardVaultSdk::new();
        sdk.decline_with("Your card was declined.");
        let secret = SecretString::new("pi_1_secret".to_string());

        let err = sdk
            .confirm_card_payment(&secret, &CardInput::new("tok_chargeDeclined"))
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::ProviderDeclined);
        assert_eq!(err.message, "Your card was declined.");
        assert!(sdk.confirmed_secrets().is_empty());
    }

    #[tokio::test]
    async fn dismissed_widget_reports_dismissal() {
        let widget = MockCheckoutWidget::new();
        widget.dismiss();

        let outcome = widget
            .open(CheckoutRequest {
                attempt_id: AttemptId::new(),
                key_id: "rzp_test".to_string(),
                reference: "order_1".to_string(),
                amount: Money::new(100, Currency::new("INR").unwrap()).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Dismissed);
        assert_eq!(widget.opened().len(), 1);
    }
}
