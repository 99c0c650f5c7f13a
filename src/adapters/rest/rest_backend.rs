//! `reqwest` implementation of the backend ports.
//!
//! # Error Mapping
//!
//! | Response | `PaymentErrorCode` |
//! |---|---|
//! | transport failure, 5xx, 429 | `NetworkError` |
//! | 402, or body code `provider_declined` / `card_declined` | `ProviderDeclined` |
//! | 401, 403 | `ConfigurationError` |
//! | 404 | `NotFound` |
//! | anything else | `ProviderError` |
//!
//! Create calls send the attempt id as `Idempotency-Key`, so a resent request
//! after a dropped response never creates a second intent, order or
//! subscription.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::domain::foundation::{ArtistId, AttemptId, ItemId};
use crate::domain::payment::Gateway;
use crate::domain::subscription::{ArtistPlans, SubscriptionRecord};
use crate::ports::{
    ActivationStatus, CaptureOrderRequest, CardIntent, ConfirmCardPaymentRequest,
    CreateCardIntentRequest, CreateOrderRequest, CreateRedirectSubscriptionRequest,
    CreateSubscriptionRequest, EntitlementReader, OrderCreated, PaymentBackend, PaymentConfirmation,
    PaymentError, PaymentErrorCode, PlanCatalog, RedirectSubscription, SubscriptionCreated,
};

use super::wire_types::{
    ActivateBody, ActivateResponse, CaptureOrderBody, ConfirmPaymentBody, ConfirmationResponse,
    CreateOrderBody, CreateOrderResponse, CreatePaymentBody, CreatePaymentResponse,
    CreateRedirectSubscriptionBody, CreateSubscriptionBody, ErrorBody, PlansResponse,
    PurchasesResponse, RedirectSubscriptionResponse, SubscriptionResponse, SubscriptionsResponse,
    WireItem, WireMoney,
};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Body codes the backend uses for provider declines.
const DECLINE_CODES: [&str; 2] = ["provider_declined", "card_declined"];

/// Connection settings for the payments backend.
#[derive(Clone)]
pub struct RestBackendConfig {
    base_url: String,
    api_token: Option<SecretString>,
    timeout: Duration,
}

impl RestBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Bearer token sent on every request.
    pub fn with_api_token(mut self, token: SecretString) -> Self {
        self.api_token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Client for the payments backend.
pub struct RestPaymentBackend {
    config: RestBackendConfig,
    http_client: reqwest::Client,
}

impl RestPaymentBackend {
    pub fn new(config: RestBackendConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<AttemptId>,
    ) -> Result<R, PaymentError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut builder = self.authorize(self.http_client.post(self.url(path))).json(body);
        if let Some(key) = idempotency_key {
            builder = builder.header(IDEMPOTENCY_HEADER, key.to_string());
        }
        self.send(path, builder).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, PaymentError> {
        let builder = self.authorize(self.http_client.get(self.url(path)));
        self.send(path, builder).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<R, PaymentError> {
        let response = builder
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = map_error_response(status, &body);
            if err.code == PaymentErrorCode::ConfigurationError {
                tracing::error!(path, %status, "Payments backend rejected client credentials");
            } else {
                tracing::warn!(path, %status, code = %err.code, "Payments backend call failed");
            }
            return Err(err);
        }

        response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse backend response from {}: {}", path, e))
        })
    }
}

/// Maps a non-2xx response to a `PaymentError`.
pub(crate) fn map_error_response(status: StatusCode, body: &str) -> PaymentError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("backend returned {}", status));

    let body_declined = parsed
        .code
        .as_deref()
        .map(|code| DECLINE_CODES.contains(&code))
        .unwrap_or(false);

    let code = if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        PaymentErrorCode::NetworkError
    } else if body_declined || status == StatusCode::PAYMENT_REQUIRED {
        PaymentErrorCode::ProviderDeclined
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        PaymentErrorCode::ConfigurationError
    } else if status == StatusCode::NOT_FOUND {
        PaymentErrorCode::NotFound
    } else {
        PaymentErrorCode::ProviderError
    };

    let err = PaymentError::new(code, message);
    match parsed.code {
        Some(provider_code) => err.with_provider_code(provider_code),
        None => err,
    }
}

#[async_trait]
impl PaymentBackend for RestPaymentBackend {
    async fn create_card_intent(
        &self,
        request: CreateCardIntentRequest,
    ) -> Result<CardIntent, PaymentError> {
        let path = format!("/payments/{}/create-payment", Gateway::CardVault.slug());
        let body = CreatePaymentBody::new(request.mode, &request.subject, &request.price);
        let response: CreatePaymentResponse =
            self.post(&path, &body, Some(request.attempt_id)).await?;

        Ok(CardIntent {
            intent_id: response.intent_id,
            client_secret: response.client_secret,
        })
    }

    async fn confirm_card_payment(
        &self,
        request: ConfirmCardPaymentRequest,
    ) -> Result<PaymentConfirmation, PaymentError> {
        let path = format!("/payments/{}/confirm-payment", Gateway::CardVault.slug());
        let body = ConfirmPaymentBody {
            intent_id: request.intent_id,
            item: WireItem::from(&request.item),
        };
        let response: ConfirmationResponse = self.post(&path, &body, None).await?;
        Ok(PaymentConfirmation {
            payment_id: response.payment_id,
        })
    }

    async fn create_order(
        &self,
        gateway: Gateway,
        request: CreateOrderRequest,
    ) -> Result<OrderCreated, PaymentError> {
        let path = format!("/payments/{}/create-order", gateway.slug());
        let body = CreateOrderBody {
            item: WireItem::from(&request.item),
            amount: WireMoney::from(&request.price),
            return_url: request.return_url,
        };
        let response: CreateOrderResponse =
            self.post(&path, &body, Some(request.attempt_id)).await?;

        Ok(OrderCreated {
            order_id: response.order_id,
            approve_url: response.approve_url,
        })
    }

    async fn capture_order(
        &self,
        gateway: Gateway,
        request: CaptureOrderRequest,
    ) -> Result<PaymentConfirmation, PaymentError> {
        let path = format!("/payments/{}/capture-order", gateway.slug());
        let body = CaptureOrderBody {
            reference: request.reference,
            payment_id: request.payment_id,
            signature: request.signature,
        };
        let response: ConfirmationResponse = self.post(&path, &body, None).await?;
        Ok(PaymentConfirmation {
            payment_id: response.payment_id,
        })
    }

    async fn create_subscription(
        &self,
        artist_id: &ArtistId,
        request: CreateSubscriptionRequest,
    ) -> Result<SubscriptionCreated, PaymentError> {
        let path = format!("/subscriptions/artist/{}", artist_id);
        let body = CreateSubscriptionBody {
            gateway: request.gateway,
            cycle: request.cycle,
            payment_method: request.payment_method,
            plan_ref: request.plan_ref,
        };
        let response: SubscriptionResponse =
            self.post(&path, &body, Some(request.attempt_id)).await?;

        Ok(SubscriptionCreated {
            subscription_id: response.subscription_id,
            status: response.status,
        })
    }

    async fn create_redirect_subscription(
        &self,
        gateway: Gateway,
        artist_id: &ArtistId,
        request: CreateRedirectSubscriptionRequest,
    ) -> Result<RedirectSubscription, PaymentError> {
        let path = format!("/subscriptions/{}/artist/{}", gateway.slug(), artist_id);
        let body = CreateRedirectSubscriptionBody {
            cycle: request.cycle,
            plan_ref: request.plan_ref,
            return_url: request.return_url,
        };
        let response: RedirectSubscriptionResponse =
            self.post(&path, &body, Some(request.attempt_id)).await?;

        Ok(RedirectSubscription {
            subscription_id: response.subscription_id,
            approve_url: response.approve_url,
        })
    }

    async fn activate_subscription(
        &self,
        gateway: Gateway,
        subscription_id: &str,
    ) -> Result<ActivationStatus, PaymentError> {
        let path = format!("/subscriptions/{}/activate", gateway.slug());
        let body = ActivateBody {
            subscription_id: subscription_id.to_string(),
        };
        let response: ActivateResponse = self.post(&path, &body, None).await?;
        Ok(response.status)
    }

    async fn cancel_subscription(&self, artist_id: &ArtistId) -> Result<(), PaymentError> {
        let path = format!("/subscriptions/artist/{}", artist_id);
        let builder = self.authorize(self.http_client.delete(self.url(&path)));
        let response = builder
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_response(status, &body));
        }
        Ok(())
    }
}

#[async_trait]
impl PlanCatalog for RestPaymentBackend {
    async fn artist_plans(&self, artist_id: &ArtistId) -> Result<ArtistPlans, PaymentError> {
        let response: PlansResponse = self.get(&format!("/artists/{}/plans", artist_id)).await?;
        response.into_plans(artist_id)
    }
}

#[async_trait]
impl EntitlementReader for RestPaymentBackend {
    async fn purchased_items(&self) -> Result<Vec<ItemId>, PaymentError> {
        let response: PurchasesResponse = self.get("/me/purchases").await?;
        response.into_item_ids()
    }

    async fn subscriptions(&self) -> Result<Vec<SubscriptionRecord>, PaymentError> {
        let response: SubscriptionsResponse = self.get("/me/subscriptions").await?;
        response.into_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_trims_trailing_slash() {
        let config = RestBackendConfig::new("https://api.example.test/");
        assert_eq!(config.base_url(), "https://api.example.test");
    }

    #[test]
    fn config_defaults_to_no_token() {
        let config = RestBackendConfig::new("http://localhost:8080");
        assert!(config.api_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn server_errors_and_rate_limits_are_network_errors() {
        for status in [StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY, StatusCode::TOO_MANY_REQUESTS] {
            let err = map_error_response(status, "");
            assert_eq!(err.code, PaymentErrorCode::NetworkError, "{}", status);
            assert!(err.retryable);
        }
    }

    #[test]
    fn decline_body_code_wins_over_status() {
        let err = map_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"code": "card_declined", "message": "Your card has insufficient funds."}"#,
        );
        assert_eq!(err.code, PaymentErrorCode::ProviderDeclined);
        assert_eq!(err.message, "Your card has insufficient funds.");
        assert_eq!(err.provider_code.as_deref(), Some("card_declined"));
    }

    #[test]
    fn payment_required_is_a_decline() {
        let err = map_error_response(StatusCode::PAYMENT_REQUIRED, "not json");
        assert_eq!(err.code, PaymentErrorCode::ProviderDeclined);
        assert!(err.message.contains("402"));
    }

    #[test]
    fn auth_failures_are_configuration_errors() {
        assert_eq!(
            map_error_response(StatusCode::UNAUTHORIZED, "").code,
            PaymentErrorCode::ConfigurationError
        );
        assert_eq!(
            map_error_response(StatusCode::FORBIDDEN, "").code,
            PaymentErrorCode::ConfigurationError
        );
    }

    #[test]
    fn other_statuses_map_to_not_found_or_provider_error() {
        assert_eq!(map_error_response(StatusCode::NOT_FOUND, "").code, PaymentErrorCode::NotFound);
        assert_eq!(
            map_error_response(StatusCode::UNPROCESSABLE_ENTITY, r#"{"code": "bad_plan"}"#).code,
            PaymentErrorCode::ProviderError
        );
    }
}
