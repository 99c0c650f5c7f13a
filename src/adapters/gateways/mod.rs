//! Gateway adapters.
//!
//! Implements the `GatewayAdapter` port once per provider:
//! - `CardVaultAdapter` - intent created server-side, confirmed by the card script
//! - `OrderCheckoutAdapter` - order created server-side, paid in the hosted widget
//! - `OrderSubscriptionAdapter` - order/subscription approved on the provider's page

mod card_vault;
mod order_checkout;
mod order_subscription;

pub use card_vault::CardVaultAdapter;
pub use order_checkout::OrderCheckoutAdapter;
pub use order_subscription::OrderSubscriptionAdapter;

use crate::domain::foundation::Money;
use crate::domain::payment::{PaymentAttempt, ProviderRefKind};
use crate::domain::subscription::BillingCycle;
use crate::ports::PaymentError;

/// Rejects a gateway whose public key was never configured.
fn require_key<'a>(key: &'a Option<String>, name: &str) -> Result<&'a str, PaymentError> {
    match key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(PaymentError::configuration(format!("{} is not configured", name))),
    }
}

fn require_price(attempt: &PaymentAttempt) -> Result<&Money, PaymentError> {
    attempt
        .price()
        .ok_or_else(|| PaymentError::configuration("attempt has no resolved price"))
}

fn require_cycle(attempt: &PaymentAttempt) -> Result<BillingCycle, PaymentError> {
    attempt
        .cycle()
        .ok_or_else(|| PaymentError::configuration("subscription attempt has no billing cycle"))
}

fn require_ref(attempt: &PaymentAttempt, kind: ProviderRefKind) -> Result<String, PaymentError> {
    attempt
        .provider_refs()
        .latest(kind)
        .map(str::to_string)
        .ok_or_else(|| PaymentError::configuration(format!("attempt has no {:?} reference", kind)))
}
