//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Backend Ports
//!
//! - `PaymentBackend` - Intents, orders, captures, subscriptions
//! - `PlanCatalog` - Artist subscription plans
//! - `EntitlementReader` - Server-confirmed purchases and subscriptions
//!
//! ## Client Ports
//!
//! - `GatewayAdapter` - Per-provider step sequences
//! - `CardVaultSdk`, `CheckoutWidget`, `RedirectNavigator` - Provider scripts
//! - `CheckpointStore` - Durable redirect checkpoints

mod checkpoint_store;
mod entitlement_reader;
mod gateway_adapter;
mod payment_backend;
mod payment_error;
mod plan_catalog;
mod provider_sdk;

pub use checkpoint_store::{CheckpointError, CheckpointStore};
pub use entitlement_reader::EntitlementReader;
pub use gateway_adapter::{GatewayAdapter, StepInput, StepResult};
pub use payment_backend::{
    ActivationStatus, CaptureOrderRequest, CardIntent, ConfirmCardPaymentRequest,
    CreateCardIntentRequest, CreateOrderRequest, CreateRedirectSubscriptionRequest,
    CreateSubscriptionRequest, IntentMode, OrderCreated, PaymentBackend, PaymentConfirmation,
    RedirectSubscription, SubscriptionCreated,
};
pub use payment_error::{PaymentError, PaymentErrorCode};
pub use plan_catalog::PlanCatalog;
pub use provider_sdk::{
    CardConfirmation, CardInput, CardVaultSdk, CheckoutOutcome, CheckoutRequest, CheckoutWidget,
    RedirectNavigator,
};
