//! Mock adapters for tests and local development.
//!
//! - `MockPaymentBackend` - in-memory backend that keeps server-side state
//! - `MockCardVaultSdk`, `MockCheckoutWidget`, `MockRedirectNavigator` - provider scripts
//!
//! Every mock records its calls, supports per-method error injection and can
//! hold a call in flight until the test releases it.

mod gates;
mod mock_backend;
mod mock_scripts;

pub use gates::Gates;
pub use mock_backend::{MethodCall, MockPaymentBackend};
pub use mock_scripts::{MockCardVaultSdk, MockCheckoutWidget, MockRedirectNavigator};
