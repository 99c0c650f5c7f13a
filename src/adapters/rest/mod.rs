//! REST adapter for the platform's payments backend.
//!
//! `RestPaymentBackend` implements `PaymentBackend`, `PlanCatalog` and
//! `EntitlementReader` over JSON/HTTP.

mod rest_backend;
mod wire_types;

pub use rest_backend::{RestBackendConfig, RestPaymentBackend};
