//! Payment domain module.
//!
//! The payment attempt aggregate, its state machine, and the value types
//! gateways exchange while driving it.
//!
//! # Module Structure
//!
//! - `attempt` - PaymentAttempt aggregate
//! - `state` - AttemptState state machine
//! - `gateway` - Supported payment gateways
//! - `checkpoint` - Durable redirect checkpoint

mod attempt;
mod checkpoint;
mod failure;
mod gateway;
mod handoff;
mod provider_ref;
mod state;
mod subject;

pub use attempt::{AttemptError, Charge, PaymentAttempt};
pub use checkpoint::RedirectCheckpoint;
pub use failure::{FailureKind, PaymentFailure};
pub use gateway::Gateway;
pub use handoff::Handoff;
pub use provider_ref::{ProviderRef, ProviderRefKind, ProviderRefs};
pub use state::{AttemptState, TerminalOutcome};
pub use subject::{AdmissionKey, AttemptKind, ItemKind, ItemRef, Subject};
