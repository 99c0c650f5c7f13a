//! Application layer - the orchestrator and the state it reconciles.
//!
//! The orchestrator drives attempts through gateway adapters; the
//! reconciliation store holds what the backend confirms. UI code reads the
//! store and the notices, never attempt internals.

pub mod handlers;
mod notice;
mod orchestrator;
mod reconciliation;
mod widget_lease;

pub use handlers::{CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult};
pub use notice::{NoticeKind, UserNotice};
pub use orchestrator::{
    BeginAttempt, OrchestratorConfig, OrchestratorError, PaymentOrchestrator, ResumeOutcome,
    StepReport,
};
pub use reconciliation::{EntitlementSnapshot, Ownership, ReconciliationStore};
pub use widget_lease::{WidgetLease, WidgetLeases};
