//! Application handlers.
//!
//! Command handlers that sit beside the orchestrator and need no attempt.

mod cancel_subscription;

pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
