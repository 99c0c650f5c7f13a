//! Gateway adapter port.
//!
//! One adapter per provider translates the generic attempt into that
//! provider's call sequence. Each step performs exactly one backend call and
//! at most one provider-script call. Adapters never touch reconciliation
//! state; the orchestrator does that after a terminal success.

use async_trait::async_trait;

use crate::domain::payment::{Gateway, Handoff, PaymentAttempt, ProviderRef};

use super::{CardInput, PaymentError};

/// Input the UI supplies when starting step 2.
#[derive(Debug, Clone)]
pub enum StepInput {
    /// No extra input: the adapter drives the provider script itself.
    Proceed,

    /// Card details for the card-vault confirmation.
    Card(CardInput),

    /// The user came back from the provider's approval page.
    RedirectReturn,
}

/// What a successful step produced.
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    pub provider_refs: Vec<ProviderRef>,
    pub handoff: Option<Handoff>,
}

impl StepResult {
    pub fn with_ref(mut self, provider_ref: ProviderRef) -> Self {
        self.provider_refs.push(provider_ref);
        self
    }

    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoff = Some(handoff);
        self
    }
}

#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    fn gateway(&self) -> Gateway;

    /// Whether step 2 waits on the user (card entry, widget), which gets the
    /// longer interactive timeout.
    fn step2_is_interactive(&self) -> bool {
        false
    }

    async fn start_step1(&self, attempt: &PaymentAttempt) -> Result<StepResult, PaymentError>;

    async fn start_step2(
        &self,
        attempt: &PaymentAttempt,
        input: StepInput,
    ) -> Result<StepResult, PaymentError>;

    /// Leaves the app for the provider's approval page.
    async fn redirect(&self, approve_url: &str) -> Result<(), PaymentError> {
        let _ = approve_url;
        Err(PaymentError::configuration(format!(
            "{} does not use redirects",
            self.gateway()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_adapter_is_object_safe() {
        fn _accepts_dyn(_adapter: &dyn GatewayAdapter) {}
    }
}
