//! Durable record of a redirect attempt awaiting the user's return.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AttemptId, Money, Timestamp};
use crate::domain::subscription::BillingCycle;

use super::{AdmissionKey, AttemptKind, ProviderRef, Subject};

/// Written synchronously before the browser leaves for the provider, keyed
/// by the provider reference the return URL carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectCheckpoint {
    pub attempt_id: AttemptId,
    pub kind: AttemptKind,
    pub subject: Subject,
    pub provider_ref: ProviderRef,
    pub price: Money,
    #[serde(default)]
    pub cycle: Option<BillingCycle>,
    #[serde(default)]
    pub plan_ref: Option<String>,
    pub created_at: Timestamp,
}

impl RedirectCheckpoint {
    /// Storage key: the provider's order or subscription id.
    pub fn key(&self) -> &str {
        &self.provider_ref.value
    }

    /// The admission slot the waiting attempt still occupies.
    pub fn admission_key(&self) -> AdmissionKey {
        AdmissionKey {
            subject: self.subject.clone(),
            kind: self.kind,
        }
    }
}
