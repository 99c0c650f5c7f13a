//! PaymentAttempt aggregate.
//!
//! One purchase or subscription creation in progress. Attempts live only in
//! memory; the redirect gateway additionally writes a [`RedirectCheckpoint`]
//! so the attempt can be rebuilt after the page is left.
//!
//! # Invariants
//!
//! - The charge (price, cycle, plan) is fixed when the gateway is selected
//!   and has no setter afterwards.
//! - `provider_refs` only grows.
//! - State changes follow [`AttemptState`]'s transition table.

use thiserror::Error;

use crate::domain::foundation::{AttemptId, Money, StateMachine, Timestamp};
use crate::domain::subscription::{BillingCycle, ResolvedPlan};

use super::{
    AttemptKind, AttemptState, FailureKind, Gateway, Handoff, PaymentFailure, ProviderRef,
    ProviderRefKind, ProviderRefs, RedirectCheckpoint, Subject,
};

/// Errors raised by attempt state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("a step is already in progress ({state:?})")]
    StepInProgress { state: AttemptState },

    #[error("cannot move attempt from {from:?} to {to:?}")]
    InvalidTransition { from: AttemptState, to: AttemptState },

    #[error("charge does not fit a {kind:?} attempt: {reason}")]
    InvalidCharge { kind: AttemptKind, reason: String },

    #[error("attempt is missing {0}")]
    Incomplete(&'static str),

    #[error("attempt cannot be re-offered under the same id")]
    NotRetryable,
}

/// The amount an attempt will charge, fixed at gateway selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    pub price: Money,
    pub cycle: Option<BillingCycle>,
    pub plan_ref: Option<String>,
}

impl Charge {
    /// Charge for a one-off item purchase.
    pub fn one_off(price: Money) -> Self {
        Self {
            price,
            cycle: None,
            plan_ref: None,
        }
    }
}

impl From<ResolvedPlan> for Charge {
    fn from(plan: ResolvedPlan) -> Self {
        Self {
            price: plan.price,
            cycle: Some(plan.cycle),
            plan_ref: plan.plan_ref,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    id: AttemptId,
    subject: Subject,
    gateway: Option<Gateway>,
    charge: Option<Charge>,
    state: AttemptState,
    provider_refs: ProviderRefs,
    handoff: Option<Handoff>,
    last_error: Option<PaymentFailure>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl PaymentAttempt {
    /// Creates an attempt in `Created` state. The kind follows from the subject.
    pub fn new(id: AttemptId, subject: Subject) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            subject,
            gateway: None,
            charge: None,
            state: AttemptState::Created,
            provider_refs: ProviderRefs::new(),
            handoff: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a redirected attempt from its checkpoint, awaiting the return call.
    pub fn from_checkpoint(checkpoint: &RedirectCheckpoint) -> Self {
        let mut provider_refs = ProviderRefs::new();
        provider_refs.append(checkpoint.provider_ref.clone());
        Self {
            id: checkpoint.attempt_id,
            subject: checkpoint.subject.clone(),
            gateway: Some(Gateway::OrderSubscription),
            charge: Some(Charge {
                price: checkpoint.price.clone(),
                cycle: checkpoint.cycle,
                plan_ref: checkpoint.plan_ref.clone(),
            }),
            state: AttemptState::Step2Pending,
            provider_refs,
            handoff: None,
            last_error: None,
            created_at: checkpoint.created_at,
            updated_at: Timestamp::now(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Accessors
    // ════════════════════════════════════════════════════════════════════════════

    pub fn id(&self) -> AttemptId {
        self.id
    }

    pub fn kind(&self) -> AttemptKind {
        self.subject.attempt_kind()
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn gateway(&self) -> Option<Gateway> {
        self.gateway
    }

    pub fn charge(&self) -> Option<&Charge> {
        self.charge.as_ref()
    }

    pub fn price(&self) -> Option<&Money> {
        self.charge.as_ref().map(|c| &c.price)
    }

    pub fn cycle(&self) -> Option<BillingCycle> {
        self.charge.as_ref().and_then(|c| c.cycle)
    }

    pub fn plan_ref(&self) -> Option<&str> {
        self.charge.as_ref().and_then(|c| c.plan_ref.as_deref())
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn provider_refs(&self) -> &ProviderRefs {
        &self.provider_refs
    }

    pub fn handoff(&self) -> Option<&Handoff> {
        self.handoff.as_ref()
    }

    pub fn last_error(&self) -> Option<&PaymentFailure> {
        self.last_error.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Transitions
    // ════════════════════════════════════════════════════════════════════════════

    /// `Created → GatewaySelected`, fixing the gateway and the charge.
    pub fn select_gateway(&mut self, gateway: Gateway, charge: Charge) -> Result<(), AttemptError> {
        match (self.kind(), charge.cycle) {
            (AttemptKind::SubscriptionCreate, None) => {
                return Err(AttemptError::InvalidCharge {
                    kind: self.kind(),
                    reason: "subscriptions need a resolved billing cycle".to_string(),
                })
            }
            (AttemptKind::ItemPurchase, Some(_)) => {
                return Err(AttemptError::InvalidCharge {
                    kind: self.kind(),
                    reason: "item purchases have no billing cycle".to_string(),
                })
            }
            _ => {}
        }
        self.transition(AttemptState::GatewaySelected)?;
        self.gateway = Some(gateway);
        self.charge = Some(charge);
        Ok(())
    }

    /// `GatewaySelected → Step1Pending`.
    pub fn begin_step1(&mut self) -> Result<(), AttemptError> {
        self.transition(AttemptState::Step1Pending)
    }

    /// `Step1Pending → Step1Done`, recording refs and the handoff for step 2.
    pub fn complete_step1(
        &mut self,
        refs: Vec<ProviderRef>,
        handoff: Option<Handoff>,
    ) -> Result<(), AttemptError> {
        self.transition(AttemptState::Step1Done)?;
        self.provider_refs.extend(refs);
        self.handoff = handoff;
        Ok(())
    }

    /// `Step1Done → Step2Pending`.
    pub fn begin_step2(&mut self) -> Result<(), AttemptError> {
        self.transition(AttemptState::Step2Pending)
    }

    /// `Step2Pending → Terminal{Success}`.
    pub fn succeed(&mut self, refs: Vec<ProviderRef>) -> Result<(), AttemptError> {
        self.transition(AttemptState::SUCCEEDED)?;
        self.provider_refs.extend(refs);
        self.handoff = None;
        Ok(())
    }

    /// Any live state `→ Terminal{Failed}`.
    pub fn fail(&mut self, failure: PaymentFailure) -> Result<(), AttemptError> {
        self.transition(AttemptState::FAILED)?;
        self.last_error = Some(failure);
        self.handoff = None;
        Ok(())
    }

    /// Any live state `→ Terminal{Cancelled}`.
    pub fn cancel(&mut self) -> Result<(), AttemptError> {
        self.transition(AttemptState::CANCELLED)?;
        self.handoff = None;
        Ok(())
    }

    /// Whether the same id may be offered again: a network failure that
    /// happened before the provider created anything.
    pub fn can_retry_same_id(&self) -> bool {
        self.state == AttemptState::FAILED
            && self.provider_refs.is_empty()
            && self.gateway.is_some()
            && self
                .last_error
                .as_ref()
                .map(|e| e.kind == FailureKind::Network)
                .unwrap_or(false)
    }

    /// Puts a transiently failed attempt back to `GatewaySelected`.
    ///
    /// This is not a state transition: the failed run is discarded and the
    /// same id starts over with the same charge.
    pub fn rearm(&mut self) -> Result<(), AttemptError> {
        if !self.can_retry_same_id() {
            return Err(AttemptError::NotRetryable);
        }
        self.state = AttemptState::GatewaySelected;
        self.last_error = None;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Builds the durable record written before a redirect.
    pub fn checkpoint(&self) -> Result<RedirectCheckpoint, AttemptError> {
        if self.gateway != Some(Gateway::OrderSubscription) {
            return Err(AttemptError::Incomplete("a redirect gateway"));
        }
        let charge = self.charge.as_ref().ok_or(AttemptError::Incomplete("a charge"))?;
        let ref_kind = match self.kind() {
            AttemptKind::SubscriptionCreate => ProviderRefKind::Subscription,
            AttemptKind::ItemPurchase => ProviderRefKind::Order,
        };
        let value = self
            .provider_refs
            .latest(ref_kind)
            .ok_or(AttemptError::Incomplete("a provider reference"))?;

        Ok(RedirectCheckpoint {
            attempt_id: self.id,
            kind: self.kind(),
            subject: self.subject.clone(),
            provider_ref: ProviderRef::new(ref_kind, value),
            price: charge.price.clone(),
            cycle: charge.cycle,
            plan_ref: charge.plan_ref.clone(),
            created_at: Timestamp::now(),
        })
    }

    fn transition(&mut self, target: AttemptState) -> Result<(), AttemptError> {
        let starts_step = matches!(target, AttemptState::Step1Pending | AttemptState::Step2Pending);
        self.state = self.state.transition_to(target).map_err(|_| {
            if starts_step && self.state.is_pending() {
                AttemptError::StepInProgress { state: self.state }
            } else {
                AttemptError::InvalidTransition {
                    from: self.state,
                    to: target,
                }
            }
        })?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
