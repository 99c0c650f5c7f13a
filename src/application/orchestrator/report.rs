//! Requests into and reports out of the orchestrator.

use crate::application::UserNotice;
use crate::domain::foundation::{ArtistId, AttemptId, Currency, Money};
use crate::domain::payment::{
    AttemptState, Gateway, Handoff, ItemRef, PaymentAttempt, PaymentFailure, Subject, TerminalOutcome,
};
use crate::domain::subscription::BillingCycle;

/// What the listener asked to pay for, and through which gateway.
#[derive(Debug, Clone)]
pub enum BeginAttempt {
    Purchase {
        item: ItemRef,
        price: Money,
        gateway: Gateway,
    },
    Subscribe {
        artist_id: ArtistId,
        cycle: BillingCycle,
        gateway: Gateway,

        /// Currency to pick among the redirect plan's registered options.
        currency_hint: Option<Currency>,
    },
}

impl BeginAttempt {
    pub fn purchase(item: ItemRef, price: Money, gateway: Gateway) -> Self {
        BeginAttempt::Purchase {
            item,
            price,
            gateway,
        }
    }

    pub fn subscribe(artist_id: ArtistId, cycle: BillingCycle, gateway: Gateway) -> Self {
        BeginAttempt::Subscribe {
            artist_id,
            cycle,
            gateway,
            currency_hint: None,
        }
    }

    /// Sets the currency hint. Ignored for purchases.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        if let BeginAttempt::Subscribe { currency_hint, .. } = &mut self {
            *currency_hint = Some(currency);
        }
        self
    }

    pub fn gateway(&self) -> Gateway {
        match self {
            BeginAttempt::Purchase { gateway, .. } | BeginAttempt::Subscribe { gateway, .. } => *gateway,
        }
    }

    pub fn subject(&self) -> Subject {
        match self {
            BeginAttempt::Purchase { item, .. } => Subject::Item(item.clone()),
            BeginAttempt::Subscribe { artist_id, .. } => Subject::artist(artist_id.clone()),
        }
    }
}

/// The attempt as it stood when an operation returned.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub attempt_id: AttemptId,
    pub subject: Subject,
    pub gateway: Option<Gateway>,
    pub state: AttemptState,

    /// What the UI needs for the next step, if any.
    pub handoff: Option<Handoff>,
    pub failure: Option<PaymentFailure>,
}

impl StepReport {
    pub fn is_terminal(&self) -> bool {
        self.state.outcome().is_some()
    }

    pub fn succeeded(&self) -> bool {
        self.state.outcome() == Some(TerminalOutcome::Success)
    }

    /// The notice to show, for failed attempts.
    pub fn notice(&self) -> Option<UserNotice> {
        self.failure.as_ref().map(UserNotice::from)
    }
}

impl From<&PaymentAttempt> for StepReport {
    fn from(attempt: &PaymentAttempt) -> Self {
        Self {
            attempt_id: attempt.id(),
            subject: attempt.subject().clone(),
            gateway: attempt.gateway(),
            state: attempt.state(),
            handoff: attempt.handoff().cloned(),
            failure: attempt.last_error().cloned(),
        }
    }
}

/// Result of handling a redirect return.
#[derive(Debug, Clone)]
pub enum ResumeOutcome {
    /// No checkpoint under that reference: never written, or already resumed.
    NothingPending,

    /// The checkpointed attempt ran its return step.
    Resumed(StepReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ItemId;

    #[test]
    fn currency_hint_only_applies_to_subscriptions() {
        let eur = Currency::new("EUR").unwrap();
        let subscribe = BeginAttempt::subscribe(
            ArtistId::new("a1").unwrap(),
            BillingCycle::ThreeMonths,
            Gateway::OrderSubscription,
        )
        .with_currency(eur.clone());
        assert!(matches!(
            subscribe,
            BeginAttempt::Subscribe { currency_hint: Some(ref c), .. } if c == &eur
        ));

        let purchase = BeginAttempt::purchase(
            ItemRef::song(ItemId::new("s1").unwrap()),
            Money::new(99, Currency::new("USD").unwrap()).unwrap(),
            Gateway::CardVault,
        )
        .with_currency(eur);
        assert_eq!(purchase.gateway(), Gateway::CardVault);
        assert!(purchase.subject().as_item().is_some());
    }
}
