//! Resolves the concrete price and provider plan for a subscription attempt.

use thiserror::Error;

use crate::domain::foundation::{ArtistId, Currency};
use crate::domain::payment::Gateway;

use super::{ArtistPlans, BillingCycle, ResolvedPlan};

/// Why a plan could not be resolved. Raised before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("artist {artist_id} has no {cycle} plan for {gateway}")]
    PlanNotFound {
        artist_id: ArtistId,
        cycle: BillingCycle,
        gateway: Gateway,
    },

    #[error("artist {artist_id} has no currency options for the {cycle} plan")]
    NoCurrencyOptions {
        artist_id: ArtistId,
        cycle: BillingCycle,
    },

    #[error("artist {artist_id} does not offer the {cycle} plan in {currency}")]
    CurrencyNotOffered {
        artist_id: ArtistId,
        cycle: BillingCycle,
        currency: Currency,
    },
}

/// Pure resolver: identical inputs always yield the identical plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionPlanResolver;

impl SubscriptionPlanResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves `(cycle, gateway, currency_hint)` against an artist's plans.
    ///
    /// In-session gateways use the base plan and ignore the hint. The redirect
    /// gateway picks the hinted currency, or the first registered option when
    /// no hint is given.
    pub fn resolve(
        &self,
        plans: &ArtistPlans,
        cycle: BillingCycle,
        gateway: Gateway,
        currency_hint: Option<&Currency>,
    ) -> Result<ResolvedPlan, PlanError> {
        let not_found = || PlanError::PlanNotFound {
            artist_id: plans.artist_id.clone(),
            cycle,
            gateway,
        };

        if !gateway.requires_redirect() {
            let base = plans.base_plan(cycle).ok_or_else(not_found)?;
            return Ok(ResolvedPlan {
                cycle,
                price: base.price.clone(),
                plan_ref: base.plan_ref.clone(),
            });
        }

        let redirect = plans.redirect_plan(cycle).ok_or_else(not_found)?;
        if redirect.options.is_empty() {
            return Err(PlanError::NoCurrencyOptions {
                artist_id: plans.artist_id.clone(),
                cycle,
            });
        }

        let option = match currency_hint {
            Some(currency) => redirect
                .options
                .iter()
                .find(|option| option.price.currency() == currency)
                .ok_or_else(|| PlanError::CurrencyNotOffered {
                    artist_id: plans.artist_id.clone(),
                    cycle,
                    currency: currency.clone(),
                })?,
            None => &redirect.options[0],
        };

        Ok(ResolvedPlan {
            cycle,
            price: option.price.clone(),
            plan_ref: Some(option.plan_ref.clone()),
        })
    }
}
