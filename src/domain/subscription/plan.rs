//! Subscription plans an artist offers.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ArtistId, Money};

use super::BillingCycle;

/// Every subscription plan an artist offers, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistPlans {
    pub artist_id: ArtistId,

    /// Plans charged through in-session gateways (card vault, checkout widget).
    #[serde(default)]
    pub base_plans: Vec<BasePlan>,

    /// Plans pre-registered with the redirect gateway, one per cycle.
    #[serde(default)]
    pub redirect_plans: Vec<RedirectPlan>,
}

impl ArtistPlans {
    pub fn base_plan(&self, cycle: BillingCycle) -> Option<&BasePlan> {
        self.base_plans.iter().find(|plan| plan.cycle == cycle)
    }

    pub fn redirect_plan(&self, cycle: BillingCycle) -> Option<&RedirectPlan> {
        self.redirect_plans.iter().find(|plan| plan.cycle == cycle)
    }
}

/// Price of one billing cycle for in-session gateways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePlan {
    pub cycle: BillingCycle,
    pub price: Money,

    /// Provider price id, when the gateway bills against a stored price.
    #[serde(default)]
    pub plan_ref: Option<String>,
}

/// Redirect-gateway plan for one cycle: one provider plan per currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectPlan {
    pub cycle: BillingCycle,
    #[serde(default)]
    pub options: Vec<CurrencyOption>,
}

/// A provider plan registered in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyOption {
    pub plan_ref: String,
    pub price: Money,
}

/// The concrete charge fixed for a subscription attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPlan {
    pub cycle: BillingCycle,
    pub price: Money,
    pub plan_ref: Option<String>,
}
