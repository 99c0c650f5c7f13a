//! Subscription domain module.
//!
//! Billing cycles, artist plans, plan resolution and the server-confirmed
//! subscription records the client reconciles against.

mod cycle;
mod plan;
mod record;
mod resolver;

pub use cycle::BillingCycle;
pub use plan::{ArtistPlans, BasePlan, CurrencyOption, RedirectPlan, ResolvedPlan};
pub use record::{SubscriptionRecord, SubscriptionStatus};
pub use resolver::{PlanError, SubscriptionPlanResolver};
