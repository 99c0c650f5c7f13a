//! Port for reading the subscription plans an artist offers.

use async_trait::async_trait;

use crate::domain::foundation::ArtistId;
use crate::domain::subscription::ArtistPlans;

use super::PaymentError;

#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// `GET /artists/{artist_id}/plans`.
    async fn artist_plans(&self, artist_id: &ArtistId) -> Result<ArtistPlans, PaymentError>;
}
