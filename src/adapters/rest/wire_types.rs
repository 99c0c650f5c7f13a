//! JSON bodies exchanged with the payments backend.
//!
//! The backend speaks camelCase; these types keep that out of the domain.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ArtistId, Currency, ItemId, Money, Timestamp};
use crate::domain::payment::{Gateway, ItemKind, ItemRef, Subject};
use crate::domain::subscription::{
    ArtistPlans, BasePlan, BillingCycle, CurrencyOption, RedirectPlan, SubscriptionRecord,
    SubscriptionStatus,
};
use crate::ports::{ActivationStatus, IntentMode, PaymentError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMoney {
    pub amount_minor: i64,
    pub currency: String,
}

impl From<&Money> for WireMoney {
    fn from(money: &Money) -> Self {
        Self {
            amount_minor: money.amount_minor(),
            currency: money.currency().code().to_string(),
        }
    }
}

impl WireMoney {
    pub fn into_money(self) -> Result<Money, PaymentError> {
        let currency = Currency::new(&self.currency)
            .map_err(|e| PaymentError::provider(format!("backend sent a bad currency: {}", e)))?;
        Money::new(self.amount_minor, currency)
            .map_err(|e| PaymentError::provider(format!("backend sent a bad amount: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    pub item_id: String,
    pub item_kind: ItemKind,
}

impl From<&ItemRef> for WireItem {
    fn from(item: &ItemRef) -> Self {
        Self {
            item_id: item.id.as_str().to_string(),
            item_kind: item.kind,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentBody {
    pub mode: IntentMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<WireItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<String>,
    pub amount: WireMoney,
}

impl CreatePaymentBody {
    pub fn new(mode: IntentMode, subject: &Subject, price: &Money) -> Self {
        let (item, artist_id) = match subject {
            Subject::Item(item) => (Some(WireItem::from(item)), None),
            Subject::Artist { artist_id } => (None, Some(artist_id.as_str().to_string())),
        };
        Self {
            mode,
            item,
            artist_id,
            amount: WireMoney::from(price),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentBody {
    pub intent_id: String,
    pub item: WireItem,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub item: WireItem,
    pub amount: WireMoney,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOrderBody {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionBody {
    pub gateway: Gateway,
    pub cycle: BillingCycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_ref: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRedirectSubscriptionBody {
    pub cycle: BillingCycle,
    pub plan_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateBody {
    pub subscription_id: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub intent_id: String,
    pub client_secret: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    #[serde(default)]
    pub approve_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscription_id: String,
    pub status: SubscriptionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSubscriptionResponse {
    pub subscription_id: String,
    pub approve_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateResponse {
    pub status: ActivationStatus,
}

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansResponse {
    #[serde(default)]
    pub base_plans: Vec<WireBasePlan>,
    #[serde(default)]
    pub redirect_plans: Vec<WireRedirectPlan>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBasePlan {
    pub cycle: BillingCycle,
    pub price: WireMoney,
    #[serde(default)]
    pub plan_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRedirectPlan {
    pub cycle: BillingCycle,
    #[serde(default)]
    pub options: Vec<WireCurrencyOption>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCurrencyOption {
    pub plan_ref: String,
    pub price: WireMoney,
}

impl PlansResponse {
    pub fn into_plans(self, artist_id: &ArtistId) -> Result<ArtistPlans, PaymentError> {
        let base_plans = self
            .base_plans
            .into_iter()
            .map(|plan| {
                Ok(BasePlan {
                    cycle: plan.cycle,
                    price: plan.price.into_money()?,
                    plan_ref: plan.plan_ref,
                })
            })
            .collect::<Result<Vec<_>, PaymentError>>()?;

        let redirect_plans = self
            .redirect_plans
            .into_iter()
            .map(|plan| {
                let options = plan
                    .options
                    .into_iter()
                    .map(|option| {
                        Ok(CurrencyOption {
                            plan_ref: option.plan_ref,
                            price: option.price.into_money()?,
                        })
                    })
                    .collect::<Result<Vec<_>, PaymentError>>()?;
                Ok(RedirectPlan {
                    cycle: plan.cycle,
                    options,
                })
            })
            .collect::<Result<Vec<_>, PaymentError>>()?;

        Ok(ArtistPlans {
            artist_id: artist_id.clone(),
            base_plans,
            redirect_plans,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasesResponse {
    #[serde(default)]
    pub item_ids: Vec<String>,
}

impl PurchasesResponse {
    pub fn into_item_ids(self) -> Result<Vec<ItemId>, PaymentError> {
        self.item_ids
            .into_iter()
            .map(|id| {
                ItemId::new(id).map_err(|e| PaymentError::provider(format!("bad item id: {}", e)))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionsResponse {
    #[serde(default)]
    pub subscriptions: Vec<WireSubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSubscription {
    pub artist_id: String,
    pub cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub renewal_gateway: Gateway,
    #[serde(default)]
    pub current_period_end: Option<Timestamp>,
}

impl SubscriptionsResponse {
    pub fn into_records(self) -> Result<Vec<SubscriptionRecord>, PaymentError> {
        self.subscriptions
            .into_iter()
            .map(|sub| {
                let artist_id = ArtistId::new(sub.artist_id)
                    .map_err(|e| PaymentError::provider(format!("bad artist id: {}", e)))?;
                Ok(SubscriptionRecord {
                    artist_id,
                    cycle: sub.cycle,
                    status: sub.status,
                    renewal_gateway: sub.renewal_gateway,
                    current_period_end: sub.current_period_end,
                })
            })
            .collect()
    }
}
