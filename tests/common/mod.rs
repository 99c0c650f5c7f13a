//! Shared harness for the integration tests: every gateway wired against
//! the mock backend and mock provider scripts.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use encore_billing::adapters::checkpoint::InMemoryCheckpointStore;
use encore_billing::adapters::gateways::{
    CardVaultAdapter, OrderCheckoutAdapter, OrderSubscriptionAdapter,
};
use encore_billing::adapters::mock::{
    MockCardVaultSdk, MockCheckoutWidget, MockPaymentBackend, MockRedirectNavigator,
};
use encore_billing::application::{OrchestratorConfig, PaymentOrchestrator, ReconciliationStore};
use encore_billing::domain::foundation::{ArtistId, Currency, ItemId, Money};
use encore_billing::domain::payment::ItemRef;
use encore_billing::domain::subscription::{
    ArtistPlans, BasePlan, BillingCycle, CurrencyOption, RedirectPlan,
};
use encore_billing::ports::{CheckpointStore, RedirectNavigator};

pub const RETURN_URL: &str = "https://encore.test/payments/return";

pub struct Harness {
    pub backend: MockPaymentBackend,
    pub sdk: MockCardVaultSdk,
    pub widget: MockCheckoutWidget,
    pub navigator: MockRedirectNavigator,
    pub checkpoints: InMemoryCheckpointStore,
    pub store: Arc<ReconciliationStore>,
    pub orchestrator: Arc<PaymentOrchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(OrchestratorConfig::default())
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        let navigator = MockRedirectNavigator::new();
        let checkpoints = InMemoryCheckpointStore::new();
        Self::build(
            config,
            Arc::new(checkpoints.clone()),
            Arc::new(navigator.clone()),
            checkpoints,
            navigator,
        )
    }

    /// Harness whose orchestrator writes checkpoints to `checkpoints` and
    /// navigates with `navigator`.
    pub fn with_parts(
        backend: MockPaymentBackend,
        checkpoints: Arc<dyn CheckpointStore>,
        navigator: Arc<dyn RedirectNavigator>,
    ) -> Self {
        let sdk = MockCardVaultSdk::new();
        let widget = MockCheckoutWidget::new();
        let store = Arc::new(ReconciliationStore::new(Arc::new(backend.clone())));
        let orchestrator = wire(
            &backend,
            &sdk,
            &widget,
            navigator,
            checkpoints,
            store.clone(),
            OrchestratorConfig::default(),
        );
        Self {
            backend,
            sdk,
            widget,
            navigator: MockRedirectNavigator::new(),
            checkpoints: InMemoryCheckpointStore::new(),
            store,
            orchestrator,
        }
    }

    fn build(
        config: OrchestratorConfig,
        checkpoints_port: Arc<dyn CheckpointStore>,
        navigator_port: Arc<dyn RedirectNavigator>,
        checkpoints: InMemoryCheckpointStore,
        navigator: MockRedirectNavigator,
    ) -> Self {
        let backend = MockPaymentBackend::new();
        backend.add_plans(artist_plans(&artist_a()));
        let sdk = MockCardVaultSdk::new();
        let widget = MockCheckoutWidget::new();
        let store = Arc::new(ReconciliationStore::new(Arc::new(backend.clone())));
        let orchestrator = wire(
            &backend,
            &sdk,
            &widget,
            navigator_port,
            checkpoints_port,
            store.clone(),
            config,
        );
        Self {
            backend,
            sdk,
            widget,
            navigator,
            checkpoints,
            store,
            orchestrator,
        }
    }
}

fn wire(
    backend: &MockPaymentBackend,
    sdk: &MockCardVaultSdk,
    widget: &MockCheckoutWidget,
    navigator: Arc<dyn RedirectNavigator>,
    checkpoints: Arc<dyn CheckpointStore>,
    store: Arc<ReconciliationStore>,
    config: OrchestratorConfig,
) -> Arc<PaymentOrchestrator> {
    let orchestrator = PaymentOrchestrator::new(Arc::new(backend.clone()), checkpoints, store, config)
        .with_adapter(Arc::new(CardVaultAdapter::new(
            Arc::new(backend.clone()),
            Arc::new(sdk.clone()),
            Some("pk_test_encore".to_string()),
        )))
        .with_adapter(Arc::new(OrderCheckoutAdapter::new(
            Arc::new(backend.clone()),
            Arc::new(widget.clone()),
            Some("rzp_test_encore".to_string()),
        )))
        .with_adapter(Arc::new(OrderSubscriptionAdapter::new(
            Arc::new(backend.clone()),
            navigator,
            Some("client_encore".to_string()),
            Some(RETURN_URL.to_string()),
        )));
    Arc::new(orchestrator)
}

pub fn short_timeouts(step: Duration, interactive: Duration) -> OrchestratorConfig {
    OrchestratorConfig {
        step_timeout: step,
        interactive_step_timeout: interactive,
    }
}

pub fn artist_a() -> ArtistId {
    ArtistId::new("artist-a").unwrap()
}

pub fn money(amount: i64, currency: &str) -> Money {
    Money::new(amount, Currency::new(currency).unwrap()).unwrap()
}

pub fn song(id: &str) -> ItemRef {
    ItemRef::song(ItemId::new(id).unwrap())
}

/// Base plans for 1m and 3m; redirect plans for 3m in USD and EUR, and a 6m
/// plan with no registered currencies.
pub fn artist_plans(artist_id: &ArtistId) -> ArtistPlans {
    ArtistPlans {
        artist_id: artist_id.clone(),
        base_plans: vec![
            BasePlan {
                cycle: BillingCycle::OneMonth,
                price: money(499, "USD"),
                plan_ref: Some("price_1m".to_string()),
            },
            BasePlan {
                cycle: BillingCycle::ThreeMonths,
                price: money(1299, "USD"),
                plan_ref: Some("price_3m".to_string()),
            },
        ],
        redirect_plans: vec![
            RedirectPlan {
                cycle: BillingCycle::ThreeMonths,
                options: vec![
                    CurrencyOption {
                        plan_ref: "P-3M-USD".to_string(),
                        price: money(1299, "USD"),
                    },
                    CurrencyOption {
                        plan_ref: "P-3M-EUR".to_string(),
                        price: money(1199, "EUR"),
                    },
                ],
            },
            RedirectPlan {
                cycle: BillingCycle::SixMonths,
                options: vec![],
            },
        ],
    }
}
