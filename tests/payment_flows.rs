//! Integration tests for in-session payment flows.
//!
//! Card vault and checkout widget attempts driven end to end through the
//! orchestrator against the mock backend and provider scripts.

mod common;

use std::time::Duration;

use common::{artist_a, money, short_timeouts, song, Harness};
use encore_billing::application::{BeginAttempt, NoticeKind, OrchestratorError, Ownership, UserNotice};
use encore_billing::domain::foundation::{Currency, ItemId};
use encore_billing::domain::payment::{AttemptState, FailureKind, Gateway, Handoff};
use encore_billing::domain::subscription::BillingCycle;
use encore_billing::ports::{CardInput, PaymentError, StepInput};

fn card() -> StepInput {
    StepInput::Card(CardInput::new("tok_visa"))
}

fn buy_song(id: &str, gateway: Gateway) -> BeginAttempt {
    BeginAttempt::purchase(song(id), money(129, "USD"), gateway)
}

// =============================================================================
// Admission
// =============================================================================

#[tokio::test]
async fn rapid_subscribe_clicks_admit_one_attempt() {
    let h = Harness::new();
    h.backend.gates().hold("artist_plans");

    let first = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .begin(BeginAttempt::subscribe(artist_a(), BillingCycle::OneMonth, Gateway::CardVault))
                .await
        })
    };
    h.backend.gates().entered("artist_plans").await;

    let second = h
        .orchestrator
        .begin(BeginAttempt::subscribe(artist_a(), BillingCycle::OneMonth, Gateway::OrderCheckout))
        .await
        .unwrap_err();
    assert!(matches!(second, OrchestratorError::AlreadyProcessing(_)));

    let notice = UserNotice::from(&second);
    assert_eq!(notice.kind, NoticeKind::AlreadyProcessing);
    assert!(!notice.retry_offered);

    h.backend.gates().release("artist_plans");
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.state, AttemptState::GatewaySelected);
    assert_eq!(h.backend.call_count("artist_plans"), 1);
}

#[tokio::test]
async fn step_requested_while_pending_is_already_processing() {
    let h = Harness::new();
    let begun = h.orchestrator.begin(buy_song("s1", Gateway::CardVault)).await.unwrap();
    h.backend.gates().hold("create_card_intent");

    let running = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_step1(begun.attempt_id).await })
    };
    h.backend.gates().entered("create_card_intent").await;

    let err = h.orchestrator.run_step1(begun.attempt_id).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::AlreadyProcessing(_)));

    h.backend.gates().release("create_card_intent");
    assert_eq!(running.await.unwrap().unwrap().state, AttemptState::Step1Done);
    assert_eq!(h.backend.call_count("create_card_intent"), 1);
}

#[tokio::test]
async fn widget_lease_refuses_second_attempt_until_terminal() {
    let h = Harness::new();
    let first = h.orchestrator.begin(buy_song("s1", Gateway::CardVault)).await.unwrap();

    let busy = h
        .orchestrator
        .begin(buy_song("s2", Gateway::CardVault))
        .await
        .unwrap_err();
    assert!(matches!(busy, OrchestratorError::WidgetBusy(Gateway::CardVault)));
    assert_eq!(UserNotice::from(&busy).kind, NoticeKind::ProviderBusy);

    // Other gateways have their own lease.
    let checkout = h
        .orchestrator
        .begin(buy_song("s2", Gateway::OrderCheckout))
        .await
        .unwrap();
    h.orchestrator.cancel(checkout.attempt_id).await.unwrap();

    h.orchestrator.run_step1(first.attempt_id).await.unwrap();
    let done = h.orchestrator.run_step2(first.attempt_id, card()).await.unwrap();
    assert!(done.succeeded());
    assert!(!h.orchestrator.leases().is_held(Gateway::CardVault));

    assert!(h.orchestrator.begin(buy_song("s2", Gateway::CardVault)).await.is_ok());
}

// =============================================================================
// Card vault
// =============================================================================

#[tokio::test]
async fn card_purchase_confirms_ownership() {
    let h = Harness::new();
    let begun = h.orchestrator.begin(buy_song("s1", Gateway::CardVault)).await.unwrap();

    let step1 = h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    assert!(matches!(step1.handoff, Some(Handoff::ConfirmCard { .. })));

    let done = h.orchestrator.run_step2(begun.attempt_id, card()).await.unwrap();
    assert!(done.succeeded());
    assert!(done.notice().is_none());

    let s1 = ItemId::new("s1").unwrap();
    assert_eq!(h.store.ownership(&s1).await, Some(Ownership::Confirmed));
    assert_eq!(h.backend.call_count("confirm_card_payment"), 1);
}

#[tokio::test]
async fn card_decline_fails_attempt_and_leaves_store_unchanged() {
    let h = Harness::new();
    h.sdk.decline_with("Your card has insufficient funds.");
    let before = h.store.snapshot().await;

    let begun = h.orchestrator.begin(buy_song("s1", Gateway::CardVault)).await.unwrap();
    h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    let failed = h.orchestrator.run_step2(begun.attempt_id, card()).await.unwrap();

    assert_eq!(failed.state, AttemptState::FAILED);
    let notice = failed.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Failure(FailureKind::ProviderDeclined));
    assert_eq!(notice.message, "Your card has insufficient funds.");
    assert!(!notice.retry_offered);

    assert_eq!(h.store.snapshot().await, before);
    assert!(!h.backend.was_called("confirm_card_payment"));
    assert!(!h.orchestrator.leases().is_held(Gateway::CardVault));
}

#[tokio::test]
async fn card_subscription_charges_base_plan() {
    let h = Harness::new();
    let begun = h
        .orchestrator
        .begin(BeginAttempt::subscribe(artist_a(), BillingCycle::ThreeMonths, Gateway::CardVault))
        .await
        .unwrap();
    let attempt = h.orchestrator.attempt(begun.attempt_id).await.unwrap();
    assert_eq!(attempt.price(), Some(&money(1299, "USD")));

    h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    let done = h.orchestrator.run_step2(begun.attempt_id, card()).await.unwrap();

    assert!(done.succeeded());
    assert!(h.store.is_subscribed(&artist_a()).await);
    let record = h.store.subscription_for(&artist_a()).await.unwrap();
    assert_eq!(record.cycle, BillingCycle::ThreeMonths);
    assert_eq!(record.renewal_gateway, Gateway::CardVault);
}

#[tokio::test]
async fn missing_plan_fails_before_any_provider_call() {
    let h = Harness::new();

    let failed = h
        .orchestrator
        .begin(BeginAttempt::subscribe(artist_a(), BillingCycle::TwelveMonths, Gateway::CardVault))
        .await
        .unwrap();

    assert_eq!(failed.state, AttemptState::FAILED);
    assert_eq!(failed.failure.unwrap().kind, FailureKind::PlanNotFound);
    assert!(!h.backend.was_called("create_card_intent"));
    assert!(!h.orchestrator.leases().is_held(Gateway::CardVault));
}

#[tokio::test]
async fn unknown_artist_reports_plan_not_found() {
    let h = Harness::new();
    let nobody = encore_billing::domain::foundation::ArtistId::new("artist-z").unwrap();

    let failed = h
        .orchestrator
        .begin(BeginAttempt::subscribe(nobody, BillingCycle::OneMonth, Gateway::CardVault))
        .await
        .unwrap();

    assert_eq!(failed.failure.unwrap().kind, FailureKind::PlanNotFound);
}

#[tokio::test]
async fn redirect_plan_without_hinted_currency_is_refused() {
    let h = Harness::new();

    let failed = h
        .orchestrator
        .begin(
            BeginAttempt::subscribe(artist_a(), BillingCycle::ThreeMonths, Gateway::OrderSubscription)
                .with_currency(Currency::new("JPY").unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(failed.failure.unwrap().kind, FailureKind::CurrencyNotOffered);

    let failed = h
        .orchestrator
        .begin(BeginAttempt::subscribe(artist_a(), BillingCycle::SixMonths, Gateway::OrderSubscription))
        .await
        .unwrap();
    assert_eq!(failed.failure.unwrap().kind, FailureKind::NoCurrencyOptions);
    assert!(!h.backend.was_called("create_redirect_subscription"));
}

// =============================================================================
// Checkout widget
// =============================================================================

#[tokio::test]
async fn checkout_subscription_activates_after_widget_payment() {
    let h = Harness::new();
    let begun = h
        .orchestrator
        .begin(BeginAttempt::subscribe(artist_a(), BillingCycle::OneMonth, Gateway::OrderCheckout))
        .await
        .unwrap();

    let step1 = h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    let Some(Handoff::OpenCheckout { reference, .. }) = step1.handoff else {
        panic!("expected checkout handoff, got {:?}", step1.handoff);
    };

    let done = h
        .orchestrator
        .run_step2(begun.attempt_id, StepInput::Proceed)
        .await
        .unwrap();

    assert!(done.succeeded());
    assert_eq!(h.widget.opened()[0].reference, reference);
    assert!(h.store.is_subscribed(&artist_a()).await);
}

#[tokio::test]
async fn dismissed_widget_cancels_without_failure() {
    let h = Harness::new();
    h.widget.dismiss();
    let before = h.store.snapshot().await;

    let begun = h.orchestrator.begin(buy_song("s1", Gateway::OrderCheckout)).await.unwrap();
    h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    let report = h
        .orchestrator
        .run_step2(begun.attempt_id, StepInput::Proceed)
        .await
        .unwrap();

    assert_eq!(report.state, AttemptState::CANCELLED);
    assert!(report.notice().is_none());
    assert!(!h.backend.was_called("capture_order"));
    assert_eq!(h.store.snapshot().await, before);
}

#[tokio::test]
async fn optimistic_purchase_holds_until_backend_confirms() {
    let h = Harness::new();
    h.backend
        .set_method_error("purchased_items", PaymentError::network("entitlements unavailable"));
    let s1 = ItemId::new("s1").unwrap();

    let begun = h.orchestrator.begin(buy_song("s1", Gateway::OrderCheckout)).await.unwrap();
    h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    let done = h
        .orchestrator
        .run_step2(begun.attempt_id, StepInput::Proceed)
        .await
        .unwrap();
    assert!(done.succeeded());
    assert_eq!(h.store.ownership(&s1).await, Some(Ownership::Optimistic));

    h.backend.clear_errors();
    h.store.refresh_purchases().await.unwrap();
    assert_eq!(h.store.ownership(&s1).await, Some(Ownership::Confirmed));
}

#[tokio::test]
async fn unconfirmed_optimistic_purchase_is_retracted() {
    let h = Harness::new();
    let s1 = ItemId::new("s1").unwrap();
    h.backend.withhold_purchase(s1.clone());

    let begun = h.orchestrator.begin(buy_song("s1", Gateway::OrderCheckout)).await.unwrap();
    h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    let done = h
        .orchestrator
        .run_step2(begun.attempt_id, StepInput::Proceed)
        .await
        .unwrap();

    assert!(done.succeeded());
    assert!(!h.store.is_purchased(&s1).await);
}

// =============================================================================
// Cancellation and timeouts
// =============================================================================

#[tokio::test]
async fn cancel_during_step_discards_late_result() {
    let h = Harness::new();
    let before = h.store.snapshot().await;
    let begun = h.orchestrator.begin(buy_song("s1", Gateway::CardVault)).await.unwrap();
    h.backend.gates().hold("create_card_intent");

    let running = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_step1(begun.attempt_id).await })
    };
    h.backend.gates().entered("create_card_intent").await;

    let cancelled = h.orchestrator.cancel(begun.attempt_id).await.unwrap();
    assert_eq!(cancelled.state, AttemptState::CANCELLED);
    assert!(!h.orchestrator.leases().is_held(Gateway::CardVault));

    h.backend.gates().release("create_card_intent");
    let late = running.await.unwrap().unwrap();
    assert_eq!(late.state, AttemptState::CANCELLED);

    let attempt = h.orchestrator.attempt(begun.attempt_id).await.unwrap();
    assert!(attempt.provider_refs().is_empty());
    assert_eq!(h.store.snapshot().await, before);

    // Cancelling again changes nothing.
    let again = h.orchestrator.cancel(begun.attempt_id).await.unwrap();
    assert_eq!(again.state, AttemptState::CANCELLED);
}

#[tokio::test]
async fn hanging_step_times_out() {
    let h = Harness::with_config(short_timeouts(Duration::from_millis(50), Duration::from_secs(5)));
    h.backend.gates().hold("create_card_intent");

    let begun = h.orchestrator.begin(buy_song("s1", Gateway::CardVault)).await.unwrap();
    let report = h.orchestrator.run_step1(begun.attempt_id).await.unwrap();

    assert_eq!(report.state, AttemptState::FAILED);
    let notice = report.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Failure(FailureKind::Timeout));
    assert!(notice.retry_offered);
    assert!(!h.orchestrator.leases().is_held(Gateway::CardVault));
    h.backend.gates().release("create_card_intent");
}

#[tokio::test]
async fn interactive_step_gets_the_longer_budget() {
    let h = Harness::with_config(short_timeouts(Duration::from_millis(20), Duration::from_secs(5)));
    let begun = h.orchestrator.begin(buy_song("s1", Gateway::OrderCheckout)).await.unwrap();
    h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    h.widget.gates().hold("open");

    let running = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_step2(begun.attempt_id, StepInput::Proceed).await })
    };
    h.widget.gates().entered("open").await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    h.widget.gates().release("open");

    let report = running.await.unwrap().unwrap();
    assert!(report.succeeded());
}

#[tokio::test]
async fn network_failure_before_provider_objects_retries_same_attempt() {
    let h = Harness::new();
    h.backend
        .set_method_error("create_order", PaymentError::network("connection reset"));

    let begun = h.orchestrator.begin(buy_song("s1", Gateway::OrderCheckout)).await.unwrap();
    let failed = h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    assert_eq!(failed.failure.as_ref().unwrap().kind, FailureKind::Network);

    h.backend.clear_errors();
    let rearmed = h.orchestrator.retry_transient(begun.attempt_id).await.unwrap();
    assert_eq!(rearmed.state, AttemptState::GatewaySelected);

    h.orchestrator.run_step1(begun.attempt_id).await.unwrap();
    let done = h
        .orchestrator
        .run_step2(begun.attempt_id, StepInput::Proceed)
        .await
        .unwrap();
    assert!(done.succeeded());
    assert_eq!(done.attempt_id, begun.attempt_id);
}
