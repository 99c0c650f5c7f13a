//! PaymentOrchestrator - drives payment attempts through their gateways.
//!
//! Owns every live attempt. Admission, state changes and lease bookkeeping
//! happen under one mutex; adapter calls, plan lookups and reconciliation
//! refreshes run with the mutex released. After each await the attempt is
//! looked up again and the result is only applied if the attempt is still in
//! the state the step started from. Otherwise the result is discarded.
//!
//! # Flow
//!
//! ```text
//! begin ──► run_step1 ──► run_step2 ─────────────► Terminal
//!                    └──► redirect ··· resume_redirect ──► Terminal
//! ```
//!
//! Terminal attempts release their widget lease and admission slot. Their
//! record stays readable until the next attempt for the same subject, or
//! until [`PaymentOrchestrator::forget`].

mod error;
mod report;
mod table;

pub use error::OrchestratorError;
pub use report::{BeginAttempt, ResumeOutcome, StepReport};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{error::Elapsed, timeout};

use crate::config::OrchestratorSettings;
use crate::domain::foundation::{ArtistId, AttemptId, Currency};
use crate::domain::payment::{
    AdmissionKey, AttemptError, AttemptState, Charge, Gateway, Handoff, PaymentAttempt, PaymentFailure,
    RedirectCheckpoint, Subject,
};
use crate::domain::subscription::{BillingCycle, PlanError, SubscriptionPlanResolver};
use crate::ports::{
    CheckpointStore, GatewayAdapter, PaymentError, PaymentErrorCode, PlanCatalog, StepInput,
    StepResult,
};

use super::{ReconciliationStore, WidgetLeases};
use table::{admission_key, AttemptTable, Entry};

/// Time budgets for provider steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Budget for non-interactive steps.
    pub step_timeout: Duration,

    /// Budget for steps that wait on the user (card entry, checkout widget).
    pub interactive_step_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(30),
            interactive_step_timeout: Duration::from_secs(600),
        }
    }
}

impl From<&OrchestratorSettings> for OrchestratorConfig {
    fn from(settings: &OrchestratorSettings) -> Self {
        Self {
            step_timeout: settings.step_timeout(),
            interactive_step_timeout: settings.interactive_step_timeout(),
        }
    }
}

/// How an adapter call ended, before it is applied to the attempt.
enum StepOutcome {
    Done(StepResult),
    Failed(PaymentFailure),
    Cancelled,
}

pub struct PaymentOrchestrator {
    adapters: HashMap<Gateway, Arc<dyn GatewayAdapter>>,
    plans: Arc<dyn PlanCatalog>,
    resolver: SubscriptionPlanResolver,
    checkpoints: Arc<dyn CheckpointStore>,
    reconciliation: Arc<ReconciliationStore>,
    leases: WidgetLeases,
    config: OrchestratorConfig,
    table: Mutex<AttemptTable>,
}

impl PaymentOrchestrator {
    pub fn new(
        plans: Arc<dyn PlanCatalog>,
        checkpoints: Arc<dyn CheckpointStore>,
        reconciliation: Arc<ReconciliationStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            adapters: HashMap::new(),
            plans,
            resolver: SubscriptionPlanResolver::new(),
            checkpoints,
            reconciliation,
            leases: WidgetLeases::new(),
            config,
            table: Mutex::new(AttemptTable::default()),
        }
    }

    /// Registers the adapter for its gateway, replacing any earlier one.
    pub fn with_adapter(mut self, adapter: Arc<dyn GatewayAdapter>) -> Self {
        self.adapters.insert(adapter.gateway(), adapter);
        self
    }

    pub fn reconciliation(&self) -> &Arc<ReconciliationStore> {
        &self.reconciliation
    }

    pub fn leases(&self) -> &WidgetLeases {
        &self.leases
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Attempt lifecycle
    // ════════════════════════════════════════════════════════════════════════════

    /// Admits a new attempt and fixes its charge.
    ///
    /// Refused with `AlreadyProcessing` while another attempt for the same
    /// subject is live or a stored redirect checkpoint for it awaits resume
    /// or discard, and with `WidgetBusy` while the gateway's widget is
    /// leased. Plan lookup problems do not refuse the call: the attempt is
    /// admitted and ends `Failed` with the plan failure.
    pub async fn begin(&self, request: BeginAttempt) -> Result<StepReport, OrchestratorError> {
        let gateway = request.gateway();
        let subject = request.subject();
        self.adapter(gateway)?;

        let attempt_id = {
            let mut table = self.table.lock().await;
            let key = AdmissionKey {
                subject: subject.clone(),
                kind: subject.attempt_kind(),
            };
            if let Some(live) = table.live_for(&key) {
                tracing::info!(%subject, live_attempt = %live, "Duplicate submission refused");
                return Err(OrchestratorError::AlreadyProcessing(subject.to_string()));
            }
            if let Some(waiting) = self
                .checkpoints
                .list()?
                .into_iter()
                .find(|cp| cp.admission_key() == key)
            {
                tracing::info!(
                    %subject,
                    waiting_attempt = %waiting.attempt_id,
                    "Refused while a redirect for the same subject awaits resume"
                );
                return Err(OrchestratorError::AlreadyProcessing(subject.to_string()));
            }
            let lease = self
                .leases
                .try_acquire(gateway)
                .ok_or(OrchestratorError::WidgetBusy(gateway))?;

            let attempt = PaymentAttempt::new(AttemptId::new(), subject.clone());
            let attempt_id = attempt.id();
            table.insert_live(Entry {
                attempt,
                lease: Some(lease),
            });
            attempt_id
        };
        tracing::info!(%attempt_id, %gateway, %subject, "Attempt admitted");

        let charge = match request {
            BeginAttempt::Purchase { price, .. } => Ok(Charge::one_off(price)),
            BeginAttempt::Subscribe {
                artist_id,
                cycle,
                currency_hint,
                ..
            } => {
                self.resolve_charge(&artist_id, cycle, gateway, currency_hint.as_ref())
                    .await
            }
        };

        let mut table = self.table.lock().await;
        let entry = table
            .get_mut(attempt_id)
            .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;
        if entry.attempt.state() != AttemptState::Created {
            // Cancelled while the plans were loading.
            return Ok(StepReport::from(&entry.attempt));
        }

        let selected = match charge {
            Ok(charge) => entry.attempt.select_gateway(gateway, charge),
            Err(failure) => {
                tracing::warn!(%attempt_id, kind = %failure.kind, detail = %failure.detail, "Plan resolution failed");
                entry.attempt.fail(failure)
            }
        };
        if let Err(err) = selected {
            entry
                .attempt
                .fail(PaymentFailure::configuration(err.to_string()))?;
            table.settle(attempt_id);
            return Err(err.into());
        }

        let report = StepReport::from(&entry.attempt);
        log_transition(&report);
        if report.is_terminal() {
            table.settle(attempt_id);
        }
        Ok(report)
    }

    /// Runs the gateway's first step: create the intent, order or subscription.
    pub async fn run_step1(&self, attempt_id: AttemptId) -> Result<StepReport, OrchestratorError> {
        let (snapshot, adapter) = {
            let mut table = self.table.lock().await;
            let entry = table
                .get_mut(attempt_id)
                .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;
            let adapter = self.adapter_for(&entry.attempt)?;
            entry
                .attempt
                .begin_step1()
                .map_err(|e| OrchestratorError::step_refused(attempt_id, "start step 1 of", e))?;
            (entry.attempt.clone(), adapter)
        };
        tracing::info!(%attempt_id, gateway = %adapter.gateway(), "Step 1 started");

        let budget = self.config.step_timeout;
        let result = timeout(budget, adapter.start_step1(&snapshot)).await;
        let outcome = classify(attempt_id, result, budget);

        let mut table = self.table.lock().await;
        self.commit(&mut table, attempt_id, AttemptState::Step1Pending, outcome)
    }

    /// Runs the in-session second step: card confirmation or checkout widget.
    ///
    /// Redirect attempts complete through [`redirect`](Self::redirect) and
    /// [`resume_redirect`](Self::resume_redirect) instead.
    pub async fn run_step2(
        &self,
        attempt_id: AttemptId,
        input: StepInput,
    ) -> Result<StepReport, OrchestratorError> {
        let (snapshot, adapter) = {
            let mut table = self.table.lock().await;
            let entry = table
                .get_mut(attempt_id)
                .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;
            let adapter = self.adapter_for(&entry.attempt)?;
            if adapter.gateway().requires_redirect() {
                return Err(OrchestratorError::RedirectRequired(attempt_id));
            }
            entry
                .attempt
                .begin_step2()
                .map_err(|e| OrchestratorError::step_refused(attempt_id, "start step 2 of", e))?;
            (entry.attempt.clone(), adapter)
        };
        tracing::info!(%attempt_id, gateway = %adapter.gateway(), "Step 2 started");

        let budget = if adapter.step2_is_interactive() {
            self.config.interactive_step_timeout
        } else {
            self.config.step_timeout
        };
        let result = timeout(budget, adapter.start_step2(&snapshot, input)).await;
        let outcome = classify(attempt_id, result, budget);

        let report = {
            let mut table = self.table.lock().await;
            self.commit(&mut table, attempt_id, AttemptState::Step2Pending, outcome)?
        };
        if report.succeeded() {
            self.reconcile(&report).await;
        }
        Ok(report)
    }

    /// Sends the user to the provider's approval page.
    ///
    /// The checkpoint is written before navigation. If it cannot be written
    /// the attempt fails and the user never leaves.
    pub async fn redirect(&self, attempt_id: AttemptId) -> Result<StepReport, OrchestratorError> {
        let (approve_url, adapter, checkpoint) = {
            let mut table = self.table.lock().await;
            let entry = table
                .get_mut(attempt_id)
                .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;
            let adapter = self.adapter_for(&entry.attempt)?;
            if !adapter.gateway().requires_redirect() {
                return Err(OrchestratorError::NotARedirect(attempt_id));
            }
            let approve_url = match entry.attempt.handoff() {
                Some(Handoff::Redirect { approve_url }) => approve_url.clone(),
                _ => {
                    return Err(OrchestratorError::InvalidTransition {
                        attempt_id,
                        state: entry.attempt.state(),
                        operation: "redirect",
                    })
                }
            };
            entry
                .attempt
                .begin_step2()
                .map_err(|e| OrchestratorError::step_refused(attempt_id, "redirect", e))?;

            let saved = entry
                .attempt
                .checkpoint()
                .map_err(OrchestratorError::from)
                .and_then(|checkpoint| {
                    self.checkpoints.save(&checkpoint)?;
                    Ok(checkpoint)
                });
            let checkpoint = match saved {
                Ok(checkpoint) => checkpoint,
                Err(err) => {
                    tracing::error!(%attempt_id, error = %err, "Checkpoint not written; redirect aborted");
                    entry.attempt.fail(PaymentFailure::configuration(err.to_string()))?;
                    table.settle(attempt_id);
                    return Err(err);
                }
            };
            tracing::info!(
                %attempt_id,
                provider_ref = %checkpoint.key(),
                subject = %checkpoint.subject,
                "Checkpoint written"
            );
            (approve_url, adapter, checkpoint)
        };

        let navigated = timeout(self.config.step_timeout, adapter.redirect(&approve_url)).await;
        let mut table = self.table.lock().await;
        let entry = table
            .get_mut(attempt_id)
            .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;

        let failure = match navigated {
            Ok(Ok(())) => return Ok(StepReport::from(&entry.attempt)),
            Ok(Err(err)) => failure_for(attempt_id, &err),
            Err(_) => Some(PaymentFailure::timeout("navigation to the approval page timed out")),
        };
        if let Err(err) = self.checkpoints.remove(checkpoint.key()) {
            tracing::warn!(%attempt_id, error = %err, "Could not remove checkpoint after failed navigation");
        }
        if entry.attempt.state() == AttemptState::Step2Pending {
            match failure {
                Some(failure) => entry.attempt.fail(failure)?,
                None => entry.attempt.cancel()?,
            }
        }
        let report = StepReport::from(&entry.attempt);
        log_transition(&report);
        if report.is_terminal() {
            table.settle(attempt_id);
        }
        Ok(report)
    }

    /// Completes a redirected attempt when the user comes back.
    ///
    /// Looks the checkpoint up by the provider reference from the return URL.
    /// A reference with no checkpoint yields `NothingPending`, so replaying a
    /// return after success changes nothing. On success the checkpoint is
    /// removed; on failure it is kept for a later resume or discard.
    pub async fn resume_redirect(&self, provider_ref: &str) -> Result<ResumeOutcome, OrchestratorError> {
        let (snapshot, adapter) = {
            let mut table = self.table.lock().await;
            if table.is_resuming(provider_ref) {
                return Err(OrchestratorError::AlreadyProcessing(provider_ref.to_string()));
            }
            let Some(checkpoint) = self.checkpoints.load(provider_ref)? else {
                tracing::info!(%provider_ref, "No pending redirect for reference");
                return Ok(ResumeOutcome::NothingPending);
            };
            let adapter = self.adapter(Gateway::OrderSubscription)?;
            let snapshot = self.admit_resume(&mut table, &checkpoint)?;
            table.start_resume(provider_ref);
            (snapshot, adapter)
        };
        let attempt_id = snapshot.id();
        tracing::info!(%attempt_id, %provider_ref, "Resuming redirected attempt");

        let budget = self.config.step_timeout;
        let result = timeout(budget, adapter.start_step2(&snapshot, StepInput::RedirectReturn)).await;
        let outcome = classify(attempt_id, result, budget);

        let report = {
            let mut table = self.table.lock().await;
            table.finish_resume(provider_ref);
            let report = self.commit(&mut table, attempt_id, AttemptState::Step2Pending, outcome)?;
            if report.succeeded() {
                if let Err(err) = self.checkpoints.remove(provider_ref) {
                    tracing::warn!(%attempt_id, error = %err, "Could not remove resumed checkpoint");
                }
            }
            report
        };
        if report.succeeded() {
            self.reconcile(&report).await;
        }
        Ok(ResumeOutcome::Resumed(report))
    }

    /// Checkpoints awaiting a return, oldest first.
    pub fn pending_redirects(&self) -> Result<Vec<RedirectCheckpoint>, OrchestratorError> {
        Ok(self.checkpoints.list()?)
    }

    /// Drops a pending redirect the user abandoned. Returns false if no
    /// checkpoint was stored under the reference.
    pub async fn discard_redirect(&self, provider_ref: &str) -> Result<bool, OrchestratorError> {
        let mut table = self.table.lock().await;
        if table.is_resuming(provider_ref) {
            return Err(OrchestratorError::AlreadyProcessing(provider_ref.to_string()));
        }
        let checkpoint = self.checkpoints.load(provider_ref)?;
        let removed = self.checkpoints.remove(provider_ref)?;

        if let Some(checkpoint) = checkpoint {
            let attempt_id = checkpoint.attempt_id;
            if let Some(entry) = table.get_mut(attempt_id) {
                if !entry.attempt.is_terminal() {
                    entry.attempt.cancel()?;
                    table.settle(attempt_id);
                }
            }
            tracing::info!(%attempt_id, %provider_ref, "Pending redirect discarded");
        }
        Ok(removed)
    }

    /// Cancels an attempt. Provider-side objects are left to expire; nothing
    /// is reversed and no entitlement changes.
    ///
    /// Cancelling a finished attempt returns it unchanged.
    pub async fn cancel(&self, attempt_id: AttemptId) -> Result<StepReport, OrchestratorError> {
        let mut table = self.table.lock().await;
        let entry = table
            .get_mut(attempt_id)
            .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;
        if entry.attempt.is_terminal() {
            return Ok(StepReport::from(&entry.attempt));
        }

        let redirect_key = if entry.attempt.state() == AttemptState::Step2Pending {
            entry
                .attempt
                .checkpoint()
                .ok()
                .map(|checkpoint| checkpoint.key().to_string())
        } else {
            None
        };
        entry.attempt.cancel()?;
        let report = StepReport::from(&entry.attempt);
        table.settle(attempt_id);

        if let Some(key) = redirect_key {
            if let Err(err) = self.checkpoints.remove(&key) {
                tracing::warn!(%attempt_id, error = %err, "Could not remove checkpoint of cancelled attempt");
            }
        }
        log_transition(&report);
        Ok(report)
    }

    /// Offers a transiently failed attempt again under the same id.
    ///
    /// Only attempts that failed on the network before the provider created
    /// anything qualify. The attempt returns to `GatewaySelected` with its
    /// charge unchanged and re-takes its widget lease.
    pub async fn retry_transient(&self, attempt_id: AttemptId) -> Result<StepReport, OrchestratorError> {
        let mut table = self.table.lock().await;
        let entry = table
            .get(attempt_id)
            .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;
        if !entry.attempt.can_retry_same_id() {
            return Err(OrchestratorError::Attempt(AttemptError::NotRetryable));
        }
        let key = admission_key(&entry.attempt);
        if let Some(live) = table.live_for(&key) {
            tracing::info!(%attempt_id, live_attempt = %live, "Retry refused; subject has a live attempt");
            return Err(OrchestratorError::AlreadyProcessing(key.subject.to_string()));
        }
        let gateway = entry
            .attempt
            .gateway()
            .ok_or(OrchestratorError::Attempt(AttemptError::NotRetryable))?;
        let lease = self
            .leases
            .try_acquire(gateway)
            .ok_or(OrchestratorError::WidgetBusy(gateway))?;

        let entry = table
            .get_mut(attempt_id)
            .ok_or(OrchestratorError::AttemptNotFound(attempt_id))?;
        entry.attempt.rearm()?;
        entry.lease = Some(lease);
        let report = StepReport::from(&entry.attempt);
        table.mark_live(attempt_id);

        tracing::info!(%attempt_id, %gateway, "Attempt re-armed after transient failure");
        Ok(report)
    }

    /// A copy of the attempt, if it is still held.
    pub async fn attempt(&self, attempt_id: AttemptId) -> Option<PaymentAttempt> {
        let table = self.table.lock().await;
        table.get(attempt_id).map(|entry| entry.attempt.clone())
    }

    /// Drops a finished attempt. Returns false if it was not held.
    pub async fn forget(&self, attempt_id: AttemptId) -> Result<bool, OrchestratorError> {
        let mut table = self.table.lock().await;
        let live = match table.get(attempt_id) {
            None => return Ok(false),
            Some(entry) => !entry.attempt.is_terminal(),
        };
        if live {
            return Err(OrchestratorError::AttemptLive(attempt_id));
        }
        Ok(table.remove(attempt_id).is_some())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn adapter(&self, gateway: Gateway) -> Result<Arc<dyn GatewayAdapter>, OrchestratorError> {
        self.adapters
            .get(&gateway)
            .cloned()
            .ok_or(OrchestratorError::GatewayNotConfigured(gateway))
    }

    fn adapter_for(&self, attempt: &PaymentAttempt) -> Result<Arc<dyn GatewayAdapter>, OrchestratorError> {
        let gateway = attempt.gateway().ok_or(OrchestratorError::InvalidTransition {
            attempt_id: attempt.id(),
            state: attempt.state(),
            operation: "run",
        })?;
        self.adapter(gateway)
    }

    async fn resolve_charge(
        &self,
        artist_id: &ArtistId,
        cycle: BillingCycle,
        gateway: Gateway,
        currency_hint: Option<&Currency>,
    ) -> Result<Charge, PaymentFailure> {
        let plans = match timeout(self.config.step_timeout, self.plans.artist_plans(artist_id)).await {
            Err(_) => return Err(PaymentFailure::timeout("plan lookup timed out")),
            Ok(Err(err)) if err.code == PaymentErrorCode::NotFound => {
                return Err(PaymentFailure::from(&PlanError::PlanNotFound {
                    artist_id: artist_id.clone(),
                    cycle,
                    gateway,
                }));
            }
            Ok(Err(err)) => return Err(plan_lookup_failure(&err)),
            Ok(Ok(plans)) => plans,
        };
        self.resolver
            .resolve(&plans, cycle, gateway, currency_hint)
            .map(Charge::from)
            .map_err(|e| PaymentFailure::from(&e))
    }

    /// Prepares the checkpointed attempt for its return step.
    ///
    /// Reuses the attempt if this process still holds it in `Step2Pending`;
    /// otherwise rebuilds it from the checkpoint. Resume does not take the
    /// widget lease.
    fn admit_resume(
        &self,
        table: &mut AttemptTable,
        checkpoint: &RedirectCheckpoint,
    ) -> Result<PaymentAttempt, OrchestratorError> {
        if let Some(live) = table.live_for(&checkpoint.admission_key()) {
            if live != checkpoint.attempt_id {
                return Err(OrchestratorError::AlreadyProcessing(checkpoint.subject.to_string()));
            }
        }

        if let Some(entry) = table.get(checkpoint.attempt_id) {
            if entry.attempt.state() == AttemptState::Step2Pending {
                return Ok(entry.attempt.clone());
            }
        }

        table.remove(checkpoint.attempt_id);
        let attempt = PaymentAttempt::from_checkpoint(checkpoint);
        table.insert_live(Entry {
            attempt: attempt.clone(),
            lease: None,
        });
        Ok(attempt)
    }

    /// Applies a step outcome if the attempt is still in `expected`.
    fn commit(
        &self,
        table: &mut AttemptTable,
        attempt_id: AttemptId,
        expected: AttemptState,
        outcome: StepOutcome,
    ) -> Result<StepReport, OrchestratorError> {
        let Some(entry) = table.get_mut(attempt_id) else {
            tracing::warn!(%attempt_id, "Step result for a dropped attempt discarded");
            return Err(OrchestratorError::AttemptNotFound(attempt_id));
        };
        if entry.attempt.state() != expected {
            tracing::warn!(
                %attempt_id,
                state = ?entry.attempt.state(),
                "Step result discarded; attempt moved on"
            );
            return Ok(StepReport::from(&entry.attempt));
        }

        match outcome {
            StepOutcome::Done(result) if expected == AttemptState::Step1Pending => {
                entry.attempt.complete_step1(result.provider_refs, result.handoff)?
            }
            StepOutcome::Done(result) => entry.attempt.succeed(result.provider_refs)?,
            StepOutcome::Failed(failure) => entry.attempt.fail(failure)?,
            StepOutcome::Cancelled => entry.attempt.cancel()?,
        }

        let report = StepReport::from(&entry.attempt);
        log_transition(&report);
        if report.is_terminal() {
            table.settle(attempt_id);
        }
        Ok(report)
    }

    /// Refreshes entitlements after a success. Refresh errors leave the
    /// previous view in place.
    async fn reconcile(&self, report: &StepReport) {
        let refreshed = match &report.subject {
            Subject::Item(item) => {
                let in_session = report.gateway.map(|g| !g.requires_redirect()).unwrap_or(false);
                if in_session {
                    self.reconciliation
                        .mark_purchased_optimistically(item.id.clone())
                        .await;
                }
                self.reconciliation.refresh_purchases().await
            }
            Subject::Artist { .. } => self.reconciliation.refresh_subscriptions().await,
        };
        if let Err(err) = refreshed {
            tracing::warn!(attempt_id = %report.attempt_id, error = %err, "Entitlement refresh failed");
        }
    }
}

fn classify(
    attempt_id: AttemptId,
    result: Result<Result<StepResult, PaymentError>, Elapsed>,
    budget: Duration,
) -> StepOutcome {
    match result {
        Ok(Ok(step)) => StepOutcome::Done(step),
        Ok(Err(err)) => match failure_for(attempt_id, &err) {
            Some(failure) => StepOutcome::Failed(failure),
            None => StepOutcome::Cancelled,
        },
        Err(_) => {
            tracing::warn!(%attempt_id, ?budget, "Provider step timed out");
            StepOutcome::Failed(PaymentFailure::timeout(format!(
                "step did not resolve within {:?}",
                budget
            )))
        }
    }
}

/// Maps an adapter error onto the attempt failure taxonomy.
///
/// `None` means the user backed out: the attempt ends `Cancelled`, not `Failed`.
fn failure_for(attempt_id: AttemptId, err: &PaymentError) -> Option<PaymentFailure> {
    let failure = match err.code {
        PaymentErrorCode::UserCancelled => {
            tracing::info!(%attempt_id, "Payment dismissed by user");
            return None;
        }
        PaymentErrorCode::NetworkError => PaymentFailure::network(err.message.clone()),
        PaymentErrorCode::ProviderDeclined => {
            tracing::info!(%attempt_id, provider_code = ?err.provider_code, "Payment declined by provider");
            PaymentFailure::declined(err.message.clone())
        }
        PaymentErrorCode::ConfigurationError | PaymentErrorCode::NotFound | PaymentErrorCode::ProviderError => {
            tracing::error!(%attempt_id, code = ?err.code, message = %err.message, "Payment configuration problem");
            PaymentFailure::configuration(err.to_string())
        }
    };
    Some(failure)
}

fn plan_lookup_failure(err: &PaymentError) -> PaymentFailure {
    if err.retryable || err.code == PaymentErrorCode::NetworkError {
        PaymentFailure::network(err.message.clone())
    } else {
        tracing::error!(code = ?err.code, message = %err.message, "Plan lookup failed");
        PaymentFailure::configuration(err.to_string())
    }
}

fn log_transition(report: &StepReport) {
    match &report.failure {
        Some(failure) if report.state == AttemptState::FAILED => tracing::info!(
            attempt_id = %report.attempt_id,
            gateway = ?report.gateway,
            state = ?report.state,
            failure = %failure.kind,
            "Attempt failed"
        ),
        _ => tracing::info!(
            attempt_id = %report.attempt_id,
            gateway = ?report.gateway,
            state = ?report.state,
            "Attempt state changed"
        ),
    }
}
