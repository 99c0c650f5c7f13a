//! Errors returned by orchestrator operations.
//!
//! These are refusals of the operation itself. Failures of an admitted
//! attempt are recorded on the attempt and reported through `StepReport`.

use thiserror::Error;

use crate::domain::foundation::AttemptId;
use crate::domain::payment::{AttemptError, AttemptState, Gateway};
use crate::ports::CheckpointError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Duplicate submission for a subject, step or checkpoint already in flight.
    #[error("{0} is already being processed")]
    AlreadyProcessing(String),

    #[error("attempt {0} not found")]
    AttemptNotFound(AttemptId),

    #[error("cannot {operation} attempt {attempt_id} in state {state:?}")]
    InvalidTransition {
        attempt_id: AttemptId,
        state: AttemptState,
        operation: &'static str,
    },

    #[error("the {0} widget is in use by another attempt")]
    WidgetBusy(Gateway),

    #[error("gateway {0} is not configured")]
    GatewayNotConfigured(Gateway),

    #[error("attempt {0} completes through the provider redirect")]
    RedirectRequired(AttemptId),

    #[error("attempt {0} does not use a redirect gateway")]
    NotARedirect(AttemptId),

    #[error("attempt {0} is still in progress")]
    AttemptLive(AttemptId),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

impl OrchestratorError {
    /// Maps a refused step start on `attempt_id`.
    pub(super) fn step_refused(attempt_id: AttemptId, operation: &'static str, err: AttemptError) -> Self {
        match err {
            AttemptError::StepInProgress { .. } => {
                OrchestratorError::AlreadyProcessing(format!("attempt {}", attempt_id))
            }
            AttemptError::InvalidTransition { from, .. } => OrchestratorError::InvalidTransition {
                attempt_id,
                state: from,
                operation,
            },
            other => OrchestratorError::Attempt(other),
        }
    }
}
