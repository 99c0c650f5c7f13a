//! Payment attempt state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// How a finished attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalOutcome {
    Success,
    Failed,
    Cancelled,
}

/// Lifecycle of a payment attempt.
///
/// Every gateway fits the same two-step shape. Any live state can fail or be
/// cancelled; terminal states have no exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Created,
    GatewaySelected,
    Step1Pending,
    Step1Done,
    Step2Pending,
    Terminal(TerminalOutcome),
}

impl AttemptState {
    pub const SUCCEEDED: AttemptState = AttemptState::Terminal(TerminalOutcome::Success);
    pub const FAILED: AttemptState = AttemptState::Terminal(TerminalOutcome::Failed);
    pub const CANCELLED: AttemptState = AttemptState::Terminal(TerminalOutcome::Cancelled);

    /// True while a provider step is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, AttemptState::Step1Pending | AttemptState::Step2Pending)
    }

    pub fn outcome(&self) -> Option<TerminalOutcome> {
        match self {
            AttemptState::Terminal(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

impl StateMachine for AttemptState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AttemptState::*;
        let forward = match self {
            Created => GatewaySelected,
            GatewaySelected => Step1Pending,
            Step1Pending => Step1Done,
            Step1Done => Step2Pending,
            Step2Pending => Self::SUCCEEDED,
            Terminal(_) => return vec![],
        };
        vec![forward, Self::FAILED, Self::CANCELLED]
    }
}
