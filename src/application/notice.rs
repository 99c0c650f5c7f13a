//! What the UI shows when an attempt fails or is refused.

use crate::domain::payment::{FailureKind, PaymentFailure};

use super::OrchestratorError;

/// Category of a notice, for styling and dismissal rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Duplicate submission; shown in place, not as an error.
    AlreadyProcessing,

    /// Another payment is using the provider's window.
    ProviderBusy,

    Failure(FailureKind),

    /// Internal or configuration problem with a generic message.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub kind: NoticeKind,
    pub message: String,
    pub retry_offered: bool,
}

impl From<&PaymentFailure> for UserNotice {
    fn from(failure: &PaymentFailure) -> Self {
        Self {
            kind: NoticeKind::Failure(failure.kind),
            message: failure.message.clone(),
            retry_offered: failure.retry_offered(),
        }
    }
}

impl From<&OrchestratorError> for UserNotice {
    fn from(err: &OrchestratorError) -> Self {
        match err {
            OrchestratorError::AlreadyProcessing(_) => Self {
                kind: NoticeKind::AlreadyProcessing,
                message: "Already processing your payment.".to_string(),
                retry_offered: false,
            },
            OrchestratorError::WidgetBusy(_) => Self {
                kind: NoticeKind::ProviderBusy,
                message: "Another payment is in progress. Finish or cancel it first.".to_string(),
                retry_offered: true,
            },
            _ => Self {
                kind: NoticeKind::Unavailable,
                message: "Something went wrong with this payment. Please try again.".to_string(),
                retry_offered: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Gateway;

    #[test]
    fn declined_notice_shows_provider_message_without_retry() {
        let notice = UserNotice::from(&PaymentFailure::declined("Do not honor"));

        assert_eq!(notice.kind, NoticeKind::Failure(FailureKind::ProviderDeclined));
        assert_eq!(notice.message, "Do not honor");
        assert!(!notice.retry_offered);
    }

    #[test]
    fn duplicate_submission_is_in_place_notice() {
        let notice = UserNotice::from(&OrchestratorError::AlreadyProcessing("artist:a1".to_string()));

        assert_eq!(notice.kind, NoticeKind::AlreadyProcessing);
        assert!(!notice.retry_offered);
    }

    #[test]
    fn busy_widget_offers_retry() {
        let notice = UserNotice::from(&OrchestratorError::WidgetBusy(Gateway::CardVault));
        assert_eq!(notice.kind, NoticeKind::ProviderBusy);
        assert!(notice.retry_offered);
    }
}
