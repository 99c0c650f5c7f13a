//! Data a completed first step hands to the second step.

use secrecy::SecretString;

use crate::domain::foundation::Money;

/// What the client must do next to finish the attempt.
#[derive(Debug, Clone)]
pub enum Handoff {
    /// Confirm the intent in the card-vault script.
    ConfirmCard {
        intent_id: String,
        client_secret: SecretString,
    },

    /// Open the hosted checkout widget for this order or subscription.
    OpenCheckout {
        reference: String,
        amount: Money,
    },

    /// Send the browser to the provider's approval page.
    Redirect { approve_url: String },
}

impl Handoff {
    pub fn label(&self) -> &'static str {
        match self {
            Handoff::ConfirmCard { .. } => "confirm_card",
            Handoff::OpenCheckout { .. } => "open_checkout",
            Handoff::Redirect { .. } => "redirect",
        }
    }
}
