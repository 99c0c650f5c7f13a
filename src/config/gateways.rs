//! Gateway keys and return URL

use serde::Deserialize;

use super::error::ValidationError;

/// Public keys of the provider scripts. A gateway without its key is
/// unavailable: its adapter refuses to start with a configuration error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewaysConfig {
    /// Card-vault publishable key
    pub card_vault_publishable_key: Option<String>,

    /// Checkout widget key id
    pub checkout_key_id: Option<String>,

    /// Redirect gateway client id
    pub redirect_client_id: Option<String>,

    /// Where the redirect provider sends the listener back
    pub return_url: Option<String>,
}

impl GatewaysConfig {
    pub fn redirect_enabled(&self) -> bool {
        is_set(&self.redirect_client_id)
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.redirect_enabled() {
            let return_url = self
                .return_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .ok_or(ValidationError::ReturnUrlRequired)?;
            if !return_url.starts_with("http://") && !return_url.starts_with("https://") {
                return Err(ValidationError::InvalidReturnUrl);
            }
        }
        Ok(())
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_gateways_is_valid() {
        assert!(GatewaysConfig::default().validate().is_ok());
    }

    #[test]
    fn test_redirect_requires_return_url() {
        let config = GatewaysConfig {
            redirect_client_id: Some("client".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::ReturnUrlRequired));
    }

    #[test]
    fn test_redirect_rejects_relative_return_url() {
        let config = GatewaysConfig {
            redirect_client_id: Some("client".to_string()),
            return_url: Some("/payments/return".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidReturnUrl));
    }

    #[test]
    fn test_blank_client_id_disables_redirect() {
        let config = GatewaysConfig {
            redirect_client_id: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!config.redirect_enabled());
        assert!(config.validate().is_ok());
    }
}
