//! Billing webhook configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Billing provider webhook configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingConfig {
    /// Webhook signing secret (whsec_...)
    pub webhook_secret: String,

    /// Ignore events generated against test-mode billing data
    #[serde(default)]
    pub require_livemode: bool,
}

impl BillingConfig {
    /// Validate billing configuration
    ///
    /// Production deployments must enforce livemode so that test-mode
    /// events can never trigger real shipments.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__WEBHOOK_SECRET"));
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        if *environment == Environment::Production && !self.require_livemode {
            return Err(ValidationError::LivemodeRequiredInProduction);
        }
        Ok(())
    }
}
