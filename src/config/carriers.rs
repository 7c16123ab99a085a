//! Carrier credential configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Carrier credential configuration
///
/// A carrier is enabled by providing its credential block; absent blocks
/// leave the carrier unregistered. Shipments routed to an unregistered
/// carrier are rejected before any label call is made.
#[derive(Debug, Clone, Deserialize)]
pub struct CarriersConfig {
    /// Colissimo credentials
    pub colissimo: Option<ColissimoSettings>,

    /// UPS credentials
    pub ups: Option<UpsSettings>,

    /// Per-request timeout applied to every carrier call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Colissimo API credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ColissimoSettings {
    /// API key from the Colissimo business dashboard
    pub api_key: String,

    /// Override for the API base URL (testing)
    pub base_url: Option<String>,
}

/// UPS API credentials
#[derive(Debug, Clone, Deserialize)]
pub struct UpsSettings {
    /// OAuth access token
    pub access_token: String,

    /// Override for the API base URL (testing)
    pub base_url: Option<String>,
}

impl CarriersConfig {
    /// Check whether a carrier has credentials configured
    pub fn is_configured(&self, name: &str) -> bool {
        match name {
            "colissimo" => self.colissimo.is_some(),
            "ups" => self.ups.is_some(),
            _ => false,
        }
    }

    /// Get the carrier call timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate carrier configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidCarrierTimeout);
        }
        if let Some(colissimo) = &self.colissimo {
            if colissimo.api_key.trim().is_empty() {
                return Err(ValidationError::MissingRequired(
                    "CARRIERS__COLISSIMO__API_KEY",
                ));
            }
        }
        if let Some(ups) = &self.ups {
            if ups.access_token.trim().is_empty() {
                return Err(ValidationError::MissingRequired(
                    "CARRIERS__UPS__ACCESS_TOKEN",
                ));
            }
        }
        Ok(())
    }
}

impl Default for CarriersConfig {
    fn default() -> Self {
        Self {
            colissimo: None,
            ups: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carriers_config_defaults() {
        let config = CarriersConfig::default();
        assert!(config.colissimo.is_none());
        assert!(config.ups.is_none());
        assert_eq!(config.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_configured() {
        let config = CarriersConfig {
            colissimo: Some(ColissimoSettings {
                api_key: "col_key".to_string(),
                base_url: None,
            }),
            ups: None,
            timeout_secs: 10,
        };
        assert!(config.is_configured("colissimo"));
        assert!(!config.is_configured("ups"));
        assert!(!config.is_configured("dhl"));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let config = CarriersConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCarrierTimeout)
        ));
    }

    #[test]
    fn test_validation_rejects_blank_api_key() {
        let config = CarriersConfig {
            colissimo: Some(ColissimoSettings {
                api_key: "   ".to_string(),
                base_url: None,
            }),
            ups: None,
            timeout_secs: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        let config = CarriersConfig {
            colissimo: Some(ColissimoSettings {
                api_key: "col_key".to_string(),
                base_url: Some("http://localhost:9100".to_string()),
            }),
            ups: Some(UpsSettings {
                access_token: "ups_token".to_string(),
                base_url: None,
            }),
            timeout_secs: 10,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_deserialize() {
        let config: CarriersConfig = serde_json::from_str(
            r#"{
                "colissimo": { "api_key": "col_key" },
                "timeout_secs": 5
            }"#,
        )
        .unwrap();
        assert!(config.is_configured("colissimo"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.colissimo.unwrap().base_url.is_none());
    }
}
