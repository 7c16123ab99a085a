//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `VINECELLAR_` prefix and nested values use underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use vinecellar::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod billing;
mod carriers;
mod database;
mod error;
mod fulfillment;
mod server;

pub use billing::BillingConfig;
pub use carriers::{CarriersConfig, ColissimoSettings, UpsSettings};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use fulfillment::{FulfillmentConfig, WarehouseConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the VineCellar fulfillment
/// service. Load using [`AppConfig::load()`] which reads from environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Billing webhook configuration (signing secret, livemode)
    pub billing: BillingConfig,

    /// Fulfillment policy (default carrier, allocation order, warehouse)
    pub fulfillment: FulfillmentConfig,

    /// Carrier credentials
    #[serde(default)]
    pub carriers: CarriersConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `VINECELLAR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `VINECELLAR__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `VINECELLAR__DATABASE__URL=...` -> `database.url = ...`
    /// - `VINECELLAR__FULFILLMENT__WAREHOUSE__CITY=...` -> `fulfillment.warehouse.city = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VINECELLAR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Performs semantic validation of configuration:
    /// - URL formats and pool size constraints
    /// - Webhook secret prefix and livemode enforcement in production
    /// - Warehouse address completeness
    /// - Default carrier has credentials configured
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.billing.validate(&self.server.environment)?;
        self.fulfillment.validate()?;
        self.carriers.validate()?;

        if !self.carriers.is_configured(&self.fulfillment.default_carrier) {
            return Err(ValidationError::DefaultCarrierNotConfigured(
                self.fulfillment.default_carrier.clone(),
            ));
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
