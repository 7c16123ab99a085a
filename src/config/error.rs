//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Webhook secret must start with whsec_")]
    InvalidWebhookSecret,

    #[error("Livemode enforcement must be enabled in production")]
    LivemodeRequiredInProduction,

    #[error("Invalid warehouse address: {0}")]
    InvalidWarehouseAddress(String),

    #[error("Invalid carrier timeout")]
    InvalidCarrierTimeout,

    #[error("Default carrier {0:?} has no credentials configured")]
    DefaultCarrierNotConfigured(String),
}
