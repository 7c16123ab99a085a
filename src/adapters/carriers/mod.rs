//! Carrier adapters.
//!
//! HTTP clients for the parcel carriers VineCellar ships with, plus a
//! scriptable mock for tests. Each adapter implements the `CarrierClient`
//! trait; [`build_registry`] assembles the registry from configured
//! credentials.
//!
//! # Security
//!
//! - Carrier credentials are handled via `secrecy::SecretString`
//! - Credentials never appear in logs or error messages

mod colissimo;
mod mock;
mod ups;

pub use colissimo::{ColissimoCarrier, ColissimoConfig};
pub use mock::MockCarrier;
pub use ups::{UpsCarrier, UpsConfig};

use std::sync::Arc;

use crate::config::CarriersConfig;
use crate::ports::CarrierRegistry;

/// Build the carrier registry from configured credentials.
///
/// Only carriers with a credential block are registered; routing a
/// shipment to anything else fails with an unsupported-carrier error
/// before any network call is made.
pub fn build_registry(config: &CarriersConfig) -> CarrierRegistry {
    let mut registry = CarrierRegistry::new();

    if let Some(settings) = &config.colissimo {
        let mut carrier_config =
            ColissimoConfig::new(settings.api_key.clone()).with_timeout(config.timeout());
        if let Some(base_url) = &settings.base_url {
            carrier_config = carrier_config.with_base_url(base_url);
        }
        registry.register(Arc::new(ColissimoCarrier::new(carrier_config)));
    }

    if let Some(settings) = &config.ups {
        let mut carrier_config =
            UpsConfig::new(settings.access_token.clone()).with_timeout(config.timeout());
        if let Some(base_url) = &settings.base_url {
            carrier_config = carrier_config.with_base_url(base_url);
        }
        registry.register(Arc::new(UpsCarrier::new(carrier_config)));
    }

    registry
}
