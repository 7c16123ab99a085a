//! Fulfillment policy configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::Address;
use crate::domain::fulfillment::AllocationOrder;
use crate::ports::ServiceLevel;

/// Fulfillment policy configuration
///
/// Controls how shipments are allocated and dispatched: which carrier
/// handles them by default, in what order bottles leave the cellar, and
/// where parcels originate.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentConfig {
    /// Carrier used for new shipments unless a request overrides it
    #[serde(default = "default_carrier")]
    pub default_carrier: String,

    /// Order wines leave the cellar during allocation
    #[serde(default)]
    pub allocation_order: AllocationOrder,

    /// Shipping speed purchased for member deliveries
    #[serde(default)]
    pub service_level: ServiceLevel,

    /// Warehouse address parcels originate from
    pub warehouse: WarehouseConfig,
}

/// Warehouse origin address
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarehouseConfig {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl WarehouseConfig {
    /// Build the validated origin address
    pub fn to_address(&self) -> Result<Address, ValidationError> {
        Address::new(
            self.name.clone(),
            self.line1.clone(),
            self.line2.clone(),
            self.city.clone(),
            self.postal_code.clone(),
            self.country.clone(),
        )
        .map_err(|e| ValidationError::InvalidWarehouseAddress(e.to_string()))
    }
}

impl FulfillmentConfig {
    /// Validate fulfillment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_carrier.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "FULFILLMENT__DEFAULT_CARRIER",
            ));
        }
        self.warehouse.to_address()?;
        Ok(())
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            default_carrier: default_carrier(),
            allocation_order: AllocationOrder::default(),
            service_level: ServiceLevel::default(),
            warehouse: WarehouseConfig::default(),
        }
    }
}

fn default_carrier() -> String {
    "colissimo".to_string()
}
