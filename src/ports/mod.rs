//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Billing Ports
//!
//! - `BillingEventLedger` - Processed-event ledger for webhook idempotency
//!
//! ## Persistence Ports
//!
//! - `SubscriptionRepository` - Subscription aggregate persistence
//! - `FulfillmentStore` - Shipments, atomic stock allocation, tracking
//! - `SubscriptionReader` / `ShipmentReader` - Read-side views
//!
//! ## Carrier Ports
//!
//! - `CarrierClient` - One carrier integration (labels + tracking)
//! - `CarrierRegistry` - Name-to-carrier resolution, built at startup

mod billing_ledger;
mod carrier_gateway;
mod fulfillment_store;
mod read_models;
mod subscription_repository;

pub use billing_ledger::{BillingEventLedger, BillingEventRecord, ClaimResult, ProcessingOutcome};
pub use carrier_gateway::{
    CarrierClient, CarrierError, CarrierErrorCode, CarrierRegistry, LabelRequest, Package,
    ServiceLevel, ShippingLabel,
};
pub use fulfillment_store::{AllocationOutcome, FulfillmentStore, NewShipment};
pub use read_models::{
    ShipmentFilter, ShipmentItemView, ShipmentReader, ShipmentView, SubscriptionReader,
    SubscriptionView,
};
pub use subscription_repository::SubscriptionRepository;
