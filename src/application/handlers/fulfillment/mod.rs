//! Fulfillment handlers.
//!
//! Commands:
//! - `CreateShipment` - Allocate and label the current period's shipment
//! - `GenerateLabel` - Retry labeling for a pending shipment
//! - `RefreshTracking` - Pull carrier tracking and advance the shipment
//!
//! Queries:
//! - `GetTracking` - Stored tracking snapshot for a shipment
//! - `ListShipments` - Filterable shipment listings

mod create_shipment;
mod generate_label;
mod get_tracking;
mod list_shipments;
mod refresh_tracking;

// Commands
pub use create_shipment::{
    CreateShipmentCommand, CreateShipmentHandler, CreateShipmentResult, FulfillmentPolicy,
};
pub use generate_label::{GenerateLabelCommand, GenerateLabelHandler, GenerateLabelResult};
pub use refresh_tracking::{RefreshTrackingCommand, RefreshTrackingHandler, RefreshTrackingResult};

// Queries
pub use get_tracking::{GetTrackingHandler, GetTrackingQuery, GetTrackingResult};
pub use list_shipments::{ListShipmentsHandler, ListShipmentsQuery, ListShipmentsResult};
