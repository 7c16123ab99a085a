//! Fulfillment domain module.
//!
//! Turns a paid billing period into a physical box: wine selection,
//! shipment lifecycle, and carrier tracking snapshots.
//!
//! # Module Structure
//!
//! - `allocation` - Wine catalogue entries and the selection policy
//! - `shipment` - Shipment aggregate and status state machine
//! - `tracking` - Tracking snapshots with last-write-wins freshness

mod allocation;
mod shipment;
mod tracking;

pub use allocation::{select_for_allocation, AllocationOrder, Wine};
pub use shipment::{Shipment, ShipmentItem, ShipmentStatus};
pub use tracking::{DeliveryStatus, TrackingEvent, TrackingInfo};
