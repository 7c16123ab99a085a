//! HTTP adapter for shipment endpoints.
//!
//! Exposes fulfillment via REST API:
//! - `GET /shipments` - List shipments, filterable by status and cave
//! - `POST /shipments/:id/label` - Generate or retry the shipping label
//! - `GET /shipments/:id/tracking` - Stored tracking snapshot
//! - `POST /shipments/:id/tracking/refresh` - Pull fresh tracking from the carrier
//! - `GET /subscriptions/:id/shipments` - List one subscription's shipments
//! - `POST /subscriptions/:id/shipments` - Create the current period's shipment by hand

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::FulfillmentAppState;
pub use routes::fulfillment_router;
