//! HTTP adapter for billing webhook ingestion.
//!
//! Exposes the processor-facing endpoint:
//! - `POST /webhooks/billing` - Process a billing processor webhook delivery

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::BillingAppState;
pub use routes::billing_router;
