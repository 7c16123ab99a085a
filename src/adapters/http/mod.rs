//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure.

use axum::{routing::get, Json, Router};

pub mod billing;
pub mod fulfillment;
pub mod subscription;

// Re-export key types for convenience
pub use billing::billing_router;
pub use billing::BillingAppState;
pub use fulfillment::fulfillment_router;
pub use fulfillment::FulfillmentAppState;
pub use subscription::subscription_router;
pub use subscription::SubscriptionAppState;

/// GET /health - Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create the health router.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}
