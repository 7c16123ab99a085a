//! Axum router configuration for shipment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_shipment, generate_label, get_tracking, list_shipments, list_subscription_shipments,
    refresh_tracking, FulfillmentAppState,
};

/// Create the shipment router.
///
/// # Routes
/// - `GET /` - List shipments, filterable by status and cave
/// - `POST /:id/label` - Generate or retry the shipping label
/// - `GET /:id/tracking` - Stored tracking snapshot
/// - `POST /:id/tracking/refresh` - Pull fresh tracking from the carrier
pub fn shipment_routes() -> Router<FulfillmentAppState> {
    Router::new()
        .route("/", get(list_shipments))
        .route("/:id/label", post(generate_label))
        .route("/:id/tracking", get(get_tracking))
        .route("/:id/tracking/refresh", post(refresh_tracking))
}

/// Create the subscription-scoped shipment router.
///
/// # Routes
/// - `GET /:id/shipments` - List one subscription's shipments
/// - `POST /:id/shipments` - Create the current period's shipment by hand
pub fn subscription_shipment_routes() -> Router<FulfillmentAppState> {
    Router::new().route(
        "/:id/shipments",
        get(list_subscription_shipments).post(create_shipment),
    )
}

/// Create the complete fulfillment module router.
///
/// Mounts shipment routes at `/shipments` and the subscription-scoped
/// trigger/listing routes at `/subscriptions`.
pub fn fulfillment_router() -> Router<FulfillmentAppState> {
    Router::new()
        .nest("/shipments", shipment_routes())
        .nest("/subscriptions", subscription_shipment_routes())
}
