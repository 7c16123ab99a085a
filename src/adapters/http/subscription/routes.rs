//! Axum router configuration for subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_subscription, request_cancellation, SubscriptionAppState};

/// Create the subscription router.
///
/// # Routes
/// - `GET /:id` - Subscription details
/// - `POST /:id/cancellation` - Stop renewing at period end
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/:id", get(get_subscription))
        .route("/:id/cancellation", post(request_cancellation))
}

/// Create the complete subscription module router.
///
/// Mounts subscription routes at `/subscriptions`.
pub fn subscription_router() -> Router<SubscriptionAppState> {
    Router::new().nest("/subscriptions", subscription_routes())
}
