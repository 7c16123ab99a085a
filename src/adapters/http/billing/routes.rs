//! Axum router configuration for the billing webhook endpoint.

use axum::{routing::post, Router};

use super::handlers::{handle_billing_webhook, BillingAppState};

/// Create the webhook router.
///
/// Webhook deliveries carry no user authentication; the payload is
/// verified against the processor's signing secret instead.
///
/// # Routes
/// - `POST /billing` - Process a billing processor webhook delivery
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/billing", post(handle_billing_webhook))
}

/// Create the complete billing module router.
///
/// Suitable for merging into the application router; exposes
/// `POST /webhooks/billing`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new().nest("/webhooks", webhook_routes())
}
