//! HTTP adapter for subscription endpoints.
//!
//! Exposes the subscription read side plus the one member-initiated
//! mutation:
//! - `GET /subscriptions/:id` - Subscription details
//! - `POST /subscriptions/:id/cancellation` - Stop renewing at period end

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::SubscriptionAppState;
pub use routes::subscription_router;
