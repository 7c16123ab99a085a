//! Subscription handlers.
//!
//! Commands:
//! - `RequestCancellation` - Flag a subscription to end at period close
//!
//! Queries:
//! - `GetSubscription` - Current subscription state for a member

mod get_subscription;
mod request_cancellation;

// Commands
pub use request_cancellation::{
    RequestCancellationCommand, RequestCancellationHandler, RequestCancellationResult,
};

// Queries
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult};
