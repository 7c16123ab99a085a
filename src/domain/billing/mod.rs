//! Billing domain module.
//!
//! Handles inbound billing-processor webhooks: signed event envelopes,
//! signature verification, and the error taxonomy for webhook processing.
//!
//! # Module Structure
//!
//! - `event` - Billing event envelope and typed payload objects
//! - `verifier` - HMAC-SHA256 signature verification with replay guard
//! - `errors` - Webhook error taxonomy with HTTP status mapping

mod errors;
mod event;
mod verifier;

pub use errors::WebhookError;
pub use event::{
    BillingEvent, BillingEventData, BillingEventKind, CheckoutObject, InvoiceObject,
    SubscriptionObject,
};
pub use verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use event::BillingEventBuilder;
#[cfg(test)]
pub use verifier::compute_test_signature;
