//! Billing handlers.
//!
//! Commands:
//! - ProcessWebhook: verify, dedupe, and apply one billing event

mod process_webhook;

// Commands
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
