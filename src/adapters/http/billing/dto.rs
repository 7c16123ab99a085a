//! Data transfer objects for the billing webhook endpoint.

use serde::Serialize;

use crate::application::handlers::billing::ProcessWebhookResult;

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement returned for every accepted webhook delivery.
///
/// The processor only looks at the status code; the body exists for
/// operators replaying deliveries by hand.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    /// The processor's event id.
    pub event_id: String,
    /// What the ledger recorded: `applied`, `ignored`, `skipped` or
    /// `duplicate`.
    pub outcome: String,
    /// True when this event id was already processed earlier.
    pub duplicate: bool,
}

impl From<ProcessWebhookResult> for WebhookAckResponse {
    fn from(result: ProcessWebhookResult) -> Self {
        let outcome = match &result {
            ProcessWebhookResult::SubscriptionActivated { .. }
            | ProcessWebhookResult::PeriodRenewed { .. }
            | ProcessWebhookResult::MarkedPastDue { .. }
            | ProcessWebhookResult::SubscriptionClosed { .. } => "applied",
            ProcessWebhookResult::Ignored { .. } => "ignored",
            ProcessWebhookResult::Skipped { .. } => "skipped",
            ProcessWebhookResult::Duplicate { .. } => "duplicate",
        };

        Self {
            event_id: result.event_id().to_string(),
            outcome: outcome.to_string(),
            duplicate: matches!(result, ProcessWebhookResult::Duplicate { .. }),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
