//! Data transfer objects for subscription endpoints.

use serde::Serialize;

use crate::application::handlers::subscription::RequestCancellationResult;
use crate::domain::foundation::Address;
use crate::domain::subscription::{SubscriptionStatus, SubscriptionTier};
use crate::ports::SubscriptionView;

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Postal address in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AddressResponse {
    pub name: String,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            name: address.name,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// Subscription details for external readers.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionViewResponse {
    pub id: String,
    pub member_id: String,
    pub cave_id: String,
    pub tier: SubscriptionTier,
    pub bottles_per_cycle: u32,
    pub status: SubscriptionStatus,
    pub delivery_address: AddressResponse,
    pub current_period_start: String,
    pub current_period_end: String,
    pub cancel_at_period_end: bool,
    pub date_paid: Option<String>,
    pub ended_at: Option<String>,
    pub created_at: String,
}

impl From<SubscriptionView> for SubscriptionViewResponse {
    fn from(view: SubscriptionView) -> Self {
        Self {
            id: view.id.to_string(),
            member_id: view.member_id.to_string(),
            cave_id: view.cave_id.to_string(),
            tier: view.tier,
            bottles_per_cycle: view.bottles_per_cycle,
            status: view.status,
            delivery_address: AddressResponse::from(view.delivery_address),
            current_period_start: view.current_period_start.as_datetime().to_rfc3339(),
            current_period_end: view.current_period_end.as_datetime().to_rfc3339(),
            cancel_at_period_end: view.cancel_at_period_end,
            date_paid: view.date_paid.map(|t| t.as_datetime().to_rfc3339()),
            ended_at: view.ended_at.map(|t| t.as_datetime().to_rfc3339()),
            created_at: view.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Acknowledgement for a cancellation request.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationResponse {
    pub subscription_id: String,
    /// The subscription keeps shipping until this date, then ends.
    pub effective_at: String,
}

impl From<RequestCancellationResult> for CancellationResponse {
    fn from(result: RequestCancellationResult) -> Self {
        Self {
            subscription_id: result.subscription_id.to_string(),
            effective_at: result.effective_at.as_datetime().to_rfc3339(),
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
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error response with details.
    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
