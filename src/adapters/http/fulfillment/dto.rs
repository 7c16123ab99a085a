//! Data transfer objects for shipment endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::handlers::fulfillment::{
    CreateShipmentResult, GenerateLabelResult, RefreshTrackingResult,
};
use crate::domain::foundation::Address;
use crate::domain::fulfillment::{
    DeliveryStatus, Shipment, ShipmentItem, ShipmentStatus, TrackingEvent, TrackingInfo,
};
use crate::ports::{ShipmentItemView, ShipmentView};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create the current billing period's shipment by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShipmentRequest {
    /// Overrides the configured default carrier when set.
    #[serde(default)]
    pub carrier: Option<String>,
}

/// Request to generate (or retry) a shipment's label.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateLabelRequest {
    /// Ship through a different carrier than the one chosen at allocation.
    #[serde(default)]
    pub carrier: Option<String>,
}

/// Query string filters for shipment listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListShipmentsParams {
    /// Only shipments in this status.
    pub status: Option<ShipmentStatus>,

    /// Only shipments drawing from this cave.
    pub cave_id: Option<Uuid>,
}

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

/// One allocated wine in a shipment response.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentItemResponse {
    pub wine_id: String,
    pub quantity: u32,
}

impl From<&ShipmentItem> for ShipmentItemResponse {
    fn from(item: &ShipmentItem) -> Self {
        Self {
            wine_id: item.wine_id.to_string(),
            quantity: item.quantity,
        }
    }
}

impl From<ShipmentItemView> for ShipmentItemResponse {
    fn from(item: ShipmentItemView) -> Self {
        Self {
            wine_id: item.wine_id.to_string(),
            quantity: item.quantity,
        }
    }
}

/// Full shipment representation returned by the trigger endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentResponse {
    pub id: String,
    pub subscription_id: String,
    pub cave_id: String,
    pub billing_period: String,
    pub status: ShipmentStatus,
    pub carrier: String,
    pub destination: AddressResponse,
    pub requested_bottles: u32,
    pub allocated_bottles: u32,
    pub under_fulfilled: bool,
    pub items: Vec<ShipmentItemResponse>,
    pub tracking_number: Option<String>,
    pub label_url: Option<String>,
    pub shipping_cost_cents: Option<i64>,
    pub estimated_delivery: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Shipment> for ShipmentResponse {
    fn from(shipment: Shipment) -> Self {
        Self {
            id: shipment.id.to_string(),
            subscription_id: shipment.subscription_id.to_string(),
            cave_id: shipment.cave_id.to_string(),
            billing_period: shipment.billing_period.clone(),
            status: shipment.status,
            carrier: shipment.carrier.clone(),
            requested_bottles: shipment.requested_bottles,
            allocated_bottles: shipment.allocated_bottles(),
            under_fulfilled: shipment.is_under_fulfilled(),
            items: shipment.items.iter().map(ShipmentItemResponse::from).collect(),
            tracking_number: shipment.tracking_number.clone(),
            label_url: shipment.label_url.clone(),
            shipping_cost_cents: shipment.shipping_cost_cents,
            estimated_delivery: shipment
                .estimated_delivery
                .map(|t| t.as_datetime().to_rfc3339()),
            delivered_at: shipment.delivered_at.map(|t| t.as_datetime().to_rfc3339()),
            created_at: shipment.created_at.as_datetime().to_rfc3339(),
            updated_at: shipment.updated_at.as_datetime().to_rfc3339(),
            destination: AddressResponse::from(shipment.destination),
        }
    }
}

/// Response for manual shipment creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateShipmentResponse {
    pub shipment: ShipmentResponse,
    /// False when the billing period already had its shipment.
    pub created: bool,
    /// True when a label was attached during this call.
    pub labeled: bool,
}

impl From<CreateShipmentResult> for CreateShipmentResponse {
    fn from(result: CreateShipmentResult) -> Self {
        Self {
            created: result.created,
            labeled: result.labeled,
            shipment: ShipmentResponse::from(result.shipment),
        }
    }
}

/// Response for label generation.
#[derive(Debug, Clone, Serialize)]
pub struct LabelResponse {
    pub shipment: ShipmentResponse,
    /// False when the shipment already carried a label and nothing ran.
    pub generated: bool,
}

impl From<GenerateLabelResult> for LabelResponse {
    fn from(result: GenerateLabelResult) -> Self {
        Self {
            generated: result.generated,
            shipment: ShipmentResponse::from(result.shipment),
        }
    }
}

/// Shipment listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentViewResponse {
    pub id: String,
    pub subscription_id: String,
    pub cave_id: String,
    pub billing_period: String,
    pub status: ShipmentStatus,
    pub carrier: String,
    pub requested_bottles: u32,
    pub allocated_bottles: u32,
    pub under_fulfilled: bool,
    pub items: Vec<ShipmentItemResponse>,
    pub tracking_number: Option<String>,
    pub label_url: Option<String>,
    pub estimated_delivery: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
}

impl From<ShipmentView> for ShipmentViewResponse {
    fn from(view: ShipmentView) -> Self {
        Self {
            id: view.id.to_string(),
            subscription_id: view.subscription_id.to_string(),
            cave_id: view.cave_id.to_string(),
            billing_period: view.billing_period,
            status: view.status,
            carrier: view.carrier,
            requested_bottles: view.requested_bottles,
            allocated_bottles: view.allocated_bottles,
            under_fulfilled: view.under_fulfilled,
            items: view.items.into_iter().map(ShipmentItemResponse::from).collect(),
            tracking_number: view.tracking_number,
            label_url: view.label_url,
            estimated_delivery: view
                .estimated_delivery
                .map(|t| t.as_datetime().to_rfc3339()),
            delivered_at: view.delivered_at.map(|t| t.as_datetime().to_rfc3339()),
            created_at: view.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// One carrier scan in a tracking response.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingEventResponse {
    pub occurred_at: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<&TrackingEvent> for TrackingEventResponse {
    fn from(event: &TrackingEvent) -> Self {
        Self {
            occurred_at: event.occurred_at.as_datetime().to_rfc3339(),
            description: event.description.clone(),
            location: event.location.clone(),
        }
    }
}

/// Tracking snapshot for a shipment.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingResponse {
    pub tracking_number: String,
    pub carrier: String,
    pub delivery_status: DeliveryStatus,
    pub events: Vec<TrackingEventResponse>,
    pub last_event_at: Option<String>,
}

impl From<TrackingInfo> for TrackingResponse {
    fn from(info: TrackingInfo) -> Self {
        Self {
            tracking_number: info.tracking_number,
            carrier: info.carrier,
            delivery_status: info.delivery_status,
            events: info.events.iter().map(TrackingEventResponse::from).collect(),
            last_event_at: info.last_event_at.map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

/// Response for a tracking refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTrackingResponse {
    pub shipment: ShipmentResponse,
    pub tracking: TrackingResponse,
    /// False when the carrier was unreachable and the stored snapshot
    /// was served instead.
    pub live: bool,
}

impl From<RefreshTrackingResult> for RefreshTrackingResponse {
    fn from(result: RefreshTrackingResult) -> Self {
        Self {
            live: result.live,
            shipment: ShipmentResponse::from(result.shipment),
            tracking: TrackingResponse::from(result.tracking),
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
