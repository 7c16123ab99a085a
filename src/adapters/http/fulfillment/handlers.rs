//! HTTP handlers for shipment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers. They drive the same handlers the webhook pipeline uses, so a
//! manual trigger and a billing event are indistinguishable downstream.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::fulfillment::{
    CreateShipmentCommand, CreateShipmentHandler, FulfillmentPolicy, GenerateLabelCommand,
    GenerateLabelHandler, GetTrackingHandler, GetTrackingQuery, ListShipmentsHandler,
    ListShipmentsQuery, RefreshTrackingCommand, RefreshTrackingHandler,
};
use crate::domain::foundation::{CaveId, DomainError, ErrorCode, ShipmentId, SubscriptionId};
use crate::ports::{
    CarrierRegistry, FulfillmentStore, ShipmentFilter, ShipmentReader, SubscriptionRepository,
};

use super::dto::{
    CreateShipmentRequest, CreateShipmentResponse, ErrorResponse, GenerateLabelRequest,
    LabelResponse, ListShipmentsParams, RefreshTrackingResponse, ShipmentViewResponse,
    TrackingResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies for efficient sharing across handlers.
#[derive(Clone)]
pub struct FulfillmentAppState {
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub fulfillment_store: Arc<dyn FulfillmentStore>,
    pub shipment_reader: Arc<dyn ShipmentReader>,
    pub carriers: Arc<CarrierRegistry>,
    pub policy: FulfillmentPolicy,
}

impl FulfillmentAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_shipment_handler(&self) -> CreateShipmentHandler {
        CreateShipmentHandler::new(
            self.subscriptions.clone(),
            self.fulfillment_store.clone(),
            self.carriers.clone(),
            self.policy.clone(),
        )
    }

    pub fn generate_label_handler(&self) -> GenerateLabelHandler {
        GenerateLabelHandler::new(
            self.fulfillment_store.clone(),
            self.carriers.clone(),
            self.policy.clone(),
        )
    }

    pub fn refresh_tracking_handler(&self) -> RefreshTrackingHandler {
        RefreshTrackingHandler::new(self.fulfillment_store.clone(), self.carriers.clone())
    }

    pub fn list_shipments_handler(&self) -> ListShipmentsHandler {
        ListShipmentsHandler::new(self.shipment_reader.clone())
    }

    pub fn tracking_handler(&self) -> GetTrackingHandler {
        GetTrackingHandler::new(self.fulfillment_store.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Trigger Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /subscriptions/:id/shipments - Create the current period's shipment
pub async fn create_shipment(
    State(state): State<FulfillmentAppState>,
    Path(subscription_id): Path<String>,
    Json(request): Json<CreateShipmentRequest>,
) -> Result<impl IntoResponse, FulfillmentApiError> {
    let subscription_id = parse_subscription_id(&subscription_id)?;

    let handler = state.create_shipment_handler();
    let result = handler
        .handle(CreateShipmentCommand {
            subscription_id,
            carrier: request.carrier,
        })
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(CreateShipmentResponse::from(result))))
}

/// POST /shipments/:id/label - Generate or retry the shipping label
pub async fn generate_label(
    State(state): State<FulfillmentAppState>,
    Path(shipment_id): Path<String>,
    Json(request): Json<GenerateLabelRequest>,
) -> Result<impl IntoResponse, FulfillmentApiError> {
    let shipment_id = parse_shipment_id(&shipment_id)?;

    let handler = state.generate_label_handler();
    let result = handler
        .handle(GenerateLabelCommand {
            shipment_id,
            carrier: request.carrier,
        })
        .await?;

    Ok(Json(LabelResponse::from(result)))
}

/// POST /shipments/:id/tracking/refresh - Pull fresh tracking from the carrier
pub async fn refresh_tracking(
    State(state): State<FulfillmentAppState>,
    Path(shipment_id): Path<String>,
) -> Result<impl IntoResponse, FulfillmentApiError> {
    let shipment_id = parse_shipment_id(&shipment_id)?;

    let handler = state.refresh_tracking_handler();
    let result = handler.handle(RefreshTrackingCommand { shipment_id }).await?;

    Ok(Json(RefreshTrackingResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /shipments?status=&cave_id= - List shipments, newest first
pub async fn list_shipments(
    State(state): State<FulfillmentAppState>,
    Query(params): Query<ListShipmentsParams>,
) -> Result<impl IntoResponse, FulfillmentApiError> {
    let filter = ShipmentFilter {
        subscription_id: None,
        cave_id: params.cave_id.map(CaveId::from_uuid),
        status: params.status,
    };

    let handler = state.list_shipments_handler();
    let views = handler.handle(ListShipmentsQuery { filter }).await?;

    let response: Vec<ShipmentViewResponse> =
        views.into_iter().map(ShipmentViewResponse::from).collect();
    Ok(Json(response))
}

/// GET /subscriptions/:id/shipments - List one subscription's shipments
pub async fn list_subscription_shipments(
    State(state): State<FulfillmentAppState>,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, FulfillmentApiError> {
    let subscription_id = parse_subscription_id(&subscription_id)?;

    let handler = state.list_shipments_handler();
    let views = handler
        .handle(ListShipmentsQuery {
            filter: ShipmentFilter::for_subscription(subscription_id),
        })
        .await?;

    let response: Vec<ShipmentViewResponse> =
        views.into_iter().map(ShipmentViewResponse::from).collect();
    Ok(Json(response))
}

/// GET /shipments/:id/tracking - Stored tracking snapshot for a shipment
pub async fn get_tracking(
    State(state): State<FulfillmentAppState>,
    Path(shipment_id): Path<String>,
) -> Result<impl IntoResponse, FulfillmentApiError> {
    let shipment_id = parse_shipment_id(&shipment_id)?;

    let handler = state.tracking_handler();
    let tracking = handler
        .handle(GetTrackingQuery { shipment_id })
        .await?
        .ok_or_else(|| {
            DomainError::new(
                ErrorCode::TrackingNotFound,
                "No tracking recorded for this shipment",
            )
            .with_detail("shipment_id", shipment_id.to_string())
        })?;

    Ok(Json(TrackingResponse::from(tracking)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Path Parsing
// ════════════════════════════════════════════════════════════════════════════════

fn parse_subscription_id(raw: &str) -> Result<SubscriptionId, FulfillmentApiError> {
    raw.parse::<SubscriptionId>()
        .map_err(|_| DomainError::validation("subscription_id", "must be a UUID").into())
}

fn parse_shipment_id(raw: &str) -> Result<ShipmentId, FulfillmentApiError> {
    raw.parse::<ShipmentId>()
        .map_err(|_| DomainError::validation("shipment_id", "must be a UUID").into())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct FulfillmentApiError(DomainError);

impl From<DomainError> for FulfillmentApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for FulfillmentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::SubscriptionNotFound
            | ErrorCode::ShipmentNotFound
            | ErrorCode::WineNotFound
            | ErrorCode::TrackingNotFound => StatusCode::NOT_FOUND,

            ErrorCode::InvalidStateTransition
            | ErrorCode::SubscriptionCancelled
            | ErrorCode::SubscriptionNotActive
            | ErrorCode::ShipmentAlreadyExists
            | ErrorCode::ShipmentAlreadyLabeled => StatusCode::CONFLICT,

            ErrorCode::InsufficientStock | ErrorCode::UnsupportedCarrier => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            ErrorCode::CarrierError => StatusCode::BAD_GATEWAY,

            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let error_code = self.0.code.to_string();
        let body = if self.0.details.is_empty() {
            ErrorResponse::new(error_code, self.0.message)
        } else {
            let details =
                serde_json::to_value(&self.0.details).unwrap_or(serde_json::Value::Null);
            ErrorResponse::with_details(error_code, self.0.message, details)
        };

        (status, Json(body)).into_response()
    }
}
