//! HTTP handlers for subscription endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers. The write side of the subscription lifecycle belongs to the
//! billing webhook; the only mutation offered here is the cancellation
//! flag.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::subscription::{
    GetSubscriptionHandler, GetSubscriptionQuery, RequestCancellationCommand,
    RequestCancellationHandler,
};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::ports::{SubscriptionReader, SubscriptionRepository};

use super::dto::{CancellationResponse, ErrorResponse, SubscriptionViewResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub subscription_reader: Arc<dyn SubscriptionReader>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionAppState {
    /// Create handlers on demand from the shared state.
    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscription_reader.clone())
    }

    pub fn request_cancellation_handler(&self) -> RequestCancellationHandler {
        RequestCancellationHandler::new(self.subscriptions.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /subscriptions/:id - Subscription details
pub async fn get_subscription(
    State(state): State<SubscriptionAppState>,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let subscription_id = parse_subscription_id(&subscription_id)?;

    let handler = state.get_subscription_handler();
    let view = handler
        .handle(GetSubscriptionQuery { subscription_id })
        .await?
        .ok_or_else(|| {
            DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                .with_detail("subscription_id", subscription_id.to_string())
        })?;

    Ok(Json(SubscriptionViewResponse::from(view)))
}

/// POST /subscriptions/:id/cancellation - Stop renewing at period end
pub async fn request_cancellation(
    State(state): State<SubscriptionAppState>,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let subscription_id = parse_subscription_id(&subscription_id)?;

    let handler = state.request_cancellation_handler();
    let result = handler
        .handle(RequestCancellationCommand { subscription_id })
        .await?;

    Ok((StatusCode::OK, Json(CancellationResponse::from(result))))
}

fn parse_subscription_id(raw: &str) -> Result<SubscriptionId, SubscriptionApiError> {
    raw.parse::<SubscriptionId>()
        .map_err(|_| DomainError::validation("subscription_id", "must be a UUID").into())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct SubscriptionApiError(DomainError);

impl From<DomainError> for SubscriptionApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SubscriptionApiError {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::{Address, CaveId, MemberId, Timestamp};
    use crate::domain::subscription::{Subscription, SubscriptionStatus, SubscriptionTier};

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn delivery_address() -> Address {
        Address::new(
            "Claire Moreau",
            "12 rue des Lilas",
            None,
            "Lyon",
            "69003",
            "FR",
        )
        .unwrap()
    }

    fn active_subscription() -> Subscription {
        let mut subscription = Subscription::create_incomplete(
            SubscriptionId::new(),
            MemberId::new(),
            CaveId::new(),
            SubscriptionTier::Prestige,
            delivery_address(),
            Some("cus_test".to_string()),
        );
        let start = Timestamp::now();
        subscription
            .activate(start, start.add_days(30), start, Some("sub_test".to_string()))
            .unwrap();
        subscription
    }

    fn test_state() -> (Arc<InMemorySubscriptionStore>, SubscriptionAppState) {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let state = SubscriptionAppState {
            subscription_reader: store.clone(),
            subscriptions: store.clone(),
        };
        (store, state)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Handler Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn get_subscription_returns_view_when_exists() {
        let (store, state) = test_state();
        let subscription = active_subscription();
        store.save(&subscription).await.unwrap();

        let result =
            get_subscription(State(state), Path(subscription.id.to_string())).await;

        let response = result.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_subscription_unknown_id_is_not_found() {
        let (_store, state) = test_state();

        let result =
            get_subscription(State(state), Path(SubscriptionId::new().to_string())).await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_subscription_malformed_id_is_bad_request() {
        let (_store, state) = test_state();

        let result = get_subscription(State(state), Path("not-a-uuid".to_string())).await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cancellation_flags_the_subscription() {
        let (store, state) = test_state();
        let subscription = active_subscription();
        store.save(&subscription).await.unwrap();

        let result =
            request_cancellation(State(state), Path(subscription.id.to_string())).await;

        let response = result.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = store.find_by_id(&subscription.id).await.unwrap().unwrap();
        assert!(stored.cancel_at_period_end);
        assert_eq!(stored.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn repeated_cancellation_stays_ok() {
        let (store, state) = test_state();
        let subscription = active_subscription();
        store.save(&subscription).await.unwrap();

        let first =
            request_cancellation(State(state.clone()), Path(subscription.id.to_string())).await;
        assert!(first.is_ok());

        let second =
            request_cancellation(State(state), Path(subscription.id.to_string())).await;
        let response = second.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cancellation_of_unknown_subscription_is_not_found() {
        let (_store, state) = test_state();

        let result =
            request_cancellation(State(state), Path(SubscriptionId::new().to_string())).await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn api_error_maps_not_found_to_404() {
        let err = SubscriptionApiError(DomainError::new(
            ErrorCode::SubscriptionNotFound,
            "Subscription not found",
        ));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_maps_cancelled_to_409() {
        let err = SubscriptionApiError(DomainError::new(
            ErrorCode::SubscriptionCancelled,
            "Cancelled subscriptions cannot change",
        ));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn api_error_maps_validation_to_400() {
        let err =
            SubscriptionApiError(DomainError::validation("subscription_id", "must be a UUID"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_database_error_to_500() {
        let err = SubscriptionApiError(DomainError::new(ErrorCode::DatabaseError, "pool gone"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
