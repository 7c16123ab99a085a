//! HTTP handler for billing webhook deliveries.
//!
//! Connects the processor's webhook POST to the application layer. The
//! status code is the contract: 2xx stops redelivery, 4xx rejects the
//! delivery for good, 5xx makes the processor retry.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use secrecy::SecretString;

use crate::application::handlers::billing::{ProcessWebhookCommand, ProcessWebhookHandler};
use crate::application::handlers::fulfillment::{CreateShipmentHandler, FulfillmentPolicy};
use crate::domain::billing::{WebhookError, WebhookVerifier};
use crate::ports::{
    BillingEventLedger, CarrierRegistry, FulfillmentStore, SubscriptionRepository,
};

use super::dto::{ErrorResponse, WebhookAckResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook endpoint.
///
/// Cloned per request; dependencies are Arc-wrapped so clones are cheap.
#[derive(Clone)]
pub struct BillingAppState {
    pub webhook_secret: SecretString,
    pub require_livemode: bool,
    pub ledger: Arc<dyn BillingEventLedger>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub fulfillment_store: Arc<dyn FulfillmentStore>,
    pub carriers: Arc<CarrierRegistry>,
    pub policy: FulfillmentPolicy,
}

impl BillingAppState {
    /// Create the webhook handler on demand from the shared state.
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        let create_shipment = Arc::new(CreateShipmentHandler::new(
            self.subscriptions.clone(),
            self.fulfillment_store.clone(),
            self.carriers.clone(),
            self.policy.clone(),
        ));

        ProcessWebhookHandler::new(
            WebhookVerifier::new(self.webhook_secret.clone()),
            self.ledger.clone(),
            self.subscriptions.clone(),
            create_shipment,
            self.require_livemode,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Handler
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/billing - Process a billing processor webhook delivery
pub async fn handle_billing_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get("Billing-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            WebhookError::MalformedPayload("missing Billing-Signature header".to_string())
        })?;

    let handler = state.webhook_handler();
    let command = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = handler.handle(command).await?;

    Ok((StatusCode::OK, Json(WebhookAckResponse::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(WebhookError);

impl From<WebhookError> for BillingApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();

        let error_code = match &self.0 {
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::ExpiredTimestamp => "EXPIRED_TIMESTAMP",
            WebhookError::InvalidTimestamp => "INVALID_TIMESTAMP",
            WebhookError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            WebhookError::MissingField(_) => "MISSING_FIELD",
            WebhookError::SubscriptionNotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            WebhookError::InvalidTransition(_) => "INVALID_STATE_TRANSITION",
            WebhookError::Database(_) => "DATABASE_ERROR",
            WebhookError::FulfillmentFailed(_) => "FULFILLMENT_FAILED",
        };

        // Deliveries rejected at the boundary never touched state; keep
        // an audit trail of who is sending us unverifiable payloads.
        if status == StatusCode::BAD_REQUEST {
            tracing::warn!(error = %self.0, "rejected billing webhook at the boundary");
        } else {
            tracing::error!(error = %self.0, "billing webhook processing failed");
        }

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue};
    use std::sync::Arc;

    use crate::adapters::carriers::MockCarrier;
    use crate::adapters::memory::{
        InMemoryBillingLedger, InMemoryFulfillmentStore, InMemorySubscriptionStore,
    };
    use crate::domain::billing::compute_test_signature;
    use crate::domain::foundation::{Address, CaveId, Timestamp};
    use crate::domain::fulfillment::AllocationOrder;
    use crate::domain::subscription::{Subscription, SubscriptionTier};
    use crate::ports::{ProcessingOutcome, ServiceLevel, SubscriptionRepository};

    const SECRET: &str = "whsec_http_test_secret";

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn delivery_address() -> Address {
        Address::new(
            "Claire Fontaine",
            "12 rue des Lilas",
            None,
            "Lyon",
            "69003",
            "FR",
        )
        .unwrap()
    }

    fn policy() -> FulfillmentPolicy {
        FulfillmentPolicy {
            default_carrier: "colissimo".to_string(),
            allocation_order: AllocationOrder::NewestFirst,
            service_level: ServiceLevel::Standard,
            warehouse: Address::new(
                "Cave Centrale",
                "4 quai des Chartrons",
                None,
                "Bordeaux",
                "33000",
                "FR",
            )
            .unwrap(),
        }
    }

    struct Harness {
        subscriptions: Arc<InMemorySubscriptionStore>,
        store: Arc<InMemoryFulfillmentStore>,
        ledger: Arc<InMemoryBillingLedger>,
        state: BillingAppState,
    }

    fn harness() -> Harness {
        let subscriptions = Arc::new(InMemorySubscriptionStore::new());
        let store = Arc::new(InMemoryFulfillmentStore::new());
        let ledger = Arc::new(InMemoryBillingLedger::new());

        let mut carriers = CarrierRegistry::new();
        carriers.register(Arc::new(MockCarrier::named("colissimo")));

        let state = BillingAppState {
            webhook_secret: SecretString::new(SECRET.to_string()),
            require_livemode: false,
            ledger: ledger.clone(),
            subscriptions: subscriptions.clone(),
            fulfillment_store: store.clone(),
            carriers: Arc::new(carriers),
            policy: policy(),
        };

        Harness {
            subscriptions,
            store,
            ledger,
            state,
        }
    }

    fn signed_headers(payload: &[u8]) -> HeaderMap {
        let timestamp = Timestamp::now().as_unix_secs();
        let signature = compute_test_signature(SECRET, timestamp, &String::from_utf8_lossy(payload));
        let header = format!("t={},v1={}", timestamp, signature);

        let mut headers = HeaderMap::new();
        headers.insert("Billing-Signature", HeaderValue::from_str(&header).unwrap());
        headers
    }

    fn checkout_payload(subscription_id: &str) -> Vec<u8> {
        serde_json::json!({
            "id": "evt_http_checkout",
            "type": "checkout.session.completed",
            "created": Timestamp::now().as_unix_secs(),
            "livemode": true,
            "data": {
                "object": {
                    "id": "cs_http_001",
                    "subscription": "sub_http_001",
                    "customer": "cus_http_001",
                    "metadata": { "subscription_id": subscription_id }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    async fn seeded_incomplete_subscription(harness: &Harness) -> Subscription {
        let subscription = Subscription::create_incomplete(
            crate::domain::foundation::SubscriptionId::new(),
            crate::domain::foundation::MemberId::new(),
            CaveId::new(),
            SubscriptionTier::Decouverte,
            delivery_address(),
            Some("cus_http_001".to_string()),
        );
        harness.subscriptions.save(&subscription).await.unwrap();
        subscription
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Endpoint Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn signed_checkout_event_returns_ok() {
        let harness = harness();
        let subscription = seeded_incomplete_subscription(&harness).await;

        let payload = checkout_payload(&subscription.id.to_string());
        let headers = signed_headers(&payload);

        let result = handle_billing_webhook(
            State(harness.state.clone()),
            headers,
            Bytes::from(payload),
        )
        .await;

        let response = result.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            harness.ledger.outcome_of("evt_http_checkout").await,
            Some(ProcessingOutcome::Applied)
        );
    }

    #[tokio::test]
    async fn missing_signature_header_is_bad_request() {
        let harness = harness();
        let payload = checkout_payload("not-used");

        let result = handle_billing_webhook(
            State(harness.state.clone()),
            HeaderMap::new(),
            Bytes::from(payload),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(harness.ledger.record_count().await, 0);
    }

    #[tokio::test]
    async fn forged_signature_is_bad_request() {
        let harness = harness();
        let subscription = seeded_incomplete_subscription(&harness).await;

        let payload = checkout_payload(&subscription.id.to_string());
        let timestamp = Timestamp::now().as_unix_secs();
        let mut headers = HeaderMap::new();
        headers.insert(
            "Billing-Signature",
            HeaderValue::from_str(&format!("t={},v1={}", timestamp, "ab".repeat(32))).unwrap(),
        );

        let result = handle_billing_webhook(
            State(harness.state.clone()),
            headers,
            Bytes::from(payload),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(harness.ledger.record_count().await, 0);
    }

    #[tokio::test]
    async fn redelivered_event_acknowledges_without_side_effects() {
        let harness = harness();
        let subscription = seeded_incomplete_subscription(&harness).await;

        let payload = checkout_payload(&subscription.id.to_string());

        let first = handle_billing_webhook(
            State(harness.state.clone()),
            signed_headers(&payload),
            Bytes::from(payload.clone()),
        )
        .await;
        assert!(first.is_ok());

        let second = handle_billing_webhook(
            State(harness.state.clone()),
            signed_headers(&payload),
            Bytes::from(payload),
        )
        .await;

        let response = second.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(harness.ledger.record_count().await, 1);
        assert_eq!(harness.store.shipment_count().await, 0);
    }

    #[tokio::test]
    async fn state_builds_a_working_webhook_handler() {
        let harness = harness();
        let _handler = harness.state.webhook_handler();
    }

    #[test]
    fn retryable_errors_map_to_server_error_responses() {
        let response =
            BillingApiError(WebhookError::Database("pool exhausted".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn boundary_rejections_map_to_bad_request_responses() {
        let response = BillingApiError(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
