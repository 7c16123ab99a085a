//! Colissimo carrier adapter.
//!
//! Implements the `CarrierClient` trait against Colissimo's JSON label
//! and tracking endpoints. Authentication uses an API key header.
//!
//! # Configuration
//!
//! ```ignore
//! let config = ColissimoConfig::new(api_key);
//! let carrier = ColissimoCarrier::new(config);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{Address, Timestamp};
use crate::domain::fulfillment::{DeliveryStatus, TrackingEvent, TrackingInfo};
use crate::ports::{
    CarrierClient, CarrierError, CarrierErrorCode, LabelRequest, ServiceLevel, ShippingLabel,
};

/// Header carrying the Colissimo API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// Colissimo API configuration.
#[derive(Clone)]
pub struct ColissimoConfig {
    /// API key issued in the Colissimo business dashboard.
    api_key: SecretString,

    /// Base URL for the Colissimo API.
    base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl ColissimoConfig {
    /// Create a new Colissimo configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            base_url: "https://ws.colissimo.fr/api/v2".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Colissimo carrier adapter.
pub struct ColissimoCarrier {
    config: ColissimoConfig,
    http_client: reqwest::Client,
}

impl ColissimoCarrier {
    /// Create a new Colissimo adapter with the given configuration.
    pub fn new(config: ColissimoConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Map a non-success HTTP response to a carrier error.
    async fn error_from_response(response: reqwest::Response) -> CarrierError {
        let status = response.status();
        let body: ColissimoErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .message
            .unwrap_or_else(|| format!("Colissimo returned HTTP {}", status));

        let mut error = match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                CarrierError::authentication(message)
            }
            reqwest::StatusCode::NOT_FOUND => {
                CarrierError::new(CarrierErrorCode::TrackingNotFound, message)
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                CarrierError::new(CarrierErrorCode::RateLimited, message)
            }
            s if s.is_client_error() => CarrierError::rejected(message),
            _ => CarrierError::unavailable(message),
        };
        if let Some(code) = body.error_code {
            error = error.with_carrier_code(code);
        }
        error
    }
}

#[async_trait]
impl CarrierClient for ColissimoCarrier {
    fn name(&self) -> &str {
        "colissimo"
    }

    async fn generate_label(&self, request: LabelRequest) -> Result<ShippingLabel, CarrierError> {
        let url = format!("{}/labels", self.config.base_url);
        let body = ColissimoLabelRequest::from(&request);

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| CarrierError::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error = Self::error_from_response(response).await;
            tracing::warn!(code = %error.code, message = %error.message, "Colissimo label request failed");
            return Err(error);
        }

        let label: ColissimoLabelResponse = response.json().await.map_err(|e| {
            CarrierError::new(
                CarrierErrorCode::Unknown,
                format!("Unexpected Colissimo label response: {}", e),
            )
        })?;

        Ok(ShippingLabel {
            tracking_number: label.parcel_number,
            label_url: label.label_url,
            cost_cents: label.price_cents,
            estimated_delivery: label
                .estimated_delivery_date
                .map(Timestamp::from_datetime),
        })
    }

    async fn track(&self, tracking_number: &str) -> Result<TrackingInfo, CarrierError> {
        let url = format!("{}/tracking/{}", self.config.base_url, tracking_number);

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| CarrierError::unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CarrierError::tracking_not_found(tracking_number));
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: ColissimoTrackingResponse = response.json().await.map_err(|e| {
            CarrierError::new(
                CarrierErrorCode::Unknown,
                format!("Unexpected Colissimo tracking response: {}", e),
            )
        })?;

        Ok(body.into_tracking_info(self.name()))
    }
}

// ────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ColissimoLabelRequest {
    sender: ColissimoAddress,
    addressee: ColissimoAddress,
    parcels: Vec<ColissimoParcel>,
    service: &'static str,
    order_reference: String,
}

impl From<&LabelRequest> for ColissimoLabelRequest {
    fn from(request: &LabelRequest) -> Self {
        Self {
            sender: ColissimoAddress::from(&request.from),
            addressee: ColissimoAddress::from(&request.to),
            parcels: request
                .packages
                .iter()
                .map(|p| ColissimoParcel {
                    weight_grams: p.weight_grams,
                    length_cm: p.length_cm,
                    width_cm: p.width_cm,
                    height_cm: p.height_cm,
                })
                .collect(),
            service: match request.service_level {
                ServiceLevel::Standard => "DOMICILE",
                ServiceLevel::Express => "EXPERT",
            },
            order_reference: request.reference.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ColissimoAddress {
    company_name: String,
    line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line2: Option<String>,
    city: String,
    zip_code: String,
    country_code: String,
}

impl From<&Address> for ColissimoAddress {
    fn from(address: &Address) -> Self {
        Self {
            company_name: address.name.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            city: address.city.clone(),
            zip_code: address.postal_code.clone(),
            country_code: address.country.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ColissimoParcel {
    weight_grams: u32,
    length_cm: u32,
    width_cm: u32,
    height_cm: u32,
}

#[derive(Debug, Deserialize)]
struct ColissimoLabelResponse {
    parcel_number: String,
    label_url: String,
    price_cents: i64,
    estimated_delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct ColissimoErrorBody {
    message: Option<String>,
    error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ColissimoTrackingResponse {
    parcel_number: String,
    status: String,
    #[serde(default)]
    events: Vec<ColissimoTrackingEvent>,
}

#[derive(Debug, Deserialize)]
struct ColissimoTrackingEvent {
    date: DateTime<Utc>,
    label: String,
    site: Option<String>,
}

impl ColissimoTrackingResponse {
    fn into_tracking_info(self, carrier: &str) -> TrackingInfo {
        let delivery_status = match self.status.as_str() {
            "delivered" => DeliveryStatus::Delivered,
            "out_for_delivery" => DeliveryStatus::OutForDelivery,
            "exception" | "returned" => DeliveryStatus::Exception,
            // Anything unrecognized counts as still moving.
            _ => DeliveryStatus::InTransit,
        };

        let events = self
            .events
            .into_iter()
            .map(|e| TrackingEvent {
                occurred_at: Timestamp::from_datetime(e.date),
                description: e.label,
                location: e.site,
            })
            .collect();

        TrackingInfo::new(
            self.parcel_number,
            carrier.to_string(),
            delivery_status,
            events,
        )
    }
}
