//! UPS carrier adapter.
//!
//! Implements the `CarrierClient` trait against the UPS shipping and
//! tracking APIs. Authentication uses a bearer token.

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

/// UPS API configuration.
#[derive(Clone)]
pub struct UpsConfig {
    /// OAuth access token for the UPS API.
    access_token: SecretString,

    /// Base URL for the UPS API.
    base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl UpsConfig {
    /// Create a new UPS configuration.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            base_url: "https://onlinetools.ups.com/api/v1".to_string(),
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

/// UPS carrier adapter.
pub struct UpsCarrier {
    config: UpsConfig,
    http_client: reqwest::Client,
}

impl UpsCarrier {
    /// Create a new UPS adapter with the given configuration.
    pub fn new(config: UpsConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn error_from_response(response: reqwest::Response) -> CarrierError {
        let status = response.status();
        let body: UpsErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .description
            .unwrap_or_else(|| format!("UPS returned HTTP {}", status));

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
        if let Some(code) = body.code {
            error = error.with_carrier_code(code);
        }
        error
    }
}

#[async_trait]
impl CarrierClient for UpsCarrier {
    fn name(&self) -> &str {
        "ups"
    }

    async fn generate_label(&self, request: LabelRequest) -> Result<ShippingLabel, CarrierError> {
        let url = format!("{}/shipments", self.config.base_url);
        let body = UpsShipmentRequest::from(&request);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| CarrierError::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error = Self::error_from_response(response).await;
            tracing::warn!(code = %error.code, message = %error.message, "UPS shipment request failed");
            return Err(error);
        }

        let shipment: UpsShipmentResponse = response.json().await.map_err(|e| {
            CarrierError::new(
                CarrierErrorCode::Unknown,
                format!("Unexpected UPS shipment response: {}", e),
            )
        })?;

        Ok(ShippingLabel {
            tracking_number: shipment.tracking_number,
            label_url: shipment.label_href,
            cost_cents: shipment.total_charge_cents,
            estimated_delivery: shipment.scheduled_delivery.map(Timestamp::from_datetime),
        })
    }

    async fn track(&self, tracking_number: &str) -> Result<TrackingInfo, CarrierError> {
        let url = format!("{}/track/{}", self.config.base_url, tracking_number);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.access_token.expose_secret())
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

        let body: UpsTrackResponse = response.json().await.map_err(|e| {
            CarrierError::new(
                CarrierErrorCode::Unknown,
                format!("Unexpected UPS tracking response: {}", e),
            )
        })?;

        Ok(body.into_tracking_info(self.name()))
    }
}

// ────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct UpsShipmentRequest {
    shipper: UpsAddress,
    ship_to: UpsAddress,
    packages: Vec<UpsPackage>,
    service_code: &'static str,
    reference_number: String,
}

impl From<&LabelRequest> for UpsShipmentRequest {
    fn from(request: &LabelRequest) -> Self {
        Self {
            shipper: UpsAddress::from(&request.from),
            ship_to: UpsAddress::from(&request.to),
            packages: request
                .packages
                .iter()
                .map(|p| UpsPackage {
                    // UPS bills in kilograms; dimensions stay metric.
                    weight_kg: f64::from(p.weight_grams) / 1000.0,
                    length_cm: p.length_cm,
                    width_cm: p.width_cm,
                    height_cm: p.height_cm,
                })
                .collect(),
            service_code: match request.service_level {
                ServiceLevel::Standard => "11",
                ServiceLevel::Express => "07",
            },
            reference_number: request.reference.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UpsAddress {
    name: String,
    address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_line2: Option<String>,
    city: String,
    postal_code: String,
    country_code: String,
}

impl From<&Address> for UpsAddress {
    fn from(address: &Address) -> Self {
        Self {
            name: address.name.clone(),
            address_line1: address.line1.clone(),
            address_line2: address.line2.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            country_code: address.country.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UpsPackage {
    weight_kg: f64,
    length_cm: u32,
    width_cm: u32,
    height_cm: u32,
}

#[derive(Debug, Deserialize)]
struct UpsShipmentResponse {
    tracking_number: String,
    label_href: String,
    total_charge_cents: i64,
    scheduled_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct UpsErrorBody {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpsTrackResponse {
    tracking_number: String,
    status_code: String,
    #[serde(default)]
    activity: Vec<UpsActivity>,
}

#[derive(Debug, Deserialize)]
struct UpsActivity {
    date: DateTime<Utc>,
    description: String,
    location: Option<String>,
}

impl UpsTrackResponse {
    fn into_tracking_info(self, carrier: &str) -> TrackingInfo {
        // UPS reports single-letter status codes.
        let delivery_status = match self.status_code.as_str() {
            "D" => DeliveryStatus::Delivered,
            "O" => DeliveryStatus::OutForDelivery,
            "X" | "RS" => DeliveryStatus::Exception,
            _ => DeliveryStatus::InTransit,
        };

        let events = self
            .activity
            .into_iter()
            .map(|a| TrackingEvent {
                occurred_at: Timestamp::from_datetime(a.date),
                description: a.description,
                location: a.location,
            })
            .collect();

        TrackingInfo::new(
            self.tracking_number,
            carrier.to_string(),
            delivery_status,
            events,
        )
    }
}
