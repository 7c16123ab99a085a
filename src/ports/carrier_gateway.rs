//! Carrier gateway port for shipping label and tracking integrations.
//!
//! Defines the contract carriers implement (Colissimo, UPS, a mock for
//! tests) and the registry that resolves a shipment's carrier by name.
//!
//! # Design
//!
//! - **Carrier agnostic**: one trait regardless of the carrier's API shape
//! - **Explicit registry**: built at startup from configuration and
//!   injected where needed; an unknown name fails that call only
//! - **Best-effort callers**: label and tracking calls sit outside any
//!   database transaction, so a carrier outage never holds a lock

use crate::domain::foundation::{Address, DomainError, Timestamp};
use crate::domain::fulfillment::TrackingInfo;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Bottles per parcel before we split into a second box.
const BOTTLES_PER_PACKAGE: u32 = 6;

/// Port for a single carrier integration.
///
/// Implementations own authentication, wire formats, and retrying is
/// left to callers via [`CarrierError::retryable`].
#[async_trait]
pub trait CarrierClient: Send + Sync {
    /// Carrier name as configured and stored on shipments
    /// (e.g., "colissimo").
    fn name(&self) -> &str;

    /// Request a shipping label.
    ///
    /// Returns tracking number, label URL, cost, and the carrier's
    /// delivery estimate.
    async fn generate_label(&self, request: LabelRequest) -> Result<ShippingLabel, CarrierError>;

    /// Fetch the carrier's current view of a tracking number.
    async fn track(&self, tracking_number: &str) -> Result<TrackingInfo, CarrierError>;
}

/// Request to generate a shipping label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRequest {
    /// Warehouse the box ships from.
    pub from: Address,

    /// Member's delivery address.
    pub to: Address,

    /// Parcels in the consignment.
    pub packages: Vec<Package>,

    /// Requested service level.
    pub service_level: ServiceLevel,

    /// Our reference printed on the label (shipment id).
    pub reference: String,
}

/// One parcel's weight and dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Gross weight in grams.
    pub weight_grams: u32,

    /// Length in centimeters.
    pub length_cm: u32,

    /// Width in centimeters.
    pub width_cm: u32,

    /// Height in centimeters.
    pub height_cm: u32,
}

impl Package {
    /// Standard wine shipper boxes for a bottle count.
    ///
    /// Boxes hold up to six bottles; larger cycles split into several
    /// parcels. Weight assumes a filled 750ml bottle plus its share of
    /// the protective packaging.
    pub fn for_bottle_count(bottles: u32) -> Vec<Package> {
        if bottles == 0 {
            return Vec::new();
        }

        let full_boxes = bottles / BOTTLES_PER_PACKAGE;
        let remainder = bottles % BOTTLES_PER_PACKAGE;

        let mut packages = Vec::new();
        for _ in 0..full_boxes {
            packages.push(Package::wine_box(BOTTLES_PER_PACKAGE));
        }
        if remainder > 0 {
            packages.push(Package::wine_box(remainder));
        }
        packages
    }

    fn wine_box(bottles: u32) -> Package {
        Package {
            weight_grams: bottles * 1_500 + 600,
            length_cm: if bottles <= 3 { 36 } else { 52 },
            width_cm: 28,
            height_cm: 36,
        }
    }
}

/// Shipping speed the member pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLevel {
    /// Regular ground delivery.
    Standard,

    /// Expedited delivery.
    Express,
}

impl Default for ServiceLevel {
    fn default() -> Self {
        Self::Standard
    }
}

/// A generated shipping label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingLabel {
    /// Carrier tracking number.
    pub tracking_number: String,

    /// Printable label location.
    pub label_url: String,

    /// What the label cost, in cents.
    pub cost_cents: i64,

    /// Carrier's delivery estimate.
    pub estimated_delivery: Option<Timestamp>,
}

/// Errors from carrier operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierError {
    /// Error code for categorization.
    pub code: CarrierErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Carrier's own error code (if available).
    pub carrier_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl CarrierError {
    /// Create a new carrier error.
    pub fn new(code: CarrierErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            carrier_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attach the carrier's own error code.
    pub fn with_carrier_code(mut self, code: impl Into<String>) -> Self {
        self.carrier_code = Some(code.into());
        self
    }

    /// No carrier is registered under this name.
    pub fn unsupported(name: &str) -> Self {
        Self::new(
            CarrierErrorCode::Unsupported,
            format!("No carrier registered under '{}'", name),
        )
    }

    /// Carrier could not be reached or answered 5xx.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CarrierErrorCode::Unavailable, message)
    }

    /// Carrier refused the request as invalid.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(CarrierErrorCode::Rejected, message)
    }

    /// Credentials were refused.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(CarrierErrorCode::AuthenticationFailed, message)
    }

    /// Carrier does not know this tracking number.
    pub fn tracking_not_found(tracking_number: &str) -> Self {
        Self::new(
            CarrierErrorCode::TrackingNotFound,
            format!("No tracking data for '{}'", tracking_number),
        )
    }
}

impl std::fmt::Display for CarrierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CarrierError {}

impl From<CarrierError> for DomainError {
    fn from(err: CarrierError) -> Self {
        use crate::domain::foundation::ErrorCode;

        let code = match err.code {
            CarrierErrorCode::Unsupported => ErrorCode::UnsupportedCarrier,
            CarrierErrorCode::TrackingNotFound => ErrorCode::TrackingNotFound,
            _ => ErrorCode::CarrierError,
        };

        DomainError::new(code, err.message).with_detail("retryable", err.retryable.to_string())
    }
}

/// Carrier error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierErrorCode {
    /// No registered carrier under the requested name.
    Unsupported,

    /// Network failure or carrier 5xx; retry later.
    Unavailable,

    /// Carrier rate limit hit; retry later.
    RateLimited,

    /// Credentials refused by the carrier.
    AuthenticationFailed,

    /// Carrier rejected the request (bad address, oversize parcel).
    Rejected,

    /// Tracking number unknown to the carrier.
    TrackingNotFound,

    /// Anything the carrier reported that we cannot classify.
    Unknown,
}

impl CarrierErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CarrierErrorCode::Unavailable | CarrierErrorCode::RateLimited
        )
    }
}

impl std::fmt::Display for CarrierErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CarrierErrorCode::Unsupported => "unsupported",
            CarrierErrorCode::Unavailable => "unavailable",
            CarrierErrorCode::RateLimited => "rate_limited",
            CarrierErrorCode::AuthenticationFailed => "authentication_failed",
            CarrierErrorCode::Rejected => "rejected",
            CarrierErrorCode::TrackingNotFound => "tracking_not_found",
            CarrierErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Registry of configured carriers, keyed by name.
///
/// Built once at startup and shared via `Arc`; handlers resolve a
/// shipment's carrier per call, so an unknown name fails that call
/// without touching any other state.
#[derive(Default)]
pub struct CarrierRegistry {
    carriers: HashMap<String, Arc<dyn CarrierClient>>,
}

impl CarrierRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            carriers: HashMap::new(),
        }
    }

    /// Register a carrier under its own reported name.
    pub fn register(&mut self, client: Arc<dyn CarrierClient>) {
        self.carriers.insert(client.name().to_string(), client);
    }

    /// Resolve a carrier by name.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if no carrier is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn CarrierClient>, CarrierError> {
        self.carriers
            .get(name)
            .cloned()
            .ok_or_else(|| CarrierError::unsupported(name))
    }

    /// Returns true if a carrier is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.carriers.contains_key(name)
    }

    /// Names of all registered carriers, sorted.
    pub fn carrier_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.carriers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for CarrierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierRegistry")
            .field("carriers", &self.carrier_names())
            .finish()
    }
}
