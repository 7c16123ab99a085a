//! Mock carrier for testing.
//!
//! Provides a configurable `CarrierClient` implementation for unit and
//! integration tests. Supports:
//! - Deterministic label generation
//! - Pre-configured tracking snapshots
//! - Error injection per operation
//! - Call tracking

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::fulfillment::{DeliveryStatus, TrackingEvent, TrackingInfo};
use crate::ports::{CarrierClient, CarrierError, LabelRequest, ShippingLabel};

/// Mock carrier for testing.
///
/// # Example
///
/// ```ignore
/// let carrier = MockCarrier::named("colissimo");
///
/// // Inject a failure
/// carrier.fail_labels_with(CarrierError::unavailable("maintenance window"));
///
/// // Assert on recorded calls
/// assert_eq!(carrier.label_requests().len(), 1);
/// ```
pub struct MockCarrier {
    name: String,
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Error returned by the next `generate_label` calls.
    label_error: Option<CarrierError>,

    /// Error returned by the next `track` calls.
    track_error: Option<CarrierError>,

    /// Tracking snapshot to serve instead of the default.
    next_tracking: Option<TrackingInfo>,

    /// Recorded label requests for assertions.
    label_requests: Vec<LabelRequest>,

    /// Recorded tracking lookups for assertions.
    track_requests: Vec<String>,

    /// Counter feeding deterministic tracking numbers.
    label_counter: u32,
}

impl MockCarrier {
    /// Create a mock registered under the given carrier name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(MockState::default())),
        }
    }

    // ════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════

    /// Make every `generate_label` call fail with this error.
    pub fn fail_labels_with(&self, error: CarrierError) {
        self.inner.lock().unwrap().label_error = Some(error);
    }

    /// Make every `track` call fail with this error.
    pub fn fail_tracking_with(&self, error: CarrierError) {
        self.inner.lock().unwrap().track_error = Some(error);
    }

    /// Serve this snapshot on `track` calls.
    pub fn set_tracking(&self, info: TrackingInfo) {
        self.inner.lock().unwrap().next_tracking = Some(info);
    }

    /// Clear injected errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.label_error = None;
        state.track_error = None;
    }

    // ════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════

    /// All recorded label requests.
    pub fn label_requests(&self) -> Vec<LabelRequest> {
        self.inner.lock().unwrap().label_requests.clone()
    }

    /// All recorded tracking lookups.
    pub fn track_requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().track_requests.clone()
    }
}

#[async_trait]
impl CarrierClient for MockCarrier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_label(&self, request: LabelRequest) -> Result<ShippingLabel, CarrierError> {
        let mut state = self.inner.lock().unwrap();
        state.label_requests.push(request);

        if let Some(error) = &state.label_error {
            return Err(error.clone());
        }

        state.label_counter += 1;
        let tracking_number = format!(
            "{}-TRK-{:04}",
            self.name.to_uppercase(),
            state.label_counter
        );

        Ok(ShippingLabel {
            label_url: format!("https://labels.test/{}.pdf", tracking_number),
            tracking_number,
            cost_cents: 950,
            estimated_delivery: Some(Timestamp::now().add_days(3)),
        })
    }

    async fn track(&self, tracking_number: &str) -> Result<TrackingInfo, CarrierError> {
        let mut state = self.inner.lock().unwrap();
        state.track_requests.push(tracking_number.to_string());

        if let Some(error) = &state.track_error {
            return Err(error.clone());
        }

        if let Some(info) = &state.next_tracking {
            return Ok(info.clone());
        }

        Ok(TrackingInfo::new(
            tracking_number.to_string(),
            self.name.clone(),
            DeliveryStatus::InTransit,
            vec![TrackingEvent {
                occurred_at: Timestamp::now(),
                description: "Parcel accepted".to_string(),
                location: Some("Origin facility".to_string()),
            }],
        ))
    }
}
