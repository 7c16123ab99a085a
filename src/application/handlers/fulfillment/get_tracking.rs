//! GetTrackingHandler - Query handler for a shipment's stored tracking.
//!
//! Serves the persisted snapshot without contacting the carrier; the
//! refresh command is the only path that talks to carrier APIs.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, ShipmentId};
use crate::domain::fulfillment::TrackingInfo;
use crate::ports::FulfillmentStore;

/// Query for a shipment's tracking snapshot.
#[derive(Debug, Clone)]
pub struct GetTrackingQuery {
    pub shipment_id: ShipmentId,
}

/// The stored snapshot, or `None` when no tracking was recorded yet.
pub type GetTrackingResult = Option<TrackingInfo>;

/// Handler for the tracking query.
pub struct GetTrackingHandler {
    store: Arc<dyn FulfillmentStore>,
}

impl GetTrackingHandler {
    /// Create a new handler with its dependencies.
    pub fn new(store: Arc<dyn FulfillmentStore>) -> Self {
        Self { store }
    }

    /// Fetch the stored tracking snapshot for a shipment.
    ///
    /// An unlabeled shipment has no tracking number and resolves to
    /// `None` rather than an error.
    pub async fn handle(&self, query: GetTrackingQuery) -> Result<GetTrackingResult, DomainError> {
        let shipment = self
            .store
            .find_by_id(&query.shipment_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::ShipmentNotFound, "Shipment not found")
                    .with_detail("shipment_id", query.shipment_id.to_string())
            })?;

        match shipment.tracking_number {
            Some(tracking_number) => self.store.get_tracking(&tracking_number).await,
            None => Ok(None),
        }
    }
}
