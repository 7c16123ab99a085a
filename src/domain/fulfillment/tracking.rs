//! Carrier tracking snapshots.
//!
//! Tracking data is a cache of what the carrier last told us. Refreshes
//! may race each other, so snapshot freshness is resolved on
//! `last_event_at`: an older snapshot never overwrites a newer one.

use crate::domain::foundation::Timestamp;
use serde::{Deserialize, Serialize};

/// Where the carrier says the box currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Moving through the carrier network.
    InTransit,

    /// On a vehicle for final delivery.
    OutForDelivery,

    /// Handed to the recipient.
    Delivered,

    /// Something went wrong: lost, refused, returned, customs hold.
    Exception,
}

impl DeliveryStatus {
    /// Returns true once the carrier has delivered the box.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }

    /// Returns true when the carrier reports a problem.
    pub fn is_exception(&self) -> bool {
        matches!(self, DeliveryStatus::Exception)
    }
}

/// One scan event in a tracking history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// When the carrier recorded the event.
    pub occurred_at: Timestamp,

    /// Carrier's description of the event.
    pub description: String,

    /// Facility or city, when the carrier reports one.
    pub location: Option<String>,
}

/// Snapshot of a shipment's tracking state.
///
/// # Invariants
///
/// - `last_event_at` equals the newest `occurred_at` among `events`
///   (`None` when the carrier has not scanned the box yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    /// Carrier tracking number this snapshot describes.
    pub tracking_number: String,

    /// Carrier that produced the snapshot.
    pub carrier: String,

    /// Current delivery status.
    pub delivery_status: DeliveryStatus,

    /// Scan history, as the carrier reported it.
    pub events: Vec<TrackingEvent>,

    /// Newest event timestamp; the freshness marker for write conflicts.
    pub last_event_at: Option<Timestamp>,
}

impl TrackingInfo {
    /// Build a snapshot, deriving `last_event_at` from the event list.
    pub fn new(
        tracking_number: String,
        carrier: String,
        delivery_status: DeliveryStatus,
        events: Vec<TrackingEvent>,
    ) -> Self {
        let last_event_at = events.iter().map(|e| e.occurred_at).max();
        Self {
            tracking_number,
            carrier,
            delivery_status,
            events,
            last_event_at,
        }
    }

    /// Returns true if this snapshot is strictly fresher than `existing`.
    ///
    /// Concurrent refreshes write last-write-wins on event time; an
    /// equal or older snapshot carries nothing new and must not clobber
    /// what is stored.
    pub fn supersedes(&self, existing: &TrackingInfo) -> bool {
        match (self.last_event_at, existing.last_event_at) {
            (Some(new), Some(old)) => new > old,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// The most recent scan event, if any.
    pub fn latest_event(&self) -> Option<&TrackingEvent> {
        self.events.iter().max_by_key(|e| e.occurred_at)
    }
}
