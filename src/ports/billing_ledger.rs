//! BillingEventLedger port - Interface for the processed-event ledger.
//!
//! The ledger is what makes webhook handling idempotent: one row per
//! billing event id, inserted only after the event's side effects have
//! committed. The full payload is kept for debugging and auditing.
//!
//! ## Why Event Idempotency Matters
//!
//! The billing processor may deliver the same event multiple times:
//! - Network timeouts
//! - A 5xx response from our endpoint (triggers retry)
//! - Our endpoint succeeding but the acknowledgement getting lost
//!
//! An event that fails mid-processing is NOT recorded here; the 5xx
//! response makes the processor redeliver, and the retry runs the full
//! pipeline again. Only completed outcomes land in the ledger.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use serde::{Deserialize, Serialize};

/// How a billing event was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingOutcome {
    /// The event changed subscription or shipment state.
    Applied,

    /// The event type is not one we model.
    Ignored,

    /// The event was recognized but matched no legal transition for the
    /// subscription's current status.
    Skipped,
}

/// Record of a fully processed billing event.
#[derive(Debug, Clone)]
pub struct BillingEventRecord {
    /// Billing processor event ID (evt_xxx format).
    pub event_id: String,

    /// Processor event type (e.g., "invoice.paid").
    pub event_type: String,

    /// When processing finished.
    pub processed_at: Timestamp,

    /// What processing did with the event.
    pub outcome: ProcessingOutcome,

    /// Human-readable detail for ignored/skipped outcomes.
    pub detail: Option<String>,

    /// Original event payload for debugging.
    pub payload: serde_json::Value,
}

impl BillingEventRecord {
    /// Creates a record for an event whose effects were applied.
    pub fn applied(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Timestamp::now(),
            outcome: ProcessingOutcome::Applied,
            detail: None,
            payload,
        }
    }

    /// Creates a record for an event type we do not model.
    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Timestamp::now(),
            outcome: ProcessingOutcome::Ignored,
            detail: Some(reason.into()),
            payload,
        }
    }

    /// Creates a record for an event with no legal transition.
    pub fn skipped(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Timestamp::now(),
            outcome: ProcessingOutcome::Skipped,
            detail: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to record a billing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// Record was inserted; this delivery owns the event.
    Claimed,
    /// Record already exists; a previous delivery processed the event.
    Duplicate,
}

/// Port for the processed billing event ledger.
///
/// Implementations must back `record` with an atomic insert-if-absent
/// (PRIMARY KEY on event_id plus `ON CONFLICT DO NOTHING`), so two
/// concurrent deliveries of one event can never both claim it.
#[async_trait]
pub trait BillingEventLedger: Send + Sync {
    /// Find a previously processed event by its processor event ID.
    ///
    /// Returns `None` if the event has not completed processing yet.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<BillingEventRecord>, DomainError>;

    /// Attempt to record a processed event.
    ///
    /// Returns `ClaimResult::Claimed` when this record is the first for
    /// the event id, `ClaimResult::Duplicate` when another delivery got
    /// there first.
    async fn record(&self, record: BillingEventRecord) -> Result<ClaimResult, DomainError>;

    /// Delete records older than the specified timestamp.
    ///
    /// Returns the number of records deleted. Used for the retention
    /// policy (e.g., keep 90 days).
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError>;
}
