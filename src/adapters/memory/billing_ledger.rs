//! In-Memory Billing Event Ledger Adapter
//!
//! Stores processed-event records in a process-local map.
//! Useful for testing and development; production uses Postgres.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{BillingEventLedger, BillingEventRecord, ClaimResult, ProcessingOutcome};

/// In-memory ledger of processed billing events.
///
/// The `record` check-and-insert runs under a single write lock, so it
/// gives the same claim-once guarantee the Postgres adapter gets from
/// its primary key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingLedger {
    records: Arc<RwLock<HashMap<String, BillingEventRecord>>>,
}

impl InMemoryBillingLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events (useful for tests).
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// The recorded outcome for an event id, if any (useful for tests).
    pub async fn outcome_of(&self, event_id: &str) -> Option<ProcessingOutcome> {
        self.records.read().await.get(event_id).map(|r| r.outcome)
    }

    /// Clear all records (useful for tests).
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl BillingEventLedger for InMemoryBillingLedger {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<BillingEventRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(event_id).cloned())
    }

    async fn record(&self, record: BillingEventRecord) -> Result<ClaimResult, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_id) {
            return Ok(ClaimResult::Duplicate);
        }
        records.insert(record.event_id.clone(), record);
        Ok(ClaimResult::Claimed)
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.processed_at.is_before(&timestamp));
        Ok((before - records.len()) as u64)
    }
}
