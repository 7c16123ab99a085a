//! PostgreSQL implementation of BillingEventLedger.
//!
//! One row per processed billing event, keyed on the processor's event
//! id. The claim is the insert itself: `ON CONFLICT DO NOTHING` means two
//! concurrent deliveries of one event can never both see `Claimed`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{BillingEventLedger, BillingEventRecord, ClaimResult, ProcessingOutcome};

/// PostgreSQL implementation of the BillingEventLedger port.
#[derive(Clone)]
pub struct PostgresBillingEventLedger {
    pool: PgPool,
}

impl PostgresBillingEventLedger {
    /// Creates a new PostgresBillingEventLedger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row for ledger lookups.
#[derive(Debug, sqlx::FromRow)]
struct BillingEventRow {
    event_id: String,
    event_type: String,
    processed_at: DateTime<Utc>,
    outcome: String,
    detail: Option<String>,
    payload: serde_json::Value,
}

fn outcome_to_str(outcome: ProcessingOutcome) -> &'static str {
    match outcome {
        ProcessingOutcome::Applied => "applied",
        ProcessingOutcome::Ignored => "ignored",
        ProcessingOutcome::Skipped => "skipped",
    }
}

fn str_to_outcome(s: &str) -> Result<ProcessingOutcome, DomainError> {
    match s {
        "applied" => Ok(ProcessingOutcome::Applied),
        "ignored" => Ok(ProcessingOutcome::Ignored),
        "skipped" => Ok(ProcessingOutcome::Skipped),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid processing outcome: {}", s),
        )),
    }
}

impl TryFrom<BillingEventRow> for BillingEventRecord {
    type Error = DomainError;

    fn try_from(row: BillingEventRow) -> Result<Self, Self::Error> {
        Ok(BillingEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            processed_at: Timestamp::from_datetime(row.processed_at),
            outcome: str_to_outcome(&row.outcome)?,
            detail: row.detail,
            payload: row.payload,
        })
    }
}

#[async_trait]
impl BillingEventLedger for PostgresBillingEventLedger {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<BillingEventRecord>, DomainError> {
        let row: Option<BillingEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, processed_at, outcome, detail, payload
            FROM billing_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch billing event: {}", e),
            )
        })?;

        row.map(BillingEventRecord::try_from).transpose()
    }

    async fn record(&self, record: BillingEventRecord) -> Result<ClaimResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO billing_events (
                event_id, event_type, processed_at, outcome, detail, payload
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(*record.processed_at.as_datetime())
        .bind(outcome_to_str(record.outcome))
        .bind(&record.detail)
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to record billing event: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            Ok(ClaimResult::Duplicate)
        } else {
            Ok(ClaimResult::Claimed)
        }
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM billing_events WHERE processed_at < $1")
            .bind(*timestamp.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to delete old billing events: {}", e),
                )
            })?;

        Ok(result.rows_affected())
    }
}
