//! PostgreSQL implementation of SubscriptionReader.
//!
//! Read-optimized subscription views for support tooling and the cave
//! dashboard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    Address, CaveId, DomainError, ErrorCode, MemberId, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{SubscriptionStatus, SubscriptionTier};
use crate::ports::{SubscriptionReader, SubscriptionView};

/// PostgreSQL implementation of the SubscriptionReader port.
pub struct PostgresSubscriptionReader {
    pool: PgPool,
}

impl PostgresSubscriptionReader {
    /// Creates a new PostgresSubscriptionReader with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row for subscription view queries.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionViewRow {
    id: Uuid,
    member_id: Uuid,
    cave_id: Uuid,
    tier: String,
    status: String,
    delivery_name: String,
    delivery_line1: String,
    delivery_line2: Option<String>,
    delivery_city: String,
    delivery_postal_code: String,
    delivery_country: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    cancel_at_period_end: bool,
    date_paid: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn parse_tier(s: &str) -> Result<SubscriptionTier, DomainError> {
    match s {
        "decouverte" => Ok(SubscriptionTier::Decouverte),
        "amateur" => Ok(SubscriptionTier::Amateur),
        "prestige" => Ok(SubscriptionTier::Prestige),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid tier value: {}", s),
        )),
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "incomplete" => Ok(SubscriptionStatus::Incomplete),
        "active" => Ok(SubscriptionStatus::Active),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

impl TryFrom<SubscriptionViewRow> for SubscriptionView {
    type Error = DomainError;

    fn try_from(row: SubscriptionViewRow) -> Result<Self, Self::Error> {
        let tier = parse_tier(&row.tier)?;
        let delivery_address = Address::new(
            row.delivery_name,
            row.delivery_line1,
            row.delivery_line2,
            row.delivery_city,
            row.delivery_postal_code,
            row.delivery_country,
        )
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Stored delivery address is invalid: {}", e),
            )
        })?;

        Ok(SubscriptionView {
            id: SubscriptionId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            cave_id: CaveId::from_uuid(row.cave_id),
            tier,
            bottles_per_cycle: tier.bottles_per_cycle(),
            status: parse_status(&row.status)?,
            delivery_address,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            cancel_at_period_end: row.cancel_at_period_end,
            date_paid: row.date_paid.map(Timestamp::from_datetime),
            ended_at: row.ended_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl SubscriptionReader for PostgresSubscriptionReader {
    async fn get_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<SubscriptionView>, DomainError> {
        let row: Option<SubscriptionViewRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, cave_id, tier, status,
                   delivery_name, delivery_line1, delivery_line2,
                   delivery_city, delivery_postal_code, delivery_country,
                   current_period_start, current_period_end, cancel_at_period_end,
                   date_paid, ended_at, created_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to get subscription view: {}", e),
            )
        })?;

        row.map(SubscriptionView::try_from).transpose()
    }
}
