//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Persists Subscription aggregates to PostgreSQL. The delivery address
//! is flattened into columns; `billing_subscription_id` carries a unique
//! index so invoice events resolve to exactly one subscription.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    Address, CaveId, DomainError, ErrorCode, MemberId, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{Subscription, SubscriptionStatus, SubscriptionTier};
use crate::ports::SubscriptionRepository;

/// PostgreSQL implementation of SubscriptionRepository.
#[derive(Clone)]
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new PostgresSubscriptionRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, member_id, cave_id, tier, status,
                delivery_name, delivery_line1, delivery_line2,
                delivery_city, delivery_postal_code, delivery_country,
                current_period_start, current_period_end, cancel_at_period_end,
                billing_customer_id, billing_subscription_id,
                date_paid, ended_at, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(*subscription.id.as_uuid())
        .bind(*subscription.member_id.as_uuid())
        .bind(*subscription.cave_id.as_uuid())
        .bind(tier_to_str(subscription.tier))
        .bind(status_to_str(subscription.status))
        .bind(&subscription.delivery_address.name)
        .bind(&subscription.delivery_address.line1)
        .bind(&subscription.delivery_address.line2)
        .bind(&subscription.delivery_address.city)
        .bind(&subscription.delivery_address.postal_code)
        .bind(&subscription.delivery_address.country)
        .bind(*subscription.current_period_start.as_datetime())
        .bind(*subscription.current_period_end.as_datetime())
        .bind(subscription.cancel_at_period_end)
        .bind(&subscription.billing_customer_id)
        .bind(&subscription.billing_subscription_id)
        .bind(subscription.date_paid.map(|t| *t.as_datetime()))
        .bind(subscription.ended_at.map(|t| *t.as_datetime()))
        .bind(*subscription.created_at.as_datetime())
        .bind(*subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert subscription: {}", e),
            )
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                current_period_start = $3,
                current_period_end = $4,
                cancel_at_period_end = $5,
                billing_subscription_id = $6,
                date_paid = $7,
                ended_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(*subscription.id.as_uuid())
        .bind(status_to_str(subscription.status))
        .bind(*subscription.current_period_start.as_datetime())
        .bind(*subscription.current_period_end.as_datetime())
        .bind(subscription.cancel_at_period_end)
        .bind(&subscription.billing_subscription_id)
        .bind(subscription.date_paid.map(|t| *t.as_datetime()))
        .bind(subscription.ended_at.map(|t| *t.as_datetime()))
        .bind(*subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", subscription.id),
            ));
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            &format!("{} WHERE id = $1", SUBSCRIPTION_SELECT),
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_billing_subscription_id(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            &format!("{} WHERE billing_subscription_id = $1", SUBSCRIPTION_SELECT),
        )
        .bind(billing_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch subscription by billing id: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Row mapping
// ════════════════════════════════════════════════════════════════════════════

const SUBSCRIPTION_SELECT: &str = r#"
    SELECT id, member_id, cave_id, tier, status,
           delivery_name, delivery_line1, delivery_line2,
           delivery_city, delivery_postal_code, delivery_country,
           current_period_start, current_period_end, cancel_at_period_end,
           billing_customer_id, billing_subscription_id,
           date_paid, ended_at, created_at, updated_at
    FROM subscriptions
"#;

/// Row for subscription aggregate queries.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
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
    billing_customer_id: Option<String>,
    billing_subscription_id: Option<String>,
    date_paid: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn tier_to_str(tier: SubscriptionTier) -> &'static str {
    match tier {
        SubscriptionTier::Decouverte => "decouverte",
        SubscriptionTier::Amateur => "amateur",
        SubscriptionTier::Prestige => "prestige",
    }
}

fn str_to_tier(s: &str) -> Result<SubscriptionTier, DomainError> {
    match s {
        "decouverte" => Ok(SubscriptionTier::Decouverte),
        "amateur" => Ok(SubscriptionTier::Amateur),
        "prestige" => Ok(SubscriptionTier::Prestige),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription tier: {}", s),
        )),
    }
}

fn status_to_str(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Incomplete => "incomplete",
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::PastDue => "past_due",
        SubscriptionStatus::Cancelled => "cancelled",
    }
}

fn str_to_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "incomplete" => Ok(SubscriptionStatus::Incomplete),
        "active" => Ok(SubscriptionStatus::Active),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status: {}", s),
        )),
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
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

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            cave_id: CaveId::from_uuid(row.cave_id),
            tier: str_to_tier(&row.tier)?,
            status: str_to_status(&row.status)?,
            delivery_address,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            cancel_at_period_end: row.cancel_at_period_end,
            billing_customer_id: row.billing_customer_id,
            billing_subscription_id: row.billing_subscription_id,
            date_paid: row.date_paid.map(Timestamp::from_datetime),
            ended_at: row.ended_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}
