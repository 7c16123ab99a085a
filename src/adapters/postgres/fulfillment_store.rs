//! PostgreSQL implementation of FulfillmentStore.
//!
//! Allocation runs in one transaction: the cave's in-stock rows are
//! locked with `FOR UPDATE`, the selected wines are decremented, and the
//! shipment with its items lands before commit. The unique key on
//! `(subscription_id, billing_period)` turns a lost insert race into the
//! winner's shipment instead of a double allocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{
    Address, CaveId, DomainError, ErrorCode, ShipmentId, SubscriptionId, Timestamp, WineId,
};
use crate::domain::fulfillment::{
    select_for_allocation, DeliveryStatus, Shipment, ShipmentItem, ShipmentStatus, TrackingEvent,
    TrackingInfo, Wine,
};
use crate::ports::{AllocationOutcome, FulfillmentStore, NewShipment};

/// PostgreSQL implementation of the FulfillmentStore port.
#[derive(Clone)]
pub struct PostgresFulfillmentStore {
    pool: PgPool,
}

impl PostgresFulfillmentStore {
    /// Creates a new PostgresFulfillmentStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, shipment_id: Uuid) -> Result<Vec<ShipmentItem>, DomainError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT wine_id, quantity
            FROM shipment_items
            WHERE shipment_id = $1
            ORDER BY wine_id
            "#,
        )
        .bind(shipment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch shipment items: {}", e),
            )
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ShipmentItem {
                wine_id: WineId::from_uuid(row.wine_id),
                quantity: row.quantity as u32,
            })
            .collect())
    }

    async fn fetch_shipment(
        &self,
        row: Option<ShipmentRow>,
    ) -> Result<Option<Shipment>, DomainError> {
        match row {
            Some(row) => {
                let items = self.load_items(row.id).await?;
                Ok(Some(row_to_shipment(row, items)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl FulfillmentStore for PostgresFulfillmentStore {
    async fn allocate_shipment(
        &self,
        new_shipment: NewShipment,
    ) -> Result<AllocationOutcome, DomainError> {
        if let Some(existing) = self
            .find_by_billing_period(&new_shipment.subscription_id, &new_shipment.billing_period)
            .await?
        {
            return Ok(AllocationOutcome::AlreadyExists(existing));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to begin transaction: {}", e),
            )
        })?;

        // Lock the cave's in-stock rows; selection and decrement happen
        // under the same lock so stock can never go negative.
        let wine_rows: Vec<WineRow> = sqlx::query_as(
            r#"
            SELECT id, cave_id, name, vintage, stock_quantity, added_at
            FROM wines
            WHERE cave_id = $1 AND stock_quantity > 0
            FOR UPDATE
            "#,
        )
        .bind(*new_shipment.cave_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to lock wine stock: {}", e),
            )
        })?;

        let catalogue: Vec<Wine> = wine_rows.into_iter().map(Wine::from).collect();
        let selected = select_for_allocation(
            &catalogue,
            new_shipment.requested_bottles,
            new_shipment.allocation_order,
        );

        if !selected.is_empty() {
            let wine_ids: Vec<Uuid> = selected.iter().map(|id| *id.as_uuid()).collect();
            sqlx::query("UPDATE wines SET stock_quantity = stock_quantity - 1 WHERE id = ANY($1)")
                .bind(&wine_ids)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to decrement wine stock: {}", e),
                    )
                })?;
        }

        let shipment = Shipment::allocate(
            ShipmentId::new(),
            new_shipment.subscription_id,
            new_shipment.cave_id,
            new_shipment.billing_period,
            new_shipment.carrier,
            new_shipment.destination,
            new_shipment.requested_bottles,
            selected.into_iter().map(ShipmentItem::single).collect(),
        );

        if let Err(e) = insert_shipment(&mut tx, &shipment).await {
            if is_unique_violation(&e) {
                // A concurrent allocation landed this billing period
                // first; our decrements roll back with the transaction
                // and the winner's shipment is returned instead.
                drop(tx);
                let winner = self
                    .find_by_billing_period(&shipment.subscription_id, &shipment.billing_period)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::DatabaseError,
                            "Shipment insert conflicted but no existing row was found",
                        )
                    })?;
                return Ok(AllocationOutcome::AlreadyExists(winner));
            }
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert shipment: {}", e),
            ));
        }

        tx.commit().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to commit transaction: {}", e),
            )
        })?;

        Ok(AllocationOutcome::Created(shipment))
    }

    async fn find_by_id(&self, id: &ShipmentId) -> Result<Option<Shipment>, DomainError> {
        let row: Option<ShipmentRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SHIPMENT_SELECT))
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to fetch shipment: {}", e),
                    )
                })?;

        self.fetch_shipment(row).await
    }

    async fn find_by_billing_period(
        &self,
        subscription_id: &SubscriptionId,
        billing_period: &str,
    ) -> Result<Option<Shipment>, DomainError> {
        let row: Option<ShipmentRow> = sqlx::query_as(&format!(
            "{} WHERE subscription_id = $1 AND billing_period = $2",
            SHIPMENT_SELECT
        ))
        .bind(*subscription_id.as_uuid())
        .bind(billing_period)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch shipment by billing period: {}", e),
            )
        })?;

        self.fetch_shipment(row).await
    }

    async fn update(&self, shipment: &Shipment) -> Result<(), DomainError> {
        // Items and destination are immutable after allocation; only the
        // carrier, status and label fields ever move.
        let result = sqlx::query(
            r#"
            UPDATE shipments SET
                status = $2,
                carrier = $3,
                tracking_number = $4,
                label_url = $5,
                shipping_cost_cents = $6,
                estimated_delivery = $7,
                delivered_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(*shipment.id.as_uuid())
        .bind(shipment_status_to_str(shipment.status))
        .bind(&shipment.carrier)
        .bind(&shipment.tracking_number)
        .bind(&shipment.label_url)
        .bind(shipment.shipping_cost_cents)
        .bind(shipment.estimated_delivery.map(|t| *t.as_datetime()))
        .bind(shipment.delivered_at.map(|t| *t.as_datetime()))
        .bind(*shipment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update shipment: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ShipmentNotFound,
                format!("Shipment not found: {}", shipment.id),
            ));
        }

        Ok(())
    }

    async fn record_tracking(&self, info: &TrackingInfo) -> Result<(), DomainError> {
        let events = serde_json::to_value(&info.events).map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to serialize tracking events: {}", e),
            )
        })?;

        // The conflict guard mirrors TrackingInfo::supersedes: a snapshot
        // without events never replaces one, and event time only moves
        // strictly forward.
        sqlx::query(
            r#"
            INSERT INTO tracking_snapshots (
                tracking_number, carrier, delivery_status, events, last_event_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tracking_number) DO UPDATE SET
                carrier = EXCLUDED.carrier,
                delivery_status = EXCLUDED.delivery_status,
                events = EXCLUDED.events,
                last_event_at = EXCLUDED.last_event_at
            WHERE EXCLUDED.last_event_at IS NOT NULL
              AND (tracking_snapshots.last_event_at IS NULL
                   OR EXCLUDED.last_event_at > tracking_snapshots.last_event_at)
            "#,
        )
        .bind(&info.tracking_number)
        .bind(&info.carrier)
        .bind(delivery_status_to_str(info.delivery_status))
        .bind(&events)
        .bind(info.last_event_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to record tracking snapshot: {}", e),
            )
        })?;

        Ok(())
    }

    async fn get_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<TrackingInfo>, DomainError> {
        let row: Option<TrackingRow> = sqlx::query_as(
            r#"
            SELECT tracking_number, carrier, delivery_status, events, last_event_at
            FROM tracking_snapshots
            WHERE tracking_number = $1
            "#,
        )
        .bind(tracking_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch tracking snapshot: {}", e),
            )
        })?;

        row.map(TrackingInfo::try_from).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Row mapping
// ════════════════════════════════════════════════════════════════════════════

const SHIPMENT_SELECT: &str = r#"
    SELECT id, subscription_id, cave_id, billing_period, status, carrier,
           destination_name, destination_line1, destination_line2,
           destination_city, destination_postal_code, destination_country,
           requested_bottles, tracking_number, label_url, shipping_cost_cents,
           estimated_delivery, delivered_at, created_at, updated_at
    FROM shipments
"#;

/// Row for shipment aggregate queries (items loaded separately).
#[derive(Debug, sqlx::FromRow)]
struct ShipmentRow {
    id: Uuid,
    subscription_id: Uuid,
    cave_id: Uuid,
    billing_period: String,
    status: String,
    carrier: String,
    destination_name: String,
    destination_line1: String,
    destination_line2: Option<String>,
    destination_city: String,
    destination_postal_code: String,
    destination_country: String,
    requested_bottles: i32,
    tracking_number: Option<String>,
    label_url: Option<String>,
    shipping_cost_cents: Option<i64>,
    estimated_delivery: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row for shipment item queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    wine_id: Uuid,
    quantity: i32,
}

/// Row for catalogue queries inside the allocation transaction.
#[derive(Debug, sqlx::FromRow)]
struct WineRow {
    id: Uuid,
    cave_id: Uuid,
    name: String,
    vintage: Option<i32>,
    stock_quantity: i32,
    added_at: DateTime<Utc>,
}

/// Row for tracking snapshot queries.
#[derive(Debug, sqlx::FromRow)]
struct TrackingRow {
    tracking_number: String,
    carrier: String,
    delivery_status: String,
    events: serde_json::Value,
    last_event_at: Option<DateTime<Utc>>,
}

impl From<WineRow> for Wine {
    fn from(row: WineRow) -> Self {
        Wine {
            id: WineId::from_uuid(row.id),
            cave_id: CaveId::from_uuid(row.cave_id),
            name: row.name,
            vintage: row.vintage,
            stock_quantity: row.stock_quantity,
            added_at: Timestamp::from_datetime(row.added_at),
        }
    }
}

fn shipment_status_to_str(status: ShipmentStatus) -> &'static str {
    match status {
        ShipmentStatus::Pending => "pending",
        ShipmentStatus::Shipped => "shipped",
        ShipmentStatus::Delivered => "delivered",
        ShipmentStatus::Failed => "failed",
    }
}

fn str_to_shipment_status(s: &str) -> Result<ShipmentStatus, DomainError> {
    match s {
        "pending" => Ok(ShipmentStatus::Pending),
        "shipped" => Ok(ShipmentStatus::Shipped),
        "delivered" => Ok(ShipmentStatus::Delivered),
        "failed" => Ok(ShipmentStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid shipment status: {}", s),
        )),
    }
}

fn delivery_status_to_str(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::InTransit => "in_transit",
        DeliveryStatus::OutForDelivery => "out_for_delivery",
        DeliveryStatus::Delivered => "delivered",
        DeliveryStatus::Exception => "exception",
    }
}

fn str_to_delivery_status(s: &str) -> Result<DeliveryStatus, DomainError> {
    match s {
        "in_transit" => Ok(DeliveryStatus::InTransit),
        "out_for_delivery" => Ok(DeliveryStatus::OutForDelivery),
        "delivered" => Ok(DeliveryStatus::Delivered),
        "exception" => Ok(DeliveryStatus::Exception),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid delivery status: {}", s),
        )),
    }
}

fn row_to_shipment(row: ShipmentRow, items: Vec<ShipmentItem>) -> Result<Shipment, DomainError> {
    let destination = Address::new(
        row.destination_name,
        row.destination_line1,
        row.destination_line2,
        row.destination_city,
        row.destination_postal_code,
        row.destination_country,
    )
    .map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Stored destination address is invalid: {}", e),
        )
    })?;

    Ok(Shipment {
        id: ShipmentId::from_uuid(row.id),
        subscription_id: SubscriptionId::from_uuid(row.subscription_id),
        cave_id: CaveId::from_uuid(row.cave_id),
        billing_period: row.billing_period,
        status: str_to_shipment_status(&row.status)?,
        carrier: row.carrier,
        destination,
        requested_bottles: row.requested_bottles as u32,
        items,
        tracking_number: row.tracking_number,
        label_url: row.label_url,
        shipping_cost_cents: row.shipping_cost_cents,
        estimated_delivery: row.estimated_delivery.map(Timestamp::from_datetime),
        delivered_at: row.delivered_at.map(Timestamp::from_datetime),
        created_at: Timestamp::from_datetime(row.created_at),
        updated_at: Timestamp::from_datetime(row.updated_at),
    })
}

impl TryFrom<TrackingRow> for TrackingInfo {
    type Error = DomainError;

    fn try_from(row: TrackingRow) -> Result<Self, Self::Error> {
        let events: Vec<TrackingEvent> = serde_json::from_value(row.events).map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Stored tracking events are invalid: {}", e),
            )
        })?;

        Ok(TrackingInfo {
            tracking_number: row.tracking_number,
            carrier: row.carrier,
            delivery_status: str_to_delivery_status(&row.delivery_status)?,
            events,
            last_event_at: row.last_event_at.map(Timestamp::from_datetime),
        })
    }
}

async fn insert_shipment(
    tx: &mut Transaction<'_, Postgres>,
    shipment: &Shipment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO shipments (
            id, subscription_id, cave_id, billing_period, status, carrier,
            destination_name, destination_line1, destination_line2,
            destination_city, destination_postal_code, destination_country,
            requested_bottles, tracking_number, label_url, shipping_cost_cents,
            estimated_delivery, delivered_at, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
            $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
        )
        "#,
    )
    .bind(*shipment.id.as_uuid())
    .bind(*shipment.subscription_id.as_uuid())
    .bind(*shipment.cave_id.as_uuid())
    .bind(&shipment.billing_period)
    .bind(shipment_status_to_str(shipment.status))
    .bind(&shipment.carrier)
    .bind(&shipment.destination.name)
    .bind(&shipment.destination.line1)
    .bind(&shipment.destination.line2)
    .bind(&shipment.destination.city)
    .bind(&shipment.destination.postal_code)
    .bind(&shipment.destination.country)
    .bind(shipment.requested_bottles as i32)
    .bind(&shipment.tracking_number)
    .bind(&shipment.label_url)
    .bind(shipment.shipping_cost_cents)
    .bind(shipment.estimated_delivery.map(|t| *t.as_datetime()))
    .bind(shipment.delivered_at.map(|t| *t.as_datetime()))
    .bind(*shipment.created_at.as_datetime())
    .bind(*shipment.updated_at.as_datetime())
    .execute(&mut **tx)
    .await?;

    for item in &shipment.items {
        sqlx::query(
            r#"
            INSERT INTO shipment_items (shipment_id, wine_id, quantity)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(*shipment.id.as_uuid())
        .bind(*item.wine_id.as_uuid())
        .bind(item.quantity as i32)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
