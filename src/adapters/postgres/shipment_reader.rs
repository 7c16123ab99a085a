//! PostgreSQL implementation of ShipmentReader.
//!
//! Read-optimized shipment listings for the cave dashboard and support
//! tooling. Filters are applied in SQL; the views carry computed
//! fulfillment fields (allocated bottles, under-fulfilled flag).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{CaveId, DomainError, ErrorCode, ShipmentId, SubscriptionId, Timestamp, WineId};
use crate::domain::fulfillment::ShipmentStatus;
use crate::ports::{ShipmentFilter, ShipmentItemView, ShipmentReader, ShipmentView};

/// PostgreSQL implementation of the ShipmentReader port.
pub struct PostgresShipmentReader {
    pool: PgPool,
}

impl PostgresShipmentReader {
    /// Creates a new PostgresShipmentReader with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row for shipment listing queries.
#[derive(Debug, sqlx::FromRow)]
struct ShipmentListRow {
    id: Uuid,
    subscription_id: Uuid,
    cave_id: Uuid,
    billing_period: String,
    status: String,
    carrier: String,
    requested_bottles: i32,
    tracking_number: Option<String>,
    label_url: Option<String>,
    estimated_delivery: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// Row for item lookups across a page of shipments.
#[derive(Debug, sqlx::FromRow)]
struct ListedItemRow {
    shipment_id: Uuid,
    wine_id: Uuid,
    quantity: i32,
}

fn parse_status(s: &str) -> Result<ShipmentStatus, DomainError> {
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

fn status_filter_value(status: ShipmentStatus) -> &'static str {
    match status {
        ShipmentStatus::Pending => "pending",
        ShipmentStatus::Shipped => "shipped",
        ShipmentStatus::Delivered => "delivered",
        ShipmentStatus::Failed => "failed",
    }
}

fn build_view(row: ShipmentListRow, items: Vec<ShipmentItemView>) -> Result<ShipmentView, DomainError> {
    let requested = row.requested_bottles as u32;
    let allocated: u32 = items.iter().map(|i| i.quantity).sum();

    Ok(ShipmentView {
        id: ShipmentId::from_uuid(row.id),
        subscription_id: SubscriptionId::from_uuid(row.subscription_id),
        cave_id: CaveId::from_uuid(row.cave_id),
        billing_period: row.billing_period,
        status: parse_status(&row.status)?,
        carrier: row.carrier,
        requested_bottles: requested,
        allocated_bottles: allocated,
        under_fulfilled: allocated < requested,
        items,
        tracking_number: row.tracking_number,
        label_url: row.label_url,
        estimated_delivery: row.estimated_delivery.map(Timestamp::from_datetime),
        delivered_at: row.delivered_at.map(Timestamp::from_datetime),
        created_at: Timestamp::from_datetime(row.created_at),
    })
}

#[async_trait]
impl ShipmentReader for PostgresShipmentReader {
    async fn list_shipments(
        &self,
        filter: ShipmentFilter,
    ) -> Result<Vec<ShipmentView>, DomainError> {
        let rows: Vec<ShipmentListRow> = sqlx::query_as(
            r#"
            SELECT id, subscription_id, cave_id, billing_period, status, carrier,
                   requested_bottles, tracking_number, label_url,
                   estimated_delivery, delivered_at, created_at
            FROM shipments
            WHERE ($1::uuid IS NULL OR subscription_id = $1)
              AND ($2::uuid IS NULL OR cave_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(filter.subscription_id.map(|id| *id.as_uuid()))
        .bind(filter.cave_id.map(|id| *id.as_uuid()))
        .bind(filter.status.map(status_filter_value))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list shipments: {}", e),
            )
        })?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // One items query for the whole page, grouped per shipment.
        let shipment_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let item_rows: Vec<ListedItemRow> = sqlx::query_as(
            r#"
            SELECT shipment_id, wine_id, quantity
            FROM shipment_items
            WHERE shipment_id = ANY($1)
            ORDER BY wine_id
            "#,
        )
        .bind(&shipment_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch shipment items: {}", e),
            )
        })?;

        let mut items_by_shipment: HashMap<Uuid, Vec<ShipmentItemView>> = HashMap::new();
        for item in item_rows {
            items_by_shipment
                .entry(item.shipment_id)
                .or_default()
                .push(ShipmentItemView {
                    wine_id: WineId::from_uuid(item.wine_id),
                    quantity: item.quantity as u32,
                });
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_shipment.remove(&row.id).unwrap_or_default();
                build_view(row, items)
            })
            .collect()
    }
}
