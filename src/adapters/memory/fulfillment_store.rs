//! In-Memory Fulfillment Store Adapter
//!
//! Holds the wine catalogue, shipments and tracking snapshots behind a
//! single mutex so allocation stays atomic, mirroring what the Postgres
//! adapter does with row locks. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, ShipmentId, SubscriptionId, WineId};
use crate::domain::fulfillment::{
    select_for_allocation, Shipment, ShipmentItem, TrackingInfo, Wine,
};
use crate::ports::{
    AllocationOutcome, FulfillmentStore, NewShipment, ShipmentFilter, ShipmentReader, ShipmentView,
};

#[derive(Debug, Default)]
struct Inner {
    wines: HashMap<WineId, Wine>,
    shipments: HashMap<ShipmentId, Shipment>,
    tracking: HashMap<String, TrackingInfo>,
}

impl Inner {
    fn shipment_for_period(
        &self,
        subscription_id: &SubscriptionId,
        billing_period: &str,
    ) -> Option<&Shipment> {
        self.shipments
            .values()
            .find(|s| s.subscription_id == *subscription_id && s.billing_period == billing_period)
    }
}

/// In-memory fulfillment storage.
///
/// Selection, stock decrement and shipment insert all happen under one
/// lock acquisition, so two concurrent `allocate_shipment` calls for the
/// same period resolve to a single shipment and stock is never spent
/// twice.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFulfillmentStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryFulfillmentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one wine to the catalogue (useful for tests and seeding).
    pub async fn add_wine(&self, wine: Wine) {
        self.inner.lock().await.wines.insert(wine.id, wine);
    }

    /// Add several wines to the catalogue.
    pub async fn seed_wines(&self, wines: Vec<Wine>) {
        let mut inner = self.inner.lock().await;
        for wine in wines {
            inner.wines.insert(wine.id, wine);
        }
    }

    /// Remaining stock for a wine (useful for test assertions).
    pub async fn stock_of(&self, wine_id: &WineId) -> Option<i32> {
        self.inner
            .lock()
            .await
            .wines
            .get(wine_id)
            .map(|w| w.stock_quantity)
    }

    /// Number of stored shipments (useful for tests).
    pub async fn shipment_count(&self) -> usize {
        self.inner.lock().await.shipments.len()
    }

    /// Insert a shipment directly, bypassing allocation (useful for tests).
    pub async fn insert_shipment(&self, shipment: Shipment) {
        self.inner.lock().await.shipments.insert(shipment.id, shipment);
    }

    /// Clear all wines, shipments and tracking state (useful for tests).
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.wines.clear();
        inner.shipments.clear();
        inner.tracking.clear();
    }
}

#[async_trait]
impl FulfillmentStore for InMemoryFulfillmentStore {
    async fn allocate_shipment(
        &self,
        new_shipment: NewShipment,
    ) -> Result<AllocationOutcome, DomainError> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) =
            inner.shipment_for_period(&new_shipment.subscription_id, &new_shipment.billing_period)
        {
            return Ok(AllocationOutcome::AlreadyExists(existing.clone()));
        }

        let catalogue: Vec<Wine> = inner
            .wines
            .values()
            .filter(|w| w.cave_id == new_shipment.cave_id)
            .cloned()
            .collect();
        let selected = select_for_allocation(
            &catalogue,
            new_shipment.requested_bottles,
            new_shipment.allocation_order,
        );

        for wine_id in &selected {
            if let Some(wine) = inner.wines.get_mut(wine_id) {
                wine.stock_quantity -= 1;
            }
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
        inner.shipments.insert(shipment.id, shipment.clone());

        Ok(AllocationOutcome::Created(shipment))
    }

    async fn find_by_id(&self, id: &ShipmentId) -> Result<Option<Shipment>, DomainError> {
        let inner = self.inner.lock().await;
        Ok(inner.shipments.get(id).cloned())
    }

    async fn find_by_billing_period(
        &self,
        subscription_id: &SubscriptionId,
        billing_period: &str,
    ) -> Result<Option<Shipment>, DomainError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .shipment_for_period(subscription_id, billing_period)
            .cloned())
    }

    async fn update(&self, shipment: &Shipment) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().await;

        if !inner.shipments.contains_key(&shipment.id) {
            return Err(DomainError::new(
                ErrorCode::ShipmentNotFound,
                format!("Shipment {} not found", shipment.id),
            ));
        }

        inner.shipments.insert(shipment.id, shipment.clone());
        Ok(())
    }

    async fn record_tracking(&self, info: &TrackingInfo) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().await;

        match inner.tracking.get(&info.tracking_number) {
            Some(stored) if !info.supersedes(stored) => Ok(()),
            _ => {
                inner
                    .tracking
                    .insert(info.tracking_number.clone(), info.clone());
                Ok(())
            }
        }
    }

    async fn get_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<TrackingInfo>, DomainError> {
        let inner = self.inner.lock().await;
        Ok(inner.tracking.get(tracking_number).cloned())
    }
}

#[async_trait]
impl ShipmentReader for InMemoryFulfillmentStore {
    async fn list_shipments(
        &self,
        filter: ShipmentFilter,
    ) -> Result<Vec<ShipmentView>, DomainError> {
        let inner = self.inner.lock().await;

        let mut shipments: Vec<&Shipment> = inner
            .shipments
            .values()
            .filter(|s| filter.matches(s))
            .collect();
        shipments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });

        Ok(shipments.into_iter().map(ShipmentView::from).collect())
    }
}
