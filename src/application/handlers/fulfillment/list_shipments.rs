//! ListShipmentsHandler - Query handler for shipment listings.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::ports::{ShipmentFilter, ShipmentReader, ShipmentView};

/// Query for shipments matching a filter.
#[derive(Debug, Clone)]
pub struct ListShipmentsQuery {
    pub filter: ShipmentFilter,
}

/// Matching shipment views, newest first.
pub type ListShipmentsResult = Vec<ShipmentView>;

/// Handler for shipment listings.
pub struct ListShipmentsHandler {
    reader: Arc<dyn ShipmentReader>,
}

impl ListShipmentsHandler {
    /// Create a new handler with its dependencies.
    pub fn new(reader: Arc<dyn ShipmentReader>) -> Self {
        Self { reader }
    }

    /// List shipments matching the filter, newest first.
    pub async fn handle(
        &self,
        query: ListShipmentsQuery,
    ) -> Result<ListShipmentsResult, DomainError> {
        self.reader.list_shipments(query.filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryFulfillmentStore;
    use crate::domain::foundation::{Address, CaveId, ShipmentId, SubscriptionId, WineId};
    use crate::domain::fulfillment::{Shipment, ShipmentItem, ShipmentStatus};

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn shipment_for(
        subscription_id: SubscriptionId,
        cave_id: CaveId,
        billing_period: &str,
    ) -> Shipment {
        Shipment::allocate(
            ShipmentId::new(),
            subscription_id,
            cave_id,
            billing_period.to_string(),
            "colissimo".to_string(),
            Address::new("Claire Moreau", "12 rue des Lilas", None, "Lyon", "69003", "FR")
                .unwrap(),
            3,
            vec![ShipmentItem::single(WineId::new())],
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn lists_only_the_requested_subscription() {
        let store = Arc::new(InMemoryFulfillmentStore::new());
        let subscription_id = SubscriptionId::new();
        let cave_id = CaveId::new();
        store
            .insert_shipment(shipment_for(subscription_id, cave_id, "2026-02-01"))
            .await;
        store
            .insert_shipment(shipment_for(subscription_id, cave_id, "2026-03-01"))
            .await;
        store
            .insert_shipment(shipment_for(SubscriptionId::new(), cave_id, "2026-03-01"))
            .await;
        let handler = ListShipmentsHandler::new(store);

        let views = handler
            .handle(ListShipmentsQuery {
                filter: ShipmentFilter::for_subscription(subscription_id),
            })
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.subscription_id == subscription_id));
    }

    #[tokio::test]
    async fn status_filter_narrows_the_listing() {
        let store = Arc::new(InMemoryFulfillmentStore::new());
        let cave_id = CaveId::new();
        let mut shipped = shipment_for(SubscriptionId::new(), cave_id, "2026-02-01");
        shipped
            .attach_label(
                "COLISSIMO-TRK-0001".to_string(),
                "https://labels.test/COLISSIMO-TRK-0001.pdf".to_string(),
                950,
                None,
            )
            .unwrap();
        store.insert_shipment(shipped).await;
        store
            .insert_shipment(shipment_for(SubscriptionId::new(), cave_id, "2026-03-01"))
            .await;
        let handler = ListShipmentsHandler::new(store);

        let views = handler
            .handle(ListShipmentsQuery {
                filter: ShipmentFilter {
                    status: Some(ShipmentStatus::Pending),
                    ..ShipmentFilter::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, ShipmentStatus::Pending);
    }

    #[tokio::test]
    async fn empty_filter_lists_everything() {
        let store = Arc::new(InMemoryFulfillmentStore::new());
        store
            .insert_shipment(shipment_for(SubscriptionId::new(), CaveId::new(), "2026-02-01"))
            .await;
        let handler = ListShipmentsHandler::new(store);

        let views = handler
            .handle(ListShipmentsQuery {
                filter: ShipmentFilter::default(),
            })
            .await
            .unwrap();

        assert_eq!(views.len(), 1);
    }
}
