//! GenerateLabelHandler - Command handler for labeling a pending shipment.
//!
//! Covers the retry path: a shipment whose allocation succeeded but whose
//! label failed (carrier outage, bad credentials) stays `pending` until
//! operations re-runs labeling here, optionally through a different
//! carrier.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, ShipmentId};
use crate::domain::fulfillment::{Shipment, ShipmentStatus};
use crate::ports::{CarrierRegistry, FulfillmentStore, LabelRequest, Package};

use super::create_shipment::FulfillmentPolicy;

/// Command to generate the shipping label for a pending shipment.
#[derive(Debug, Clone)]
pub struct GenerateLabelCommand {
    pub shipment_id: ShipmentId,

    /// Ship through a different carrier than the one chosen at allocation.
    pub carrier: Option<String>,
}

/// Result of a label generation attempt.
#[derive(Debug, Clone)]
pub struct GenerateLabelResult {
    pub shipment: Shipment,

    /// False when the shipment already carried a label and nothing ran.
    pub generated: bool,
}

/// Handler for generating shipping labels.
pub struct GenerateLabelHandler {
    store: Arc<dyn FulfillmentStore>,
    carriers: Arc<CarrierRegistry>,
    policy: FulfillmentPolicy,
}

impl GenerateLabelHandler {
    /// Create a new handler with its dependencies.
    pub fn new(
        store: Arc<dyn FulfillmentStore>,
        carriers: Arc<CarrierRegistry>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            store,
            carriers,
            policy,
        }
    }

    /// Generate and attach a label, moving the shipment to `shipped`.
    ///
    /// Idempotent: a shipment that already has a label is returned as-is.
    /// Carrier errors propagate so the caller can distinguish a retriable
    /// outage from a misconfigured carrier name; the shipment stays
    /// `pending` either way.
    pub async fn handle(
        &self,
        command: GenerateLabelCommand,
    ) -> Result<GenerateLabelResult, DomainError> {
        // 1. Load the shipment
        let mut shipment = self
            .store
            .find_by_id(&command.shipment_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::ShipmentNotFound, "Shipment not found")
                    .with_detail("shipment_id", command.shipment_id.to_string())
            })?;

        // 2. Re-labeling an already shipped box is a no-op
        if shipment.has_label() {
            return Ok(GenerateLabelResult {
                shipment,
                generated: false,
            });
        }

        if shipment.status != ShipmentStatus::Pending {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Only pending shipments can be labeled",
            )
            .with_detail("shipment_id", shipment.id.to_string())
            .with_detail("status", format!("{:?}", shipment.status)));
        }

        if shipment.items.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InsufficientStock,
                "Shipment has no bottles to ship",
            )
            .with_detail("shipment_id", shipment.id.to_string()));
        }

        // 3. Resolve the carrier, honoring an override
        let carrier_name = command
            .carrier
            .clone()
            .unwrap_or_else(|| shipment.carrier.clone());
        let carrier = self.carriers.get(&carrier_name)?;

        // 4. Request the label and persist it; the override only sticks
        //    once the new carrier actually produced a label
        let label = carrier
            .generate_label(LabelRequest {
                from: self.policy.warehouse.clone(),
                to: shipment.destination.clone(),
                packages: Package::for_bottle_count(shipment.allocated_bottles()),
                service_level: self.policy.service_level,
                reference: shipment.id.to_string(),
            })
            .await?;

        if shipment.carrier != carrier_name {
            shipment.carrier = carrier_name;
        }
        shipment.attach_label(
            label.tracking_number,
            label.label_url,
            label.cost_cents,
            label.estimated_delivery,
        )?;
        self.store.update(&shipment).await?;

        tracing::info!(
            shipment_id = %shipment.id,
            carrier = %shipment.carrier,
            "shipping label attached"
        );

        Ok(GenerateLabelResult {
            shipment,
            generated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::carriers::MockCarrier;
    use crate::adapters::memory::InMemoryFulfillmentStore;
    use crate::domain::foundation::{Address, CaveId, SubscriptionId, WineId};
    use crate::domain::fulfillment::{AllocationOrder, ShipmentItem};
    use crate::ports::{CarrierError, ServiceLevel};

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn address(name: &str) -> Address {
        Address::new(name, "12 rue des Lilas", None, "Lyon", "69003", "FR").unwrap()
    }

    fn policy() -> FulfillmentPolicy {
        FulfillmentPolicy {
            default_carrier: "colissimo".to_string(),
            allocation_order: AllocationOrder::NewestFirst,
            service_level: ServiceLevel::Standard,
            warehouse: address("Cave Centrale"),
        }
    }

    fn pending_shipment(bottles: usize) -> Shipment {
        let items = (0..bottles).map(|_| ShipmentItem::single(WineId::new())).collect();
        Shipment::allocate(
            ShipmentId::new(),
            SubscriptionId::new(),
            CaveId::new(),
            "2026-03-01".to_string(),
            "colissimo".to_string(),
            address("Claire Moreau"),
            3,
            items,
        )
    }

    struct Harness {
        store: Arc<InMemoryFulfillmentStore>,
        carrier: Arc<MockCarrier>,
        handler: GenerateLabelHandler,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryFulfillmentStore::new());
        let carrier = Arc::new(MockCarrier::named("colissimo"));

        let mut registry = CarrierRegistry::new();
        registry.register(carrier.clone());

        let handler = GenerateLabelHandler::new(store.clone(), Arc::new(registry), policy());

        Harness {
            store,
            carrier,
            handler,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Labeling
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn labels_a_pending_shipment() {
        let h = harness();
        let shipment = pending_shipment(3);
        h.store.insert_shipment(shipment.clone()).await;

        let result = h
            .handler
            .handle(GenerateLabelCommand {
                shipment_id: shipment.id,
                carrier: None,
            })
            .await
            .unwrap();

        assert!(result.generated);
        assert_eq!(result.shipment.status, ShipmentStatus::Shipped);
        assert_eq!(
            result.shipment.tracking_number.as_deref(),
            Some("COLISSIMO-TRK-0001")
        );
        assert_eq!(result.shipment.shipping_cost_cents, Some(950));

        let stored = h.store.find_by_id(&shipment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShipmentStatus::Shipped);
    }

    #[tokio::test]
    async fn already_labeled_shipment_is_left_alone() {
        let h = harness();
        let mut shipment = pending_shipment(3);
        shipment
            .attach_label(
                "COLISSIMO-TRK-9999".to_string(),
                "https://labels.test/COLISSIMO-TRK-9999.pdf".to_string(),
                950,
                None,
            )
            .unwrap();
        h.store.insert_shipment(shipment.clone()).await;

        let result = h
            .handler
            .handle(GenerateLabelCommand {
                shipment_id: shipment.id,
                carrier: None,
            })
            .await
            .unwrap();

        assert!(!result.generated);
        assert_eq!(
            result.shipment.tracking_number.as_deref(),
            Some("COLISSIMO-TRK-9999")
        );
        assert!(h.carrier.label_requests().is_empty());
    }

    #[tokio::test]
    async fn failed_shipment_cannot_be_labeled() {
        let h = harness();
        let mut shipment = pending_shipment(3);
        shipment.mark_failed().unwrap();
        h.store.insert_shipment(shipment.clone()).await;

        let error = h
            .handler
            .handle(GenerateLabelCommand {
                shipment_id: shipment.id,
                carrier: None,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn empty_shipment_cannot_be_labeled() {
        let h = harness();
        let shipment = pending_shipment(0);
        h.store.insert_shipment(shipment.clone()).await;

        let error = h
            .handler
            .handle(GenerateLabelCommand {
                shipment_id: shipment.id,
                carrier: None,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::InsufficientStock);
        assert!(h.carrier.label_requests().is_empty());
    }

    #[tokio::test]
    async fn missing_shipment_is_an_error() {
        let h = harness();

        let error = h
            .handler
            .handle(GenerateLabelCommand {
                shipment_id: ShipmentId::new(),
                carrier: None,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::ShipmentNotFound);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Carrier Resolution
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn carrier_error_leaves_shipment_pending() {
        let h = harness();
        let shipment = pending_shipment(3);
        h.store.insert_shipment(shipment.clone()).await;
        h.carrier
            .fail_labels_with(CarrierError::unavailable("maintenance window"));

        let error = h
            .handler
            .handle(GenerateLabelCommand {
                shipment_id: shipment.id,
                carrier: None,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::CarrierError);
        let stored = h.store.find_by_id(&shipment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShipmentStatus::Pending);
        assert!(stored.tracking_number.is_none());
    }

    #[tokio::test]
    async fn unknown_carrier_override_is_rejected() {
        let h = harness();
        let shipment = pending_shipment(3);
        h.store.insert_shipment(shipment.clone()).await;

        let error = h
            .handler
            .handle(GenerateLabelCommand {
                shipment_id: shipment.id,
                carrier: Some("dhl".to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::UnsupportedCarrier);
        let stored = h.store.find_by_id(&shipment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShipmentStatus::Pending);
    }

    #[tokio::test]
    async fn carrier_override_sticks_after_success() {
        let h = harness();
        let ups = Arc::new(MockCarrier::named("ups"));
        let mut registry = CarrierRegistry::new();
        registry.register(h.carrier.clone());
        registry.register(ups);
        let handler = GenerateLabelHandler::new(h.store.clone(), Arc::new(registry), policy());

        let shipment = pending_shipment(3);
        h.store.insert_shipment(shipment.clone()).await;

        let result = handler
            .handle(GenerateLabelCommand {
                shipment_id: shipment.id,
                carrier: Some("ups".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(result.shipment.carrier, "ups");
        assert_eq!(
            result.shipment.tracking_number.as_deref(),
            Some("UPS-TRK-0001")
        );
    }
}
