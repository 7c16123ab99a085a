//! RefreshTrackingHandler - Command handler for pulling carrier tracking.
//!
//! Fetches the latest tracking snapshot from the shipment's carrier,
//! persists it under last-write-wins, and advances the shipment when the
//! carrier reports a terminal outcome (delivered or exception). When the
//! carrier is temporarily unreachable the stored snapshot is served
//! instead, so members still see the last known position.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, ShipmentId, Timestamp};
use crate::domain::fulfillment::{DeliveryStatus, Shipment, ShipmentStatus, TrackingInfo};
use crate::ports::{CarrierRegistry, FulfillmentStore};

/// Command to refresh tracking for a shipment.
#[derive(Debug, Clone)]
pub struct RefreshTrackingCommand {
    pub shipment_id: ShipmentId,
}

/// Result of a tracking refresh.
#[derive(Debug, Clone)]
pub struct RefreshTrackingResult {
    pub shipment: Shipment,
    pub tracking: TrackingInfo,

    /// False when the carrier was unreachable and the stored snapshot
    /// was served instead.
    pub live: bool,
}

/// Handler for refreshing carrier tracking.
pub struct RefreshTrackingHandler {
    store: Arc<dyn FulfillmentStore>,
    carriers: Arc<CarrierRegistry>,
}

impl RefreshTrackingHandler {
    /// Create a new handler with its dependencies.
    pub fn new(store: Arc<dyn FulfillmentStore>, carriers: Arc<CarrierRegistry>) -> Self {
        Self { store, carriers }
    }

    /// Pull tracking from the carrier and persist the freshest snapshot.
    pub async fn handle(
        &self,
        command: RefreshTrackingCommand,
    ) -> Result<RefreshTrackingResult, DomainError> {
        // 1. Load the shipment; tracking needs a label first
        let mut shipment = self
            .store
            .find_by_id(&command.shipment_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::ShipmentNotFound, "Shipment not found")
                    .with_detail("shipment_id", command.shipment_id.to_string())
            })?;

        let tracking_number = shipment.tracking_number.clone().ok_or_else(|| {
            DomainError::new(
                ErrorCode::TrackingNotFound,
                "Shipment has no label yet, nothing to track",
            )
            .with_detail("shipment_id", shipment.id.to_string())
        })?;

        // 2. Ask the carrier for the latest snapshot
        let carrier = self.carriers.get(&shipment.carrier)?;
        match carrier.track(&tracking_number).await {
            Ok(fresh) => {
                // 3. Persist under last-write-wins, then act on whichever
                //    snapshot won so a stale carrier response cannot
                //    regress the shipment
                self.store.record_tracking(&fresh).await?;
                let tracking = self
                    .store
                    .get_tracking(&tracking_number)
                    .await?
                    .unwrap_or(fresh);

                self.apply_delivery_status(&mut shipment, &tracking).await?;

                Ok(RefreshTrackingResult {
                    shipment,
                    tracking,
                    live: true,
                })
            }
            Err(error) if error.retryable => {
                // 4. Carrier outage: fall back to the stored snapshot
                tracing::warn!(
                    shipment_id = %shipment.id,
                    carrier = %shipment.carrier,
                    error = %error,
                    "carrier tracking unavailable, serving stored snapshot"
                );
                match self.store.get_tracking(&tracking_number).await? {
                    Some(tracking) => Ok(RefreshTrackingResult {
                        shipment,
                        tracking,
                        live: false,
                    }),
                    None => Err(error.into()),
                }
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Advance the shipment when tracking reports a terminal outcome.
    ///
    /// Only `shipped` boxes move; a snapshot seen after delivery is a
    /// no-op rather than an invalid transition.
    async fn apply_delivery_status(
        &self,
        shipment: &mut Shipment,
        tracking: &TrackingInfo,
    ) -> Result<(), DomainError> {
        if shipment.status != ShipmentStatus::Shipped {
            return Ok(());
        }

        match tracking.delivery_status {
            DeliveryStatus::Delivered => {
                let delivered_at = tracking.last_event_at.unwrap_or_else(Timestamp::now);
                shipment.record_delivery(delivered_at)?;
                self.store.update(shipment).await?;
                tracing::info!(shipment_id = %shipment.id, "shipment delivered");
            }
            DeliveryStatus::Exception => {
                shipment.mark_failed()?;
                self.store.update(shipment).await?;
                tracing::warn!(
                    shipment_id = %shipment.id,
                    "carrier reported a delivery exception"
                );
            }
            DeliveryStatus::InTransit | DeliveryStatus::OutForDelivery => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::carriers::MockCarrier;
    use crate::adapters::memory::InMemoryFulfillmentStore;
    use crate::domain::foundation::{Address, CaveId, SubscriptionId, WineId};
    use crate::domain::fulfillment::{ShipmentItem, TrackingEvent};
    use crate::ports::CarrierError;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    const TRACKING_NUMBER: &str = "COLISSIMO-TRK-0001";

    fn shipped_shipment() -> Shipment {
        let mut shipment = Shipment::allocate(
            ShipmentId::new(),
            SubscriptionId::new(),
            CaveId::new(),
            "2026-03-01".to_string(),
            "colissimo".to_string(),
            Address::new("Claire Moreau", "12 rue des Lilas", None, "Lyon", "69003", "FR")
                .unwrap(),
            3,
            vec![
                ShipmentItem::single(WineId::new()),
                ShipmentItem::single(WineId::new()),
                ShipmentItem::single(WineId::new()),
            ],
        );
        shipment
            .attach_label(
                TRACKING_NUMBER.to_string(),
                format!("https://labels.test/{}.pdf", TRACKING_NUMBER),
                950,
                None,
            )
            .unwrap();
        shipment
    }

    fn snapshot(status: DeliveryStatus, event_descriptions: &[(&str, i64)]) -> TrackingInfo {
        let events = event_descriptions
            .iter()
            .map(|(description, days_ago)| TrackingEvent {
                occurred_at: Timestamp::now().minus_days(*days_ago),
                description: description.to_string(),
                location: None,
            })
            .collect();
        TrackingInfo::new(
            TRACKING_NUMBER.to_string(),
            "colissimo".to_string(),
            status,
            events,
        )
    }

    struct Harness {
        store: Arc<InMemoryFulfillmentStore>,
        carrier: Arc<MockCarrier>,
        handler: RefreshTrackingHandler,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryFulfillmentStore::new());
        let carrier = Arc::new(MockCarrier::named("colissimo"));

        let mut registry = CarrierRegistry::new();
        registry.register(carrier.clone());

        let handler = RefreshTrackingHandler::new(store.clone(), Arc::new(registry));

        Harness {
            store,
            carrier,
            handler,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Live Refresh
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn refresh_persists_the_carrier_snapshot() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;

        let result = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap();

        assert!(result.live);
        assert_eq!(result.tracking.delivery_status, DeliveryStatus::InTransit);
        assert_eq!(result.shipment.status, ShipmentStatus::Shipped);
        assert!(h
            .store
            .get_tracking(TRACKING_NUMBER)
            .await
            .unwrap()
            .is_some());
        assert_eq!(h.carrier.track_requests(), vec![TRACKING_NUMBER.to_string()]);
    }

    #[tokio::test]
    async fn delivered_snapshot_completes_the_shipment() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;
        h.carrier.set_tracking(snapshot(
            DeliveryStatus::Delivered,
            &[("Parcel accepted", 3), ("Delivered to recipient", 0)],
        ));

        let result = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap();

        assert_eq!(result.shipment.status, ShipmentStatus::Delivered);
        assert!(result.shipment.delivered_at.is_some());
        let stored = h.store.find_by_id(&shipment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShipmentStatus::Delivered);
    }

    #[tokio::test]
    async fn delivery_exception_fails_the_shipment() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;
        h.carrier.set_tracking(snapshot(
            DeliveryStatus::Exception,
            &[("Address not found", 0)],
        ));

        let result = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap();

        assert_eq!(result.shipment.status, ShipmentStatus::Failed);
    }

    #[tokio::test]
    async fn repeat_refresh_after_delivery_is_a_noop() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;
        h.carrier.set_tracking(snapshot(
            DeliveryStatus::Delivered,
            &[("Delivered to recipient", 0)],
        ));

        let command = RefreshTrackingCommand {
            shipment_id: shipment.id,
        };
        h.handler.handle(command.clone()).await.unwrap();
        let second = h.handler.handle(command).await.unwrap();

        assert_eq!(second.shipment.status, ShipmentStatus::Delivered);
    }

    #[tokio::test]
    async fn stale_carrier_response_does_not_replace_newer_snapshot() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;

        let newer = snapshot(
            DeliveryStatus::OutForDelivery,
            &[("Parcel accepted", 2), ("Out for delivery", 0)],
        );
        h.store.record_tracking(&newer).await.unwrap();
        // The carrier replays an older snapshot.
        h.carrier
            .set_tracking(snapshot(DeliveryStatus::InTransit, &[("Parcel accepted", 2)]));

        let result = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap();

        assert_eq!(
            result.tracking.delivery_status,
            DeliveryStatus::OutForDelivery
        );
        assert_eq!(result.tracking.events.len(), 2);
        assert_eq!(result.shipment.status, ShipmentStatus::Shipped);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Carrier Outages
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn outage_serves_the_stored_snapshot() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;
        let stored = snapshot(DeliveryStatus::InTransit, &[("Parcel accepted", 1)]);
        h.store.record_tracking(&stored).await.unwrap();
        h.carrier
            .fail_tracking_with(CarrierError::unavailable("maintenance window"));

        let result = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap();

        assert!(!result.live);
        assert_eq!(result.tracking.events.len(), 1);
    }

    #[tokio::test]
    async fn outage_without_stored_snapshot_is_an_error() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;
        h.carrier
            .fail_tracking_with(CarrierError::unavailable("maintenance window"));

        let error = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::CarrierError);
    }

    #[tokio::test]
    async fn unknown_tracking_number_propagates() {
        let h = harness();
        let shipment = shipped_shipment();
        h.store.insert_shipment(shipment.clone()).await;
        // A stored snapshot must not mask a carrier that disowns the number.
        let stored = snapshot(DeliveryStatus::InTransit, &[("Parcel accepted", 1)]);
        h.store.record_tracking(&stored).await.unwrap();
        h.carrier
            .fail_tracking_with(CarrierError::tracking_not_found(TRACKING_NUMBER));

        let error = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::TrackingNotFound);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Guards
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unlabeled_shipment_has_nothing_to_track() {
        let h = harness();
        let shipment = Shipment::allocate(
            ShipmentId::new(),
            SubscriptionId::new(),
            CaveId::new(),
            "2026-03-01".to_string(),
            "colissimo".to_string(),
            Address::new("Claire Moreau", "12 rue des Lilas", None, "Lyon", "69003", "FR")
                .unwrap(),
            3,
            vec![ShipmentItem::single(WineId::new())],
        );
        h.store.insert_shipment(shipment.clone()).await;

        let error = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: shipment.id,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::TrackingNotFound);
        assert!(h.carrier.track_requests().is_empty());
    }

    #[tokio::test]
    async fn missing_shipment_is_an_error() {
        let h = harness();

        let error = h
            .handler
            .handle(RefreshTrackingCommand {
                shipment_id: ShipmentId::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::ShipmentNotFound);
    }
}
