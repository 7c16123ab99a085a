//! CreateShipmentHandler - Command handler for allocating a billing period's shipment.
//!
//! Called by the webhook pipeline after a paid invoice advances a
//! subscription's period, and by the manual trigger endpoint when
//! operations re-runs fulfillment. Allocation and the carrier label are
//! two separate phases: the allocation commits atomically in the store,
//! then the label is best-effort. A carrier outage never rolls back
//! bottles that were already set aside for the member.

use std::sync::Arc;

use crate::domain::foundation::{Address, DomainError, ErrorCode, SubscriptionId};
use crate::domain::fulfillment::{AllocationOrder, Shipment};
use crate::ports::{
    AllocationOutcome, CarrierRegistry, FulfillmentStore, LabelRequest, NewShipment, Package,
    ServiceLevel, SubscriptionRepository,
};

/// Fulfillment policy resolved from configuration at startup.
///
/// Bundles the knobs every shipment shares so handlers do not take a
/// half dozen loose parameters.
#[derive(Debug, Clone)]
pub struct FulfillmentPolicy {
    /// Carrier used when the command does not name one.
    pub default_carrier: String,

    /// Which end of the catalogue boxes draw from.
    pub allocation_order: AllocationOrder,

    /// Shipping speed purchased for member deliveries.
    pub service_level: ServiceLevel,

    /// Warehouse address parcels originate from.
    pub warehouse: Address,
}

/// Command to create the shipment for a subscription's current billing period.
#[derive(Debug, Clone)]
pub struct CreateShipmentCommand {
    pub subscription_id: SubscriptionId,

    /// Overrides the configured default carrier when set.
    pub carrier: Option<String>,
}

/// Result of a shipment creation attempt.
#[derive(Debug, Clone)]
pub struct CreateShipmentResult {
    pub shipment: Shipment,

    /// False when the billing period already had its shipment.
    pub created: bool,

    /// True when a label was attached during this call.
    pub labeled: bool,
}

/// Handler for creating shipments.
pub struct CreateShipmentHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    store: Arc<dyn FulfillmentStore>,
    carriers: Arc<CarrierRegistry>,
    policy: FulfillmentPolicy,
}

impl CreateShipmentHandler {
    /// Create a new handler with its dependencies.
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        store: Arc<dyn FulfillmentStore>,
        carriers: Arc<CarrierRegistry>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            subscriptions,
            store,
            carriers,
            policy,
        }
    }

    /// Allocate and (best-effort) label the shipment for the
    /// subscription's current billing period.
    ///
    /// Idempotent per billing period: a repeat call returns the existing
    /// shipment without spending stock or contacting the carrier again.
    pub async fn handle(
        &self,
        command: CreateShipmentCommand,
    ) -> Result<CreateShipmentResult, DomainError> {
        // 1. Load the subscription and check it can receive shipments
        let subscription = self
            .subscriptions
            .find_by_id(&command.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", command.subscription_id.to_string())
            })?;

        if !subscription.is_fulfillable() {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotActive,
                "Only active subscriptions receive shipments",
            )
            .with_detail("subscription_id", subscription.id.to_string())
            .with_detail("status", format!("{:?}", subscription.status)));
        }

        // 2. Resolve the carrier before touching stock; an unknown name
        //    must fail without allocating anything
        let carrier_name = command
            .carrier
            .unwrap_or_else(|| self.policy.default_carrier.clone());
        let carrier = self.carriers.get(&carrier_name)?;

        // 3. Allocate bottles and persist the shipment atomically
        let outcome = self
            .store
            .allocate_shipment(NewShipment {
                subscription_id: subscription.id,
                cave_id: subscription.cave_id,
                billing_period: subscription.billing_period_key(),
                carrier: carrier_name,
                destination: subscription.delivery_address.clone(),
                requested_bottles: subscription.tier.bottles_per_cycle(),
                allocation_order: self.policy.allocation_order,
            })
            .await?;

        let mut shipment = match outcome {
            AllocationOutcome::AlreadyExists(shipment) => {
                tracing::debug!(
                    shipment_id = %shipment.id,
                    billing_period = %shipment.billing_period,
                    "billing period already has its shipment"
                );
                let labeled = shipment.has_label();
                return Ok(CreateShipmentResult {
                    shipment,
                    created: false,
                    labeled,
                });
            }
            AllocationOutcome::Created(shipment) => shipment,
        };

        // 4. Best-effort label; carrier failure leaves the shipment pending
        if shipment.items.is_empty() {
            tracing::warn!(
                shipment_id = %shipment.id,
                cave_id = %shipment.cave_id,
                "no bottles in stock; shipment created empty and left pending"
            );
            return Ok(CreateShipmentResult {
                shipment,
                created: true,
                labeled: false,
            });
        }

        if shipment.is_under_fulfilled() {
            tracing::warn!(
                shipment_id = %shipment.id,
                requested = shipment.requested_bottles,
                allocated = shipment.allocated_bottles(),
                "cave stock could not fill the box; shipment is under-fulfilled"
            );
        }

        let request = LabelRequest {
            from: self.policy.warehouse.clone(),
            to: shipment.destination.clone(),
            packages: Package::for_bottle_count(shipment.allocated_bottles()),
            service_level: self.policy.service_level,
            reference: shipment.id.to_string(),
        };

        let labeled = match carrier.generate_label(request).await {
            Ok(label) => {
                shipment.attach_label(
                    label.tracking_number,
                    label.label_url,
                    label.cost_cents,
                    label.estimated_delivery,
                )?;
                self.store.update(&shipment).await?;
                true
            }
            Err(error) => {
                tracing::warn!(
                    shipment_id = %shipment.id,
                    carrier = %shipment.carrier,
                    error = %error,
                    "label generation failed; shipment stays pending for retry"
                );
                false
            }
        };

        Ok(CreateShipmentResult {
            shipment,
            created: true,
            labeled,
        })
    }
}
