//! Reader ports (read side / CQRS queries).
//!
//! Read-only views served to external collaborators: member support
//! tooling, the cave dashboard, ops scripts. Nothing here mutates state;
//! the write side is driven exclusively by billing events and the
//! trigger operations.

use crate::domain::foundation::{
    Address, CaveId, DomainError, MemberId, ShipmentId, SubscriptionId, Timestamp, WineId,
};
use crate::domain::fulfillment::{Shipment, ShipmentStatus};
use crate::domain::subscription::{Subscription, SubscriptionStatus, SubscriptionTier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reader port for subscription queries.
#[async_trait]
pub trait SubscriptionReader: Send + Sync {
    /// Get the subscription view.
    ///
    /// Returns `None` if the subscription doesn't exist.
    async fn get_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<SubscriptionView>, DomainError>;
}

/// Reader port for shipment queries.
#[async_trait]
pub trait ShipmentReader: Send + Sync {
    /// List shipment views matching a filter, newest first.
    ///
    /// An empty filter lists everything; filter fields combine with AND.
    async fn list_shipments(
        &self,
        filter: ShipmentFilter,
    ) -> Result<Vec<ShipmentView>, DomainError>;
}

/// Criteria for shipment listings. All fields optional, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentFilter {
    /// Only shipments of this subscription.
    pub subscription_id: Option<SubscriptionId>,

    /// Only shipments drawing from this cave.
    pub cave_id: Option<CaveId>,

    /// Only shipments in this status.
    pub status: Option<ShipmentStatus>,
}

impl ShipmentFilter {
    /// Filter for one subscription's shipments.
    pub fn for_subscription(subscription_id: SubscriptionId) -> Self {
        Self {
            subscription_id: Some(subscription_id),
            ..Self::default()
        }
    }

    /// Returns true if a shipment matches every set criterion.
    pub fn matches(&self, shipment: &Shipment) -> bool {
        self.subscription_id
            .map_or(true, |id| shipment.subscription_id == id)
            && self.cave_id.map_or(true, |id| shipment.cave_id == id)
            && self.status.map_or(true, |s| shipment.status == s)
    }
}

/// Detailed view of a subscription for external readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionView {
    /// Subscription ID.
    pub id: SubscriptionId,

    /// Member who owns this subscription.
    pub member_id: MemberId,

    /// Cave whose wines ship each cycle.
    pub cave_id: CaveId,

    /// Subscription tier.
    pub tier: SubscriptionTier,

    /// Bottles each cycle ships at this tier.
    pub bottles_per_cycle: u32,

    /// Current status.
    pub status: SubscriptionStatus,

    /// Where boxes ship.
    pub delivery_address: Address,

    /// Start of the current billing period.
    pub current_period_start: Timestamp,

    /// End of the current billing period.
    pub current_period_end: Timestamp,

    /// Member asked to stop renewing at period end.
    pub cancel_at_period_end: bool,

    /// When the last successful payment landed.
    pub date_paid: Option<Timestamp>,

    /// When the subscription ended (cancelled only).
    pub ended_at: Option<Timestamp>,

    /// When the subscription was created.
    pub created_at: Timestamp,
}

impl From<&Subscription> for SubscriptionView {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id,
            member_id: subscription.member_id,
            cave_id: subscription.cave_id,
            tier: subscription.tier,
            bottles_per_cycle: subscription.tier.bottles_per_cycle(),
            status: subscription.status,
            delivery_address: subscription.delivery_address.clone(),
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
            date_paid: subscription.date_paid,
            ended_at: subscription.ended_at,
            created_at: subscription.created_at,
        }
    }
}

/// View of one allocated wine in a shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentItemView {
    /// Wine allocated to the shipment.
    pub wine_id: WineId,

    /// Bottles of this wine.
    pub quantity: u32,
}

/// Detailed view of a shipment for external readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentView {
    /// Shipment ID.
    pub id: ShipmentId,

    /// Subscription the shipment fulfills.
    pub subscription_id: SubscriptionId,

    /// Cave the wines came from.
    pub cave_id: CaveId,

    /// Billing period key.
    pub billing_period: String,

    /// Current fulfillment status.
    pub status: ShipmentStatus,

    /// Carrier handling the box.
    pub carrier: String,

    /// Bottles the tier called for.
    pub requested_bottles: u32,

    /// Bottles actually allocated.
    pub allocated_bottles: u32,

    /// True when stock ran short of the tier's count.
    pub under_fulfilled: bool,

    /// Allocated wines.
    pub items: Vec<ShipmentItemView>,

    /// Carrier tracking number, once labeled.
    pub tracking_number: Option<String>,

    /// Printable label URL.
    pub label_url: Option<String>,

    /// Carrier's delivery estimate.
    pub estimated_delivery: Option<Timestamp>,

    /// When the carrier confirmed delivery.
    pub delivered_at: Option<Timestamp>,

    /// When the shipment was allocated.
    pub created_at: Timestamp,
}

impl From<&Shipment> for ShipmentView {
    fn from(shipment: &Shipment) -> Self {
        Self {
            id: shipment.id,
            subscription_id: shipment.subscription_id,
            cave_id: shipment.cave_id,
            billing_period: shipment.billing_period.clone(),
            status: shipment.status,
            carrier: shipment.carrier.clone(),
            requested_bottles: shipment.requested_bottles,
            allocated_bottles: shipment.allocated_bottles(),
            under_fulfilled: shipment.is_under_fulfilled(),
            items: shipment
                .items
                .iter()
                .map(|item| ShipmentItemView {
                    wine_id: item.wine_id,
                    quantity: item.quantity,
                })
                .collect(),
            tracking_number: shipment.tracking_number.clone(),
            label_url: shipment.label_url.clone(),
            estimated_delivery: shipment.estimated_delivery,
            delivered_at: shipment.delivered_at,
            created_at: shipment.created_at,
        }
    }
}
