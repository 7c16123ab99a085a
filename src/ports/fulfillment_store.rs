//! FulfillmentStore port - Interface for shipment and stock persistence.
//!
//! The store owns the one transactional step of fulfillment: selecting
//! wines, decrementing their stock, and inserting the shipment with its
//! items as a single atomic unit. Everything after that (labels,
//! tracking) is a plain aggregate update and never touches stock again.
//!
//! # Design
//!
//! - **Race-safe by key**: `(subscription_id, billing_period)` is unique;
//!   two concurrent allocations for one period resolve to one shipment
//! - **Guarded decrements**: stock is only taken under a lock / guard, so
//!   concurrent allocations for the same wine can never oversell
//! - **Tracking writes are last-write-wins** on event time; an older
//!   snapshot never replaces a newer one

use async_trait::async_trait;

use crate::domain::foundation::{Address, CaveId, DomainError, ShipmentId, SubscriptionId};
use crate::domain::fulfillment::{AllocationOrder, Shipment, TrackingInfo};

/// Everything needed to allocate one billing period's shipment.
#[derive(Debug, Clone)]
pub struct NewShipment {
    /// Subscription the shipment fulfills.
    pub subscription_id: SubscriptionId,

    /// Cave to draw wines from.
    pub cave_id: CaveId,

    /// Billing period key; unique together with `subscription_id`.
    pub billing_period: String,

    /// Carrier the label step will use.
    pub carrier: String,

    /// Delivery address snapshotted from the subscription.
    pub destination: Address,

    /// Bottles the tier calls for.
    pub requested_bottles: u32,

    /// Configured wine selection policy.
    pub allocation_order: AllocationOrder,
}

/// Result of an allocation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// A new shipment was allocated; stock was decremented.
    Created(Shipment),

    /// A shipment for this (subscription, billing period) already
    /// existed; nothing was allocated or decremented.
    AlreadyExists(Shipment),
}

impl AllocationOutcome {
    /// The shipment, whether freshly created or pre-existing.
    pub fn shipment(&self) -> &Shipment {
        match self {
            AllocationOutcome::Created(s) | AllocationOutcome::AlreadyExists(s) => s,
        }
    }

    /// Consumes the outcome, returning the shipment.
    pub fn into_shipment(self) -> Shipment {
        match self {
            AllocationOutcome::Created(s) | AllocationOutcome::AlreadyExists(s) => s,
        }
    }

    /// Returns true when this call performed the allocation.
    pub fn was_created(&self) -> bool {
        matches!(self, AllocationOutcome::Created(_))
    }
}

/// Port for shipment persistence and atomic stock allocation.
///
/// `allocate_shipment` implementations must:
/// 1. Return the existing shipment untouched when the billing-period key
///    is already taken (idempotent re-entry).
/// 2. Select wines under the same lock that decrements their stock, so a
///    decrement never drives `stock_quantity` below zero.
/// 3. On a key conflict detected at insert time (two racing calls), roll
///    back their decrements and return the winner's shipment.
#[async_trait]
pub trait FulfillmentStore: Send + Sync {
    /// Atomically allocate wines and create the shipment for one
    /// billing period, or return the shipment that already exists.
    async fn allocate_shipment(
        &self,
        new_shipment: NewShipment,
    ) -> Result<AllocationOutcome, DomainError>;

    /// Find a shipment by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &ShipmentId) -> Result<Option<Shipment>, DomainError>;

    /// Find the shipment for a subscription's billing period.
    ///
    /// Returns `None` if the period has not been fulfilled.
    async fn find_by_billing_period(
        &self,
        subscription_id: &SubscriptionId,
        billing_period: &str,
    ) -> Result<Option<Shipment>, DomainError>;

    /// Update an existing shipment (label fields, status, delivery).
    ///
    /// # Errors
    ///
    /// - `ShipmentNotFound` if the shipment doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, shipment: &Shipment) -> Result<(), DomainError>;

    /// Persist a tracking snapshot if it is fresher than what is stored.
    ///
    /// An equal-or-older snapshot is silently dropped; the stored state
    /// only ever moves forward in event time.
    async fn record_tracking(&self, info: &TrackingInfo) -> Result<(), DomainError>;

    /// Fetch the stored tracking snapshot for a tracking number.
    ///
    /// Returns `None` if no snapshot has been recorded.
    async fn get_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<TrackingInfo>, DomainError>;
}
