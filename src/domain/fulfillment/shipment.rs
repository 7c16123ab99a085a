//! Shipment aggregate entity.
//!
//! One shipment per (subscription, billing period): the physical box a
//! paid cycle produces. Items and the stock they consumed are written in
//! the same unit of work; label and tracking data arrive best-effort
//! afterwards and never undo the allocation.

use crate::domain::foundation::{
    Address, CaveId, DomainError, ErrorCode, ShipmentId, StateMachine, SubscriptionId, Timestamp,
    WineId,
};
use serde::{Deserialize, Serialize};

/// Shipment status.
///
/// `Pending` covers everything between allocation and a successful label;
/// a shipment whose label request failed stays pending and retries later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Allocated; awaiting a carrier label.
    Pending,

    /// Label generated, box handed to the carrier.
    Shipped,

    /// Carrier confirmed delivery. Terminal.
    Delivered,

    /// Lost, returned, or label permanently refused. Terminal.
    Failed,
}

impl StateMachine for ShipmentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, target),
            (Pending, Shipped) | (Pending, Failed) | (Shipped, Delivered) | (Shipped, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ShipmentStatus::*;
        match self {
            Pending => vec![Shipped, Failed],
            Shipped => vec![Delivered, Failed],
            Delivered => vec![],
            Failed => vec![],
        }
    }
}

/// One line of a shipment: a single wine and how many bottles of it.
///
/// The selection policy allocates distinct wines at one bottle each, so
/// `quantity` is 1 today; it is stored rather than assumed so historical
/// shipments stay readable if the policy ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    /// Wine allocated to this shipment.
    pub wine_id: WineId,

    /// Bottles of this wine in the box.
    pub quantity: u32,
}

impl ShipmentItem {
    /// Creates a one-bottle item for a wine.
    pub fn single(wine_id: WineId) -> Self {
        Self {
            wine_id,
            quantity: 1,
        }
    }
}

/// Shipment aggregate - the box one billing period produces.
///
/// # Invariants
///
/// - `(subscription_id, billing_period)` is unique across all shipments
/// - Status transitions follow state machine rules
/// - `tracking_number` is set exactly when status has passed `Pending`
///   via a label (failures may leave it unset)
/// - `delivered_at` is set exactly when status is `Delivered`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    /// Unique identifier for this shipment.
    pub id: ShipmentId,

    /// Subscription this shipment fulfills.
    pub subscription_id: SubscriptionId,

    /// Cave the wines were drawn from.
    pub cave_id: CaveId,

    /// Billing period key, the period's start date as `YYYY-MM-DD`.
    /// Unique together with `subscription_id`.
    pub billing_period: String,

    /// Current fulfillment status.
    pub status: ShipmentStatus,

    /// Carrier chosen for this shipment.
    pub carrier: String,

    /// Where the box ships, snapshotted from the subscription at
    /// allocation time.
    pub destination: Address,

    /// Bottles the tier called for this cycle.
    pub requested_bottles: u32,

    /// Allocated wines. May be shorter than `requested_bottles` when
    /// stock ran short.
    pub items: Vec<ShipmentItem>,

    /// Carrier tracking number, once a label exists.
    pub tracking_number: Option<String>,

    /// Printable label URL from the carrier.
    pub label_url: Option<String>,

    /// What the label cost, in cents.
    pub shipping_cost_cents: Option<i64>,

    /// Carrier's delivery estimate.
    pub estimated_delivery: Option<Timestamp>,

    /// When the carrier confirmed delivery.
    pub delivered_at: Option<Timestamp>,

    /// When the shipment was allocated.
    pub created_at: Timestamp,

    /// When the shipment was last updated.
    pub updated_at: Timestamp,
}

impl Shipment {
    /// Allocate a new pending shipment.
    ///
    /// Items may number fewer than `requested_bottles`; the shortfall is
    /// visible through [`Shipment::is_under_fulfilled`] and reported by
    /// the caller, never treated as fatal.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        id: ShipmentId,
        subscription_id: SubscriptionId,
        cave_id: CaveId,
        billing_period: String,
        carrier: String,
        destination: Address,
        requested_bottles: u32,
        items: Vec<ShipmentItem>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            subscription_id,
            cave_id,
            billing_period,
            status: ShipmentStatus::Pending,
            carrier,
            destination,
            requested_bottles,
            items,
            tracking_number: None,
            label_url: None,
            shipping_cost_cents: None,
            estimated_delivery: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a generated label and hand the box to the carrier.
    ///
    /// # Errors
    ///
    /// Returns error if the shipment is not pending.
    pub fn attach_label(
        &mut self,
        tracking_number: String,
        label_url: String,
        shipping_cost_cents: i64,
        estimated_delivery: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        self.transition_to(ShipmentStatus::Shipped)?;
        self.tracking_number = Some(tracking_number);
        self.label_url = Some(label_url);
        self.shipping_cost_cents = Some(shipping_cost_cents);
        self.estimated_delivery = estimated_delivery;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Record carrier-confirmed delivery.
    ///
    /// # Errors
    ///
    /// Returns error if the shipment has not shipped.
    pub fn record_delivery(&mut self, delivered_at: Timestamp) -> Result<(), DomainError> {
        self.transition_to(ShipmentStatus::Delivered)?;
        self.delivered_at = Some(delivered_at);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Mark the shipment permanently failed.
    ///
    /// # Errors
    ///
    /// Returns error if the shipment already reached a terminal status.
    pub fn mark_failed(&mut self) -> Result<(), DomainError> {
        self.transition_to(ShipmentStatus::Failed)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Returns true if a carrier label has already been generated.
    pub fn has_label(&self) -> bool {
        self.tracking_number.is_some()
    }

    /// Returns true if stock ran short of the tier's bottle count.
    pub fn is_under_fulfilled(&self) -> bool {
        self.allocated_bottles() < self.requested_bottles
    }

    /// Total bottles actually in the box.
    pub fn allocated_bottles(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: ShipmentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition shipment from {:?} to {:?}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_destination() -> Address {
        Address::new(
            "Marie Dubois",
            "12 rue des Vignes",
            None,
            "Lyon",
            "69002",
            "FR",
        )
        .unwrap()
    }

    fn test_items(count: usize) -> Vec<ShipmentItem> {
        (0..count)
            .map(|i| ShipmentItem::single(WineId::from_uuid(Uuid::from_bytes([i as u8 + 1; 16]))))
            .collect()
    }

    fn pending_shipment(requested: u32, allocated: usize) -> Shipment {
        Shipment::allocate(
            ShipmentId::new(),
            SubscriptionId::new(),
            CaveId::new(),
            "2026-03-01".to_string(),
            "colissimo".to_string(),
            test_destination(),
            requested,
            test_items(allocated),
        )
    }

    fn shipped_shipment() -> Shipment {
        let mut shipment = pending_shipment(3, 3);
        shipment
            .attach_label(
                "CP123456789FR".to_string(),
                "https://labels.example.test/CP123456789FR.pdf".to_string(),
                895,
                Some(Timestamp::now().add_days(3)),
            )
            .unwrap();
        shipment
    }

    // ══════════════════════════════════════════════════════════════
    // Status Machine Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn pending_can_ship_or_fail() {
        let status = ShipmentStatus::Pending;
        assert!(status.can_transition_to(&ShipmentStatus::Shipped));
        assert!(status.can_transition_to(&ShipmentStatus::Failed));
        assert!(!status.can_transition_to(&ShipmentStatus::Delivered));
    }

    #[test]
    fn shipped_can_deliver_or_fail() {
        let status = ShipmentStatus::Shipped;
        assert!(status.can_transition_to(&ShipmentStatus::Delivered));
        assert!(status.can_transition_to(&ShipmentStatus::Failed));
        assert!(!status.can_transition_to(&ShipmentStatus::Pending));
    }

    #[test]
    fn delivered_and_failed_are_terminal() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Failed.is_terminal());
        assert!(!ShipmentStatus::Pending.is_terminal());
        assert!(!ShipmentStatus::Shipped.is_terminal());
    }

    // ══════════════════════════════════════════════════════════════
    // Allocation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn allocate_starts_pending_without_label() {
        let shipment = pending_shipment(3, 3);

        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert!(!shipment.has_label());
        assert!(shipment.tracking_number.is_none());
        assert!(shipment.delivered_at.is_none());
        assert_eq!(shipment.allocated_bottles(), 3);
        assert!(!shipment.is_under_fulfilled());
    }

    #[test]
    fn short_allocation_is_under_fulfilled() {
        let shipment = pending_shipment(6, 4);

        assert!(shipment.is_under_fulfilled());
        assert_eq!(shipment.allocated_bottles(), 4);
        assert_eq!(shipment.requested_bottles, 6);
    }

    #[test]
    fn empty_allocation_is_still_a_shipment() {
        let shipment = pending_shipment(3, 0);

        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert!(shipment.is_under_fulfilled());
        assert_eq!(shipment.allocated_bottles(), 0);
    }

    #[test]
    fn single_item_carries_one_bottle() {
        let item = ShipmentItem::single(WineId::new());
        assert_eq!(item.quantity, 1);
    }

    // ══════════════════════════════════════════════════════════════
    // Label Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn attach_label_moves_to_shipped() {
        let mut shipment = pending_shipment(3, 3);
        let eta = Timestamp::now().add_days(2);

        shipment
            .attach_label(
                "CP987654321FR".to_string(),
                "https://labels.example.test/x.pdf".to_string(),
                1095,
                Some(eta),
            )
            .unwrap();

        assert_eq!(shipment.status, ShipmentStatus::Shipped);
        assert!(shipment.has_label());
        assert_eq!(shipment.tracking_number.as_deref(), Some("CP987654321FR"));
        assert_eq!(shipment.shipping_cost_cents, Some(1095));
        assert_eq!(shipment.estimated_delivery, Some(eta));
    }

    #[test]
    fn attach_label_twice_fails() {
        let mut shipment = shipped_shipment();

        let result = shipment.attach_label(
            "CP000000000FR".to_string(),
            "https://labels.example.test/y.pdf".to_string(),
            500,
            None,
        );

        assert!(result.is_err());
        // First label survives
        assert_eq!(shipment.tracking_number.as_deref(), Some("CP123456789FR"));
    }

    // ══════════════════════════════════════════════════════════════
    // Delivery and Failure Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn record_delivery_stamps_date() {
        let mut shipment = shipped_shipment();
        let delivered_at = Timestamp::now();

        shipment.record_delivery(delivered_at).unwrap();

        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        assert_eq!(shipment.delivered_at, Some(delivered_at));
    }

    #[test]
    fn record_delivery_requires_shipped() {
        let mut shipment = pending_shipment(3, 3);

        let result = shipment.record_delivery(Timestamp::now());

        assert!(result.is_err());
        assert_eq!(shipment.status, ShipmentStatus::Pending);
    }

    #[test]
    fn mark_failed_from_pending() {
        let mut shipment = pending_shipment(3, 3);

        shipment.mark_failed().unwrap();

        assert_eq!(shipment.status, ShipmentStatus::Failed);
    }

    #[test]
    fn mark_failed_from_shipped() {
        let mut shipment = shipped_shipment();

        shipment.mark_failed().unwrap();

        assert_eq!(shipment.status, ShipmentStatus::Failed);
    }

    #[test]
    fn delivered_shipment_cannot_fail() {
        let mut shipment = shipped_shipment();
        shipment.record_delivery(Timestamp::now()).unwrap();

        let result = shipment.mark_failed();

        assert!(result.is_err());
        assert_eq!(shipment.status, ShipmentStatus::Delivered);
    }

    #[test]
    fn serde_uses_snake_case_status() {
        let json = serde_json::to_string(&ShipmentStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");

        let parsed: ShipmentStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, ShipmentStatus::Delivered);
    }
}
