//! Subscription aggregate entity.
//!
//! The Subscription aggregate represents one member's recurring box from
//! one cave. A member can hold several subscriptions (different caves);
//! each billing cycle of an active subscription yields one shipment.
//!
//! # Design Decisions
//!
//! - **Processor-linked**: the billing processor owns payment state; this
//!   aggregate mirrors it through webhook-driven transitions only
//! - **Period from the invoice**: billing period bounds come from the
//!   processor's invoice, never computed locally
//! - **Cancellation is a request**: `cancel_at_period_end` records intent;
//!   the cancelled status lands with the processor's deletion event

use crate::domain::foundation::{
    Address, CaveId, DomainError, ErrorCode, MemberId, SubscriptionId, Timestamp,
};
use serde::{Deserialize, Serialize};

use super::{SubscriptionStatus, SubscriptionTier};

/// Subscription aggregate - one member's recurring box from one cave.
///
/// # Invariants
///
/// - `id` is globally unique
/// - Status transitions follow state machine rules
/// - Period dates: `current_period_start <= current_period_end`
/// - `ended_at` is set exactly when status is cancelled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub id: SubscriptionId,

    /// Member who owns this subscription.
    pub member_id: MemberId,

    /// Cave whose wines ship each cycle.
    pub cave_id: CaveId,

    /// Tier determining bottles per cycle.
    pub tier: SubscriptionTier,

    /// Current status in the billing lifecycle.
    pub status: SubscriptionStatus,

    /// Where each cycle's box ships.
    pub delivery_address: Address,

    /// Start of current billing period.
    pub current_period_start: Timestamp,

    /// End of current billing period.
    pub current_period_end: Timestamp,

    /// Member asked to stop renewing; status flips when the processor
    /// confirms the deletion.
    pub cancel_at_period_end: bool,

    /// Billing processor customer ID (cus_xxx).
    pub billing_customer_id: Option<String>,

    /// Billing processor subscription ID (sub_xxx), set once checkout
    /// completes.
    pub billing_subscription_id: Option<String>,

    /// When the last successful payment landed.
    pub date_paid: Option<Timestamp>,

    /// When the subscription ended (cancelled only).
    pub ended_at: Option<Timestamp>,

    /// When the subscription was created.
    pub created_at: Timestamp,

    /// When the subscription was last updated.
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Create a subscription awaiting its first payment.
    ///
    /// Created when the member starts checkout; stays incomplete until
    /// the processor confirms the session completed.
    pub fn create_incomplete(
        id: SubscriptionId,
        member_id: MemberId,
        cave_id: CaveId,
        tier: SubscriptionTier,
        delivery_address: Address,
        billing_customer_id: Option<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            member_id,
            cave_id,
            tier,
            status: SubscriptionStatus::Incomplete,
            delivery_address,
            current_period_start: now,
            current_period_end: now, // Set when the first payment is confirmed
            cancel_at_period_end: false,
            billing_customer_id,
            billing_subscription_id: None,
            date_paid: None,
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Activate after the first payment confirmed via checkout.
    ///
    /// Stores the processor's subscription id and opens the first
    /// billing period.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is not allowed or the period
    /// bounds are inverted.
    pub fn activate(
        &mut self,
        period_start: Timestamp,
        period_end: Timestamp,
        paid_at: Timestamp,
        billing_subscription_id: Option<String>,
    ) -> Result<(), DomainError> {
        Self::check_period(period_start, period_end)?;
        self.transition_to(SubscriptionStatus::Active)?;
        self.current_period_start = period_start;
        self.current_period_end = period_end;
        self.date_paid = Some(paid_at);
        if let Some(sub_id) = billing_subscription_id {
            self.billing_subscription_id = Some(sub_id);
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Advance the billing period after a paid renewal invoice.
    ///
    /// Also recovers a past-due subscription once the retry succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is not allowed or the period
    /// bounds are inverted.
    pub fn renew(
        &mut self,
        period_start: Timestamp,
        period_end: Timestamp,
        paid_at: Timestamp,
    ) -> Result<(), DomainError> {
        Self::check_period(period_start, period_end)?;
        self.transition_to(SubscriptionStatus::Active)?;
        self.current_period_start = period_start;
        self.current_period_end = period_end;
        self.date_paid = Some(paid_at);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Mark payment as past due (failed but the processor is retrying).
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn mark_past_due(&mut self) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::PastDue)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Close out the subscription after the processor deleted it.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn close_out(&mut self, ended_at: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Cancelled)?;
        self.ended_at = Some(ended_at);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Record the member's request to stop renewing at period end.
    ///
    /// The status stays as-is; the cancelled status arrives with the
    /// processor's subscription-deleted event.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription has already ended or never
    /// activated.
    pub fn request_cancellation(&mut self) -> Result<(), DomainError> {
        match self.status {
            SubscriptionStatus::Active | SubscriptionStatus::PastDue => {
                self.cancel_at_period_end = true;
                self.updated_at = Timestamp::now();
                Ok(())
            }
            SubscriptionStatus::Cancelled => Err(DomainError::new(
                ErrorCode::SubscriptionCancelled,
                "Subscription already ended",
            )),
            SubscriptionStatus::Incomplete => Err(DomainError::new(
                ErrorCode::SubscriptionNotActive,
                "Subscription has not completed checkout",
            )),
        }
    }

    /// Returns true if new shipments may be created for this subscription.
    pub fn is_fulfillable(&self) -> bool {
        self.status.is_fulfillable()
    }

    /// Key identifying the billing period for shipment idempotency.
    ///
    /// One shipment exists per (subscription, billing period); the key is
    /// the period's start date.
    pub fn billing_period_key(&self) -> String {
        self.current_period_start
            .as_datetime()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn check_period(start: Timestamp, end: Timestamp) -> Result<(), DomainError> {
        if end.is_before(&start) {
            return Err(DomainError::validation(
                "current_period_end",
                "Billing period cannot end before it starts",
            ));
        }
        Ok(())
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        use crate::domain::foundation::StateMachine;

        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {:?} to {:?}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }
}
