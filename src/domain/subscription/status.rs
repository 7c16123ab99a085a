//! Subscription status state machine.
//!
//! Defines all possible subscription states and valid transitions
//! according to the billing lifecycle.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Subscription status.
///
/// Represents the current state of a member's cave subscription in the
/// billing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Checkout started but first payment not yet confirmed.
    /// No shipments until payment completes.
    Incomplete,

    /// Paid subscription receiving a shipment each billing cycle.
    Active,

    /// Renewal payment failed; the processor is retrying.
    /// No new shipments while past due.
    PastDue,

    /// Subscription ended. Terminal: no further shipments are
    /// generated and no event can leave this state.
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns true if this status allows new shipments to be created.
    ///
    /// Only active subscriptions are fulfilled. Incomplete has not paid,
    /// past due failed its renewal, and cancelled is terminal.
    pub fn is_fulfillable(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From INCOMPLETE
            (Incomplete, Active)
            // From ACTIVE
                | (Active, Active) // Renewal
                | (Active, PastDue)
                | (Active, Cancelled)
            // From PAST_DUE
                | (PastDue, Active)
                | (PastDue, Cancelled)
            // CANCELLED is terminal
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Incomplete => vec![Active],
            Active => vec![Active, PastDue, Cancelled],
            PastDue => vec![Active, Cancelled],
            Cancelled => vec![],
        }
    }
}
