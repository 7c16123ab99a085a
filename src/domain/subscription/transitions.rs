//! Lifecycle transition table.
//!
//! The subscription lifecycle is driven by a single data structure: each
//! row maps a (current status, billing event kind) pair to the next
//! status and the side effect the caller applies. Any pair absent from
//! the table is a logged no-op, so adding a lifecycle rule means adding
//! a row here, not a branch in a handler.

use crate::domain::billing::BillingEventKind;

use super::status::SubscriptionStatus;

/// Side effect the caller applies after a transition commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// First successful payment: start the initial billing period and
    /// stamp the payment date.
    StartFirstPeriod,
    /// Renewal payment: advance the billing period, stamp the payment
    /// date, and trigger fulfillment for the new period.
    AdvancePeriodAndFulfill,
    /// Status change only.
    None,
    /// Subscription ended: stamp the end date.
    CloseOut,
}

/// One row of the lifecycle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Status the subscription must currently be in.
    pub current: SubscriptionStatus,
    /// Billing event kind that triggers the row.
    pub on: BillingEventKind,
    /// Status after the transition.
    pub next: SubscriptionStatus,
    /// Side effect the caller applies.
    pub effect: TransitionEffect,
}

/// The complete lifecycle table.
///
/// Cancelled has no outgoing rows: it is terminal.
pub const LIFECYCLE_TABLE: &[TransitionRule] = &[
    TransitionRule {
        current: SubscriptionStatus::Incomplete,
        on: BillingEventKind::CheckoutCompleted,
        next: SubscriptionStatus::Active,
        effect: TransitionEffect::StartFirstPeriod,
    },
    TransitionRule {
        current: SubscriptionStatus::Active,
        on: BillingEventKind::InvoicePaid,
        next: SubscriptionStatus::Active,
        effect: TransitionEffect::AdvancePeriodAndFulfill,
    },
    TransitionRule {
        current: SubscriptionStatus::Active,
        on: BillingEventKind::InvoicePaymentFailed,
        next: SubscriptionStatus::PastDue,
        effect: TransitionEffect::None,
    },
    TransitionRule {
        current: SubscriptionStatus::PastDue,
        on: BillingEventKind::InvoicePaid,
        next: SubscriptionStatus::Active,
        effect: TransitionEffect::AdvancePeriodAndFulfill,
    },
    TransitionRule {
        current: SubscriptionStatus::Active,
        on: BillingEventKind::SubscriptionDeleted,
        next: SubscriptionStatus::Cancelled,
        effect: TransitionEffect::CloseOut,
    },
    TransitionRule {
        current: SubscriptionStatus::PastDue,
        on: BillingEventKind::SubscriptionDeleted,
        next: SubscriptionStatus::Cancelled,
        effect: TransitionEffect::CloseOut,
    },
];

/// Looks up the rule for a (status, event) pair.
///
/// Returns `None` when the pair is not modeled; callers treat that as
/// a no-op and acknowledge the event without changing state.
pub fn resolve(
    current: SubscriptionStatus,
    on: BillingEventKind,
) -> Option<&'static TransitionRule> {
    LIFECYCLE_TABLE
        .iter()
        .find(|rule| rule.current == current && rule.on == on)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StateMachine;

    const ALL_STATUSES: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Incomplete,
        SubscriptionStatus::Active,
        SubscriptionStatus::PastDue,
        SubscriptionStatus::Cancelled,
    ];

    // ══════════════════════════════════════════════════════════════
    // Table Row Resolution Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn checkout_completed_activates_incomplete() {
        let rule = resolve(
            SubscriptionStatus::Incomplete,
            BillingEventKind::CheckoutCompleted,
        )
        .unwrap();

        assert_eq!(rule.next, SubscriptionStatus::Active);
        assert_eq!(rule.effect, TransitionEffect::StartFirstPeriod);
    }

    #[test]
    fn invoice_paid_renews_active() {
        let rule = resolve(SubscriptionStatus::Active, BillingEventKind::InvoicePaid).unwrap();

        assert_eq!(rule.next, SubscriptionStatus::Active);
        assert_eq!(rule.effect, TransitionEffect::AdvancePeriodAndFulfill);
    }

    #[test]
    fn invoice_paid_recovers_past_due() {
        let rule = resolve(SubscriptionStatus::PastDue, BillingEventKind::InvoicePaid).unwrap();

        assert_eq!(rule.next, SubscriptionStatus::Active);
        assert_eq!(rule.effect, TransitionEffect::AdvancePeriodAndFulfill);
    }

    #[test]
    fn payment_failure_marks_past_due() {
        let rule = resolve(
            SubscriptionStatus::Active,
            BillingEventKind::InvoicePaymentFailed,
        )
        .unwrap();

        assert_eq!(rule.next, SubscriptionStatus::PastDue);
        assert_eq!(rule.effect, TransitionEffect::None);
    }

    #[test]
    fn deletion_cancels_active_and_past_due() {
        for current in [SubscriptionStatus::Active, SubscriptionStatus::PastDue] {
            let rule = resolve(current, BillingEventKind::SubscriptionDeleted).unwrap();
            assert_eq!(rule.next, SubscriptionStatus::Cancelled);
            assert_eq!(rule.effect, TransitionEffect::CloseOut);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // No-op Pair Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn cancelled_has_no_outgoing_rows() {
        for kind in BillingEventKind::MODELED {
            assert!(
                resolve(SubscriptionStatus::Cancelled, kind).is_none(),
                "cancelled must ignore {:?}",
                kind
            );
        }
    }

    #[test]
    fn invoice_paid_on_cancelled_is_noop() {
        assert!(resolve(SubscriptionStatus::Cancelled, BillingEventKind::InvoicePaid).is_none());
    }

    #[test]
    fn payment_failure_on_incomplete_is_noop() {
        assert!(resolve(
            SubscriptionStatus::Incomplete,
            BillingEventKind::InvoicePaymentFailed
        )
        .is_none());
    }

    #[test]
    fn deletion_on_incomplete_is_noop() {
        assert!(resolve(
            SubscriptionStatus::Incomplete,
            BillingEventKind::SubscriptionDeleted
        )
        .is_none());
    }

    #[test]
    fn unknown_kind_is_noop_from_every_status() {
        for status in ALL_STATUSES {
            assert!(resolve(status, BillingEventKind::Unknown).is_none());
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Table Consistency Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn every_row_is_a_legal_status_transition() {
        for rule in LIFECYCLE_TABLE {
            assert!(
                rule.current.can_transition_to(&rule.next),
                "table row {:?} -> {:?} contradicts the status machine",
                rule.current,
                rule.next
            );
        }
    }

    #[test]
    fn table_has_no_duplicate_pairs() {
        for (i, a) in LIFECYCLE_TABLE.iter().enumerate() {
            for b in &LIFECYCLE_TABLE[i + 1..] {
                assert!(
                    !(a.current == b.current && a.on == b.on),
                    "duplicate table pair ({:?}, {:?})",
                    a.current,
                    a.on
                );
            }
        }
    }

    #[test]
    fn every_pair_resolves_to_row_or_noop() {
        // Closure: no (status, kind) combination panics or falls through.
        for status in ALL_STATUSES {
            for kind in BillingEventKind::MODELED {
                let resolved = resolve(status, kind);
                if let Some(rule) = resolved {
                    assert_eq!(rule.current, status);
                    assert_eq!(rule.on, kind);
                }
            }
        }
    }

    #[test]
    fn fulfillment_only_triggers_on_invoice_paid() {
        for rule in LIFECYCLE_TABLE {
            if rule.effect == TransitionEffect::AdvancePeriodAndFulfill {
                assert_eq!(rule.on, BillingEventKind::InvoicePaid);
            }
        }
    }
}
