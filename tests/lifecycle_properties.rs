//! Property-based tests for the subscription lifecycle table and the
//! wine allocation policy.
//!
//! Both are pure functions the rest of the platform leans on: webhook
//! redelivery is only safe because `resolve` answers every (status,
//! event) pair without panicking, and concurrent fulfillment is only
//! safe because selection is deterministic and never picks a wine
//! twice. proptest drives them across randomly generated statuses,
//! event kinds and catalogues.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use uuid::Uuid;

use vinecellar::domain::billing::BillingEventKind;
use vinecellar::domain::foundation::{CaveId, StateMachine, Timestamp, WineId};
use vinecellar::domain::fulfillment::{select_for_allocation, AllocationOrder, Wine};
use vinecellar::domain::subscription::{resolve, SubscriptionStatus, LIFECYCLE_TABLE};

// =============================================================================
// Strategies
// =============================================================================

fn status_strategy() -> impl Strategy<Value = SubscriptionStatus> {
    prop_oneof![
        Just(SubscriptionStatus::Incomplete),
        Just(SubscriptionStatus::Active),
        Just(SubscriptionStatus::PastDue),
        Just(SubscriptionStatus::Cancelled),
    ]
}

fn event_kind_strategy() -> impl Strategy<Value = BillingEventKind> {
    prop_oneof![
        Just(BillingEventKind::CheckoutCompleted),
        Just(BillingEventKind::InvoicePaid),
        Just(BillingEventKind::InvoicePaymentFailed),
        Just(BillingEventKind::SubscriptionDeleted),
        Just(BillingEventKind::Unknown),
    ]
}

fn order_strategy() -> impl Strategy<Value = AllocationOrder> {
    prop::bool::ANY.prop_map(|newest| {
        if newest {
            AllocationOrder::NewestFirst
        } else {
            AllocationOrder::OldestFirst
        }
    })
}

/// A catalogue of up to a dozen wines with random stock levels (zero
/// included) and random ages, all in one cave.
fn catalogue_strategy() -> impl Strategy<Value = Vec<Wine>> {
    prop::collection::vec((0i32..=9, 0i64..=400), 0..12).prop_map(|entries| {
        let cave_id = CaveId::from_uuid(Uuid::from_bytes([0xCA; 16]));
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (stock, age_days))| Wine {
                id: WineId::from_uuid(Uuid::from_bytes([index as u8 + 1; 16])),
                cave_id,
                name: format!("Cuvée {}", index + 1),
                vintage: Some(2020),
                stock_quantity: stock,
                added_at: Timestamp::now().minus_days(age_days),
            })
            .collect()
    })
}

fn wines_by_id(catalogue: &[Wine]) -> HashMap<WineId, &Wine> {
    catalogue.iter().map(|wine| (wine.id, wine)).collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Any (status, event) pair resolves to a table row consistent with
    /// the status machine, or to a no-op. No pair panics, so a
    /// redelivered event can always be acknowledged.
    #[test]
    fn every_status_event_pair_resolves_or_noops(
        status in status_strategy(),
        kind in event_kind_strategy(),
    ) {
        if let Some(rule) = resolve(status, kind) {
            prop_assert_eq!(rule.current, status);
            prop_assert_eq!(rule.on, kind);
            prop_assert!(
                rule.current.can_transition_to(&rule.next),
                "table row {:?} -> {:?} contradicts the status machine",
                rule.current,
                rule.next
            );
        }
    }

    /// Cancelled is terminal: no event kind moves a subscription out of
    /// it, so a closed membership can never silently revive.
    #[test]
    fn cancelled_never_transitions(kind in event_kind_strategy()) {
        prop_assert!(resolve(SubscriptionStatus::Cancelled, kind).is_none());
    }

    /// Selection is a pure function of its inputs: the same catalogue,
    /// bottle count and order always produce the same picks.
    #[test]
    fn selection_is_deterministic(
        catalogue in catalogue_strategy(),
        bottles in 0u32..=8,
        order in order_strategy(),
    ) {
        let first = select_for_allocation(&catalogue, bottles, order);
        let second = select_for_allocation(&catalogue, bottles, order);

        prop_assert_eq!(first, second);
    }

    /// The order wines happen to be listed in must not leak into the
    /// selection; only age and id decide.
    #[test]
    fn selection_ignores_catalogue_input_order(
        catalogue in catalogue_strategy(),
        bottles in 0u32..=8,
        order in order_strategy(),
    ) {
        let mut reversed = catalogue.clone();
        reversed.reverse();

        prop_assert_eq!(
            select_for_allocation(&catalogue, bottles, order),
            select_for_allocation(&reversed, bottles, order)
        );
    }

    /// Consecutive picks respect the configured order: newest-first
    /// never ships an older wine before a newer one, and vice versa.
    #[test]
    fn selection_respects_the_configured_order(
        catalogue in catalogue_strategy(),
        bottles in 0u32..=8,
        order in order_strategy(),
    ) {
        let selected = select_for_allocation(&catalogue, bottles, order);
        let by_id = wines_by_id(&catalogue);

        for pair in selected.windows(2) {
            let first = by_id[&pair[0]];
            let second = by_id[&pair[1]];
            match order {
                AllocationOrder::NewestFirst => prop_assert!(
                    first.added_at >= second.added_at,
                    "newest-first shipped {:?} before the newer {:?}",
                    first.added_at,
                    second.added_at
                ),
                AllocationOrder::OldestFirst => prop_assert!(
                    first.added_at <= second.added_at,
                    "oldest-first shipped {:?} before the older {:?}",
                    first.added_at,
                    second.added_at
                ),
            }
        }
    }
}

/// The no-oversell invariant gets a deeper run: whatever the catalogue,
/// a box never contains more bottles than requested, never a wine
/// without stock, and never the same wine twice.
mod exhaustive_allocation {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn selection_never_oversells(
            catalogue in catalogue_strategy(),
            bottles in 0u32..=8,
            order in order_strategy(),
        ) {
            let selected = select_for_allocation(&catalogue, bottles, order);
            let by_id = wines_by_id(&catalogue);
            let in_stock = catalogue.iter().filter(|w| w.in_stock()).count();

            // Exactly as many distinct wines as stock and the request allow.
            prop_assert_eq!(selected.len(), (bottles as usize).min(in_stock));

            let mut seen = HashSet::new();
            for id in &selected {
                prop_assert!(seen.insert(*id), "wine {:?} was selected twice", id);
                let wine = by_id.get(id);
                prop_assert!(wine.is_some(), "selected {:?} is not in the catalogue", id);
                prop_assert!(
                    wine.is_some_and(|w| w.in_stock()),
                    "selected {:?} has no stock",
                    id
                );
            }
        }
    }
}

// =============================================================================
// Table Reachability
// =============================================================================

/// Once a subscription leaves Incomplete it can never re-activate via
/// checkout: no status the table can land on accepts CheckoutCompleted.
#[test]
fn activation_is_unreachable_after_leaving_incomplete() {
    for rule in LIFECYCLE_TABLE {
        assert!(
            resolve(rule.next, BillingEventKind::CheckoutCompleted).is_none(),
            "{:?} must not accept a second checkout",
            rule.next
        );
    }
}
