//! Wine selection policy for shipment allocation.
//!
//! Picks which bottles go into a cycle's box. The policy is pure: storage
//! adapters apply the result under their own concurrency guard, so the
//! selection itself stays deterministic and unit-testable.

use crate::domain::foundation::{CaveId, Timestamp, WineId};
use serde::{Deserialize, Serialize};

/// A wine in a cave's catalogue, with its remaining stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wine {
    /// Unique identifier for this wine.
    pub id: WineId,

    /// Cave whose catalogue this wine belongs to.
    pub cave_id: CaveId,

    /// Display name (producer + cuvée).
    pub name: String,

    /// Vintage year, if the wine carries one.
    pub vintage: Option<i32>,

    /// Bottles remaining; never negative.
    pub stock_quantity: i32,

    /// When the cave added this wine to its catalogue.
    pub added_at: Timestamp,
}

impl Wine {
    /// Returns true if at least one bottle can be allocated.
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Which end of the catalogue boxes draw from.
///
/// `NewestFirst` showcases the cave's latest additions each cycle;
/// `OldestFirst` rotates older stock out. The choice lives in
/// configuration so operations can switch it without a deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationOrder {
    /// Most recently added wines ship first.
    NewestFirst,

    /// Oldest catalogue entries ship first.
    OldestFirst,
}

impl Default for AllocationOrder {
    fn default() -> Self {
        Self::NewestFirst
    }
}

/// Select up to `bottles` distinct wines for one shipment, one bottle each.
///
/// Only wines with stock participate. Ordering follows the configured
/// policy, with the wine id as a tiebreak so equal timestamps still
/// produce a stable result. Fewer than `bottles` wines in stock means a
/// shorter selection; callers flag the shipment under-fulfilled.
pub fn select_for_allocation(
    available: &[Wine],
    bottles: u32,
    order: AllocationOrder,
) -> Vec<WineId> {
    let mut candidates: Vec<&Wine> = available.iter().filter(|w| w.in_stock()).collect();

    candidates.sort_by(|a, b| {
        let by_age = match order {
            AllocationOrder::NewestFirst => b.added_at.cmp(&a.added_at),
            AllocationOrder::OldestFirst => a.added_at.cmp(&b.added_at),
        };
        by_age.then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
    });

    candidates
        .into_iter()
        .take(bottles as usize)
        .map(|w| w.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn wine(id_byte: u8, stock: i32, added_days_ago: i64) -> Wine {
        Wine {
            id: WineId::from_uuid(Uuid::from_bytes([id_byte; 16])),
            cave_id: CaveId::from_uuid(Uuid::from_bytes([0xCA; 16])),
            name: format!("Cuvée {}", id_byte),
            vintage: Some(2020),
            stock_quantity: stock,
            added_at: Timestamp::now().minus_days(added_days_ago),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Ordering tests
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn newest_first_prefers_recent_additions() {
        let catalogue = vec![wine(1, 10, 30), wine(2, 10, 1), wine(3, 10, 10)];

        let selected = select_for_allocation(&catalogue, 2, AllocationOrder::NewestFirst);

        assert_eq!(selected, vec![catalogue[1].id, catalogue[2].id]);
    }

    #[test]
    fn oldest_first_prefers_early_additions() {
        let catalogue = vec![wine(1, 10, 30), wine(2, 10, 1), wine(3, 10, 10)];

        let selected = select_for_allocation(&catalogue, 2, AllocationOrder::OldestFirst);

        assert_eq!(selected, vec![catalogue[0].id, catalogue[2].id]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let added = Timestamp::now();
        let mut a = wine(9, 5, 0);
        let mut b = wine(3, 5, 0);
        a.added_at = added;
        b.added_at = added;

        let first_order = select_for_allocation(&[a.clone(), b.clone()], 2, AllocationOrder::NewestFirst);
        let second_order = select_for_allocation(&[b.clone(), a.clone()], 2, AllocationOrder::NewestFirst);

        // Input order must not leak into the result.
        assert_eq!(first_order, second_order);
        assert_eq!(first_order, vec![b.id, a.id]);
    }

    // ───────────────────────────────────────────────────────────────
    // Stock filtering tests
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn out_of_stock_wines_are_skipped() {
        let catalogue = vec![wine(1, 0, 1), wine(2, 3, 10), wine(3, 0, 5)];

        let selected = select_for_allocation(&catalogue, 3, AllocationOrder::NewestFirst);

        assert_eq!(selected, vec![catalogue[1].id]);
    }

    #[test]
    fn short_catalogue_allocates_what_exists() {
        let catalogue = vec![wine(1, 2, 1), wine(2, 1, 2)];

        let selected = select_for_allocation(&catalogue, 6, AllocationOrder::NewestFirst);

        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn empty_catalogue_allocates_nothing() {
        let selected = select_for_allocation(&[], 3, AllocationOrder::NewestFirst);
        assert!(selected.is_empty());
    }

    #[test]
    fn selection_never_exceeds_requested_bottles() {
        let catalogue: Vec<Wine> = (1..=20).map(|i| wine(i, 10, i as i64)).collect();

        let selected = select_for_allocation(&catalogue, 12, AllocationOrder::NewestFirst);

        assert_eq!(selected.len(), 12);
    }

    #[test]
    fn each_wine_selected_at_most_once() {
        let catalogue = vec![wine(1, 100, 1), wine(2, 100, 2), wine(3, 100, 3)];

        let selected = select_for_allocation(&catalogue, 12, AllocationOrder::NewestFirst);

        assert_eq!(selected.len(), 3);
        let mut deduped = selected.clone();
        deduped.dedup();
        assert_eq!(deduped, selected);
    }

    #[test]
    fn in_stock_reflects_quantity() {
        assert!(wine(1, 1, 0).in_stock());
        assert!(!wine(1, 0, 0).in_stock());
    }
}
