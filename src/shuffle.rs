//! Round layout generation.
//!
//! Fisher-Yates over any `rand::Rng`. Callers pick the generator: seeded
//! `StdRng` for reproducible rounds, OS-seeded for play.

use rand::Rng;

use crate::types::{Catalog, ItemId, RoundLayout, Slot};

/// Shuffle `items` in place so every ordering is equally likely.
///
/// Walks from the last index down to 1, swapping each position with a
/// uniformly chosen index in `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Draw a fresh layout: a uniform permutation of the whole catalog.
pub fn layout_for<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> RoundLayout {
    let mut slots: Vec<Slot> = catalog
        .items()
        .iter()
        .map(|item| Slot {
            item: item.id,
            is_target: item.is_target,
        })
        .collect();

    fisher_yates(&mut slots, rng);

    RoundLayout::from_slots(slots)
}

/// True if `layout` is a bijection onto `catalog` with matching target flags.
pub fn is_permutation_of(layout: &RoundLayout, catalog: &Catalog) -> bool {
    if layout.len() != catalog.len() {
        return false;
    }

    let mut seen = vec![false; catalog.len()];
    for slot in layout.slots() {
        let ItemId(index) = slot.item;
        match catalog.get(slot.item) {
            Some(item) if !seen[index] && item.is_target == slot.is_target => seen[index] = true,
            _ => return false,
        }
    }
    true
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn nine_item_catalog() -> Catalog {
        Catalog::with_targets(
            (1..=9).map(|n| format!("images/image{}.jpg", n)),
            |index, _| index < 4,
        )
        .unwrap()
    }

    #[test]
    fn fisher_yates_keeps_every_element() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut values: Vec<u32> = (0..50).collect();
        fisher_yates(&mut values, &mut rng);

        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn fisher_yates_handles_empty_and_single() {
        let mut rng = StdRng::seed_from_u64(1);

        let mut empty: Vec<u8> = Vec::new();
        fisher_yates(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = vec![42];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, vec![42]);
    }

    #[test]
    fn same_seed_same_layout() {
        let catalog = nine_item_catalog();
        let a = layout_for(&catalog, &mut StdRng::seed_from_u64(99));
        let b = layout_for(&catalog, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn layout_is_permutation_with_k_targets() {
        let catalog = nine_item_catalog();
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..200 {
            let layout = layout_for(&catalog, &mut rng);
            assert!(is_permutation_of(&layout, &catalog));
            assert_eq!(layout.target_slots().len(), 4);
        }
    }

    #[test]
    fn layout_denormalizes_target_flag() {
        let catalog = nine_item_catalog();
        let layout = layout_for(&catalog, &mut StdRng::seed_from_u64(5));
        for slot in layout.slots() {
            assert_eq!(slot.is_target, catalog.get(slot.item).unwrap().is_target);
        }
    }

    #[test]
    fn layouts_vary_across_draws() {
        let catalog = nine_item_catalog();
        let mut rng = StdRng::seed_from_u64(11);
        let first = layout_for(&catalog, &mut rng);
        let differs = (0..20).any(|_| layout_for(&catalog, &mut rng) != first);
        assert!(differs, "20 draws of 9! orderings should not all repeat");
    }

    #[test]
    fn permutation_check_rejects_duplicates() {
        let catalog = nine_item_catalog();
        let mut slots: Vec<Slot> = layout_for(&catalog, &mut StdRng::seed_from_u64(3))
            .slots()
            .to_vec();
        slots[1] = slots[0];
        assert!(!is_permutation_of(&RoundLayout::from_slots(slots), &catalog));
    }

    #[test]
    fn permutation_check_rejects_flipped_target_flag() {
        let catalog = nine_item_catalog();
        let mut slots: Vec<Slot> = layout_for(&catalog, &mut StdRng::seed_from_u64(3))
            .slots()
            .to_vec();
        slots[0].is_target = !slots[0].is_target;
        assert!(!is_permutation_of(&RoundLayout::from_slots(slots), &catalog));
    }
}
