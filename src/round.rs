//! The puzzle round: shuffled layout, user selection, verification.
//!
//! A `PuzzleRound` is a plain owned value. It has no rendering
//! dependency; presentation layers call in and react to what comes back.
//!
//! Lifecycle:
//! - `start` draws a layout and empties the selection (status Active)
//! - `toggle` flips one slot (status back to Active)
//! - `verify` classifies every slot (status Solved or Rejected)
//! - `reset` / `refresh` discard both and draw again

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PuzzleError;
use crate::shuffle::layout_for;
use crate::types::{
    Catalog, CatalogItem, RoundLayout, RoundStatus, SelectionTally, VerificationResult,
};

/// One active puzzle: a layout plus the user's evolving selection.
#[derive(Debug, Clone)]
pub struct PuzzleRound<R = StdRng> {
    catalog: Catalog,
    layout: RoundLayout,
    selection: BTreeSet<usize>,
    status: RoundStatus,
    round_number: u64,
    rng: R,
}

impl PuzzleRound<StdRng> {
    /// Start a round with a generator seeded from the OS.
    pub fn with_os_rng(catalog: Catalog) -> Self {
        Self::start(catalog, StdRng::from_os_rng())
    }

    /// Start a reproducible round: the same seed yields the same layouts.
    pub fn seeded(catalog: Catalog, seed: u64) -> Self {
        Self::start(catalog, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PuzzleRound<R> {
    /// Shuffle `catalog` into a first layout with an empty selection.
    ///
    /// Targets are already marked on the catalog (see
    /// [`Catalog::with_targets`]), so there is nothing left to fail here.
    pub fn start(catalog: Catalog, mut rng: R) -> Self {
        let layout = layout_for(&catalog, &mut rng);
        tracing::debug!(
            items = catalog.len(),
            targets = catalog.target_count(),
            "round started"
        );
        PuzzleRound {
            catalog,
            layout,
            selection: BTreeSet::new(),
            status: RoundStatus::Active,
            round_number: 1,
            rng,
        }
    }

    /// Flip `slot` in the selection. Returns whether it is now selected.
    ///
    /// # Errors
    /// `InvalidSlot` if `slot` is not a position of the current layout;
    /// the round is left untouched.
    pub fn toggle(&mut self, slot: usize) -> Result<bool, PuzzleError> {
        if slot >= self.layout.len() {
            tracing::warn!(slot, slot_count = self.layout.len(), "toggle rejected");
            return Err(PuzzleError::InvalidSlot {
                slot,
                slot_count: self.layout.len(),
            });
        }

        let selected = if self.selection.remove(&slot) {
            false
        } else {
            self.selection.insert(slot);
            true
        };
        self.status = RoundStatus::Active;
        Ok(selected)
    }

    /// Check the selection against the target slots. Exact match only.
    ///
    /// Layout and selection are kept either way.
    pub fn verify(&mut self) -> VerificationResult {
        let tally = self.tally();
        let result = VerificationResult::from_tally(tally);

        self.status = if result.is_success() {
            RoundStatus::Solved
        } else {
            RoundStatus::Rejected
        };
        tracing::debug!(
            round = self.round_number,
            correct = tally.correct,
            wrong = tally.wrong,
            missed = tally.missed,
            passed = result.is_success(),
            "round verified"
        );
        result
    }

    /// Discard layout and selection and draw a new round.
    pub fn reset(&mut self) -> &RoundLayout {
        self.layout = layout_for(&self.catalog, &mut self.rng);
        self.selection.clear();
        self.status = RoundStatus::Active;
        self.round_number += 1;
        tracing::debug!(round = self.round_number, "round reset");
        &self.layout
    }

    /// Same as [`reset`](Self::reset). Kept separate so callers can attach
    /// different presentation (the success banner vs. a fade).
    pub fn refresh(&mut self) -> &RoundLayout {
        self.reset()
    }

    fn tally(&self) -> SelectionTally {
        let mut tally = SelectionTally {
            target_count: self.catalog.target_count(),
            ..Default::default()
        };

        for (index, slot) in self.layout.slots().iter().enumerate() {
            match (self.selection.contains(&index), slot.is_target) {
                (true, true) => tally.correct += 1,
                (true, false) => tally.wrong += 1,
                (false, true) => tally.missed += 1,
                (false, false) => {}
            }
        }
        tally
    }
}

impl<R> PuzzleRound<R> {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &RoundLayout {
        &self.layout
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    pub fn is_selected(&self, slot: usize) -> bool {
        self.selection.contains(&slot)
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    /// Number of layouts drawn by this round so far, starting at 1.
    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    pub fn slot_count(&self) -> usize {
        self.layout.len()
    }

    pub fn target_slots(&self) -> Vec<usize> {
        self.layout.target_slots()
    }

    /// The catalog item shown at `slot`.
    pub fn item_at(&self, slot: usize) -> Option<&CatalogItem> {
        self.layout
            .slot(slot)
            .and_then(|s| self.catalog.get(s.item))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::is_permutation_of;

    fn valentine_catalog() -> Catalog {
        Catalog::with_targets(
            (1..=9).map(|n| format!("images/image{}.jpg", n)),
            |index, _| [0, 1, 2, 3].contains(&index),
        )
        .unwrap()
    }

    fn round(seed: u64) -> PuzzleRound {
        PuzzleRound::seeded(valentine_catalog(), seed)
    }

    fn select(round: &mut PuzzleRound, slots: &[usize]) {
        for &slot in slots {
            assert!(round.toggle(slot).unwrap());
        }
    }

    fn first_non_target(round: &PuzzleRound) -> usize {
        (0..round.slot_count())
            .find(|slot| !round.target_slots().contains(slot))
            .unwrap()
    }

    // -- start --

    #[test]
    fn start_produces_permutation_and_empty_selection() {
        let round = round(1);
        assert!(is_permutation_of(round.layout(), round.catalog()));
        assert_eq!(round.target_slots().len(), 4);
        assert!(round.selection().is_empty());
        assert_eq!(round.status(), RoundStatus::Active);
        assert_eq!(round.round_number(), 1);
    }

    #[test]
    fn item_at_follows_layout() {
        let round = round(8);
        for (index, slot) in round.layout().slots().iter().enumerate() {
            assert_eq!(round.item_at(index).unwrap().id, slot.item);
        }
        assert!(round.item_at(9).is_none());
    }

    // -- toggle --

    #[test]
    fn toggle_adds_then_removes() {
        let mut round = round(2);
        assert!(round.toggle(5).unwrap());
        assert!(round.is_selected(5));
        assert!(!round.toggle(5).unwrap());
        assert!(!round.is_selected(5));
    }

    #[test]
    fn double_toggle_is_identity_for_every_slot() {
        let mut round = round(3);
        select(&mut round, &[0, 4]);
        let before = round.selection().clone();

        for slot in 0..round.slot_count() {
            round.toggle(slot).unwrap();
            round.toggle(slot).unwrap();
            assert_eq!(round.selection(), &before);
        }
    }

    #[test]
    fn toggle_out_of_range_is_rejected() {
        let mut round = round(4);
        round.toggle(1).unwrap();

        let err = round.toggle(9).unwrap_err();
        assert_eq!(err, PuzzleError::InvalidSlot {
            slot: 9,
            slot_count: 9,
        });
        assert_eq!(round.selection().len(), 1);

        assert!(round.toggle(usize::MAX).is_err());
    }

    // -- verify --

    #[test]
    fn exact_target_selection_passes() {
        let mut round = round(5);
        let targets = round.target_slots();
        select(&mut round, &targets);

        let result = round.verify();
        assert!(result.is_success());
        assert_eq!(result.tally().correct, 4);
        assert_eq!(round.status(), RoundStatus::Solved);
    }

    #[test]
    fn targets_plus_one_extra_fails() {
        let mut round = round(6);
        let targets = round.target_slots();
        let extra = first_non_target(&round);
        select(&mut round, &targets);
        select(&mut round, &[extra]);

        let result = round.verify();
        assert!(!result.is_success());
        assert_eq!(result.tally().wrong, 1);
        assert_eq!(round.status(), RoundStatus::Rejected);
    }

    #[test]
    fn three_of_four_targets_fails() {
        let mut round = round(7);
        let targets = round.target_slots();
        select(&mut round, &targets[..3]);

        let result = round.verify();
        assert!(!result.is_success());
        assert_eq!(result.tally().missed, 1);
    }

    #[test]
    fn empty_selection_fails() {
        let mut round = round(8);
        let result = round.verify();
        assert!(!result.is_success());
        assert_eq!(result.tally().missed, 4);
    }

    #[test]
    fn disjoint_selection_fails() {
        let mut round = round(9);
        let targets = round.target_slots();
        let others: Vec<usize> = (0..9).filter(|s| !targets.contains(s)).collect();
        select(&mut round, &others);
        assert!(!round.verify().is_success());
    }

    #[test]
    fn overlapping_selection_fails() {
        let mut round = round(10);
        let targets = round.target_slots();
        let extra = first_non_target(&round);
        select(&mut round, &targets[..2]);
        select(&mut round, &[extra]);
        assert!(!round.verify().is_success());
    }

    #[test]
    fn every_selection_passes_only_when_equal_to_targets() {
        let mut round = round(11);
        let targets: BTreeSet<usize> = round.target_slots().into_iter().collect();

        for mask in 0u32..(1 << 9) {
            let wanted: BTreeSet<usize> = (0..9).filter(|bit| mask & (1 << bit) != 0).collect();
            for slot in 0..9 {
                if round.is_selected(slot) != wanted.contains(&slot) {
                    round.toggle(slot).unwrap();
                }
            }
            assert_eq!(round.verify().is_success(), wanted == targets, "mask {mask:09b}");
        }
    }

    #[test]
    fn failed_verify_keeps_round_for_retry() {
        let mut round = round(12);
        let layout = round.layout().clone();
        let targets = round.target_slots();
        select(&mut round, &targets[..3]);
        assert!(!round.verify().is_success());

        assert_eq!(round.layout(), &layout);
        assert_eq!(round.selection().len(), 3);

        select(&mut round, &targets[3..]);
        assert_eq!(round.status(), RoundStatus::Active);
        assert!(round.verify().is_success());
    }

    // -- reset / refresh --

    #[test]
    fn reset_clears_selection_and_status() {
        let mut round = round(13);
        let targets = round.target_slots();
        select(&mut round, &targets);
        round.verify();

        let layout = round.reset().clone();
        assert!(round.selection().is_empty());
        assert_eq!(round.status(), RoundStatus::Active);
        assert_eq!(round.round_number(), 2);
        assert!(is_permutation_of(&layout, round.catalog()));
    }

    #[test]
    fn refresh_draws_new_layouts() {
        let mut round = round(14);
        let first = round.layout().clone();
        round.toggle(0).unwrap();

        let changed = (0..20).any(|_| round.refresh() != &first);
        assert!(changed);
        assert!(round.selection().is_empty());
        assert_eq!(round.target_slots().len(), 4);
    }

    #[test]
    fn rounds_are_independent_instances() {
        let mut a = round(15);
        let b = round(15);
        a.toggle(0).unwrap();
        assert!(b.selection().is_empty());
        assert_eq!(a.layout(), b.layout());
    }
}
