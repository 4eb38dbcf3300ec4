//! Shuffle uniformity: count where each item lands over many rounds.
//!
//! Rounds are drawn in fixed-size batches on the rayon pool. Each batch
//! has its own `StdRng` derived from the base seed and the batch index, so
//! a given seed always yields the same report regardless of thread count.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::shuffle::layout_for;
use crate::types::{Catalog, RoundLayout};

/// Rounds per batch (one RNG, one progress callback each).
pub const BATCH_SIZE: u64 = 1_000;

/// Default number of rounds for the CLI `stats` command.
pub const DEFAULT_ROUNDS: u64 = 90_000;

/// Standard normal quantile for p = 0.001 (upper tail).
const Z_P001: f64 = 3.0902;

// ============================================================================
// TYPES
// ============================================================================

/// Slot-by-item occurrence counts over many generated layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniformityReport {
    pub rounds: u64,
    pub item_count: usize,
    pub target_count: usize,
    /// `occurrences[slot][item]`: how often `item` was shown at `slot`.
    pub occurrences: Vec<Vec<u64>>,
    /// Layouts whose target slot count differed from the catalog's K.
    pub invariant_violations: u64,
}

/// Pearson chi-square against the uniform expectation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChiSquare {
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    /// Upper critical value at p = 0.001.
    pub critical_value: f64,
}

impl ChiSquare {
    pub fn within_tolerance(&self) -> bool {
        self.statistic <= self.critical_value
    }
}

impl UniformityReport {
    fn empty(item_count: usize, target_count: usize) -> Self {
        UniformityReport {
            rounds: 0,
            item_count,
            target_count,
            occurrences: vec![vec![0; item_count]; item_count],
            invariant_violations: 0,
        }
    }

    pub(crate) fn record(&mut self, layout: &RoundLayout) {
        self.rounds += 1;
        for (slot, entry) in layout.slots().iter().enumerate() {
            self.occurrences[slot][entry.item.index()] += 1;
        }
        if layout.target_slots().len() != self.target_count {
            self.invariant_violations += 1;
        }
    }

    fn merge(mut self, other: UniformityReport) -> Self {
        self.rounds += other.rounds;
        self.invariant_violations += other.invariant_violations;
        for (row, other_row) in self.occurrences.iter_mut().zip(other.occurrences) {
            for (cell, count) in row.iter_mut().zip(other_row) {
                *cell += count;
            }
        }
        self
    }

    /// Expected count per cell under a uniform shuffle.
    pub fn expected_per_cell(&self) -> f64 {
        self.rounds as f64 / self.item_count as f64
    }

    /// Chi-square statistic over all N×N cells, (N-1)² degrees of freedom.
    ///
    /// Each round contributes a whole permutation, not N independent draws,
    /// so the raw Pearson sum is scaled by (N-1)/N to follow χ²((N-1)²).
    pub fn chi_square(&self) -> ChiSquare {
        let expected = self.expected_per_cell();
        let n = self.item_count as f64;
        let statistic = if expected > 0.0 && self.item_count > 1 {
            let pearson: f64 = self
                .occurrences
                .iter()
                .flatten()
                .map(|&observed| {
                    let diff = observed as f64 - expected;
                    diff * diff / expected
                })
                .sum();
            pearson * (n - 1.0) / n
        } else {
            0.0
        };

        let df = self.item_count.saturating_sub(1).pow(2);
        ChiSquare {
            statistic,
            degrees_of_freedom: df,
            critical_value: critical_value(df),
        }
    }

    /// At least one round, no invariant violations and chi-square within
    /// tolerance. An empty tally proves nothing, so it is never uniform.
    pub fn is_uniform(&self) -> bool {
        self.rounds > 0
            && self.invariant_violations == 0
            && self.chi_square().within_tolerance()
    }

    /// Largest relative deviation of any cell from the expectation.
    pub fn max_relative_deviation(&self) -> f64 {
        let expected = self.expected_per_cell();
        if expected == 0.0 {
            return 0.0;
        }
        self.occurrences
            .iter()
            .flatten()
            .map(|&observed| (observed as f64 - expected).abs() / expected)
            .fold(0.0, f64::max)
    }
}

/// Wilson-Hilferty approximation of the chi-square quantile.
fn critical_value(df: usize) -> f64 {
    if df == 0 {
        return 0.0;
    }
    let k = df as f64;
    let h = 2.0 / (9.0 * k);
    k * (1.0 - h + Z_P001 * h.sqrt()).powi(3)
}

fn batch_seed(seed: u64, batch: u64) -> u64 {
    seed ^ (batch + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

// ============================================================================
// TALLYING
// ============================================================================

/// Generate `rounds` layouts of `catalog` and count slot placements.
pub fn tally_layouts(catalog: &Catalog, rounds: u64, seed: u64) -> UniformityReport {
    tally_layouts_with_progress(catalog, rounds, seed, |_| {})
}

/// Same as [`tally_layouts`], calling `on_progress(n)` after each batch of
/// `n` rounds. The callback runs on worker threads.
pub fn tally_layouts_with_progress<F>(
    catalog: &Catalog,
    rounds: u64,
    seed: u64,
    on_progress: F,
) -> UniformityReport
where
    F: Fn(u64) + Sync + Send,
{
    let item_count = catalog.len();
    let target_count = catalog.target_count();
    let batches = rounds.div_ceil(BATCH_SIZE);

    tracing::debug!(rounds, batches, item_count, "tallying layouts");

    (0..batches)
        .into_par_iter()
        .map(|batch| {
            let len = BATCH_SIZE.min(rounds - batch * BATCH_SIZE);
            let mut rng = StdRng::seed_from_u64(batch_seed(seed, batch));
            let mut partial = UniformityReport::empty(item_count, target_count);
            for _ in 0..len {
                partial.record(&layout_for(catalog, &mut rng));
            }
            on_progress(len);
            partial
        })
        .reduce(
            || UniformityReport::empty(item_count, target_count),
            UniformityReport::merge,
        )
}

// ============================================================================
// TESTS
// ============================================================================
