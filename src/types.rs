//! Domain types for pick-captcha.
//!
//! Catalog and layout types are plain data. The only logic here is
//! construction and lookups; shuffling lives in `shuffle`, the round
//! state machine in `round`.

use std::path::Path;

use serde::Serialize;

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Stable identity of a catalog item: its index in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(pub usize);

impl ItemId {
    pub fn index(self) -> usize {
        self.0
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// One fixed item of the puzzle (an image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id: ItemId,
    /// Image path or any opaque reference the presentation understands.
    pub source: String,
    /// Short display name, derived from the file stem.
    pub label: String,
    pub is_target: bool,
}

/// The ordered, immutable set of items a puzzle is drawn from.
///
/// Only constructible through [`Catalog::with_targets`], which refuses an
/// empty item list. Validation of target counts against configuration
/// happens in `config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Build a catalog from item sources, marking targets with `is_target`.
    ///
    /// The predicate receives the catalog index and the source. Returns
    /// `None` for an empty source list.
    pub fn with_targets<S, F>(sources: impl IntoIterator<Item = S>, is_target: F) -> Option<Self>
    where
        S: Into<String>,
        F: Fn(usize, &str) -> bool,
    {
        let items: Vec<CatalogItem> = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| {
                let source = source.into();
                CatalogItem {
                    id: ItemId(index),
                    label: label_for(&source, index),
                    is_target: is_target(index, &source),
                    source,
                }
            })
            .collect();

        if items.is_empty() {
            None
        } else {
            Some(Catalog { items })
        }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.get(id.0)
    }

    /// Number of items, N.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Never true for a constructed catalog: `with_targets` refuses an
    /// empty source list.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of target items, K.
    pub fn target_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_target).count()
    }
}

/// Display label: file stem of the source, or "Photo N" when there is none.
fn label_for(source: &str, index: usize) -> String {
    Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Photo {}", index + 1))
}

// ============================================================================
// ROUND LAYOUT
// ============================================================================

/// One display position of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub item: ItemId,
    /// Copy of the item's target flag, so verification never needs the catalog.
    pub is_target: bool,
}

/// A permutation of the catalog: slot `i` shows `slots[i].item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundLayout {
    slots: Vec<Slot>,
}

impl RoundLayout {
    pub(crate) fn from_slots(slots: Vec<Slot>) -> Self {
        RoundLayout { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot indices holding target items, ascending.
    pub fn target_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_target)
            .map(|(index, _)| index)
            .collect()
    }

    /// Catalog item ids in slot order.
    pub fn item_order(&self) -> Vec<ItemId> {
        self.slots.iter().map(|slot| slot.item).collect()
    }
}

/// Columns of the display grid: the smallest square that fits every slot.
pub fn grid_columns(slot_count: usize) -> usize {
    let mut columns = 1;
    while columns * columns < slot_count {
        columns += 1;
    }
    columns
}

// ============================================================================
// VERIFICATION
// ============================================================================

/// Per-slot classification counts for one verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionTally {
    /// Selected and target.
    pub correct: usize,
    /// Selected but not a target.
    pub wrong: usize,
    /// Target left unselected.
    pub missed: usize,
    /// K for the round.
    pub target_count: usize,
}

impl SelectionTally {
    /// Exact match: every target selected, nothing else.
    pub fn is_exact(&self) -> bool {
        self.correct == self.target_count && self.wrong == 0
    }
}

/// Outcome of verifying the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "tally", rename_all = "snake_case")]
pub enum VerificationResult {
    /// Selection equals the target slot set.
    Passed(SelectionTally),
    /// Anything else. The round continues.
    Failed(SelectionTally),
}

impl VerificationResult {
    pub fn from_tally(tally: SelectionTally) -> Self {
        if tally.is_exact() {
            VerificationResult::Passed(tally)
        } else {
            VerificationResult::Failed(tally)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Passed(_))
    }

    pub fn tally(&self) -> &SelectionTally {
        match self {
            VerificationResult::Passed(tally) | VerificationResult::Failed(tally) => tally,
        }
    }
}

/// Where a round is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Fresh layout, or selection changed since the last verify.
    #[default]
    Active,
    /// Last verify succeeded.
    Solved,
    /// Last verify failed; the user may keep adjusting.
    Rejected,
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable pretty output.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

// ============================================================================
// TESTS
// ============================================================================
