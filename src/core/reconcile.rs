//! Repair persisted state against the live catalog.
//!
//! Everything except the catalog refers to items by id, and any of those
//! references can go stale: an item deleted in another session, a hand
//! edited state file, a partial write. `reconcile` is the single place that
//! drops stale references. It is pure and idempotent.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::core::catalog::Catalog;
use crate::core::deck::{is_permutation_of, DeckRecord};
use crate::core::presentation::PresentationState;

/// Study state that refers to catalog items by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyState {
    pub excluded: BTreeSet<String>,
    pub auto_excluded: BTreeSet<String>,
    pub counts: BTreeMap<String, u32>,
    /// `None` means the deck must be rebuilt.
    pub deck: Option<DeckRecord>,
    pub presentation: PresentationState,
}

/// What a reconciliation pass had to fix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repairs {
    pub dropped_excluded: usize,
    pub dropped_auto_excluded: usize,
    pub dropped_counts: usize,
    pub deck_discarded: bool,
    pub presentation_cleared: bool,
}

impl Repairs {
    /// Whether the input was already consistent.
    pub fn is_clean(&self) -> bool {
        *self == Repairs::default()
    }
}

/// Eligible ids: catalog minus exclusions.
pub fn eligible_ids(catalog: &Catalog, excluded: &BTreeSet<String>) -> HashSet<String> {
    catalog
        .ids()
        .filter(|id| !excluded.contains(*id))
        .map(str::to_string)
        .collect()
}

/// Repair `state` against `catalog`.
///
/// - exclusions keep only catalog ids
/// - automatic exclusions keep only ids that are still excluded
/// - counts keep only catalog ids
/// - the deck survives only if it is exactly a permutation of the eligible
///   ids with an in-range cursor
/// - the presentation survives only if its item is still eligible
pub fn reconcile(catalog: &Catalog, state: StudyState) -> (StudyState, Repairs) {
    let mut repairs = Repairs::default();
    let ids = catalog.id_set();

    let before = state.excluded.len();
    let excluded: BTreeSet<String> = state
        .excluded
        .into_iter()
        .filter(|id| ids.contains(id))
        .collect();
    repairs.dropped_excluded = before - excluded.len();

    let before = state.auto_excluded.len();
    let auto_excluded: BTreeSet<String> = state
        .auto_excluded
        .into_iter()
        .filter(|id| excluded.contains(id))
        .collect();
    repairs.dropped_auto_excluded = before - auto_excluded.len();

    let before = state.counts.len();
    let counts: BTreeMap<String, u32> = state
        .counts
        .into_iter()
        .filter(|(id, _)| ids.contains(id))
        .collect();
    repairs.dropped_counts = before - counts.len();

    let eligible = eligible_ids(catalog, &excluded);

    let deck = match state.deck {
        Some(record)
            if record.deck_index <= record.deck.len()
                && is_permutation_of(&record.deck, &eligible) =>
        {
            Some(record)
        }
        Some(_) => {
            repairs.deck_discarded = true;
            None
        }
        None => None,
    };

    let current_eligible = state
        .presentation
        .current_id
        .as_deref()
        .map(|id| eligible.contains(id));
    let presentation = match current_eligible {
        Some(true) => state.presentation,
        Some(false) => {
            repairs.presentation_cleared = true;
            PresentationState::exhausted()
        }
        None => PresentationState::exhausted(),
    };

    (
        StudyState {
            excluded,
            auto_excluded,
            counts,
            deck,
            presentation,
        },
        repairs,
    )
}
