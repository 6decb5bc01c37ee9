//! Shuffled traversal over the eligible items.
//!
//! A deck is one pass: a permutation of the eligible ids and a cursor to
//! the next unseen position. It is either `Unbuilt` or `Valid`; every change
//! to the catalog or the exclusion set must call [`Deck::invalidate`], after
//! which the owner rebuilds it before drawing again.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Deck validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeckState {
    /// No usable order; must be rebuilt before drawing.
    #[default]
    Unbuilt,
    /// Order is a permutation of the eligible set.
    Valid,
}

/// One pass over the eligible items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    state: DeckState,
    order: Vec<String>,
    index: usize,
}

/// Persisted form of a deck: `{deck: [id], deckIndex: n}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeckRecord {
    #[serde(default)]
    pub deck: Vec<String>,
    #[serde(default)]
    pub deck_index: usize,
}

impl Deck {
    /// Create an unbuilt deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a persisted order as valid.
    ///
    /// The caller is responsible for having checked it against the eligible
    /// set (see `core::reconcile`). The cursor is clamped to the length.
    pub fn restored(order: Vec<String>, index: usize) -> Self {
        let index = index.min(order.len());
        Self {
            state: DeckState::Valid,
            order,
            index,
        }
    }

    pub fn state(&self) -> DeckState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state == DeckState::Valid
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Cursor position: number of ids already drawn in this pass.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids not yet drawn in this pass.
    pub fn remaining(&self) -> &[String] {
        &self.order[self.index.min(self.order.len())..]
    }

    /// Mark the deck stale. Drops the order so nothing can be drawn from it.
    pub fn invalidate(&mut self) {
        self.state = DeckState::Unbuilt;
        self.order.clear();
        self.index = 0;
    }

    /// Shuffle a fresh pass over `pool`.
    ///
    /// If the shuffle puts `current` first and there is another item, the
    /// first two entries are swapped once so the same card is not shown
    /// twice in a row across the pass boundary.
    /// A pool of one, or a card re-included after leaving mid-pass, can
    /// still repeat.
    pub fn rebuild<R: Rng + ?Sized>(
        &mut self,
        pool: Vec<String>,
        current: Option<&str>,
        rng: &mut R,
    ) {
        self.order = pool;
        self.index = 0;
        self.state = DeckState::Valid;

        if self.order.is_empty() {
            return;
        }

        self.order.shuffle(rng);

        if self.order.len() >= 2 && current == Some(self.order[0].as_str()) {
            self.order.swap(0, 1);
        }
    }

    /// Whether the cursor has reached the end of the pass.
    ///
    /// An empty valid deck is always complete.
    pub fn is_pass_complete(&self) -> bool {
        self.index >= self.order.len()
    }

    /// Draw the next id of this pass and advance the cursor.
    ///
    /// Returns `None` once the pass is complete or the deck is unbuilt.
    pub fn take_next(&mut self) -> Option<String> {
        if !self.is_valid() || self.is_pass_complete() {
            return None;
        }
        let id = self.order[self.index].clone();
        self.index += 1;
        Some(id)
    }

    /// Whether the order is exactly a permutation of `pool`.
    pub fn matches_pool(&self, pool: &HashSet<String>) -> bool {
        is_permutation_of(&self.order, pool)
    }

    pub fn to_record(&self) -> DeckRecord {
        DeckRecord {
            deck: self.order.clone(),
            deck_index: self.index,
        }
    }
}

/// True if `order` has no duplicates and contains exactly the ids of `pool`.
pub fn is_permutation_of(order: &[String], pool: &HashSet<String>) -> bool {
    if order.len() != pool.len() {
        return false;
    }
    let mut seen = HashSet::with_capacity(order.len());
    order
        .iter()
        .all(|id| pool.contains(id) && seen.insert(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_deck_is_unbuilt() {
        let mut deck = Deck::new();
        assert_eq!(deck.state(), DeckState::Unbuilt);
        assert!(deck.take_next().is_none());
    }

    #[test]
    fn test_rebuild_produces_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut deck = Deck::new();
        deck.rebuild(ids(&["a", "b", "c", "d"]), None, &mut rng);

        assert!(deck.is_valid());
        assert_eq!(deck.index(), 0);
        assert!(deck.matches_pool(&set(&["a", "b", "c", "d"])));
    }

    #[test]
    fn test_rebuild_empty_pool_is_exhausted() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut deck = Deck::new();
        deck.rebuild(vec![], Some("a"), &mut rng);

        assert!(deck.is_valid());
        assert!(deck.is_empty());
        assert!(deck.is_pass_complete());
        assert!(deck.take_next().is_none());
    }

    #[test]
    fn test_rebuild_avoids_current_first() {
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut deck = Deck::new();
            deck.rebuild(ids(&["a", "b", "c"]), Some("a"), &mut rng);
            assert_ne!(deck.order()[0], "a", "seed {seed}");
        }
    }

    #[test]
    fn test_rebuild_single_item_keeps_current() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut deck = Deck::new();
        deck.rebuild(ids(&["a"]), Some("a"), &mut rng);
        assert_eq!(deck.take_next().as_deref(), Some("a"));
    }

    #[test]
    fn test_same_seed_same_order() {
        let mut a = Deck::new();
        let mut b = Deck::new();
        let pool = ids(&["a", "b", "c", "d", "e"]);
        a.rebuild(pool.clone(), None, &mut ChaCha8Rng::seed_from_u64(9));
        b.rebuild(pool, None, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_take_next_walks_whole_pass() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut deck = Deck::new();
        deck.rebuild(ids(&["a", "b", "c"]), None, &mut rng);

        let mut drawn = HashSet::new();
        for _ in 0..3 {
            assert!(!deck.is_pass_complete());
            drawn.insert(deck.take_next().unwrap());
        }
        assert!(deck.is_pass_complete());
        assert!(deck.take_next().is_none());
        assert_eq!(drawn, set(&["a", "b", "c"]));
    }

    #[test]
    fn test_invalidate_clears_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut deck = Deck::new();
        deck.rebuild(ids(&["a", "b"]), None, &mut rng);
        deck.take_next();

        deck.invalidate();

        assert_eq!(deck.state(), DeckState::Unbuilt);
        assert!(deck.is_empty());
        assert_eq!(deck.index(), 0);
    }

    #[test]
    fn test_restored_clamps_cursor() {
        let deck = Deck::restored(ids(&["a", "b"]), 9);
        assert_eq!(deck.index(), 2);
        assert!(deck.is_pass_complete());
        assert!(deck.remaining().is_empty());
    }

    #[test]
    fn test_is_permutation_of() {
        assert!(is_permutation_of(&ids(&["b", "a"]), &set(&["a", "b"])));
        assert!(!is_permutation_of(&ids(&["a", "a"]), &set(&["a", "b"])));
        assert!(!is_permutation_of(&ids(&["a"]), &set(&["a", "b"])));
        assert!(!is_permutation_of(&ids(&["a", "c"]), &set(&["a", "b"])));
        assert!(is_permutation_of(&[], &HashSet::new()));
    }

    #[test]
    fn test_record_wire_names() {
        let deck = Deck::restored(ids(&["a", "b"]), 1);
        let json = serde_json::to_value(deck.to_record()).unwrap();
        assert_eq!(json["deck"], serde_json::json!(["a", "b"]));
        assert_eq!(json["deckIndex"], 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: a rebuilt deck is exactly a permutation of its pool
            #[test]
            fn prop_rebuild_is_permutation(
                pool in proptest::collection::hash_set("[a-z]{1,6}", 0..40),
                seed in any::<u64>(),
            ) {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let current = pool.iter().next().cloned();
                let mut deck = Deck::new();
                deck.rebuild(pool.iter().cloned().collect(), current.as_deref(), &mut rng);
                prop_assert!(deck.matches_pool(&pool));
            }

            // Property: k draws see every id once, then the pass is complete
            #[test]
            fn prop_k_draws_exhaust_pass(
                pool in proptest::collection::hash_set("[a-z]{1,6}", 1..40),
                seed in any::<u64>(),
            ) {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut deck = Deck::new();
                deck.rebuild(pool.iter().cloned().collect(), None, &mut rng);

                let mut seen = HashSet::new();
                for _ in 0..pool.len() {
                    prop_assert!(!deck.is_pass_complete());
                    let id = deck.take_next().unwrap();
                    prop_assert!(seen.insert(id));
                }
                prop_assert!(deck.is_pass_complete());
                prop_assert_eq!(seen, pool);
            }
        }
    }
}
