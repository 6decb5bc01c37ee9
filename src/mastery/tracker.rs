//! Per-item mastery: correct counts and the exclusion sets.
//!
//! The exclusion set hides items from the deck. Its subset of automatic
//! exclusions records which items were hidden for reaching the mastery
//! threshold, as opposed to a user saying "I already know this". Decay only
//! ever re-admits automatic exclusions.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::Catalog;
use crate::mastery::decay::{below_threshold, decay_counts, DecayReport};

/// Counts and exclusion sets for the catalog.
///
/// Invariant: `auto_excluded ⊆ excluded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasteryTracker {
    counts: BTreeMap<String, u32>,
    excluded: BTreeSet<String>,
    auto_excluded: BTreeSet<String>,
}

/// Excluded ids split by how they were excluded.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExclusionPartition {
    pub manual: Vec<String>,
    pub auto: Vec<String>,
}

impl MasteryTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a tracker from persisted parts.
    ///
    /// Restores the subset invariant by dropping automatic marks that are
    /// not in the exclusion set. Catalog-level repair is `core::reconcile`'s
    /// job.
    pub fn from_parts(
        counts: BTreeMap<String, u32>,
        excluded: BTreeSet<String>,
        auto_excluded: BTreeSet<String>,
    ) -> Self {
        let auto_excluded = auto_excluded
            .into_iter()
            .filter(|id| excluded.contains(id))
            .collect();
        Self {
            counts,
            excluded,
            auto_excluded,
        }
    }

    pub fn counts(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub fn auto_excluded(&self) -> &BTreeSet<String> {
        &self.auto_excluded
    }

    /// Correct answers recorded for `id` since the last reset.
    pub fn count(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }

    pub fn is_auto_excluded(&self, id: &str) -> bool {
        self.auto_excluded.contains(id)
    }

    /// Record a correct answer and return the new count.
    ///
    /// No-op returning `None` when `id` is not in the catalog.
    pub fn record_correct(&mut self, catalog: &Catalog, id: &str) -> Option<u32> {
        if !catalog.contains(id) {
            return None;
        }
        let count = self.counts.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        Some(*count)
    }

    /// Exclude `id` as mastered if its count reached `threshold`.
    ///
    /// Returns true if the item was moved into the exclusion sets.
    pub fn auto_exclude_if_threshold_reached(&mut self, id: &str, threshold: u32) -> bool {
        if self.count(id) < threshold {
            return false;
        }
        self.excluded.insert(id.to_string());
        self.auto_excluded.insert(id.to_string());
        true
    }

    /// Exclude `id` at the user's request, regardless of its count.
    ///
    /// Clears any automatic mark so decay will not bring it back.
    pub fn manual_exclude(&mut self, id: &str) {
        self.excluded.insert(id.to_string());
        self.auto_excluded.remove(id);
    }

    /// Put `id` back into rotation. Its count is kept.
    ///
    /// Returns true if it was excluded.
    pub fn reinclude(&mut self, id: &str) -> bool {
        self.auto_excluded.remove(id);
        self.excluded.remove(id)
    }

    /// Drop every trace of a deleted item.
    pub fn forget(&mut self, id: &str) {
        self.counts.remove(id);
        self.excluded.remove(id);
        self.auto_excluded.remove(id);
    }

    /// Decrement all counts and re-admit automatic exclusions that fell
    /// below `threshold`.
    pub fn decay_and_reinclude(&mut self, threshold: u32) -> DecayReport {
        let decremented = decay_counts(&mut self.counts);

        let reincluded: Vec<String> = self
            .auto_excluded
            .iter()
            .filter(|id| below_threshold(self.count(id), threshold))
            .cloned()
            .collect();

        for id in &reincluded {
            self.reinclude(id);
        }

        DecayReport {
            decremented,
            reincluded,
        }
    }

    /// Excluded ids split into manual and automatic, in id order.
    pub fn partition(&self) -> ExclusionPartition {
        let (auto, manual): (Vec<String>, Vec<String>) = self
            .excluded
            .iter()
            .cloned()
            .partition(|id| self.auto_excluded.contains(id));
        ExclusionPartition { manual, auto }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Item;

    fn catalog() -> Catalog {
        Catalog::from_items(vec![
            Item::new("A", "", "a"),
            Item::new("B", "", "b"),
            Item::new("C", "", "c"),
        ])
    }

    #[test]
    fn test_record_correct_increments() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();

        assert_eq!(tracker.record_correct(&catalog, "A"), Some(1));
        assert_eq!(tracker.record_correct(&catalog, "A"), Some(2));
        assert_eq!(tracker.count("A"), 2);
        assert_eq!(tracker.count("B"), 0);
    }

    #[test]
    fn test_record_correct_unknown_id_is_noop() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();

        assert_eq!(tracker.record_correct(&catalog, "Z"), None);
        assert!(tracker.counts().is_empty());
    }

    #[test]
    fn test_auto_exclude_at_threshold() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();

        tracker.record_correct(&catalog, "A");
        assert!(!tracker.auto_exclude_if_threshold_reached("A", 2));
        assert!(!tracker.is_excluded("A"));

        tracker.record_correct(&catalog, "A");
        assert!(tracker.auto_exclude_if_threshold_reached("A", 2));
        assert!(tracker.is_excluded("A"));
        assert!(tracker.is_auto_excluded("A"));
    }

    #[test]
    fn test_manual_exclude_at_zero_is_not_auto() {
        let mut tracker = MasteryTracker::new();
        tracker.manual_exclude("B");

        assert!(tracker.is_excluded("B"));
        assert!(!tracker.is_auto_excluded("B"));
    }

    #[test]
    fn test_manual_overrides_automatic() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();
        for _ in 0..5 {
            tracker.record_correct(&catalog, "A");
        }
        tracker.auto_exclude_if_threshold_reached("A", 2);
        assert!(tracker.is_auto_excluded("A"));

        tracker.manual_exclude("A");

        assert!(tracker.is_excluded("A"));
        assert!(!tracker.is_auto_excluded("A"));
    }

    #[test]
    fn test_reinclude_keeps_count() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();
        tracker.record_correct(&catalog, "A");
        tracker.record_correct(&catalog, "A");
        tracker.auto_exclude_if_threshold_reached("A", 2);

        assert!(tracker.reinclude("A"));
        assert!(!tracker.is_excluded("A"));
        assert!(!tracker.is_auto_excluded("A"));
        assert_eq!(tracker.count("A"), 2);

        assert!(!tracker.reinclude("A"));
    }

    #[test]
    fn test_decay_reincludes_only_auto() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();
        for _ in 0..2 {
            tracker.record_correct(&catalog, "A");
            tracker.record_correct(&catalog, "B");
        }
        tracker.auto_exclude_if_threshold_reached("A", 2);
        tracker.manual_exclude("B");

        let report = tracker.decay_and_reinclude(2);

        assert!(report.changed());
        assert_eq!(report.decremented, 2);
        assert_eq!(report.reincluded, vec!["A".to_string()]);
        assert!(!tracker.is_excluded("A"));
        assert!(tracker.is_excluded("B"));
        assert_eq!(tracker.count("A"), 1);
        assert_eq!(tracker.count("B"), 1);
    }

    #[test]
    fn test_decay_keeps_auto_exclusion_still_at_threshold() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();
        for _ in 0..4 {
            tracker.record_correct(&catalog, "A");
        }
        tracker.auto_exclude_if_threshold_reached("A", 2);

        let report = tracker.decay_and_reinclude(2);

        assert!(report.reincluded.is_empty());
        assert!(tracker.is_auto_excluded("A"));
        assert_eq!(tracker.count("A"), 3);
    }

    #[test]
    fn test_decay_with_nothing_recorded_changes_nothing() {
        let mut tracker = MasteryTracker::new();
        tracker.manual_exclude("C");
        let report = tracker.decay_and_reinclude(2);
        assert!(!report.changed());
    }

    #[test]
    fn test_forget_cascades() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();
        tracker.record_correct(&catalog, "A");
        tracker.auto_exclude_if_threshold_reached("A", 1);

        tracker.forget("A");

        assert!(!tracker.is_excluded("A"));
        assert!(!tracker.is_auto_excluded("A"));
        assert!(!tracker.counts().contains_key("A"));
    }

    #[test]
    fn test_from_parts_repairs_subset() {
        let tracker = MasteryTracker::from_parts(
            BTreeMap::new(),
            ["A".to_string()].into_iter().collect(),
            ["A".to_string(), "B".to_string()].into_iter().collect(),
        );
        assert!(tracker.is_auto_excluded("A"));
        assert!(!tracker.is_auto_excluded("B"));
    }

    #[test]
    fn test_partition() {
        let catalog = catalog();
        let mut tracker = MasteryTracker::new();
        tracker.record_correct(&catalog, "A");
        tracker.auto_exclude_if_threshold_reached("A", 1);
        tracker.manual_exclude("C");

        let partition = tracker.partition();

        assert_eq!(partition.auto, vec!["A".to_string()]);
        assert_eq!(partition.manual, vec!["C".to_string()]);
    }
}
