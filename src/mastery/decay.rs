//! Periodic decay of correct-answer counts.
//!
//! Decay logic:
//! 1. Every `decay_period` completed deck passes, a decay run is due
//! 2. Each recorded count drops by one, never below zero
//! 3. Auto-excluded items whose count fell below the mastery threshold are
//!    re-admitted to the deck
//! 4. Manual exclusions are never touched
//!
//! This keeps mastered items coming back for review without per-item
//! timestamps: mastery fades over study passes, not wall-clock time.

use std::collections::BTreeMap;

/// Outcome of one decay run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Number of counts that were decremented.
    pub decremented: usize,
    /// Items moved out of the exclusion set, in id order.
    pub reincluded: Vec<String>,
}

impl DecayReport {
    /// Whether the run changed any state.
    pub fn changed(&self) -> bool {
        self.decremented > 0 || !self.reincluded.is_empty()
    }
}

/// Check whether a decay run is due after `cycles` completed passes.
///
/// Cycle zero never triggers; a period of zero disables decay.
pub fn is_decay_due(cycles: u64, period: u64) -> bool {
    period > 0 && cycles > 0 && cycles % period == 0
}

/// Decrement every count by one, flooring at zero.
///
/// Returns how many counts actually changed.
pub fn decay_counts(counts: &mut BTreeMap<String, u32>) -> usize {
    let mut decremented = 0;
    for count in counts.values_mut() {
        if *count > 0 {
            *count -= 1;
            decremented += 1;
        }
    }
    decremented
}

/// Whether an item with `count` correct answers has dropped out of mastery.
pub fn below_threshold(count: u32, threshold: u32) -> bool {
    count < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_is_decay_due() {
        assert!(!is_decay_due(0, 10));
        assert!(!is_decay_due(9, 10));
        assert!(is_decay_due(10, 10));
        assert!(!is_decay_due(11, 10));
        assert!(is_decay_due(20, 10));
        assert!(is_decay_due(1, 1));
    }

    #[test]
    fn test_zero_period_never_due() {
        assert!(!is_decay_due(0, 0));
        assert!(!is_decay_due(10, 0));
    }

    #[test]
    fn test_decay_counts_floors_at_zero() {
        let mut c = counts(&[("a", 3), ("b", 1), ("c", 0)]);
        let changed = decay_counts(&mut c);

        assert_eq!(changed, 2);
        assert_eq!(c, counts(&[("a", 2), ("b", 0), ("c", 0)]));
    }

    #[test]
    fn test_decay_counts_empty() {
        let mut c = BTreeMap::new();
        assert_eq!(decay_counts(&mut c), 0);
    }

    #[test]
    fn test_below_threshold() {
        assert!(below_threshold(1, 2));
        assert!(!below_threshold(2, 2));
    }

    #[test]
    fn test_report_changed() {
        assert!(!DecayReport::default().changed());
        assert!(DecayReport {
            decremented: 1,
            reincluded: vec![]
        }
        .changed());
        assert!(DecayReport {
            decremented: 0,
            reincluded: vec!["a".to_string()]
        }
        .changed());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: decay never goes negative and moves each count by at most one
            #[test]
            fn prop_decay_monotone(
                before in proptest::collection::btree_map("[a-z]{1,4}", 0u32..20, 0..30)
            ) {
                let mut after = before.clone();
                decay_counts(&mut after);

                prop_assert_eq!(after.len(), before.len());
                for (id, old) in &before {
                    let new = after[id];
                    if *old == 0 {
                        prop_assert_eq!(new, 0);
                    } else {
                        prop_assert_eq!(new, old - 1);
                    }
                }
            }
        }
    }
}
