//! Mastery tracking for rote.
//!
//! Correct-answer counters per item, the manual/automatic exclusion sets,
//! and the decay rule that periodically re-admits mastered items.

pub mod decay;
pub mod tracker;

pub use decay::{decay_counts, is_decay_due, DecayReport};
pub use tracker::{ExclusionPartition, MasteryTracker};
