//! Core types for rote.
//!
//! The catalog of items, the deck state machine, what is on screen, and the
//! reconciliation pass that keeps id references consistent.

pub mod catalog;
pub mod deck;
pub mod presentation;
pub mod reconcile;

pub use catalog::{Catalog, Item};
pub use deck::{is_permutation_of, Deck, DeckRecord, DeckState};
pub use presentation::{Phase, PresentationState};
pub use reconcile::{eligible_ids, reconcile, Repairs, StudyState};
