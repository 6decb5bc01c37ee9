//! rote - flashcard scheduling with mastery tracking
//!
//! rote walks a shuffled deck of study items, counts correct answers per
//! item, retires items that reach a mastery threshold, and periodically
//! decays counts so retired items come back for review. All state lives in
//! a key/value store and is repaired against the catalog on every load.

pub mod backup;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod mastery;
pub mod storage;
pub mod study;

pub use backup::{Backup, BACKUP_VERSION};
pub use config::{Config, StudyConfig};
pub use core::{
    reconcile, Catalog, Deck, DeckRecord, DeckState, Item, Phase, PresentationState, Repairs,
    StudyState,
};
pub use error::{Result, RoteError};
pub use mastery::{DecayReport, ExclusionPartition, MasteryTracker};
pub use storage::{FileKvStore, KvStore, MemoryKvStore};
pub use study::{Advance, CardView, MarkOutcome, StudySession};

// CLI commands
pub use cli::{BackupCommand, InitCommand, ItemsCommand, StatusCommand, StudyCommand};
