//! The study controller.
//!
//! `StudySession` owns the catalog, the mastery tracker, the deck and the
//! presentation state. It is the only place those are mutated, and every
//! action mirrors what it changed to the store before returning. Store
//! failures are logged and swallowed; the in-memory state stays
//! authoritative for the rest of the session.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::backup::{Backup, BACKUP_VERSION};
use crate::config::StudyConfig;
use crate::core::{reconcile, Catalog, Deck, Item, Phase, PresentationState, StudyState};
use crate::error::{Result, RoteError};
use crate::mastery::{is_decay_due, ExclusionPartition, MasteryTracker};
use crate::storage::KvStore;
use crate::study::persist;

/// Ignores an advance that follows the previous one too closely.
///
/// One physical gesture can arrive as two advance events; the second one
/// inside `min_interval` is dropped.
#[derive(Debug, Clone)]
pub struct AdvanceGuard {
    min_interval: Duration,
    last: Option<Instant>,
}

impl AdvanceGuard {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Whether an advance at `now` may proceed. Records `now` if so.
    pub fn try_pass(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

/// Result of an advance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "id", rename_all = "snake_case")]
pub enum Advance {
    /// Dropped by the debounce guard; nothing changed.
    Debounced,
    /// A new card is on screen.
    Showing(String),
    /// Nothing is eligible.
    Exhausted,
}

/// What the front end should display for the current card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: String,
    pub description: String,
    /// Present only once the card is revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_source: Option<String>,
    pub phase: Phase,
    pub count: u32,
}

/// Result of marking the current card as known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkOutcome {
    pub id: String,
    pub count: u32,
    /// The item reached the mastery threshold and left the rotation.
    pub auto_excluded: bool,
}

/// Owns all study state for one store.
pub struct StudySession<S: KvStore, R: Rng = ChaCha8Rng> {
    store: S,
    config: StudyConfig,
    rng: R,
    catalog: Catalog,
    tracker: MasteryTracker,
    deck: Deck,
    deck_cycles: u64,
    presentation: PresentationState,
    guard: AdvanceGuard,
}

impl<S: KvStore> StudySession<S, ChaCha8Rng> {
    /// Load from `store` with an entropy-seeded shuffle.
    pub fn open(store: S, config: StudyConfig) -> Self {
        Self::with_rng(store, config, ChaCha8Rng::from_entropy())
    }
}

impl<S: KvStore, R: Rng> StudySession<S, R> {
    /// Load from `store`, shuffling with `rng`.
    ///
    /// Persisted state is reconciled against the catalog; whatever had to
    /// be repaired is written back so a second load sees the same state.
    pub fn with_rng(store: S, config: StudyConfig, rng: R) -> Self {
        let snapshot = persist::load(&store);
        let guard = AdvanceGuard::new(Duration::from_millis(config.advance_debounce_ms));
        let mut session = Self {
            store,
            config,
            rng,
            catalog: Catalog::new(),
            tracker: MasteryTracker::new(),
            deck: Deck::new(),
            deck_cycles: 0,
            presentation: PresentationState::exhausted(),
            guard,
        };
        session.install(snapshot.catalog, snapshot.state, snapshot.deck_cycles, false);
        session
    }

    /// Replace all in-memory state and bring it to a displayable point.
    fn install(
        &mut self,
        catalog: Catalog,
        state: StudyState,
        deck_cycles: u64,
        save_all: bool,
    ) {
        let (state, repairs) = reconcile(&catalog, state);
        if !repairs.is_clean() {
            tracing::debug!(?repairs, "repaired stale study state");
        }

        self.catalog = catalog;
        self.tracker =
            MasteryTracker::from_parts(state.counts, state.excluded, state.auto_excluded);
        self.deck = match state.deck {
            Some(record) => Deck::restored(record.deck, record.deck_index),
            None => Deck::new(),
        };
        self.deck_cycles = deck_cycles;
        self.presentation = state.presentation;

        if save_all {
            persist::save_catalog(&self.store, &self.catalog);
            persist::save_cycles(&self.store, self.deck_cycles);
        }
        if save_all || !repairs.is_clean() {
            persist::save_tracker(&self.store, &self.tracker);
            persist::save_presentation(&self.store, &self.presentation);
        }

        if !self.deck.is_valid() {
            self.rebuild_deck();
        }
        if self.presentation.is_exhausted() && self.has_eligible() {
            self.step();
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &MasteryTracker {
        &self.tracker
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn presentation(&self) -> &PresentationState {
        &self.presentation
    }

    /// Completed passes since the counter was last reset by a restore.
    pub fn deck_cycles(&self) -> u64 {
        self.deck_cycles
    }

    /// Items currently in rotation, in catalog order.
    pub fn eligible_items(&self) -> Vec<&Item> {
        self.catalog
            .items()
            .iter()
            .filter(|item| !self.tracker.is_excluded(&item.id))
            .collect()
    }

    /// Excluded ids split into manual and automatic.
    pub fn excluded_items(&self) -> ExclusionPartition {
        self.tracker.partition()
    }

    pub fn counts(&self) -> &BTreeMap<String, u32> {
        self.tracker.counts()
    }

    /// The card on screen, or `None` for the exhausted display.
    pub fn current_display(&self) -> Option<CardView> {
        let id = self.presentation.current_id.as_deref()?;
        let item = self.catalog.get(id)?;
        let formula_source = match self.presentation.phase {
            Phase::Answer => Some(item.formula_source.clone()),
            Phase::Question => None,
        };
        Some(CardView {
            id: item.id.clone(),
            description: item.description.clone(),
            formula_source,
            phase: self.presentation.phase,
            count: self.tracker.count(id),
        })
    }

    fn has_eligible(&self) -> bool {
        self.catalog.ids().any(|id| !self.tracker.is_excluded(id))
    }

    fn eligible_pool(&self) -> Vec<String> {
        self.catalog
            .ids()
            .filter(|id| !self.tracker.is_excluded(id))
            .map(str::to_string)
            .collect()
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Show the next card, unless the previous advance was too recent.
    pub fn advance(&mut self) -> Advance {
        self.advance_at(Instant::now())
    }

    /// [`advance`](Self::advance) with an explicit clock reading.
    pub fn advance_at(&mut self, now: Instant) -> Advance {
        if !self.guard.try_pass(now) {
            tracing::debug!("advance ignored inside debounce interval");
            return Advance::Debounced;
        }
        self.step()
    }

    /// Turn the current card to its answer side.
    ///
    /// Returns false when there is no card or it is already revealed.
    pub fn reveal(&mut self) -> bool {
        if !self.presentation.reveal() {
            return false;
        }
        persist::save_presentation(&self.store, &self.presentation);
        true
    }

    /// Record a correct answer for the revealed card and move on.
    ///
    /// Only valid in the answer phase; returns `None` otherwise. Reaching
    /// the mastery threshold excludes the item automatically.
    pub fn mark_correct(&mut self) -> Option<MarkOutcome> {
        if !self.presentation.can_mark() {
            return None;
        }
        let id = self.presentation.current_id.clone()?;
        let count = self.tracker.record_correct(&self.catalog, &id)?;
        let auto_excluded = self
            .tracker
            .auto_exclude_if_threshold_reached(&id, self.config.mastery_threshold);
        persist::save_tracker(&self.store, &self.tracker);

        if auto_excluded {
            tracing::debug!(id = %id, count, "item mastered, excluding");
            self.eligible_set_changed();
        }
        self.step();

        Some(MarkOutcome {
            id,
            count,
            auto_excluded,
        })
    }

    /// Exclude the current card at the user's request and move on.
    ///
    /// Returns the excluded id, or `None` on the exhausted display.
    pub fn exclude_manually(&mut self) -> Option<String> {
        let id = self.presentation.current_id.clone()?;
        self.tracker.manual_exclude(&id);
        persist::save_tracker(&self.store, &self.tracker);
        self.eligible_set_changed();
        self.step();
        Some(id)
    }

    /// Put an excluded item back into rotation. Its count is kept.
    ///
    /// Returns false if it was not excluded. On the exhausted display the
    /// item shows up on the next advance.
    pub fn reinclude(&mut self, id: &str) -> Result<bool> {
        if !self.catalog.contains(id) {
            return Err(RoteError::item_not_found(id));
        }
        if !self.tracker.reinclude(id) {
            return Ok(false);
        }
        persist::save_tracker(&self.store, &self.tracker);
        self.eligible_set_changed();
        Ok(true)
    }

    /// Add a new item and return its id.
    pub fn add_item(
        &mut self,
        description: impl Into<String>,
        formula_source: impl Into<String>,
    ) -> String {
        let id = self.catalog.next_id();
        self.catalog
            .insert(Item::new(id.clone(), description, formula_source));
        persist::save_catalog(&self.store, &self.catalog);
        self.eligible_set_changed();
        id
    }

    /// Delete an item and every reference to it.
    ///
    /// If it was on screen, a fresh card is drawn.
    pub fn delete_item(&mut self, id: &str) -> Result<Item> {
        let item = self
            .catalog
            .remove(id)
            .ok_or_else(|| RoteError::item_not_found(id))?;
        self.tracker.forget(id);
        persist::save_catalog(&self.store, &self.catalog);
        persist::save_tracker(&self.store, &self.tracker);

        let was_showing = self.presentation.is_showing(id);
        if was_showing {
            self.presentation = PresentationState::exhausted();
            persist::save_presentation(&self.store, &self.presentation);
        }
        self.eligible_set_changed();
        if was_showing && self.has_eligible() {
            self.step();
        }
        Ok(item)
    }

    /// Jump straight to an eligible item, question side up.
    ///
    /// The deck cursor is left alone.
    pub fn show(&mut self, id: &str) -> Result<()> {
        if !self.catalog.contains(id) {
            return Err(RoteError::item_not_found(id));
        }
        if self.tracker.is_excluded(id) {
            return Err(RoteError::not_eligible(id));
        }
        self.presentation = PresentationState::showing(id);
        persist::save_presentation(&self.store, &self.presentation);
        Ok(())
    }

    /// Replace all state with a validated backup.
    pub fn restore(&mut self, backup: Backup) {
        let catalog = backup.catalog();
        let state = StudyState {
            excluded: backup.excluded,
            auto_excluded: backup.auto_excluded,
            counts: backup.stats,
            deck: None,
            presentation: PresentationState::exhausted(),
        };
        self.install(catalog, state, backup.deck_cycles, true);
        tracing::debug!(items = self.catalog.len(), "restored from backup");
    }

    /// Parse, validate, then restore. A rejected payload changes nothing.
    pub fn restore_json(&mut self, text: &str) -> Result<()> {
        let backup = Backup::parse(text)?;
        self.restore(backup);
        Ok(())
    }

    /// Snapshot of everything a restore needs.
    pub fn export(&self) -> Backup {
        Backup {
            version: BACKUP_VERSION,
            exported_at: Some(Utc::now()),
            formulas: self.catalog.items().to_vec(),
            excluded: self.tracker.excluded().clone(),
            auto_excluded: self.tracker.auto_excluded().clone(),
            deck_cycles: self.deck_cycles,
            stats: self.tracker.counts().clone(),
        }
    }

    // =========================================================================
    // Deck plumbing
    // =========================================================================

    /// Draw the next card and put it on screen.
    fn step(&mut self) -> Advance {
        match self.draw_next() {
            Some(id) => {
                self.presentation = PresentationState::showing(id.clone());
                persist::save_presentation(&self.store, &self.presentation);
                Advance::Showing(id)
            }
            None => {
                self.presentation = PresentationState::exhausted();
                persist::save_presentation(&self.store, &self.presentation);
                Advance::Exhausted
            }
        }
    }

    /// Next id from the deck, closing the pass and rebuilding as needed.
    fn draw_next(&mut self) -> Option<String> {
        if !self.deck.is_valid() {
            self.rebuild_deck();
        }
        if self.deck.is_pass_complete() {
            self.complete_pass();
            self.rebuild_deck();
        }
        let id = self.deck.take_next();
        persist::save_deck(&self.store, &self.deck);
        id
    }

    /// Count a finished pass and run decay when it falls due.
    fn complete_pass(&mut self) {
        self.deck_cycles = self.deck_cycles.saturating_add(1);
        persist::save_cycles(&self.store, self.deck_cycles);

        if is_decay_due(self.deck_cycles, self.config.decay_period) {
            let report = self
                .tracker
                .decay_and_reinclude(self.config.mastery_threshold);
            if report.changed() {
                tracing::debug!(
                    cycles = self.deck_cycles,
                    decremented = report.decremented,
                    reincluded = report.reincluded.len(),
                    "decay applied"
                );
                persist::save_tracker(&self.store, &self.tracker);
            }
        }
    }

    fn eligible_set_changed(&mut self) {
        self.deck.invalidate();
        self.rebuild_deck();
    }

    fn rebuild_deck(&mut self) {
        let pool = self.eligible_pool();
        let current = self.presentation.current_id.clone();
        self.deck.rebuild(pool, current.as_deref(), &mut self.rng);
        persist::save_deck(&self.store, &self.deck);
    }
}
