//! Mapping between study state and the key/value store.
//!
//! Reads are lenient: a missing key, unreadable value, or wrong JSON shape
//! reads as the empty default for that key and is logged. Writes are
//! best-effort: a failed write is logged and swallowed, the in-memory state
//! stays authoritative for the rest of the session.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::core::{Catalog, Deck, DeckRecord, Item, PresentationState, StudyState};
use crate::error::{FailOpen, Result};
use crate::mastery::MasteryTracker;
use crate::storage::{keys, KvStore};

/// Everything read from the store, before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub catalog: Catalog,
    pub state: StudyState,
    pub deck_cycles: u64,
}

/// Read all study keys.
pub fn load<S: KvStore>(store: &S) -> Snapshot {
    let catalog = read_json(store, keys::CATALOG)
        .map(|v| parse_catalog(&v))
        .unwrap_or_default();

    let state = StudyState {
        excluded: read_json(store, keys::EXCLUDED)
            .map(|v| parse_id_set(&v))
            .unwrap_or_default(),
        auto_excluded: read_json(store, keys::AUTO_EXCLUDED)
            .map(|v| parse_id_set(&v))
            .unwrap_or_default(),
        counts: read_json(store, keys::STATS)
            .map(|v| parse_counts(&v))
            .unwrap_or_default(),
        deck: read_json(store, keys::DECK).and_then(parse_deck),
        presentation: read_json(store, keys::PRESENTATION)
            .map(parse_presentation)
            .unwrap_or_default(),
    };

    let deck_cycles = read_raw(store, keys::DECK_CYCLES)
        .map(|text| parse_cycles(&text))
        .unwrap_or(0);

    Snapshot {
        catalog,
        state,
        deck_cycles,
    }
}

fn read_raw<S: KvStore>(store: &S, key: &str) -> Option<String> {
    store
        .get(key)
        .fail_open_default(&format!("reading '{}'", key))
}

fn read_json<S: KvStore>(store: &S, key: &str) -> Option<Value> {
    let text = read_raw(store, key)?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "corrupt value in store, treating as absent");
            None
        }
    }
}

/// Items from a JSON array; entries that are not item objects are skipped.
pub(crate) fn parse_catalog(value: &Value) -> Catalog {
    let Some(entries) = value.as_array() else {
        tracing::warn!("catalog is not a list, treating as empty");
        return Catalog::new();
    };
    Catalog::from_items(
        entries
            .iter()
            .filter_map(|entry| serde_json::from_value::<Item>(entry.clone()).ok()),
    )
}

/// String ids from a JSON array; anything else reads as empty.
pub(crate) fn parse_id_set(value: &Value) -> BTreeSet<String> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Non-negative integer counts from a JSON object.
pub(crate) fn parse_counts(value: &Value) -> BTreeMap<String, u32> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(id, count)| {
                    let count = u32::try_from(count.as_u64()?).ok()?;
                    Some((id.clone(), count))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_cycles(text: &str) -> u64 {
    text.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(value = text, "corrupt deck cycle count, using 0");
        0
    })
}

fn parse_deck(value: Value) -> Option<DeckRecord> {
    serde_json::from_value(value).ok()
}

fn parse_presentation(value: Value) -> PresentationState {
    serde_json::from_value(value).unwrap_or_default()
}

fn write_json<S: KvStore, T: Serialize + ?Sized>(store: &S, key: &str, value: &T) {
    let result: Result<()> = serde_json::to_string(value)
        .map_err(Into::into)
        .and_then(|text| store.put(key, &text));
    result.fail_open_default(&format!("saving '{}'", key));
}

pub fn save_catalog<S: KvStore>(store: &S, catalog: &Catalog) {
    write_json(store, keys::CATALOG, catalog.items());
}

/// Write exclusions, automatic exclusions and counts.
pub fn save_tracker<S: KvStore>(store: &S, tracker: &MasteryTracker) {
    write_json(store, keys::EXCLUDED, tracker.excluded());
    write_json(store, keys::AUTO_EXCLUDED, tracker.auto_excluded());
    write_json(store, keys::STATS, tracker.counts());
}

pub fn save_cycles<S: KvStore>(store: &S, cycles: u64) {
    store
        .put(keys::DECK_CYCLES, &cycles.to_string())
        .fail_open_default("saving 'deck_cycles'");
}

/// Write the deck, or remove it while it is unbuilt.
pub fn save_deck<S: KvStore>(store: &S, deck: &Deck) {
    if deck.is_valid() {
        write_json(store, keys::DECK, &deck.to_record());
    } else {
        store
            .delete(keys::DECK)
            .fail_open_default("clearing 'deck'");
    }
}

pub fn save_presentation<S: KvStore>(store: &S, presentation: &PresentationState) {
    write_json(store, keys::PRESENTATION, presentation);
}
