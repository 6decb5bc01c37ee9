//! Study items and the ordered catalog that owns them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

static ITEM_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A single flashcard: a description prompt and the formula it asks for.
///
/// The formula source is opaque text (typically TeX); rendering it is the
/// front end's business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Stable unique identifier.
    pub id: String,
    /// Prompt shown in the question phase. May be empty.
    #[serde(rename = "desc", default)]
    pub description: String,
    /// Formula shown in the answer phase.
    #[serde(rename = "tex", default)]
    pub formula_source: String,
}

impl Item {
    /// Create a new item.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        formula_source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            formula_source: formula_source.into(),
        }
    }
}

/// Ordered collection of items with lookup by id.
///
/// Ids are unique; the first occurrence wins when building from a list
/// that contains duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, dropping items with an empty or repeated id.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| !item.id.is_empty() && seen.insert(item.id.clone()))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    /// Ids as an owned set, for reconciliation.
    pub fn id_set(&self) -> HashSet<String> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    /// Append an item. Returns false (and leaves the catalog alone) if the
    /// id is empty or already taken.
    pub fn insert(&mut self, item: Item) -> bool {
        if item.id.is_empty() || self.contains(&item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove an item, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Generate an id that is not yet used in this catalog.
    ///
    /// Format: `f_YYYYMMDDHHMMSS_NNN`.
    pub fn next_id(&self) -> String {
        loop {
            let counter = ITEM_COUNTER.fetch_add(1, Ordering::SeqCst);
            let id = format!(
                "f_{}_{:03}",
                Utc::now().format("%Y%m%d%H%M%S"),
                counter % 1000
            );
            if !self.contains(&id) {
                return id;
            }
        }
    }
}
