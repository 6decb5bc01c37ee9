//! Backup snapshots for export and restore.
//!
//! A backup is one JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "exportedAt": "2026-01-01T00:00:00Z",
//!   "formulas": [{"id": "f1", "desc": "...", "tex": "..."}],
//!   "excluded": ["f1"],
//!   "autoExcluded": ["f1"],
//!   "deckCycles": 12,
//!   "stats": {"f1": 3}
//! }
//! ```
//!
//! Only `formulas` is mandatory on restore: if it is missing or not a list
//! the whole payload is rejected. Every other field falls back to empty or
//! zero when missing or malformed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::core::{Catalog, Item};
use crate::error::{RoteError, Result};
use crate::study::persist::{parse_catalog, parse_counts, parse_id_set};

/// Current backup format version.
pub const BACKUP_VERSION: u64 = 1;

/// A full, validated snapshot of the study state.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    pub formulas: Vec<Item>,
    pub excluded: BTreeSet<String>,
    pub auto_excluded: BTreeSet<String>,
    pub deck_cycles: u64,
    pub stats: BTreeMap<String, u32>,
}

impl Backup {
    /// Parse and validate a backup document.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RoteError::restore(format!("backup is not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Validate an already parsed backup document.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(RoteError::restore("backup must be a JSON object"));
        };

        let formulas = match object.get("formulas") {
            Some(list @ Value::Array(entries)) => {
                let catalog = parse_catalog(list);
                if catalog.len() < entries.len() {
                    tracing::warn!(
                        skipped = entries.len() - catalog.len(),
                        "backup contains invalid or duplicate formulas, skipping them"
                    );
                }
                catalog.items().to_vec()
            }
            Some(_) => return Err(RoteError::restore("'formulas' must be a list")),
            None => return Err(RoteError::restore("missing 'formulas' list")),
        };

        let version = object
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(BACKUP_VERSION);
        if version > BACKUP_VERSION {
            tracing::warn!(version, "backup is from a newer format, reading known fields");
        }

        let exported_at = object
            .get("exportedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Self {
            version,
            exported_at,
            formulas,
            excluded: object.get("excluded").map(parse_id_set).unwrap_or_default(),
            auto_excluded: object
                .get("autoExcluded")
                .map(parse_id_set)
                .unwrap_or_default(),
            deck_cycles: object
                .get("deckCycles")
                .map(parse_deck_cycles)
                .unwrap_or(0),
            stats: object.get("stats").map(parse_counts).unwrap_or_default(),
        })
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Catalog built from the backup's formulas.
    pub fn catalog(&self) -> Catalog {
        Catalog::from_items(self.formulas.iter().cloned())
    }
}

/// Accept a number or numeric text; anything else is zero.
fn parse_deck_cycles(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
