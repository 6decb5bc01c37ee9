//! Persisted key names.

/// Array of `{id, desc, tex}`.
pub const CATALOG: &str = "catalog";

/// Array of excluded item ids.
pub const EXCLUDED: &str = "excluded";

/// Array of ids excluded by reaching the mastery threshold.
pub const AUTO_EXCLUDED: &str = "auto_excluded";

/// Object mapping item id to correct-answer count.
pub const STATS: &str = "stats";

/// Completed deck passes, as integer text.
pub const DECK_CYCLES: &str = "deck_cycles";

/// `{deck: [id], deckIndex: n}`.
pub const DECK: &str = "deck";

/// `{currentId, stageView}`.
pub const PRESENTATION: &str = "presentation";

/// Every key the study session owns.
pub const ALL: &[&str] = &[
    CATALOG,
    EXCLUDED,
    AUTO_EXCLUDED,
    STATS,
    DECK_CYCLES,
    DECK,
    PRESENTATION,
];

/// Check whether a key is safe to use as a file stem.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
