//! Catalog commands for rote.
//!
//! Add and delete items, put excluded items back into rotation, and list
//! what is eligible or excluded.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::Config;
use crate::core::Item;
use crate::storage::KvStore;
use crate::study::StudySession;

/// Catalog action to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemsAction {
    /// Add a new item.
    Add {
        description: String,
        formula: String,
    },
    /// Delete an item and everything recorded about it.
    Delete { id: String },
    /// Put an excluded item back into rotation.
    Include { id: String },
    /// List eligible items, or excluded ones.
    List { excluded: bool },
}

impl ItemsAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Delete { .. } => "delete",
            Self::Include { .. } => "include",
            Self::List { .. } => "list",
        }
    }
}

/// Options for the catalog commands.
#[derive(Debug, Clone, Default)]
pub struct ItemsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// How an item currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Eligible,
    /// Excluded by the user.
    Excluded,
    /// Excluded for reaching the mastery threshold.
    Mastered,
}

/// Item info for output.
#[derive(Debug, Clone, Serialize)]
pub struct ItemInfo {
    pub id: String,
    pub description: String,
    pub formula: String,
    pub count: u32,
    pub status: ItemStatus,
}

/// Output format for the catalog commands.
#[derive(Debug, Clone, Serialize)]
pub struct ItemsOutput {
    /// Whether the action succeeded.
    pub success: bool,
    /// The action that ran.
    pub action: String,
    /// Id the action applied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Whether state changed (false for including an item already in rotation).
    pub changed: bool,
    /// Listed items.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemInfo>,
    /// Error message if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemsOutput {
    /// Create a successful output for a single-item action.
    pub fn success(action: &ItemsAction, id: impl Into<String>, changed: bool) -> Self {
        Self {
            success: true,
            action: action.name().to_string(),
            id: Some(id.into()),
            changed,
            items: Vec::new(),
            error: None,
        }
    }

    /// Create a successful listing.
    pub fn listing(action: &ItemsAction, items: Vec<ItemInfo>) -> Self {
        Self {
            success: true,
            action: action.name().to_string(),
            id: None,
            changed: false,
            items,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(action: &ItemsAction, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: action.name().to_string(),
            id: None,
            changed: false,
            items: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The catalog command implementation.
pub struct ItemsCommand<S: KvStore, R: Rng = ChaCha8Rng> {
    session: StudySession<S, R>,
}

impl<S: KvStore> ItemsCommand<S> {
    /// Open a session on `store`.
    pub fn new(store: S, config: &Config) -> Self {
        Self::with_session(StudySession::open(store, config.study.clone()))
    }
}

impl<S: KvStore, R: Rng> ItemsCommand<S, R> {
    /// Wrap an already open session.
    pub fn with_session(session: StudySession<S, R>) -> Self {
        Self { session }
    }

    /// Run one catalog action.
    pub fn run(&mut self, action: &ItemsAction) -> ItemsOutput {
        match action {
            ItemsAction::Add {
                description,
                formula,
            } => {
                if formula.trim().is_empty() {
                    return ItemsOutput::failure(action, "formula must not be empty");
                }
                let id = self.session.add_item(description.trim(), formula.trim());
                ItemsOutput::success(action, id, true)
            }
            ItemsAction::Delete { id } => match self.session.delete_item(id) {
                Ok(item) => ItemsOutput::success(action, item.id, true),
                Err(e) => ItemsOutput::failure(action, e.to_string()),
            },
            ItemsAction::Include { id } => match self.session.reinclude(id) {
                Ok(changed) => ItemsOutput::success(action, id.clone(), changed),
                Err(e) => ItemsOutput::failure(action, e.to_string()),
            },
            ItemsAction::List { excluded } => {
                let items = if *excluded {
                    self.excluded_infos()
                } else {
                    self.session
                        .eligible_items()
                        .into_iter()
                        .map(|item| self.info(item))
                        .collect()
                };
                ItemsOutput::listing(action, items)
            }
        }
    }

    /// Excluded items, manual ones first.
    fn excluded_infos(&self) -> Vec<ItemInfo> {
        let partition = self.session.excluded_items();
        partition
            .manual
            .iter()
            .chain(partition.auto.iter())
            .filter_map(|id| self.session.catalog().get(id))
            .map(|item| self.info(item))
            .collect()
    }

    fn info(&self, item: &Item) -> ItemInfo {
        let tracker = self.session.tracker();
        let status = if tracker.is_auto_excluded(&item.id) {
            ItemStatus::Mastered
        } else if tracker.is_excluded(&item.id) {
            ItemStatus::Excluded
        } else {
            ItemStatus::Eligible
        };
        ItemInfo {
            id: item.id.clone(),
            description: item.description.clone(),
            formula: item.formula_source.clone(),
            count: tracker.count(&item.id),
            status,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ItemsOutput, options: &ItemsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            format_human_readable(output)
        }
    }
}

fn format_human_readable(output: &ItemsOutput) -> String {
    if let Some(error) = &output.error {
        return format!("{} failed: {}\n", output.action, error);
    }

    let id = output.id.as_deref().unwrap_or_default();
    match output.action.as_str() {
        "add" => format!("Added {}.\n", id),
        "delete" => format!("Deleted {}.\n", id),
        "include" if output.changed => format!("{} is back in rotation.\n", id),
        "include" => format!("{} was not excluded.\n", id),
        _ => format_listing(&output.items),
    }
}

fn format_listing(items: &[ItemInfo]) -> String {
    if items.is_empty() {
        return "No items.\n".to_string();
    }

    let mut lines = Vec::new();
    for item in items {
        let marker = match item.status {
            ItemStatus::Eligible => "",
            ItemStatus::Excluded => " [excluded]",
            ItemStatus::Mastered => " [mastered]",
        };
        let description = if item.description.is_empty() {
            "(no description)"
        } else {
            item.description.as_str()
        };
        lines.push(format!(
            "{}{}  correct: {}\n  {}\n  = {}",
            item.id, marker, item.count, description, item.formula
        ));
    }
    lines.push(format!("{} item(s)", items.len()));
    lines.join("\n") + "\n"
}
