//! Status command for rote.
//!
//! Summarizes the catalog, exclusions, the current pass, and when the next
//! decay run falls due.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::{Config, StudyConfig};
use crate::storage::KvStore;
use crate::study::StudySession;

/// Options for the status command.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the status command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    /// Always true; status reads state fail-open.
    pub success: bool,
    /// Items in the catalog.
    pub items: usize,
    /// Items in rotation.
    pub eligible: usize,
    /// Items excluded by the user.
    pub excluded_manual: usize,
    /// Items excluded for reaching the mastery threshold.
    pub excluded_mastered: usize,
    /// Length of the current pass.
    pub deck_size: usize,
    /// Cards not yet drawn in the current pass.
    pub deck_remaining: usize,
    /// Completed passes.
    pub deck_cycles: u64,
    /// Completed passes still needed before the next decay run.
    pub passes_until_decay: u64,
    /// Id on screen, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Effective study settings.
    pub config: StudyConfig,
    /// Where state is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Passes left until `cycles` reaches the next multiple of `period`.
pub fn passes_until_decay(cycles: u64, period: u64) -> u64 {
    if period == 0 {
        return 0;
    }
    period - cycles % period
}

/// The status command implementation.
pub struct StatusCommand<S: KvStore, R: Rng = ChaCha8Rng> {
    session: StudySession<S, R>,
    data_dir: Option<String>,
}

impl<S: KvStore> StatusCommand<S> {
    /// Open a session on `store`.
    pub fn new(store: S, config: &Config, data_dir: Option<String>) -> Self {
        Self::with_session(StudySession::open(store, config.study.clone()), data_dir)
    }
}

impl<S: KvStore, R: Rng> StatusCommand<S, R> {
    /// Wrap an already open session.
    pub fn with_session(session: StudySession<S, R>, data_dir: Option<String>) -> Self {
        Self { session, data_dir }
    }

    /// Run the status command.
    pub fn run(&self) -> StatusOutput {
        let partition = self.session.excluded_items();
        let deck = self.session.deck();
        let config = self.session.config().clone();

        StatusOutput {
            success: true,
            items: self.session.catalog().len(),
            eligible: self.session.eligible_items().len(),
            excluded_manual: partition.manual.len(),
            excluded_mastered: partition.auto.len(),
            deck_size: deck.len(),
            deck_remaining: deck.remaining().len(),
            deck_cycles: self.session.deck_cycles(),
            passes_until_decay: passes_until_decay(
                self.session.deck_cycles(),
                config.decay_period,
            ),
            current: self.session.presentation().current_id.clone(),
            config,
            data_dir: self.data_dir.clone(),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatusOutput, options: &StatusOptions) -> String {
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

fn format_human_readable(output: &StatusOutput) -> String {
    let mut lines = vec![
        format!(
            "Items: {} ({} in rotation, {} excluded, {} mastered)",
            output.items, output.eligible, output.excluded_manual, output.excluded_mastered
        ),
        format!(
            "Pass: {} of {} cards left, {} completed",
            output.deck_remaining, output.deck_size, output.deck_cycles
        ),
        format!(
            "Decay: every {} passes, next in {}",
            output.config.decay_period, output.passes_until_decay
        ),
        format!(
            "Mastery threshold: {} correct",
            output.config.mastery_threshold
        ),
    ];
    match &output.current {
        Some(id) => lines.push(format!("Current card: {}", id)),
        None => lines.push("Current card: none".to_string()),
    }
    if let Some(dir) = &output.data_dir {
        lines.push(format!("Data: {}", dir));
    }
    lines.join("\n") + "\n"
}
