//! Study commands for rote.
//!
//! The card loop: draw, reveal, mark known, exclude, jump to an item, or
//! just look at what is on screen.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::Config;
use crate::core::Phase;
use crate::storage::KvStore;
use crate::study::{Advance, CardView, MarkOutcome, StudySession};

/// What to do with the current card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyAction {
    /// Draw the next card.
    Next,
    /// Show the formula of the current card.
    Reveal,
    /// Mark the revealed card as known.
    Known,
    /// Exclude the current card from study.
    Exclude,
    /// Jump to a specific item.
    Show(String),
    /// Print the current card.
    Current,
}

impl StudyAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Reveal => "reveal",
            Self::Known => "known",
            Self::Exclude => "exclude",
            Self::Show(_) => "show",
            Self::Current => "current",
        }
    }
}

/// Options for the study commands.
#[derive(Debug, Clone, Default)]
pub struct StudyOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the study commands.
#[derive(Debug, Clone, Serialize)]
pub struct StudyOutput {
    /// Whether the action was applied.
    pub success: bool,
    /// The action that ran.
    pub action: String,
    /// The card on screen after the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardView>,
    /// Nothing is left to study.
    pub exhausted: bool,
    /// Result of marking a card as known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked: Option<MarkOutcome>,
    /// Id excluded by this action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded: Option<String>,
    /// Error message if the action was refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StudyOutput {
    /// Create a successful output.
    pub fn success(action: &StudyAction, card: Option<CardView>) -> Self {
        Self {
            success: true,
            action: action.name().to_string(),
            exhausted: card.is_none(),
            card,
            marked: None,
            excluded: None,
            error: None,
        }
    }

    /// Create a failed output; the card is still reported.
    pub fn failure(action: &StudyAction, card: Option<CardView>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            success: false,
            ..Self::success(action, card)
        }
    }
}

/// The study command implementation.
pub struct StudyCommand<S: KvStore, R: Rng = ChaCha8Rng> {
    session: StudySession<S, R>,
}

impl<S: KvStore> StudyCommand<S> {
    /// Open a session on `store`.
    pub fn new(store: S, config: &Config) -> Self {
        Self::with_session(StudySession::open(store, config.study.clone()))
    }
}

impl<S: KvStore, R: Rng> StudyCommand<S, R> {
    /// Wrap an already open session.
    pub fn with_session(session: StudySession<S, R>) -> Self {
        Self { session }
    }

    /// Run one study action.
    pub fn run(&mut self, action: &StudyAction) -> StudyOutput {
        let refused = match action {
            StudyAction::Next => {
                if self.session.advance() == Advance::Debounced {
                    Some("advance ignored, too soon after the previous one".to_string())
                } else {
                    None
                }
            }
            StudyAction::Reveal => {
                if self.session.reveal() {
                    None
                } else {
                    Some(self.refusal("nothing to reveal", "card is already revealed"))
                }
            }
            StudyAction::Known => match self.session.mark_correct() {
                Some(outcome) => {
                    let mut output =
                        StudyOutput::success(action, self.session.current_display());
                    output.marked = Some(outcome);
                    return output;
                }
                None => Some(self.refusal(
                    "no card to mark",
                    "reveal the card before marking it known",
                )),
            },
            StudyAction::Exclude => match self.session.exclude_manually() {
                Some(id) => {
                    let mut output =
                        StudyOutput::success(action, self.session.current_display());
                    output.excluded = Some(id);
                    return output;
                }
                None => Some("no card to exclude".to_string()),
            },
            StudyAction::Show(id) => self.session.show(id).err().map(|e| e.to_string()),
            StudyAction::Current => None,
        };

        let card = self.session.current_display();
        match refused {
            Some(error) => StudyOutput::failure(action, card, error),
            None => StudyOutput::success(action, card),
        }
    }

    fn refusal(&self, when_exhausted: &str, otherwise: &str) -> String {
        if self.session.presentation().is_exhausted() {
            when_exhausted.to_string()
        } else {
            otherwise.to_string()
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StudyOutput, options: &StudyOptions) -> String {
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

fn format_human_readable(output: &StudyOutput) -> String {
    let mut lines = Vec::new();

    if let Some(error) = &output.error {
        lines.push(format!("Cannot {}: {}", output.action, error));
    }

    if let Some(marked) = &output.marked {
        if marked.auto_excluded {
            lines.push(format!(
                "Mastered {} ({} correct), excluded from study.",
                marked.id, marked.count
            ));
        } else {
            lines.push(format!("Marked {} known ({} correct).", marked.id, marked.count));
        }
    }

    if let Some(id) = &output.excluded {
        lines.push(format!("Excluded {}.", id));
    }

    match &output.card {
        Some(card) => {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(format_card(card));
        }
        None => {
            lines.push("All items are excluded. Add or include an item to continue.".to_string())
        }
    }

    lines.join("\n") + "\n"
}

fn format_card(card: &CardView) -> Vec<String> {
    let mut lines = vec![format!("[{}] correct: {}", card.id, card.count)];
    if card.description.is_empty() {
        lines.push("  (no description)".to_string());
    } else {
        lines.push(format!("  {}", card.description));
    }
    match (&card.formula_source, card.phase) {
        (Some(formula), Phase::Answer) => lines.push(format!("  = {}", formula)),
        _ => lines.push("  (reveal to see the formula)".to_string()),
    }
    lines
}
