//! What the front end is showing right now.
//!
//! Each card goes `Question -> Answer` on reveal; advancing to another card
//! resets it to `Question`. `current_id == None` is the exhausted display:
//! nothing is eligible.

use serde::{Deserialize, Serialize};

/// Reveal phase of the current card.
///
/// Persisted as `"desc"` / `"formula"`, the view each phase puts on stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Phase {
    /// Description shown, formula hidden.
    #[default]
    #[serde(rename = "desc")]
    Question,
    /// Formula revealed.
    #[serde(rename = "formula")]
    Answer,
}

/// Current card and phase, persisted as `{currentId, stageView}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresentationState {
    #[serde(rename = "currentId", default)]
    pub current_id: Option<String>,
    #[serde(rename = "stageView", default)]
    pub phase: Phase,
}

impl PresentationState {
    /// Show `id` from its question side.
    pub fn showing(id: impl Into<String>) -> Self {
        Self {
            current_id: Some(id.into()),
            phase: Phase::Question,
        }
    }

    /// The exhausted display.
    pub fn exhausted() -> Self {
        Self::default()
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_id.is_none()
    }

    /// Move `Question -> Answer`. Returns false if there is no card or it is
    /// already revealed.
    pub fn reveal(&mut self) -> bool {
        if self.current_id.is_none() || self.phase == Phase::Answer {
            return false;
        }
        self.phase = Phase::Answer;
        true
    }

    /// Whether the current card may be marked as known.
    pub fn can_mark(&self) -> bool {
        self.current_id.is_some() && self.phase == Phase::Answer
    }

    pub fn is_showing(&self, id: &str) -> bool {
        self.current_id.as_deref() == Some(id)
    }
}
