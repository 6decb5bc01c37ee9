//! The study controller and its persistence mapping.

pub mod persist;
pub mod session;

pub use session::{Advance, AdvanceGuard, CardView, MarkOutcome, StudySession};
