//! CLI commands for rote.
//!
//! This module provides CLI commands for rote, organized into:
//! - **Study commands**: next, reveal, known, exclude, show, current
//! - **Catalog commands**: add, delete, include, list
//! - **Utility commands**: status, export, import, init

// Study commands
pub mod study;

// Catalog commands
pub mod items;

// Utility commands
pub mod backup_cmd;
pub mod init;
pub mod status;

pub use backup_cmd::BackupCommand;
pub use init::InitCommand;
pub use items::ItemsCommand;
pub use status::StatusCommand;
pub use study::StudyCommand;
