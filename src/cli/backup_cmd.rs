//! Export and import commands for rote.
//!
//! Export writes a backup document to a file or stdout. Import validates a
//! backup file completely before replacing anything.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::Config;
use crate::storage::KvStore;
use crate::study::StudySession;

/// Backup action to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupAction {
    /// Write a backup to `output`, or to stdout.
    Export { output: Option<PathBuf> },
    /// Replace all state with the backup at `path`.
    Import { path: PathBuf },
}

/// Options for the backup commands.
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the backup commands.
#[derive(Debug, Clone, Serialize)]
pub struct BackupOutput {
    /// Whether the export or import succeeded.
    pub success: bool,
    /// "export" or "import".
    pub action: String,
    /// File written or read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Items in the backup.
    pub items: usize,
    /// Excluded items in the backup.
    pub excluded: usize,
    /// Completed deck passes in the backup.
    pub deck_cycles: u64,
    /// The backup itself, when exporting to stdout.
    #[serde(skip)]
    pub document: Option<String>,
    /// Error message if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackupOutput {
    fn new(action: &str, path: Option<&Path>) -> Self {
        Self {
            success: true,
            action: action.to_string(),
            path: path.map(|p| p.display().to_string()),
            items: 0,
            excluded: 0,
            deck_cycles: 0,
            document: None,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(action: &str, path: Option<&Path>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::new(action, path)
        }
    }
}

/// The backup command implementation.
pub struct BackupCommand<S: KvStore, R: Rng = ChaCha8Rng> {
    session: StudySession<S, R>,
}

impl<S: KvStore> BackupCommand<S> {
    /// Open a session on `store`.
    pub fn new(store: S, config: &Config) -> Self {
        Self::with_session(StudySession::open(store, config.study.clone()))
    }
}

impl<S: KvStore, R: Rng> BackupCommand<S, R> {
    /// Wrap an already open session.
    pub fn with_session(session: StudySession<S, R>) -> Self {
        Self { session }
    }

    /// Run the export or import.
    pub fn run(&mut self, action: &BackupAction) -> BackupOutput {
        match action {
            BackupAction::Export { output } => self.export(output.as_deref()),
            BackupAction::Import { path } => self.import(path),
        }
    }

    fn export(&self, path: Option<&Path>) -> BackupOutput {
        let backup = self.session.export();
        let document = match backup.to_json_pretty() {
            Ok(document) => document,
            Err(e) => return BackupOutput::failure("export", path, e.to_string()),
        };

        let mut output = BackupOutput::new("export", path);
        output.items = backup.formulas.len();
        output.excluded = backup.excluded.len();
        output.deck_cycles = backup.deck_cycles;

        match path {
            Some(path) => {
                if let Err(e) = fs::write(path, document + "\n") {
                    return BackupOutput::failure(
                        "export",
                        Some(path),
                        format!("cannot write {}: {}", path.display(), e),
                    );
                }
            }
            None => output.document = Some(document),
        }
        output
    }

    fn import(&mut self, path: &Path) -> BackupOutput {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                return BackupOutput::failure(
                    "import",
                    Some(path),
                    format!("cannot read {}: {}", path.display(), e),
                )
            }
        };

        if let Err(e) = self.session.restore_json(&text) {
            return BackupOutput::failure("import", Some(path), e.to_string());
        }

        let mut output = BackupOutput::new("import", Some(path));
        output.items = self.session.catalog().len();
        output.excluded = self.session.tracker().excluded().len();
        output.deck_cycles = self.session.deck_cycles();
        output
    }

    /// Format output based on options.
    ///
    /// An export to stdout prints the backup document itself.
    pub fn format_output(&self, output: &BackupOutput, options: &BackupOptions) -> String {
        if let Some(document) = &output.document {
            return document.clone() + "\n";
        }

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

fn format_human_readable(output: &BackupOutput) -> String {
    if let Some(error) = &output.error {
        return format!("{} failed: {}\n", output.action, error);
    }

    let path = output.path.as_deref().unwrap_or("stdout");
    let verb = if output.action == "export" {
        "Exported to"
    } else {
        "Imported from"
    };
    format!(
        "{} {}: {} item(s), {} excluded, {} completed pass(es).\n",
        verb, path, output.items, output.excluded, output.deck_cycles
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudyConfig;
    use crate::core::{Catalog, Item};
    use crate::storage::MemoryKvStore;
    use crate::study::persist;
    use rand::SeedableRng;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn command(ids: &[&str]) -> BackupCommand<Arc<MemoryKvStore>, ChaCha8Rng> {
        let store = Arc::new(MemoryKvStore::new());
        let catalog = Catalog::from_items(ids.iter().map(|id| Item::new(*id, "", "x")));
        persist::save_catalog(&store, &catalog);
        BackupCommand::with_session(StudySession::with_rng(
            store,
            StudyConfig::default(),
            ChaCha8Rng::seed_from_u64(1),
        ))
    }

    #[test]
    fn test_export_to_stdout_prints_document() {
        let mut cmd = command(&["A", "B"]);
        let output = cmd.run(&BackupAction::Export { output: None });

        assert!(output.success);
        assert_eq!(output.items, 2);
        let text = cmd.format_output(&output, &BackupOptions::default());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["formulas"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_export_then_import_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("backup.json");

        let mut source = command(&["A", "B", "C"]);
        source.session.show("A").unwrap();
        source.session.exclude_manually();
        let exported = source.run(&BackupAction::Export {
            output: Some(path.clone()),
        });
        assert!(exported.success);
        assert!(path.exists());

        let mut target = command(&["Z"]);
        let imported = target.run(&BackupAction::Import { path: path.clone() });

        assert!(imported.success);
        assert_eq!(imported.items, 3);
        assert_eq!(imported.excluded, 1);
        assert!(!target.session.catalog().contains("Z"));
        assert!(target.session.tracker().is_excluded("A"));
    }

    #[test]
    fn test_import_invalid_backup_keeps_state() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, r#"{"formulas": 3}"#).unwrap();

        let mut cmd = command(&["A"]);
        let output = cmd.run(&BackupAction::Import { path });

        assert!(!output.success);
        assert!(output.error.unwrap().contains("restore failed"));
        assert!(cmd.session.catalog().contains("A"));
    }

    #[test]
    fn test_import_missing_file() {
        let temp = TempDir::new().unwrap();
        let mut cmd = command(&["A"]);
        let output = cmd.run(&BackupAction::Import {
            path: temp.path().join("nope.json"),
        });

        assert!(!output.success);
        let text = cmd.format_output(&output, &BackupOptions::default());
        assert!(text.starts_with("import failed: cannot read"));
    }

    #[test]
    fn test_format_import_summary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("b.json");
        fs::write(&path, r#"{"formulas": [{"id": "X"}], "deckCycles": 2}"#).unwrap();

        let mut cmd = command(&[]);
        let output = cmd.run(&BackupAction::Import { path });
        let text = cmd.format_output(&output, &BackupOptions::default());

        assert!(text.contains("Imported from"));
        assert!(text.contains("1 item(s)"));
        assert!(text.contains("2 completed pass(es)"));
    }

    #[test]
    fn test_format_output_quiet() {
        let temp = TempDir::new().unwrap();
        let mut cmd = command(&["A"]);
        let output = cmd.run(&BackupAction::Export {
            output: Some(temp.path().join("b.json")),
        });
        let options = BackupOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&output, &options).is_empty());
    }
}
