//! Init command for rote.
//!
//! Writes the effective configuration to `.rote/config.toml` in the project
//! and creates the state directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{project_config_path, Config};

/// Options for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Overwrite an existing project config.
    pub force: bool,
}

/// Output format for the init command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitOutput {
    /// Whether initialization was successful.
    pub success: bool,
    /// Files and directories created.
    pub created: Vec<String>,
    /// Files that already existed (skipped).
    pub skipped: Vec<String>,
    /// Error message if initialization failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InitOutput {
    /// Create a successful output.
    pub fn success(created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: true,
            created,
            skipped,
            error: None,
        }
    }

    /// Create a failed output with partial success information.
    pub fn failure(error: impl Into<String>, created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: false,
            created,
            skipped,
            error: Some(error.into()),
        }
    }
}

/// The init command implementation.
pub struct InitCommand {
    cwd: PathBuf,
    state_dir: Option<PathBuf>,
    config: Config,
}

impl InitCommand {
    /// Create a new init command.
    pub fn new(cwd: impl Into<PathBuf>, state_dir: Option<PathBuf>, config: Config) -> Self {
        Self {
            cwd: cwd.into(),
            state_dir,
            config,
        }
    }

    /// Run the init command.
    pub fn run(&self, options: &InitOptions) -> InitOutput {
        let mut created = Vec::new();
        let mut skipped = Vec::new();

        let config_path = project_config_path(&self.cwd);
        if config_path.exists() && !options.force {
            skipped.push(config_path.display().to_string());
        } else {
            match self.config.save_project(&self.cwd) {
                Ok(()) => created.push(config_path.display().to_string()),
                Err(e) => return InitOutput::failure(e.to_string(), created, skipped),
            }
        }

        if let Some(state_dir) = &self.state_dir {
            match ensure_dir(state_dir) {
                Ok(true) => created.push(state_dir.display().to_string()),
                Ok(false) => skipped.push(state_dir.display().to_string()),
                Err(e) => return InitOutput::failure(e, created, skipped),
            }
        }

        InitOutput::success(created, skipped)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &InitOutput, options: &InitOptions) -> String {
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

/// Ensure a directory exists.
/// Returns Ok(true) if created, Ok(false) if already exists.
fn ensure_dir(path: &Path) -> Result<bool, String> {
    if path.exists() {
        if path.is_dir() {
            return Ok(false);
        }
        return Err(format!("{} exists but is not a directory", path.display()));
    }

    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))?;

    Ok(true)
}

fn format_human_readable(output: &InitOutput) -> String {
    let mut lines = Vec::new();

    if let Some(error) = &output.error {
        lines.push(format!("Init failed: {}", error));
        if !output.created.is_empty() {
            lines.push(String::new());
            lines.push("Partially created before failure:".to_string());
            for path in &output.created {
                lines.push(format!("  {}", path));
            }
        }
        return lines.join("\n") + "\n";
    }

    if !output.created.is_empty() {
        lines.push("Created:".to_string());
        for path in &output.created {
            lines.push(format!("  {}", path));
        }
    }

    if !output.skipped.is_empty() {
        lines.push("Already exists (skipped):".to_string());
        for path in &output.skipped {
            lines.push(format!("  {}", path));
        }
    }

    lines.push(String::new());
    lines.push("rote initialized.".to_string());

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn command(temp: &TempDir) -> InitCommand {
        let mut config = Config::default();
        config.study.mastery_threshold = 5;
        InitCommand::new(temp.path(), Some(temp.path().join("state")), config)
    }

    #[test]
    fn test_init_output_failure() {
        let output = InitOutput::failure("test error", vec![], vec![]);

        assert!(!output.success);
        assert_eq!(output.error, Some("test error".to_string()));
    }

    #[test]
    fn test_init_writes_config_and_state_dir() {
        let temp = TempDir::new().unwrap();
        let output = command(&temp).run(&InitOptions::default());

        assert!(output.success);
        assert_eq!(output.created.len(), 2);
        assert!(temp.path().join("state").is_dir());

        let loaded = Config::load_from_file(&project_config_path(temp.path())).unwrap();
        assert_eq!(loaded.study.mastery_threshold, 5);
    }

    #[test]
    fn test_init_idempotent() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);

        cmd.run(&InitOptions::default());
        let second = cmd.run(&InitOptions::default());

        assert!(second.success);
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 2);
    }

    #[test]
    fn test_init_with_force_overwrites() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);
        cmd.run(&InitOptions::default());

        let config_path = project_config_path(temp.path());
        fs::write(&config_path, "# modified").unwrap();

        let output = cmd.run(&InitOptions {
            force: true,
            ..Default::default()
        });

        assert!(output.success);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("mastery_threshold = 5"));
    }

    #[test]
    fn test_state_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("state"), "").unwrap();

        let output = command(&temp).run(&InitOptions::default());

        assert!(!output.success);
        let text = command(&temp).format_output(&output, &InitOptions::default());
        assert!(text.contains("not a directory"));
        assert!(text.contains("Partially created"));
    }

    #[test]
    fn test_format_output_quiet() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);
        let output = InitOutput::success(vec!["x".to_string()], vec![]);
        let options = InitOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&output, &options).is_empty());
    }
}
