//! Configuration loading for rote.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.rote/config.toml` in cwd)
//! 3. User config (`~/.rote/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RoteError, Result};

/// Main configuration struct for rote.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scheduling and mastery settings.
    pub study: StudyConfig,
}

/// Scheduling and mastery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StudyConfig {
    /// Correct answers after which an item is auto-excluded as mastered.
    pub mastery_threshold: u32,
    /// Completed deck passes between two decay runs.
    pub decay_period: u64,
    /// Minimum interval between two advances, in milliseconds.
    pub advance_debounce_ms: u64,
}

/// Smallest accepted mastery threshold.
pub const MIN_MASTERY_THRESHOLD: u32 = 1;

/// Smallest accepted decay period.
pub const MIN_DECAY_PERIOD: u64 = 1;

impl StudyConfig {
    /// A threshold of 0 would exclude every item on its first correct answer
    /// before it was even counted.
    pub fn is_valid_threshold(value: u32) -> bool {
        value >= MIN_MASTERY_THRESHOLD
    }

    /// A period of 0 would make the decay check divide by zero.
    pub fn is_valid_decay_period(value: u64) -> bool {
        value >= MIN_DECAY_PERIOD
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: 3,
            decay_period: 10,
            advance_debounce_ms: 300,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config.sanitize();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();
        config.sanitize();

        config
    }

    /// Load user config from `~/.rote/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = rote_home()?;
        Self::load_from_file(&home.join("config.toml")).ok()
    }

    /// Load project config from `.rote/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_from_file(&project_config_path(cwd)).ok()
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| RoteError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| RoteError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // ROTE_MASTERY_THRESHOLD
        if let Ok(val) = env::var("ROTE_MASTERY_THRESHOLD") {
            match val.parse::<u32>() {
                Ok(n) if StudyConfig::is_valid_threshold(n) => self.study.mastery_threshold = n,
                _ => tracing::warn!(
                    value = %val,
                    current = self.study.mastery_threshold,
                    "invalid ROTE_MASTERY_THRESHOLD, expected an integer >= {}",
                    MIN_MASTERY_THRESHOLD
                ),
            }
        }

        // ROTE_DECAY_PERIOD
        if let Ok(val) = env::var("ROTE_DECAY_PERIOD") {
            match val.parse::<u64>() {
                Ok(n) if StudyConfig::is_valid_decay_period(n) => self.study.decay_period = n,
                _ => tracing::warn!(
                    value = %val,
                    current = self.study.decay_period,
                    "invalid ROTE_DECAY_PERIOD, expected an integer >= {}",
                    MIN_DECAY_PERIOD
                ),
            }
        }

        // ROTE_ADVANCE_DEBOUNCE_MS
        if let Ok(val) = env::var("ROTE_ADVANCE_DEBOUNCE_MS") {
            match val.parse::<u64>() {
                Ok(n) => self.study.advance_debounce_ms = n,
                Err(_) => tracing::warn!(
                    value = %val,
                    current = self.study.advance_debounce_ms,
                    "invalid ROTE_ADVANCE_DEBOUNCE_MS, expected milliseconds"
                ),
            }
        }
    }

    /// Reset out-of-range values that came from config files.
    fn sanitize(&mut self) {
        let defaults = StudyConfig::default();
        if !StudyConfig::is_valid_threshold(self.study.mastery_threshold) {
            tracing::warn!(
                value = self.study.mastery_threshold,
                "mastery_threshold out of range, using default"
            );
            self.study.mastery_threshold = defaults.mastery_threshold;
        }
        if !StudyConfig::is_valid_decay_period(self.study.decay_period) {
            tracing::warn!(
                value = self.study.decay_period,
                "decay_period out of range, using default"
            );
            self.study.decay_period = defaults.decay_period;
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence for every field it sets to a
    /// non-default value. A layer cannot reset a field back to its default
    /// once a lower layer changed it.
    fn merge(mut self, other: Config) -> Self {
        let defaults = StudyConfig::default();
        if other.study.mastery_threshold != defaults.mastery_threshold {
            self.study.mastery_threshold = other.study.mastery_threshold;
        }
        if other.study.decay_period != defaults.decay_period {
            self.study.decay_period = other.study.decay_period;
        }
        if other.study.advance_debounce_ms != defaults.advance_debounce_ms {
            self.study.advance_debounce_ms = other.study.advance_debounce_ms;
        }
        self
    }

    /// Save configuration to the project config file.
    ///
    /// Writes `.rote/config.toml` under `cwd` via temp file + rename.
    pub fn save_project(&self, cwd: &Path) -> Result<()> {
        let config_path = project_config_path(cwd);
        let rote_dir = cwd.join(".rote");
        if !rote_dir.exists() {
            fs::create_dir_all(&rote_dir).map_err(|e| RoteError::storage(&rote_dir, e))?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| RoteError::config(e.to_string()))?;

        let temp_path = rote_dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| RoteError::storage(&temp_path, e))?;
        fs::rename(&temp_path, &config_path).map_err(|e| RoteError::storage(&config_path, e))?;

        Ok(())
    }
}

/// Get the rote home directory.
///
/// Checks `ROTE_HOME` first, then falls back to `~/.rote`.
pub fn rote_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("ROTE_HOME") {
        if home.is_empty() {
            tracing::warn!("ROTE_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("ROTE_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".rote"));
    }

    let fallback_path = env::temp_dir().join("rote");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Project config file: `<cwd>/.rote/config.toml`.
pub fn project_config_path(cwd: &Path) -> PathBuf {
    cwd.join(".rote").join("config.toml")
}

/// Get the study state directory.
///
/// Returns `<rote_home>/state/`.
pub fn state_dir() -> Option<PathBuf> {
    rote_home().map(|h| h.join("state"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        env::remove_var("ROTE_MASTERY_THRESHOLD");
        env::remove_var("ROTE_DECAY_PERIOD");
        env::remove_var("ROTE_ADVANCE_DEBOUNCE_MS");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.study.mastery_threshold, 3);
        assert_eq!(config.study.decay_period, 10);
        assert_eq!(config.study.advance_debounce_ms, 300);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[study]
mastery_threshold = 5
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.study.mastery_threshold, 5);
        // Other fields should be defaults
        assert_eq!(config.study.decay_period, 10);
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        assert!(matches!(
            Config::load_from_file(&config_path),
            Err(RoteError::Config { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let rote_dir = dir.path().join(".rote");
        fs::create_dir_all(&rote_dir).unwrap();
        fs::write(
            rote_dir.join("config.toml"),
            "[study]\ndecay_period = 4\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.study.decay_period, 4);
        assert_eq!(config.study.advance_debounce_ms, 300);
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let rote_dir = dir.path().join(".rote");
        fs::create_dir_all(&rote_dir).unwrap();
        fs::write(
            rote_dir.join("config.toml"),
            "[study]\nmastery_threshold = 7\n",
        )
        .unwrap();

        env::set_var("ROTE_MASTERY_THRESHOLD", "2");
        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config.study.mastery_threshold, 2);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_invalid_values_ignored() {
        clear_env();
        let dir = TempDir::new().unwrap();

        env::set_var("ROTE_MASTERY_THRESHOLD", "0");
        env::set_var("ROTE_DECAY_PERIOD", "soon");
        env::set_var("ROTE_ADVANCE_DEBOUNCE_MS", "-5");
        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.study.mastery_threshold, 3);
        assert_eq!(config.study.decay_period, 10);
        assert_eq!(config.study.advance_debounce_ms, 300);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_valid_values_applied() {
        clear_env();
        let dir = TempDir::new().unwrap();

        env::set_var("ROTE_DECAY_PERIOD", "25");
        env::set_var("ROTE_ADVANCE_DEBOUNCE_MS", "0");
        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.study.decay_period, 25);
        assert_eq!(config.study.advance_debounce_ms, 0);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_period_in_file_is_sanitized() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let rote_dir = dir.path().join(".rote");
        fs::create_dir_all(&rote_dir).unwrap();
        fs::write(
            rote_dir.join("config.toml"),
            "[study]\ndecay_period = 0\nmastery_threshold = 0\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.study.decay_period, 10);
        assert_eq!(config.study.mastery_threshold, 3);
    }

    #[test]
    fn test_merge_field_by_field() {
        let mut user = Config::default();
        user.study.mastery_threshold = 6;
        user.study.advance_debounce_ms = 500;

        let mut project = Config::default();
        project.study.decay_period = 3;

        let merged = Config::default().merge(user).merge(project);

        assert_eq!(merged.study.mastery_threshold, 6);
        assert_eq!(merged.study.decay_period, 3);
        assert_eq!(merged.study.advance_debounce_ms, 500);
    }

    #[test]
    fn test_is_valid_threshold_and_period() {
        assert!(!StudyConfig::is_valid_threshold(0));
        assert!(StudyConfig::is_valid_threshold(1));
        assert!(!StudyConfig::is_valid_decay_period(0));
        assert!(StudyConfig::is_valid_decay_period(10));
    }

    #[test]
    #[serial]
    fn test_rote_home_with_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("ROTE_HOME", dir.path());

        assert_eq!(rote_home(), Some(dir.path().to_path_buf()));
        assert_eq!(state_dir(), Some(dir.path().join("state")));

        env::remove_var("ROTE_HOME");
    }

    #[test]
    #[serial]
    fn test_rote_home_empty_env_falls_back() {
        env::set_var("ROTE_HOME", "");
        let home = rote_home().unwrap();
        assert!(home.ends_with(".rote") || home.ends_with("rote"));
        env::remove_var("ROTE_HOME");
    }

    #[test]
    fn test_save_project_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.study.mastery_threshold = 4;

        config.save_project(dir.path()).unwrap();

        let loaded = Config::load_from_file(&dir.path().join(".rote").join("config.toml")).unwrap();
        assert_eq!(loaded, config);
        assert!(!dir.path().join(".rote").join(".config.toml.tmp").exists());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }
}
