//! Unified error types for rote with fail-open persistence.
//!
//! Storage is best-effort: a failed write or a corrupt value must never take
//! down a study session. Callers log a warning and carry on with the
//! in-memory state. The only error surfaced to the user on purpose is an
//! invalid restore payload.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rote operations.
#[derive(Error, Debug)]
pub enum RoteError {
    /// I/O errors from state or config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A write was rejected by the store (quota, read-only medium).
    #[error("write rejected for key '{key}': {message}")]
    WriteRejected { key: String, message: String },

    /// Store key that cannot be mapped to a file name.
    #[error("invalid store key: {key}")]
    InvalidKey { key: String },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Backup payload failed validation; nothing was replaced.
    #[error("restore failed: {message}")]
    Restore { message: String },

    /// Item id not present in the catalog.
    #[error("item not found: {id}")]
    ItemNotFound { id: String },

    /// Item exists but is excluded from study.
    #[error("item is excluded: {id}")]
    NotEligible { id: String },
}

/// A specialized Result type for rote operations.
pub type Result<T> = std::result::Result<T, RoteError>;

impl RoteError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a write-rejected error.
    pub fn write_rejected(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteRejected {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid key error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a restore error.
    pub fn restore(message: impl Into<String>) -> Self {
        Self::Restore {
            message: message.into(),
        }
    }

    /// Create an item not found error.
    pub fn item_not_found(id: impl Into<String>) -> Self {
        Self::ItemNotFound { id: id.into() }
    }

    /// Create a not-eligible error.
    pub fn not_eligible(id: impl Into<String>) -> Self {
        Self::NotEligible { id: id.into() }
    }

    /// Whether the error is a storage-layer problem that callers should
    /// swallow rather than report.
    pub fn is_fail_open(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::WriteRejected { .. }
                | Self::InvalidKey { .. }
                | Self::Serde { .. }
        )
    }
}

impl From<io::Error> for RoteError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for RoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and return a safe default instead of propagating it.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the rote CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Command failed (bad id, rejected backup).
    pub const ERROR: i32 = 1;

    /// Process panicked.
    pub const CRASH: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = RoteError::storage(
            "/tmp/state/catalog.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/state/catalog.json"));
    }

    #[test]
    fn test_write_rejected_display() {
        let err = RoteError::write_rejected("deck", "quota exceeded");
        assert_eq!(
            err.to_string(),
            "write rejected for key 'deck': quota exceeded"
        );
    }

    #[test]
    fn test_restore_error_display() {
        let err = RoteError::restore("formulas must be a list");
        assert_eq!(err.to_string(), "restore failed: formulas must be a list");
    }

    #[test]
    fn test_item_not_found_display() {
        let err = RoteError::item_not_found("f_001");
        assert_eq!(err.to_string(), "item not found: f_001");
    }

    #[test]
    fn test_is_fail_open() {
        assert!(RoteError::write_rejected("k", "m").is_fail_open());
        assert!(RoteError::invalid_key("../x").is_fail_open());
        assert!(RoteError::serde("bad").is_fail_open());
        assert!(!RoteError::restore("bad").is_fail_open());
        assert!(!RoteError::item_not_found("x").is_fail_open());
        assert!(!RoteError::config("x").is_fail_open());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: RoteError = io_err.into();
        assert!(matches!(err, RoteError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: RoteError = json_err.into();
        assert!(matches!(err, RoteError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(RoteError::write_rejected("k", "full"));
        let value = result.fail_open_default("test context");
        assert!(value.is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<u64> = Err(RoteError::serde("nope"));
        assert_eq!(result.fail_open_with("test context", 7), 7);
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<i32> = Ok(100);
        assert_eq!(result.fail_open_default("test context"), 100);
    }
}
