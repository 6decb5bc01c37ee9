//! File-based key/value storage for rote.
//!
//! Each key is stored as `<key>.json` in `~/.rote/state/`.
//! Atomic writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::state_dir;
use crate::error::{RoteError, Result};
use crate::storage::keys::is_valid_key;
use crate::storage::KvStore;

/// File-based key/value store.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    /// Directory where value files are stored.
    dir: PathBuf,
}

impl FileKvStore {
    /// Create a new file store with the default directory.
    ///
    /// Uses `~/.rote/state/` or `$ROTE_HOME/state/`.
    pub fn new() -> Result<Self> {
        let dir = state_dir().ok_or_else(|| {
            RoteError::config("Could not determine state directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a new file store with a custom directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| RoteError::storage(&dir, e))?;
        }

        Ok(Self { dir })
    }

    /// Directory holding the value files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            return Err(RoteError::invalid_key(key));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", key))
    }

    /// Write a value atomically using temp file + rename.
    fn atomic_write(&self, key: &str, value: &str) -> Result<()> {
        let final_path = self.value_path(key)?;
        let temp_path = self.temp_path(key);

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| RoteError::storage(&temp_path, e))?;
            file.write_all(value.as_bytes())
                .map_err(|e| RoteError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| RoteError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path).map_err(|e| RoteError::storage(&final_path, e))?;

        Ok(())
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| RoteError::storage(&path, e))?;
        Ok(Some(content))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.atomic_write(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;

        if path.exists() {
            fs::remove_file(&path).map_err(|e| RoteError::storage(&path, e))?;
        }

        // Also clean up any temp file
        let temp_path = self.temp_path(key);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }
}
