//! Storage trait for rote.
//!
//! This module defines the `KvStore` trait for study-state persistence.

use std::sync::Arc;

use crate::error::Result;

/// Trait for key/value storage backends.
///
/// Values are opaque UTF-8 text. Implementations must make `put` atomic
/// per key: a reader sees either the old or the new value, never a mix.
pub trait KvStore: Send + Sync {
    /// Read a value.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value.
    ///
    /// Returns `Ok(())` even if the key doesn't exist.
    fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Blanket implementation of KvStore for Arc-wrapped stores.
///
/// Lets tests keep a handle on the store a session writes into.
impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
