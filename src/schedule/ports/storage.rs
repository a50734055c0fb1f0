//! Key-value storage port backing the local store.
//!
//! The contract mirrors a browser's per-origin persistent storage: string
//! values under string keys, read and written synchronously.

use std::io;

/// Synchronous string key-value storage.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the underlying medium cannot be read.
    fn load(&self, key: &str) -> io::Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the underlying medium cannot be written.
    fn save(&self, key: &str, value: &str) -> io::Result<()>;

    /// Removes the value under `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the underlying medium cannot be written.
    fn remove(&self, key: &str) -> io::Result<()>;
}
