//! Key-value storage implementations.

use crate::schedule::ports::KeyValueStorage;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory storage, the equivalent of a fresh browser
/// profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|err| io::Error::other(err.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| io::Error::other(err.to_string()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| io::Error::other(err.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Storage keeping one file per key inside a capability-scoped directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug)]
pub struct DirectoryStorage {
    dir: Dir,
}

impl DirectoryStorage {
    /// Opens (creating if needed) the storage directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be created or opened.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir })
    }
}

/// Maps a storage key onto a safe file name.
fn file_name(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.json")
}

impl KeyValueStorage for DirectoryStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        match self.dir.read_to_string(file_name(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        let target = file_name(key);
        let staging = format!("{target}.tmp");
        self.dir.write(&staging, value)?;
        self.dir.rename(&staging, &self.dir, &target)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match self.dir.remove_file(file_name(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}
