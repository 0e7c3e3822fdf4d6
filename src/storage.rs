//! Persistence for the task list and the last-access marker.
//!
//! The durable layer is an opaque key-value blob store ([`BlobStore`]). Two
//! keys are used:
//!
//! ```text
//! <data-dir>/
//!   TodoApp       # JSON array of tasks
//!   LastAccess    # ISO-8601 timestamp of the previous session start
//!   TodoApp.bak   # unreadable task list set aside at startup, if any
//!   .lock         # advisory lock held while a key is read or written
//!   config.toml   # optional configuration (see `config`)
//! ```
//!
//! Key names are configurable through `[storage]` in `config.toml`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::{to_iso_millis, TaskStore};

/// Default key holding the serialized task array
pub const TASKS_KEY: &str = "TodoApp";

/// Default key holding the last-access timestamp
pub const LAST_ACCESS_KEY: &str = "LastAccess";

const LOCK_FILE: &str = ".lock";

/// String key-value store the application persists into.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// One file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileBlobStore {
    /// Open (and create if needed) a blob store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_timeout(dir, DEFAULT_LOCK_TIMEOUT_MS)
    }

    pub fn with_timeout(dir: impl Into<PathBuf>, lock_timeout_ms: u64) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock_timeout_ms,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        lock::read_locked(&path, self.lock_path(), self.lock_timeout_ms)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        lock::write_atomic_locked(&path, self.lock_path(), value.as_bytes(), self.lock_timeout_ms)
    }
}

/// In-memory blob store, used by tests and as a scratch backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn entry(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key names used by [`Persistence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub tasks: String,
    pub last_access: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            tasks: TASKS_KEY.to_string(),
            last_access: LAST_ACCESS_KEY.to_string(),
        }
    }
}

impl From<&StorageConfig> for StorageKeys {
    fn from(config: &StorageConfig) -> Self {
        Self {
            tasks: config.tasks_key.clone(),
            last_access: config.last_access_key.clone(),
        }
    }
}

/// What was found under the tasks key at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedTasks {
    Stored(TaskStore),
    Missing,
    Empty,
    /// `raw` is the unparsed value, absent when the read itself failed.
    Malformed { reason: String, raw: Option<String> },
}

/// Typed access to the task list and last-access marker over a [`BlobStore`].
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    blobs: S,
    keys: StorageKeys,
}

impl<S: BlobStore> Persistence<S> {
    pub fn new(blobs: S, keys: StorageKeys) -> Self {
        Self { blobs, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn blobs(&self) -> &S {
        &self.blobs
    }

    pub fn into_inner(self) -> S {
        self.blobs
    }

    /// Read the persisted task list. Read failures are reported as
    /// `Malformed` so the caller can fall back to seed data.
    pub fn load_tasks(&self) -> LoadedTasks {
        let raw = match self.blobs.get(&self.keys.tasks) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadedTasks::Missing,
            Err(err) => {
                return LoadedTasks::Malformed {
                    reason: err.to_string(),
                    raw: None,
                }
            }
        };

        match TaskStore::from_json(&raw) {
            Ok(store) if store.is_empty() => LoadedTasks::Empty,
            Ok(store) => LoadedTasks::Stored(store),
            Err(err) => LoadedTasks::Malformed {
                reason: err.to_string(),
                raw: Some(raw),
            },
        }
    }

    pub fn backup_key(&self) -> String {
        format!("{}.bak", self.keys.tasks)
    }

    /// Copy an unreadable task list aside before anything can overwrite it.
    /// Returns the key it was written under.
    pub fn back_up_tasks(&mut self, raw: &str) -> Result<String> {
        let key = self.backup_key();
        self.blobs.set(&key, raw)?;
        Ok(key)
    }

    /// Write the full task list.
    pub fn save_tasks(&mut self, store: &TaskStore) -> Result<()> {
        let json = store.to_json()?;
        self.blobs.set(&self.keys.tasks, &json)
    }

    /// Read the last-access marker. Absent or unparseable values are `None`.
    pub fn load_last_access(&self) -> Option<DateTime<Utc>> {
        let raw = match self.blobs.get(&self.keys.last_access) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read last-access marker");
                return None;
            }
        };

        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(err) => {
                tracing::debug!(value = %raw, error = %err, "ignoring unparseable last-access marker");
                None
            }
        }
    }

    pub fn save_last_access(&mut self, ts: DateTime<Utc>) -> Result<()> {
        self.blobs.set(&self.keys.last_access, &to_iso_millis(ts))
    }
}

/// Key names become file names, so keep them to a safe character set.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("storage key cannot be empty".to_string()));
    }
    if key.starts_with('.') {
        return Err(Error::InvalidArgument(format!(
            "storage key '{key}' cannot start with '.'"
        )));
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
    {
        return Err(Error::InvalidArgument(format!(
            "storage key '{key}' may only contain letters, digits, '-', '_' and '.'"
        )));
    }
    Ok(())
}
