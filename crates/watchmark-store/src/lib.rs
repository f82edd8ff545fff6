mod history;

pub use history::{Toggled, WatchedHistory};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use watchmark_core::WatchedRecord;

/// Fixed key under which the serialized history lives.
pub const HISTORY_KEY: &str = "watchedVideos";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The persistence boundary: a string key-value API in the shape of the
/// host environment's storage primitives. Values are opaque to the backend.
pub trait ValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory backend for tests and embedding hosts that bring their own
/// durability.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.values.insert(key.into(), value.into());
        store
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl ValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed backend: one JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.key_path(key), value)?;
        Ok(())
    }
}

/// Owner of the persisted watched history. Reads self-heal; only backend
/// I/O failures surface to the caller.
#[derive(Debug)]
pub struct HistoryStore<S: ValueStore> {
    backend: S,
}

impl<S: ValueStore> HistoryStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Load the persisted history. Absent, unparseable, or structurally
    /// invalid data resets to an empty history and persists that reset
    /// immediately, so callers never observe malformed state.
    pub fn load(&mut self) -> Result<WatchedHistory, StoreError> {
        let raw = match self.backend.get(HISTORY_KEY)? {
            Some(raw) => raw,
            None => {
                self.reset()?;
                return Ok(WatchedHistory::new());
            }
        };
        match serde_json::from_str::<Vec<WatchedRecord>>(&raw) {
            Ok(records) => Ok(WatchedHistory::from_records(records)),
            Err(err) => {
                warn!(%err, "discarding malformed watched history");
                self.reset()?;
                Ok(WatchedHistory::new())
            }
        }
    }

    /// Serialize and write the full history back, unconditionally.
    pub fn persist(&mut self, history: &WatchedHistory) -> Result<(), StoreError> {
        let raw = serde_json::to_string(history.records())
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        self.backend.set(HISTORY_KEY, &raw)
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.backend.set(HISTORY_KEY, "[]")
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}
