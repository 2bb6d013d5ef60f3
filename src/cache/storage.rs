//! Cache storage trait and its JSON-file and in-memory implementations.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::chart::ChartEntry;
use crate::error::StoreError;

/// Whole-store mapping from composite key (`YYYY-MM-DD`) to entry.
pub type ChartMap = BTreeMap<String, ChartEntry>;

/// Trait for cache storage backends.
///
/// The store is only ever read whole and replaced whole.
pub trait CacheStorage: Send + Sync {
  /// Load the entire mapping.
  fn load(&self) -> Result<ChartMap, StoreError>;

  /// Replace the entire mapping.
  fn replace(&self, entries: &ChartMap) -> Result<(), StoreError>;
}

/// Storage that keeps the mapping in process memory.
/// Used by tests and by dry-run backfills that must not touch disk.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<ChartMap>,
}

impl MemoryStorage {
  pub fn new(entries: ChartMap) -> Self {
    Self {
      entries: Mutex::new(entries),
    }
  }
}

impl CacheStorage for MemoryStorage {
  fn load(&self) -> Result<ChartMap, StoreError> {
    let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
    Ok(entries.clone())
  }

  fn replace(&self, entries: &ChartMap) -> Result<(), StoreError> {
    let mut current = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
    *current = entries.clone();
    Ok(())
  }
}

/// Storage backed by a single JSON document on disk.
pub struct JsonFileStorage {
  path: PathBuf,
}

impl JsonFileStorage {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Get the default store path.
  pub fn default_path() -> Option<PathBuf> {
    let data_dir = dirs::data_dir().or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))?;
    Some(data_dir.join("chartday").join("charts.json"))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn io_error(&self, action: &'static str, source: std::io::Error) -> StoreError {
    StoreError::Io {
      action,
      path: self.path.clone(),
      source,
    }
  }

  fn temp_path(&self) -> PathBuf {
    let name = self
      .path
      .file_name()
      .and_then(|s| s.to_str())
      .unwrap_or("charts.json");
    self
      .path
      .with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
  }
}

impl CacheStorage for JsonFileStorage {
  fn load(&self) -> Result<ChartMap, StoreError> {
    let contents = match std::fs::read(&self.path) {
      Ok(contents) => contents,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "No cache store yet, starting empty");
        return Ok(ChartMap::new());
      }
      Err(e) => return Err(self.io_error("read", e)),
    };

    let raw: ChartMap =
      serde_json::from_slice(&contents).map_err(|source| StoreError::Corrupt {
        path: self.path.clone(),
        source,
      })?;

    Ok(validate_keys(raw))
  }

  /// Write to a temporary sibling and rename it over the store, so readers
  /// see either the old blob or the new one.
  fn replace(&self, entries: &ChartMap) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent).map_err(|e| self.io_error("create directory for", e))?;
      }
    }

    let data = serde_json::to_vec(entries).map_err(StoreError::Serialize)?;
    let tmp = self.temp_path();
    let written = write_synced(&tmp, &data)
      .and_then(|()| std::fs::rename(&tmp, &self.path).map_err(|e| ("replace", e)));

    if let Err((action, e)) = written {
      let _ = std::fs::remove_file(&tmp);
      return Err(self.io_error(action, e));
    }

    debug!(path = %self.path.display(), entries = entries.len(), "Cache store replaced");
    Ok(())
  }
}

/// Create `path` with `data` and flush it to disk.
fn write_synced(path: &Path, data: &[u8]) -> Result<(), (&'static str, std::io::Error)> {
  let mut file = std::fs::File::create(path).map_err(|e| ("create", e))?;
  file.write_all(data).map_err(|e| ("write", e))?;
  file.sync_all().map_err(|e| ("sync", e))?;
  Ok(())
}

/// Drop entries whose embedded date disagrees with their key.
fn validate_keys(raw: ChartMap) -> ChartMap {
  raw
    .into_iter()
    .filter(|(key, entry)| {
      let ok = *key == entry.cache_key() && entry.is_consistent();
      if !ok {
        warn!(key = %key, date = %entry.date, "Dropping cache entry stored under the wrong key");
      }
      ok
    })
    .collect()
}
