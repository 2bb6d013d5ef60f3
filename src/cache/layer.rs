//! Read-only snapshot of the chart store used to answer lookups.

use std::sync::Arc;

use chrono::NaiveDate;

use super::storage::{CacheStorage, ChartMap};
use crate::chart::ChartEntry;
use crate::error::StoreError;

/// Immutable in-memory snapshot of the cache store.
///
/// Built once at startup. A backfill does not mutate it; callers load a new
/// snapshot after the backfill commits and swap it in.
#[derive(Clone, Default)]
pub struct ChartCache {
  entries: Arc<ChartMap>,
}

impl ChartCache {
  /// Snapshot the whole store.
  pub fn load<S: CacheStorage + ?Sized>(storage: &S) -> Result<Self, StoreError> {
    Ok(Self::from_entries(storage.load()?))
  }

  /// Wrap a preloaded mapping.
  pub fn from_entries(entries: ChartMap) -> Self {
    Self {
      entries: Arc::new(entries),
    }
  }

  /// Point lookup by composite key.
  pub fn get(&self, key: &str) -> Option<&ChartEntry> {
    self.entries.get(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The newest cached query date.
  pub fn latest_date(&self) -> Option<NaiveDate> {
    self.entries.values().next_back().map(|e| e.date)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;

  fn entry(y: i32, m: u32, d: u32) -> ChartEntry {
    let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
    ChartEntry::new(
      date,
      (date, date),
      "Track".to_string(),
      "Artist".to_string(),
      None,
    )
  }

  #[test]
  fn test_get_by_key() {
    let e = entry(1990, 6, 15);
    let cache = ChartCache::from_entries([(e.cache_key(), e.clone())].into());
    assert_eq!(cache.get("1990-06-15"), Some(&e));
    assert_eq!(cache.get("1990-6-15"), None);
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn test_latest_date() {
    assert_eq!(ChartCache::default().latest_date(), None);

    let entries: ChartMap = [entry(2001, 1, 2), entry(1999, 12, 31), entry(2001, 1, 1)]
      .into_iter()
      .map(|e| (e.cache_key(), e))
      .collect();
    let cache = ChartCache::from_entries(entries);
    assert_eq!(cache.latest_date(), NaiveDate::from_ymd_opt(2001, 1, 2));
  }

  #[test]
  fn test_snapshot_is_not_live() {
    let storage = MemoryStorage::default();
    let cache = ChartCache::load(&storage).unwrap();

    let e = entry(1990, 6, 15);
    storage.replace(&[(e.cache_key(), e)].into()).unwrap();

    assert!(cache.is_empty());
    assert_eq!(ChartCache::load(&storage).unwrap().len(), 1);
  }
}
