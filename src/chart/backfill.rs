//! Bulk population of the durable chart cache.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use super::client::ChartSource;
use super::types::ChartEntry;
use crate::cache::CacheStorage;
use crate::config::DEFAULT_BACKFILL_CONCURRENCY;
use crate::date::days_through;
use crate::error::StoreError;

const PROGRESS_EVERY: usize = 1000;

/// Fetches every date in a range and merges the results into the store.
pub struct BackfillService<S, St> {
  source: S,
  storage: Arc<St>,
  concurrency: usize,
}

impl<S: ChartSource, St: CacheStorage> BackfillService<S, St> {
  pub fn new(source: S, storage: Arc<St>) -> Self {
    Self {
      source,
      storage,
      concurrency: DEFAULT_BACKFILL_CONCURRENCY,
    }
  }

  /// Set the maximum number of fetches in flight.
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency.max(1);
    self
  }

  /// Fetch every date from `start` through `today` and persist the results.
  ///
  /// Dates whose fetch fails are logged and left out; there is no retry, a
  /// later run over the same range picks them up. Successful entries are
  /// merged into the full store, which is then rewritten in one piece.
  /// Returns the fetched entries in date order.
  pub async fn backfill(
    &self,
    start: NaiveDate,
    today: NaiveDate,
  ) -> Result<Vec<ChartEntry>, StoreError> {
    let dates = days_through(start, today);
    let total = dates.len();
    if total == 0 {
      info!(%start, %today, "Nothing to backfill");
      return Ok(Vec::new());
    }

    info!(%start, %today, total, concurrency = self.concurrency, "Starting backfill");

    let source = &self.source;
    let mut results = stream::iter(dates)
      .map(|date| async move { (date, source.fetch(date).await) })
      .buffer_unordered(self.concurrency);

    let mut entries = Vec::with_capacity(total);
    let mut done = 0usize;
    let mut layout_failures = 0usize;
    let mut other_failures = 0usize;

    while let Some((date, result)) = results.next().await {
      done += 1;
      match result {
        Ok(entry) => entries.push(entry),
        Err(e) if e.is_layout_change() => {
          layout_failures += 1;
          error!(%date, error = %e, "Chart page no longer matches the parser");
        }
        Err(e) => {
          other_failures += 1;
          warn!(%date, error = %e, "Skipping date");
        }
      }
      if done % PROGRESS_EVERY == 0 {
        info!(done, total, "Backfill progress");
      }
    }

    entries.sort_by_key(|e| e.date);

    if !entries.is_empty() {
      self.commit(&entries)?;
    }

    info!(
      fetched = entries.len(),
      layout_failures,
      other_failures,
      "Backfill complete"
    );
    Ok(entries)
  }

  /// Read the whole store, merge `entries` over it and write it back.
  fn commit(&self, entries: &[ChartEntry]) -> Result<(), StoreError> {
    let mut store = self.storage.load()?;
    let before = store.len();
    for entry in entries {
      store.insert(entry.cache_key(), entry.clone());
    }
    self.storage.replace(&store)?;

    info!(
      added = store.len() - before,
      total = store.len(),
      "Cache store updated"
    );
    Ok(())
  }
}
