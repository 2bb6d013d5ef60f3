//! Cache-first chart lookups.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use tracing::{info, warn};

use super::client::ChartSource;
use super::types::ChartEntry;
use crate::cache::ChartCache;
use crate::date::composite_key;
use crate::error::LookupError;

/// Answers lookups from the cache snapshot, falling back to the chart source.
///
/// Remote results are returned but never written back; only a backfill grows
/// the durable cache.
pub struct ChartLookupService<S> {
  source: S,
  cache: ChartCache,
}

impl<S: ChartSource> ChartLookupService<S> {
  pub fn new(source: S, cache: ChartCache) -> Self {
    Self { source, cache }
  }

  /// Swap in a snapshot taken after a backfill committed.
  #[allow(dead_code)]
  pub fn replace_cache(&mut self, cache: ChartCache) {
    self.cache = cache;
  }

  pub fn cache(&self) -> &ChartCache {
    &self.cache
  }

  /// Number one for a single date.
  pub async fn lookup_one(&self, year: i32, month: u32, day: u32) -> Result<ChartEntry, LookupError> {
    let key = composite_key(year, month, day);

    if let Some(entry) = self.cache.get(&key) {
      info!(target: "query_log", %key, source = "cache", "Chart lookup");
      return Ok(entry.clone());
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)
      .ok_or(LookupError::InvalidDate { year, month, day })?;

    info!(target: "query_log", %key, source = "network", "Chart lookup");
    Ok(self.source.fetch(date).await?)
  }

  /// Number one on `month`/`day` of every year from `year` to the current chart year.
  ///
  /// Lookups run concurrently; results come back in ascending year order.
  /// Years whose lookup failed are left out.
  pub async fn lookup_yearly(
    &self,
    year: i32,
    month: u32,
    day: u32,
    now: NaiveDate,
  ) -> Vec<ChartEntry> {
    let years: Vec<i32> = chart_years(year, month, now).collect();
    let results = join_all(years.iter().map(|&y| self.lookup_one(y, month, day))).await;

    years
      .into_iter()
      .zip(results)
      .filter_map(|(y, result)| match result {
        Ok(entry) => Some(entry),
        Err(e) => {
          warn!(year = y, month, day, error = %e, "Omitting year from yearly lookup");
          None
        }
      })
      .collect()
  }
}

/// Years with a chart for `month` from `birth_year` up to `now`.
///
/// The current year counts only when `month` is not greater than the
/// zero-based current month, so a query for the current month still stops
/// at last year.
pub fn chart_years(birth_year: i32, month: u32, now: NaiveDate) -> RangeInclusive<i32> {
  let last = if month > now.month0() {
    now.year() - 1
  } else {
    now.year()
  };
  birth_year..=last
}
