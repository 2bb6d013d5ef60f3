//! UK singles chart lookups: live fetching, cache-first lookups and backfill.

mod backfill;
mod client;
mod lookup;
mod page;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchError;

pub use backfill::BackfillService;
pub use client::{ChartSource, OfficialChartsClient};
pub use lookup::{chart_years, ChartLookupService};
pub use page::parse_chart_page;
pub use types::ChartEntry;

/// Lets the lookup and backfill services share one client.
#[async_trait]
impl<T: ChartSource + ?Sized> ChartSource for Arc<T> {
  async fn fetch(&self, date: NaiveDate) -> Result<ChartEntry, FetchError> {
    (**self).fetch(date).await
  }
}
