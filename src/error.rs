//! Typed errors for chart lookups, fetching and the cache store.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// A date string from a chart page could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
  #[error("malformed date '{0}', expected 'D Month YYYY'")]
  Malformed(String),

  #[error("unrecognized month name '{0}'")]
  UnknownMonth(String),

  #[error("'{0}' is not a calendar date")]
  InvalidDate(String),

  #[error("malformed chart week '{0}', expected 'D Month YYYY - D Month YYYY'")]
  MalformedRange(String),
}

/// Retrieving or parsing a single date's chart page failed.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request for {date} failed: {source}")]
  Http {
    date: NaiveDate,
    #[source]
    source: reqwest::Error,
  },

  #[error("chart source returned HTTP {status} for {date}")]
  Status { date: NaiveDate, status: u16 },

  #[error("chart page for {date} has no {element}")]
  MissingElement {
    date: NaiveDate,
    element: &'static str,
  },

  #[error("chart page for {date} has an unreadable week: {source}")]
  Parse {
    date: NaiveDate,
    #[source]
    source: ParseError,
  },

  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("invalid chart URL: {0}")]
  Url(#[from] url::ParseError),
}

impl FetchError {
  /// Whether this failure means the page layout no longer matches the parser.
  pub fn is_layout_change(&self) -> bool {
    matches!(self, Self::MissingElement { .. } | Self::Parse { .. })
  }
}

/// A single-date lookup missed the cache and the remote fetch failed too.
#[derive(Debug, Error)]
pub enum LookupError {
  #[error("{year:04}-{month:02}-{day:02} is not a calendar date")]
  InvalidDate { year: i32, month: u32, day: u32 },

  #[error(transparent)]
  Fetch(#[from] FetchError),
}

/// Reading or replacing the persisted cache store failed.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to {action} cache store {}: {source}", path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cache store {} is not valid JSON: {source}", path.display())]
  Corrupt {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize cache store: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("cache store lock poisoned")]
  Poisoned,
}
