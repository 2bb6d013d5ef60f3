//! Date handling for chart pages and cache keys.
//!
//! Chart pages print dates long-form ("1 August 2020"), the cache is keyed by
//! zero-padded `YYYY-MM-DD`, and the chart source addresses pages by
//! `YYYYMMDD`.

use chrono::{Datelike, NaiveDate};

use crate::error::ParseError;

const MONTHS: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

/// Parse a long-form date such as "1 August 2020".
///
/// Month names are full English names and are matched case-sensitively.
pub fn parse_long_date(s: &str) -> Result<NaiveDate, ParseError> {
  let parts: Vec<&str> = s.split_whitespace().collect();
  let [day, month, year] = parts.as_slice() else {
    return Err(ParseError::Malformed(s.to_string()));
  };

  let month = MONTHS
    .iter()
    .position(|name| name == month)
    .map(|idx| idx as u32 + 1)
    .ok_or_else(|| ParseError::UnknownMonth(month.to_string()))?;

  let day: u32 = day
    .parse()
    .map_err(|_| ParseError::Malformed(s.to_string()))?;
  let year: i32 = year
    .parse()
    .map_err(|_| ParseError::Malformed(s.to_string()))?;

  NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| ParseError::InvalidDate(s.to_string()))
}

/// Parse a chart week such as "31 July 2020 - 6 August 2020" into its bounds.
pub fn parse_week_range(s: &str) -> Result<(NaiveDate, NaiveDate), ParseError> {
  let parts: Vec<&str> = s.split('-').map(str::trim).collect();
  let [start, end] = parts.as_slice() else {
    return Err(ParseError::MalformedRange(s.to_string()));
  };

  Ok((parse_long_date(start)?, parse_long_date(end)?))
}

/// The calendar day after `date`, or `None` past the end of the representable range.
pub fn next_day(date: NaiveDate) -> Option<NaiveDate> {
  date.succ_opt()
}

/// Every date from `start` to `end`, both inclusive. Empty if `start > end`.
pub fn days_through(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
  std::iter::successors(Some(start), |d| next_day(*d))
    .take_while(|d| *d <= end)
    .collect()
}

/// Cache key for a query date, e.g. `2020-08-01`.
pub fn composite_key(year: i32, month: u32, day: u32) -> String {
  format!("{:04}-{:02}-{:02}", year, month, day)
}

pub fn key_for(date: NaiveDate) -> String {
  composite_key(date.year(), date.month(), date.day())
}

/// Path segment the chart source uses to address a date, e.g. `20200801`.
pub fn date_path(date: NaiveDate) -> String {
  format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}
