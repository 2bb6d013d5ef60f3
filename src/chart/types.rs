use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::date;

/// The number one single for a queried date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
  pub date: NaiveDate,
  pub chart_week_start: NaiveDate,
  pub chart_week_end: NaiveDate,
  pub track: String,
  pub artist: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover_url: Option<String>,
  pub year: i32,
  pub month: u32,
  pub day: u32,
}

impl ChartEntry {
  /// Build an entry for `date`; the year/month/day copies are derived from it.
  pub fn new(
    date: NaiveDate,
    chart_week: (NaiveDate, NaiveDate),
    track: String,
    artist: String,
    cover_url: Option<String>,
  ) -> Self {
    Self {
      date,
      chart_week_start: chart_week.0,
      chart_week_end: chart_week.1,
      track,
      artist,
      cover_url,
      year: date.year(),
      month: date.month(),
      day: date.day(),
    }
  }

  /// Composite cache key, e.g. `1990-06-15`.
  pub fn cache_key(&self) -> String {
    date::key_for(self.date)
  }

  /// Whether the redundant year/month/day fields agree with `date`.
  pub fn is_consistent(&self) -> bool {
    self.year == self.date.year() && self.month == self.date.month() && self.day == self.date.day()
  }

  /// The `(artist, track)` pair handed to playlist creation.
  pub fn track_pair(&self) -> (String, String) {
    (self.artist.clone(), self.track.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> ChartEntry {
    ChartEntry::new(
      NaiveDate::from_ymd_opt(1990, 6, 5).unwrap(),
      (
        NaiveDate::from_ymd_opt(1990, 6, 3).unwrap(),
        NaiveDate::from_ymd_opt(1990, 6, 9).unwrap(),
      ),
      "World In Motion".to_string(),
      "Englandneworder".to_string(),
      None,
    )
  }

  #[test]
  fn test_new_derives_date_parts() {
    let entry = sample();
    assert_eq!((entry.year, entry.month, entry.day), (1990, 6, 5));
    assert_eq!(entry.cache_key(), "1990-06-05");
    assert!(entry.is_consistent());
  }

  #[test]
  fn test_serialized_shape() {
    let value = serde_json::to_value(sample()).unwrap();
    assert_eq!(value["date"], "1990-06-05");
    assert_eq!(value["chartWeekStart"], "1990-06-03");
    assert_eq!(value["chartWeekEnd"], "1990-06-09");
    assert_eq!(value["month"], 6);
    assert!(value.get("coverUrl").is_none());
  }

  #[test]
  fn test_track_pair_is_artist_first() {
    assert_eq!(
      sample().track_pair(),
      (
        "Englandneworder".to_string(),
        "World In Motion".to_string()
      )
    );
  }
}
