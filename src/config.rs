use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::JsonFileStorage;

pub const DEFAULT_BASE_URL: &str = "https://www.officialcharts.com/charts/singles-chart/";
const DEFAULT_USER_AGENT: &str = concat!("chartday/", env!("CARGO_PKG_VERSION"));

/// Maximum simultaneous remote fetches during a backfill.
pub const DEFAULT_BACKFILL_CONCURRENCY: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub source: SourceConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub backfill: BackfillConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  /// Chart page root; the date path is appended to it
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_user_agent")]
  pub user_agent: String,
  /// Per-request timeout. No timeout when unset.
  pub timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      user_agent: default_user_agent(),
      timeout_secs: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Store location (defaults to $XDG_DATA_HOME/chartday/charts.json)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
  #[serde(default = "default_concurrency")]
  pub concurrency: usize,
  /// First date fetched when no explicit start is given
  #[serde(default = "default_start_date")]
  pub start_date: NaiveDate,
}

impl Default for BackfillConfig {
  fn default() -> Self {
    Self {
      concurrency: default_concurrency(),
      start_date: default_start_date(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
  /// Directory for the daily rolling log file. File logging is off when unset.
  pub dir: Option<PathBuf>,
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
  DEFAULT_USER_AGENT.to_string()
}

fn default_concurrency() -> usize {
  DEFAULT_BACKFILL_CONCURRENCY
}

/// The first UK singles chart was published for 14 November 1952.
fn default_start_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(1952, 11, 14).unwrap_or_default()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./chartday.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/chartday/config.yaml
  ///
  /// Falls back to built-in defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("chartday.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("chartday").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn validate(&self) -> Result<()> {
    if self.backfill.concurrency == 0 {
      return Err(eyre!("backfill.concurrency must be at least 1"));
    }
    url::Url::parse(&self.source.base_url)
      .map_err(|e| eyre!("Invalid source.base_url '{}': {}", self.source.base_url, e))?;
    Ok(())
  }

  /// Resolve the cache store location.
  pub fn cache_path(&self) -> Result<PathBuf> {
    self
      .cache
      .path
      .clone()
      .or_else(JsonFileStorage::default_path)
      .ok_or_else(|| eyre!("Could not determine data directory; set cache.path"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_yaml_is_defaults() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.source.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.backfill.concurrency, 100);
    assert_eq!(
      config.backfill.start_date,
      NaiveDate::from_ymd_opt(1952, 11, 14).unwrap()
    );
    assert!(config.source.timeout_secs.is_none());
    assert!(config.log.dir.is_none());
  }

  #[test]
  fn test_partial_yaml_keeps_other_defaults() {
    let config = Config::from_yaml(
      "source:\n  timeout_secs: 20\nbackfill:\n  concurrency: 8\ncache:\n  path: /tmp/charts.json\n",
    )
    .unwrap();
    assert_eq!(config.source.timeout_secs, Some(20));
    assert_eq!(config.source.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.backfill.concurrency, 8);
    assert_eq!(config.backfill.start_date.to_string(), "1952-11-14");
    assert_eq!(
      config.cache_path().unwrap(),
      PathBuf::from("/tmp/charts.json")
    );
  }

  #[test]
  fn test_start_date_parses_iso() {
    let config = Config::from_yaml("backfill:\n  start_date: 2000-01-01\n").unwrap();
    assert_eq!(
      config.backfill.start_date,
      NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
    );
  }

  #[test]
  fn test_validate_rejects_zero_concurrency() {
    let config = Config::from_yaml("backfill:\n  concurrency: 0\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_validate_rejects_bad_base_url() {
    let config = Config::from_yaml("source:\n  base_url: not a url\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    assert!(Config::load(Some(Path::new("/definitely/not/here.yaml"))).is_err());
  }
}
