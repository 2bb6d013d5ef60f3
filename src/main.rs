mod cache;
mod chart;
mod config;
mod date;
mod error;
mod logging;
mod text;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use cache::{CacheStorage, ChartCache, JsonFileStorage, MemoryStorage};
use chart::{BackfillService, ChartEntry, ChartLookupService, OfficialChartsClient};
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "chartday")]
#[command(about = "The UK number one single on your birthday, every year since you were born")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/chartday/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Path to the chart cache store
  #[arg(long, global = true)]
  cache: Option<PathBuf>,

  /// Print results as JSON
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Number one single for one date (YYYY-MM-DD)
  Lookup { date: NaiveDate },

  /// Number one on this day of every year since the given birthday
  Yearly {
    birthday: NaiveDate,

    /// Print the ordered artist/track list for building a playlist
    #[arg(long)]
    pairs: bool,
  },

  /// Fetch every date up to today and merge it into the cache store
  Backfill {
    /// First date to fetch (default: backfill.start_date from config)
    #[arg(long, conflicts_with = "resume")]
    from: Option<NaiveDate>,

    /// Start the day after the newest cached date
    #[arg(long)]
    resume: bool,

    /// Maximum fetches in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Fetch but don't write the store
    #[arg(long)]
    no_persist: bool,
  },

  /// Parse a saved chart page, to check the parser against the live layout
  ParsePage { date: NaiveDate, file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Override cache path if specified on command line
  if let Some(path) = args.cache {
    config.cache.path = Some(path);
  }

  let _log_guard = logging::init(config.log.dir.as_deref());

  match args.command {
    Command::Lookup { date } => lookup(&config, date, args.json).await,
    Command::Yearly { birthday, pairs } => yearly(&config, birthday, pairs, args.json).await,
    Command::Backfill {
      from,
      resume,
      concurrency,
      no_persist,
    } => {
      let opts = BackfillOptions {
        from,
        resume,
        concurrency: concurrency.unwrap_or(config.backfill.concurrency),
        json: args.json,
      };
      let storage = JsonFileStorage::new(config.cache_path()?);
      if no_persist {
        let dry = MemoryStorage::new(storage.load()?);
        backfill(&config, Arc::new(dry), opts).await
      } else {
        backfill(&config, Arc::new(storage), opts).await
      }
    }
    Command::ParsePage { date, file } => parse_page(date, &file, args.json),
  }
}

fn lookup_service(config: &Config) -> Result<ChartLookupService<OfficialChartsClient>> {
  let storage = JsonFileStorage::new(config.cache_path()?);
  let client = OfficialChartsClient::new(&config.source)?;
  let service = ChartLookupService::new(client, ChartCache::load(&storage)?);
  info!(
    path = %storage.path().display(),
    entries = service.cache().len(),
    "Loaded chart cache"
  );
  if service.cache().is_empty() {
    info!("Chart cache is empty, every lookup goes to the network; run `chartday backfill` to fill it");
  }
  Ok(service)
}

async fn lookup(config: &Config, date: NaiveDate, json: bool) -> Result<()> {
  let service = lookup_service(config)?;
  let entry = service
    .lookup_one(date.year(), date.month(), date.day())
    .await?;

  if json {
    println!("{}", serde_json::to_string_pretty(&entry)?);
  } else {
    println!("{}", describe(&entry));
  }
  Ok(())
}

async fn yearly(config: &Config, birthday: NaiveDate, pairs: bool, json: bool) -> Result<()> {
  let service = lookup_service(config)?;
  let today = Local::now().date_naive();

  let years = chart::chart_years(birthday.year(), birthday.month(), today);
  info!(from = years.start(), to = years.end(), "Looking up yearly number ones");

  let entries = service
    .lookup_yearly(birthday.year(), birthday.month(), birthday.day(), today)
    .await;

  if pairs {
    let pairs: Vec<(String, String)> = entries.iter().map(ChartEntry::track_pair).collect();
    if json {
      println!("{}", serde_json::to_string_pretty(&pairs)?);
    } else {
      for (artist, track) in pairs {
        println!("{}\t{}", artist, track);
      }
    }
  } else if json {
    println!("{}", serde_json::to_string_pretty(&entries)?);
  } else {
    for entry in &entries {
      println!("{}", describe(entry));
    }
  }
  Ok(())
}

struct BackfillOptions {
  from: Option<NaiveDate>,
  resume: bool,
  concurrency: usize,
  json: bool,
}

async fn backfill<St: CacheStorage>(
  config: &Config,
  storage: Arc<St>,
  opts: BackfillOptions,
) -> Result<()> {
  let start = if opts.resume {
    ChartCache::load(&*storage)?
      .latest_date()
      .and_then(date::next_day)
      .unwrap_or(config.backfill.start_date)
  } else {
    opts.from.unwrap_or(config.backfill.start_date)
  };
  if opts.concurrency == 0 {
    return Err(eyre!("--concurrency must be at least 1"));
  }

  let client = OfficialChartsClient::new(&config.source)?;
  let service = BackfillService::new(client, storage).with_concurrency(opts.concurrency);

  let today = Local::now().date_naive();
  let entries = service.backfill(start, today).await?;

  if opts.json {
    println!("{}", serde_json::to_string_pretty(&entries)?);
  } else {
    println!(
      "Fetched {} of {} dates from {} to {}",
      entries.len(),
      date::days_through(start, today).len(),
      start,
      today
    );
  }
  Ok(())
}

fn parse_page(date: NaiveDate, file: &std::path::Path, json: bool) -> Result<()> {
  let html = std::fs::read_to_string(file)
    .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
  let entry = chart::parse_chart_page(date, &html)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&entry)?);
  } else {
    println!("{}", describe(&entry));
  }
  Ok(())
}

fn describe(entry: &ChartEntry) -> String {
  format!(
    "{}  {} - {}  (chart week {} to {})",
    entry.date, entry.track, entry.artist, entry.chart_week_start, entry.chart_week_end
  )
}
