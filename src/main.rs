mod cache;
mod config;
mod stats;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cache::{CacheStorage, NoopStorage, Outcome, SqliteStorage};
use crate::config::{Config, LogConfig};
use crate::stats::transform::find_pinned;
use crate::stats::{DetailRecord, FetchError, HttpRemote, Repository};

#[derive(Parser, Debug)]
#[command(name = "covstat")]
#[command(about = "COVID-19 statistics with an offline cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/covstat/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Neither read nor write the local cache
  #[arg(long)]
  no_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Global totals
  Overview,
  /// Daily global series with trends
  Daily,
  /// Confirmed cases per location
  Confirmed,
  /// Deaths per location
  Deaths,
  /// Recoveries per location
  Recovered,
  /// Totals for one country (name or ISO code)
  Country { id: String },
  /// Confirmed cases merged with recoveries and deaths
  FullStats,
  /// Latest numbers for the pinned location
  Pinned,
  /// Pin a location from the confirmed list
  Pin {
    country: String,
    #[arg(short, long)]
    region: Option<String>,
  },
  /// Forget the pinned location
  Unpin,
  /// Print cached data without touching the network
  Cached {
    #[arg(value_enum)]
    category: Category,
    /// Country id, for the country category
    #[arg(long)]
    id: Option<String>,
  },
  /// Daily series from the regional API
  RegionalDaily,
  /// Per-region totals from the regional API
  RegionalCounts,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Category {
  Overview,
  Daily,
  Confirmed,
  Deaths,
  Recovered,
  FullStats,
  Country,
  Pinned,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _guard = init_tracing(&config.log)?;

  let remote = HttpRemote::new(&config.api)?;

  if args.no_cache || !config.cache.enabled {
    let repo = Repository::new(remote, NoopStorage).with_daily_order(config.daily_order);
    run(&repo, args.command).await
  } else {
    let storage = SqliteStorage::open(config.cache.path.as_deref())?;
    let repo = Repository::new(remote, storage).with_daily_order(config.daily_order);
    run(&repo, args.command).await
  }
}

/// Log to a daily file when a directory is configured, otherwise to stderr.
fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&log.filter))
    .map_err(|e| eyre!("Invalid log filter '{}': {}", log.filter, e))?;

  let builder = tracing_subscriber::fmt().with_env_filter(filter);

  match &log.directory {
    Some(dir) => {
      let appender = tracing_appender::rolling::daily(dir, "covstat.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      builder.with_writer(writer).with_ansi(false).init();
      Ok(Some(guard))
    }
    None => {
      builder.with_writer(std::io::stderr).init();
      Ok(None)
    }
  }
}

async fn run<S: CacheStorage>(repo: &Repository<HttpRemote, S>, command: Command) -> Result<()> {
  match command {
    Command::Overview => print_outcomes(repo.overview()).await,
    Command::Daily => print_outcomes(repo.daily()).await,
    Command::Confirmed => print_values(repo.confirmed()).await,
    Command::Deaths => print_values(repo.deaths()).await,
    Command::Recovered => print_values(repo.recovered()).await,
    Command::Country { id } => print_values(repo.country(&id)).await,
    Command::FullStats => print_values(repo.full_stats()).await,
    Command::Pinned => print_outcomes(repo.pinned_region()).await,
    Command::Pin { country, region } => pin(repo, country, region).await,
    Command::Unpin => {
      repo.remove_pinned_region()?;
      print_line(&json!({ "unpinned": true }))
    }
    Command::Cached { category, id } => print_cached(repo, category, id.as_deref()),
    Command::RegionalDaily => print_values(repo.regional_daily()).await,
    Command::RegionalCounts => print_values(repo.regional_counts()).await,
  }
}

/// Pin the freshest confirmed record for the location.
async fn pin<S: CacheStorage>(
  repo: &Repository<HttpRemote, S>,
  country: String,
  region: Option<String>,
) -> Result<()> {
  let wanted = DetailRecord {
    country,
    region,
    iso2: None,
    confirmed: 0,
    recovered: 0,
    deaths: 0,
    last_update: 0,
    lat: 0.0,
    long: 0.0,
  };

  let mut latest = None;
  let mut confirmed = repo.confirmed();
  while let Some(item) = confirmed.next().await {
    match item {
      Ok(records) => latest = Some(records),
      // A cached list is good enough to pin from
      Err(e) if latest.is_some() => tracing::warn!(error = %e, "Using cached confirmed list"),
      Err(e) => return Err(eyre!(e)),
    }
  }

  let records = latest.unwrap_or_default();
  let record = find_pinned(&records, &wanted)
    .ok_or_else(|| eyre!("No confirmed record for {}", wanted.display_name()))?;

  repo.put_pinned_region(record)?;
  print_line(&json!({ "pinned": record }))
}

fn print_cached<S: CacheStorage>(
  repo: &Repository<HttpRemote, S>,
  category: Category,
  id: Option<&str>,
) -> Result<()> {
  let data = match category {
    Category::Overview => serde_json::to_value(repo.cached_overview())?,
    Category::Daily => serde_json::to_value(repo.cached_daily())?,
    Category::Confirmed => serde_json::to_value(repo.cached_confirmed())?,
    Category::Deaths => serde_json::to_value(repo.cached_deaths())?,
    Category::Recovered => serde_json::to_value(repo.cached_recovered())?,
    Category::FullStats => serde_json::to_value(repo.cached_full_stats())?,
    Category::Country => {
      let id = id.ok_or_else(|| eyre!("--id is required for the country category"))?;
      serde_json::to_value(repo.cached_country(id))?
    }
    Category::Pinned => serde_json::to_value(repo.cached_pinned_region())?,
  };

  print_line(&json!({ "source": "cache", "data": data }))
}

/// Print every outcome as a JSON line. A terminal error is printed, then
/// returned.
async fn print_outcomes<T: Serialize>(
  mut stream: BoxStream<'static, Result<Outcome<T, FetchError>, FetchError>>,
) -> Result<()> {
  while let Some(item) = stream.next().await {
    let outcome = item.map_err(|e| report(&e))?;
    print_line(&json!({
      "source": outcome.source,
      "cached_at": outcome.cached_at,
      "data": outcome.data,
      "error": outcome.error.map(|e| e.to_string()),
    }))?;
  }
  Ok(())
}

async fn print_values<T: Serialize>(
  mut stream: BoxStream<'static, Result<T, FetchError>>,
) -> Result<()> {
  while let Some(item) = stream.next().await {
    let data = item.map_err(|e| report(&e))?;
    print_line(&json!({ "data": data }))?;
  }
  Ok(())
}

fn report(err: &FetchError) -> color_eyre::Report {
  // Keep stdout machine readable even on failure
  let _ = print_line(&json!({ "error": err.to_string() }));
  eyre!(err.clone())
}

fn print_line(value: &serde_json::Value) -> Result<()> {
  println!("{}", serde_json::to_string(value)?);
  Ok(())
}
