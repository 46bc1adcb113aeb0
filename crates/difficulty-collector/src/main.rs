//! `difficulty`: collects the daily puzzle difficulty score and keeps the
//! data directory's views current.
//!
//! # Usage
//!
//! ```
//! difficulty daily --retries 3
//! difficulty backfill --start-date 2024-01-01 --end-date 2024-03-01
//! difficulty date 2025-03-09 --save-html
//! difficulty migrate
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use difficulty_collector::{
  Collector, CollectorConfig, DailyOutcome, HttpScraper, config::ScraperConfig, controller,
};
use difficulty_store_csv::DataDirLock;
use difficulty_views::{DataPaths, ViewGenerator};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Puzzle difficulty score tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "difficulty.toml")]
  config: PathBuf,

  /// Directory holding the stores and views.
  #[arg(long, env = "DIFFICULTY_DATA_DIR")]
  data_dir: Option<PathBuf>,

  /// Log at debug level unless `RUST_LOG` says otherwise.
  #[arg(long)]
  debug: bool,

  /// Send this user agent instead of rotating through browser agents.
  #[arg(long)]
  user_agent: Option<String>,

  /// HTTP proxy URL.
  #[arg(long)]
  proxy: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Collect today's score (the default).
  Daily {
    /// Total attempts before giving up.
    #[arg(long)]
    retries:     Option<u32>,
    /// Seconds between attempts.
    #[arg(long)]
    retry_delay: Option<u64>,
  },

  /// Collect every missing date in a range.
  Backfill {
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    end_date:   Option<NaiveDate>,
    /// Base seconds between requests.
    #[arg(long)]
    delay:      Option<f64>,
    #[arg(long)]
    no_jitter:  bool,
    /// Requests per batch before a cooldown.
    #[arg(long)]
    batch_size: Option<u32>,
    /// Seconds to pause between batches.
    #[arg(long)]
    cooldown:   Option<u64>,
  },

  /// Collect a single date into the history store.
  Date {
    date:      NaiveDate,
    /// Keep the page as `debug_<date>.html` if no score is found.
    #[arg(long)]
    save_html: bool,
  },

  /// Upgrade legacy store rows, then rebuild the views.
  Migrate,

  /// Rebuild every view from the stores.
  Generate,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  let mut config = CollectorConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

  // CLI flags override file and environment.
  if let Some(dir) = cli.data_dir {
    config.data_dir = dir;
  }
  if let Some(agent) = cli.user_agent {
    config.scraper.user_agent = Some(agent);
  }
  config.scraper.proxy = cli
    .proxy
    .or(config.scraper.proxy)
    .or_else(ScraperConfig::proxy_from_env);

  let command = cli.command.unwrap_or(Command::Daily { retries: None, retry_delay: None });
  apply_overrides(&mut config, &command);
  config.validate().context("invalid configuration")?;

  let _lock = DataDirLock::acquire(&config.data_dir)
    .with_context(|| format!("failed to lock {}", config.data_dir.display()))?;

  let views = ViewGenerator::new(DataPaths::in_dir(&config.data_dir));
  let today = Local::now().date_naive();

  match command {
    Command::Migrate => {
      controller::migrate(&views).context("migration failed")?;
    }
    Command::Generate => {
      views.regenerate_all().context("view generation failed")?;
      info!("views regenerated");
    }
    Command::Daily { .. } => {
      let collector = build_collector(views, &config)?;
      match collector.collect_daily(today).await? {
        DailyOutcome::Collected { record, .. } => info!(
          date = %record.observation_date,
          score = record.difficulty_score,
          "daily collection complete"
        ),
        DailyOutcome::Exhausted { attempts } => {
          anyhow::bail!("no score collected for {today} after {attempts} attempts")
        }
      }
    }
    Command::Backfill { .. } => {
      let collector = build_collector(views, &config)?;
      let (start, end) = config.backfill.range(today);
      let report = collector.backfill(start, end).await?;
      info!(?report, "backfill finished");
    }
    Command::Date { date, save_html } => {
      let collector = build_collector(views, &config)?;
      if collector.collect_date(date, save_html).await?.is_none() {
        anyhow::bail!("no score collected for {date}");
      }
    }
  }

  Ok(())
}

fn build_collector(
  views: ViewGenerator,
  config: &CollectorConfig,
) -> anyhow::Result<Collector<HttpScraper>> {
  let scraper = HttpScraper::new(config.scraper.clone()).context("failed to build HTTP client")?;
  Ok(Collector::new(scraper, views, config))
}

/// Fold subcommand flags into the loaded configuration.
fn apply_overrides(config: &mut CollectorConfig, command: &Command) {
  match command {
    Command::Daily { retries, retry_delay } => {
      if let Some(n) = retries {
        config.daily.max_retries = *n;
      }
      if let Some(secs) = retry_delay {
        config.daily.retry_delay_secs = *secs;
      }
    }
    Command::Backfill { start_date, end_date, delay, no_jitter, batch_size, cooldown } => {
      let policy = &mut config.backfill;
      policy.start_date = start_date.or(policy.start_date);
      policy.end_date = end_date.or(policy.end_date);
      if let Some(secs) = delay {
        policy.delay_secs = *secs;
      }
      if *no_jitter {
        policy.jitter = false;
      }
      if let Some(n) = batch_size {
        policy.batch_size = *n;
      }
      if let Some(secs) = cooldown {
        policy.cooldown_secs = *secs;
      }
    }
    Command::Date { .. } | Command::Migrate | Command::Generate => {}
  }
}
