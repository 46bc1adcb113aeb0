//! [`Collector`]: daily, single-date and backfill collection runs.
//!
//! Every attempt goes fetch → parse → store. Stores notify the view
//! generator on insert, so views are current when a collect call returns.

use std::{fs, sync::Arc, time::Duration};

use chrono::NaiveDate;
use difficulty_core::{
  PuzzleRecord, Score, puzzle_number_for,
  store::{Outcome, RecordStore, StoreKind},
};
use difficulty_store_csv::CsvStore;
use difficulty_views::ViewGenerator;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
  Result,
  config::{BackfillPolicy, CollectorConfig, DailyPolicy},
  progress::Checkpoint,
  scraper::{FetchError, Page, Scraper},
};

/// Bounds of the uniform jitter added to the backfill delay, in seconds.
const JITTER_SECS: (f64, f64) = (-0.5, 1.5);

/// Floor for a jittered backfill delay, in seconds.
const MIN_JITTERED_DELAY_SECS: f64 = 1.0;

/// Companion page URL for the puzzle observed on `date`.
pub fn companion_url(date: NaiveDate) -> String {
  format!(
    "https://www.nytimes.com/{}/crosswords/connections-companion-{}.html",
    date.format("%Y/%m/%d"),
    puzzle_number_for(date)
  )
}

// ─── Outcomes ─────────────────────────────────────────────────────────────────

/// Result of one fetch → parse attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
  Success(Score),
  /// The page loaded but had no rating; carries the body when available.
  NotFound(Option<Page>),
  TransientError(String),
}

impl From<Result<Score, FetchError>> for AttemptOutcome {
  fn from(result: Result<Score, FetchError>) -> Self {
    match result {
      Ok(score) => Self::Success(score),
      Err(FetchError::NotFound { page, .. }) => Self::NotFound(page),
      Err(FetchError::Transient { reason, .. }) => Self::TransientError(reason),
    }
  }
}

#[derive(Debug)]
pub enum DailyOutcome {
  Collected {
    record:  PuzzleRecord,
    daily:   Outcome,
    history: Outcome,
  },
  /// Every attempt failed; nothing was written.
  Exhausted { attempts: u32 },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
  /// Dates fetched.
  pub attempted:      u64,
  pub collected:      u64,
  /// Fetched, but the store already held an equivalent row.
  pub duplicates:     u64,
  /// Dates already present before the run started.
  pub skipped:        u64,
  pub failed:         u64,
  pub failure_pauses: u32,
  pub checkpoints:    u32,
}

// ─── Collector ────────────────────────────────────────────────────────────────

pub struct Collector<S> {
  scraper:         S,
  views:           Arc<ViewGenerator>,
  history:         CsvStore,
  daily:           CsvStore,
  daily_policy:    DailyPolicy,
  backfill_policy: BackfillPolicy,
}

impl<S: Scraper> Collector<S> {
  /// Wire both stores to `views` and take the run policies from `config`.
  pub fn new(scraper: S, views: ViewGenerator, config: &CollectorConfig) -> Self {
    let views = Arc::new(views);
    let paths = views.paths();
    let history = CsvStore::new(&paths.history_csv, StoreKind::History)
      .with_observer(views.clone());
    let daily = CsvStore::new(&paths.daily_csv, StoreKind::Daily)
      .with_observer(views.clone());
    Self {
      scraper,
      views,
      history,
      daily,
      daily_policy: config.daily.clone(),
      backfill_policy: config.backfill.clone(),
    }
  }

  async fn attempt(&self, date: NaiveDate) -> AttemptOutcome {
    let url = companion_url(date);
    debug!(%date, %url, "attempting collection");
    let outcome = AttemptOutcome::from(self.scraper.fetch_and_extract(&url).await);
    match &outcome {
      AttemptOutcome::Success(score) => {
        info!(%date, value = score.value, scale = score.scale, "found difficulty score");
      }
      AttemptOutcome::NotFound(_) => warn!(%date, %url, "no difficulty score on page"),
      AttemptOutcome::TransientError(reason) => warn!(%date, %url, %reason, "fetch failed"),
    }
    outcome
  }

  // ── Daily ───────────────────────────────────────────────────────────────

  /// Collect today's score into the daily and history stores, retrying
  /// after `retry_delay` until the attempts run out.
  pub async fn collect_daily(&self, today: NaiveDate) -> Result<DailyOutcome> {
    let attempts = self.daily_policy.attempts();

    for attempt in 1..=attempts {
      info!(attempt, attempts, %today, "daily collection attempt");

      if let AttemptOutcome::Success(score) = self.attempt(today).await {
        let record = PuzzleRecord::observed(today, puzzle_number_for(today), score);

        let daily = self.daily.append(&record)?;
        if daily == Outcome::Duplicate {
          info!(%today, "already in daily store; refreshing latest view");
          self.views.refresh_latest_from_daily()?;
          self.views.regenerate_four_day()?;
        }
        let history = self.history.append(&record)?;

        return Ok(DailyOutcome::Collected { record, daily, history });
      }

      if attempt < attempts {
        let delay = self.daily_policy.retry_delay();
        info!(delay_secs = delay.as_secs(), "waiting before next attempt");
        sleep(delay).await;
      }
    }

    error!(attempts, %today, "daily collection failed on every attempt");
    Ok(DailyOutcome::Exhausted { attempts })
  }

  // ── Single date ─────────────────────────────────────────────────────────

  /// One attempt for `date`, stored in the history store only. With
  /// `save_html`, a page lacking a score is kept as `debug_<date>.html`.
  pub async fn collect_date(
    &self,
    date: NaiveDate,
    save_html: bool,
  ) -> Result<Option<PuzzleRecord>> {
    match self.attempt(date).await {
      AttemptOutcome::Success(score) => {
        let record = PuzzleRecord::observed(date, puzzle_number_for(date), score);
        if self.history.append(&record)? == Outcome::Duplicate {
          info!(%date, "already in history store");
        }
        Ok(Some(record))
      }
      AttemptOutcome::NotFound(Some(page)) if save_html => {
        let path = self
          .views
          .paths()
          .dir
          .join(format!("debug_{}.html", date.format("%Y-%m-%d")));
        fs::create_dir_all(&self.views.paths().dir)?;
        fs::write(&path, &page.body)?;
        info!(path = %path.display(), url = %page.url, "saved page for inspection");
        Ok(None)
      }
      _ => {
        if save_html {
          warn!(%date, "no page body to save");
        }
        Ok(None)
      }
    }
  }

  // ── Backfill ────────────────────────────────────────────────────────────

  /// Walk `start..=end`, collecting every date not yet in the history
  /// store, with batch and failure cooldowns.
  pub async fn backfill(&self, start: NaiveDate, end: NaiveDate) -> Result<BackfillReport> {
    let policy = &self.backfill_policy;
    let batch_size = u64::from(policy.batch_size.max(1));
    let processed = self.history.load_processed_keys()?;
    let mut report = BackfillReport::default();
    let mut consecutive_failures = 0u32;

    info!(%start, %end, already = processed.len(), "starting backfill");

    for date in start.iter_days().take_while(|d| *d <= end) {
      if processed.contains(&date) {
        debug!(%date, "already collected; skipping");
        report.skipped += 1;
        continue;
      }

      if consecutive_failures >= policy.max_consecutive_failures {
        let pause = policy.failure_cooldown();
        error!(
          consecutive_failures,
          pause_secs = pause.as_secs(),
          "too many consecutive failures; pausing"
        );
        sleep(pause).await;
        consecutive_failures = 0;
        report.failure_pauses += 1;
      }

      match self.attempt(date).await {
        AttemptOutcome::Success(score) => {
          let record = PuzzleRecord::observed(date, puzzle_number_for(date), score);
          match self.history.append(&record)? {
            Outcome::Inserted => report.collected += 1,
            Outcome::Duplicate => report.duplicates += 1,
          }
          consecutive_failures = 0;
        }
        AttemptOutcome::NotFound(_) | AttemptOutcome::TransientError(_) => {
          report.failed += 1;
          consecutive_failures += 1;
        }
      }
      report.attempted += 1;

      if report.attempted % batch_size == 0 {
        let cooldown = policy.cooldown();
        info!(
          requests = report.attempted,
          cooldown_secs = cooldown.as_secs(),
          "batch complete; cooling down"
        );
        sleep(cooldown).await;
        Checkpoint { last_processed: date, total_requests: report.attempted }
          .write(&self.views.paths().progress)?;
        report.checkpoints += 1;
      }

      sleep(self.inter_request_delay()).await;
    }

    info!(
      attempted = report.attempted,
      collected = report.collected,
      skipped = report.skipped,
      failed = report.failed,
      "backfill complete"
    );
    self.views.regenerate_history()?;

    Ok(report)
  }

  fn inter_request_delay(&self) -> Duration {
    let policy = &self.backfill_policy;
    let secs = if policy.jitter {
      let (low, high) = JITTER_SECS;
      (policy.delay_secs + rand::rng().random_range(low..=high)).max(MIN_JITTERED_DELAY_SECS)
    } else {
      policy.delay_secs
    };
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO)
  }
}

// ─── Maintenance ──────────────────────────────────────────────────────────────

/// Rows rewritten by [`migrate`], per store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
  pub history: usize,
  pub daily:   usize,
}

/// Bring both stores to the current schema, then rebuild every view.
pub fn migrate(views: &ViewGenerator) -> Result<MigrationReport> {
  let paths = views.paths();
  let report = MigrationReport {
    history: CsvStore::new(&paths.history_csv, StoreKind::History).migrate()?,
    daily:   CsvStore::new(&paths.daily_csv, StoreKind::Daily).migrate()?,
  };
  info!(history = report.history, daily = report.daily, "migration complete");
  views.regenerate_all()?;
  Ok(report)
}
