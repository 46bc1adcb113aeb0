//! The `RecordStore` trait and the post-write observer hook.
//!
//! The trait is implemented by storage backends (e.g. `difficulty-store-csv`).
//! Derived views are kept consistent by registering a [`StoreObserver`] that
//! the store calls synchronously after every successful insert.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::record::PuzzleRecord;

/// Which of the two physical stores a backend instance represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
  /// Every successfully collected record, kept indefinitely.
  History,
  /// Same-day collection outcomes only; drives the latest view.
  Daily,
}

impl StoreKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::History => "history",
      Self::Daily => "daily",
    }
  }
}

/// Result of an append. A duplicate is an idempotent no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
  Inserted,
  Duplicate,
}

pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Notified after a record has been durably appended to a store.
pub trait StoreObserver: Send + Sync {
  fn on_insert(
    &self,
    kind: StoreKind,
    record: &PuzzleRecord,
  ) -> Result<(), ObserverError>;
}

/// Abstraction over an append-only, deduplicating record store.
///
/// Records are never updated or removed. The only whole-file rewrite is
/// [`RecordStore::migrate`], which upgrades legacy rows in place.
pub trait RecordStore {
  type Error: std::error::Error + Send + Sync + 'static;

  fn kind(&self) -> StoreKind;

  /// Append `record` unless a row with the same observation date or the
  /// same puzzle number already exists.
  fn append(&self, record: &PuzzleRecord) -> Result<Outcome, Self::Error>;

  /// Rewrite legacy rows so every row carries the derived date columns.
  /// Returns the number of rows migrated; `0` when nothing needed doing.
  fn migrate(&self) -> Result<usize, Self::Error>;

  /// Every row that normalizes cleanly, in file order.
  fn load(&self) -> Result<Vec<PuzzleRecord>, Self::Error>;

  /// Observation dates already present, without building full records.
  fn load_processed_keys(&self) -> Result<BTreeSet<NaiveDate>, Self::Error>;

  /// The record with the greatest observation date. Ties keep the first
  /// one encountered.
  fn latest(&self) -> Result<Option<PuzzleRecord>, Self::Error> {
    let mut latest: Option<PuzzleRecord> = None;
    for record in self.load()? {
      match &latest {
        Some(best) if record.observation_date <= best.observation_date => {}
        _ => latest = Some(record),
      }
    }
    Ok(latest)
  }
}
