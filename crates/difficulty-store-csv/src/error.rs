//! Error type for `difficulty-store-csv`.

use std::path::PathBuf;

use difficulty_core::store::ObserverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] difficulty_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  /// The temporary file holding a rewrite could not be moved into place.
  #[error("could not replace store file: {0}")]
  Persist(#[from] tempfile::PersistError),

  /// Another process holds the data directory lock.
  #[error("data directory is locked by another process: {0}")]
  Locked(PathBuf),

  /// The row was written, but a post-write hook failed.
  #[error("post-write hook failed: {0}")]
  Observer(#[source] ObserverError),
}

/// A single row could not be migrated; it is kept as it was.
#[derive(Debug, Error)]
#[error("line {line}: {source}")]
pub struct SchemaMigrationRowError {
  pub line:   u64,
  #[source]
  pub source: difficulty_core::Error,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
