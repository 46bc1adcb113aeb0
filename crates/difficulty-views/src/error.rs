//! Error type for `difficulty-views`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[from] difficulty_store_csv::Error),

  #[error("core error: {0}")]
  Core(#[from] difficulty_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("could not replace view file: {0}")]
  Persist(#[from] tempfile::PersistError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
