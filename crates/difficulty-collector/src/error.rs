//! Error type for `difficulty-collector`.
//!
//! Fetch failures are not errors at this level: they are attempt outcomes
//! handled by the retry policy. What remains is local I/O on the stores and
//! views, which aborts the current operation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[from] difficulty_store_csv::Error),

  #[error("view error: {0}")]
  Views(#[from] difficulty_views::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
