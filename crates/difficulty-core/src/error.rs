//! Error types for `difficulty-core`.

use thiserror::Error;

/// A date string matched none of the accepted formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse date {input:?} in any known format")]
pub struct DateParseError {
  pub input: String,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  DateParse(#[from] DateParseError),

  #[error("invalid {field} value: {value:?}")]
  InvalidField { field: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
