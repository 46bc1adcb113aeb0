//! Backfill progress checkpoint, written for operators and never read back.

use std::{fmt, fs, io, path::Path};

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
  pub last_processed: NaiveDate,
  pub total_requests: u64,
}

impl Checkpoint {
  pub fn write(&self, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, self.to_string())
  }
}

impl fmt::Display for Checkpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Last processed date: {}", self.last_processed.format("%Y-%m-%d"))?;
    writeln!(f, "Total requests: {}", self.total_requests)
  }
}
