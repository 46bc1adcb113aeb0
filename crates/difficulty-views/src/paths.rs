//! File layout of a data directory.

use std::path::{Path, PathBuf};

/// Every file the pipeline reads or writes, all inside one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
  pub dir:           PathBuf,
  pub history_csv:   PathBuf,
  pub daily_csv:     PathBuf,
  pub latest_json:   PathBuf,
  pub history_json:  PathBuf,
  pub four_day_json: PathBuf,
  pub four_day_csv:  PathBuf,
  /// Backfill checkpoint for operators; never read back.
  pub progress:      PathBuf,
}

impl DataPaths {
  pub fn in_dir(dir: impl AsRef<Path>) -> Self {
    let dir = dir.as_ref();
    Self {
      dir:           dir.to_path_buf(),
      history_csv:   dir.join("connections_difficulty_history.csv"),
      daily_csv:     dir.join("connections_difficulty_daily.csv"),
      latest_json:   dir.join("connections_difficulty_data_latest.json"),
      history_json:  dir.join("connections_difficulty_history.json"),
      four_day_json: dir.join("connections_difficulty_four_day.json"),
      four_day_csv:  dir.join("connections_difficulty_four_day.csv"),
      progress:      dir.join("scraper_progress.txt"),
    }
  }
}
