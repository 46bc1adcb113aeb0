//! Rebuilds every derived view from the stores.

use chrono::{Local, NaiveDate};
use csv::WriterBuilder;
use difficulty_core::{
  PuzzleRecord,
  store::{ObserverError, RecordStore, StoreKind, StoreObserver},
  view::{PuzzleEntry, VIEW_COLUMNS, ViewDocument},
};
use difficulty_store_csv::CsvStore;
use tracing::{info, warn};

use crate::{Result, paths::DataPaths, write};

/// Number of entries in the rolling window view.
pub const FOUR_DAY_WINDOW: usize = 4;

/// Rendered four-day views, ready to be written.
struct FourDay {
  json:  String,
  table: Vec<u8>,
  len:   usize,
}

/// Owns the view files and read-only handles on both stores.
pub struct ViewGenerator {
  paths:   DataPaths,
  history: CsvStore,
  daily:   CsvStore,
  /// Fixed generation date; `None` means the local calendar date.
  today:   Option<NaiveDate>,
}

impl ViewGenerator {
  pub fn new(paths: DataPaths) -> Self {
    let history = CsvStore::new(&paths.history_csv, StoreKind::History);
    let daily = CsvStore::new(&paths.daily_csv, StoreKind::Daily);
    Self { paths, history, daily, today: None }
  }

  /// Stamp every view with `date` instead of the current date.
  pub fn with_today(mut self, date: NaiveDate) -> Self {
    self.today = Some(date);
    self
  }

  pub fn paths(&self) -> &DataPaths { &self.paths }

  fn today(&self) -> NaiveDate {
    self.today.unwrap_or_else(|| Local::now().date_naive())
  }

  // ── Latest ──────────────────────────────────────────────────────────────

  /// Overwrite the latest view with exactly `record`.
  pub fn regenerate_latest(&self, record: &PuzzleRecord) -> Result<()> {
    let doc = ViewDocument::new(vec![PuzzleEntry::from(record)], self.today());
    write::replace(&self.paths.latest_json, doc.to_pretty_json()?.as_bytes())?;
    info!(
      date = %record.observation_date,
      puzzle_date = %record.puzzle_date,
      "updated latest view"
    );
    Ok(())
  }

  /// Rebuild the latest view from the newest record in the daily store.
  /// Leaves the view untouched when the daily store has nothing usable.
  pub fn refresh_latest_from_daily(&self) -> Result<Option<PuzzleRecord>> {
    let Some(latest) = self.daily.latest()? else {
      warn!(
        path = %self.paths.daily_csv.display(),
        "daily store has no usable rows, latest view not updated"
      );
      return Ok(None);
    };
    self.regenerate_latest(&latest)?;
    Ok(Some(latest))
  }

  // ── History ─────────────────────────────────────────────────────────────

  /// Rebuild the history view, newest observation first, and the four-day
  /// views cut from it. All three files are replaced together, so the
  /// window never disagrees with the history on disk. Returns the history
  /// entries written.
  pub fn regenerate_history(&self) -> Result<Vec<PuzzleEntry>> {
    let mut records = self.history.load()?;
    // Stable: equal dates keep their store order.
    records.sort_by(|a, b| b.observation_date.cmp(&a.observation_date));

    let entries: Vec<PuzzleEntry> = records.iter().map(PuzzleEntry::from).collect();
    let doc = ViewDocument::new(entries, self.today());
    let json = doc.to_pretty_json()?;
    let four_day = self.render_four_day(&doc.puzzles)?;

    write::replace_all(&[
      (self.paths.history_json.as_path(), json.as_bytes()),
      (self.paths.four_day_json.as_path(), four_day.json.as_bytes()),
      (self.paths.four_day_csv.as_path(), four_day.table.as_slice()),
    ])?;
    info!(total = doc.puzzles.len(), window = four_day.len, "updated history and four-day views");
    Ok(doc.puzzles)
  }

  // ── Four-day window ─────────────────────────────────────────────────────

  /// Rebuild the four-day views from the history view on disk.
  pub fn regenerate_four_day(&self) -> Result<usize> {
    let path = &self.paths.history_json;
    if !path.exists() {
      warn!(path = %path.display(), "history view missing, four-day views not updated");
      return Ok(0);
    }
    let history = ViewDocument::from_json(&std::fs::read_to_string(path)?)?;
    self.write_four_day(&history.puzzles)
  }

  /// Write the JSON and CSV four-day views from the same leading slice of
  /// `history`, which must already be newest-first.
  pub fn write_four_day(&self, history: &[PuzzleEntry]) -> Result<usize> {
    let four_day = self.render_four_day(history)?;
    write::replace_all(&[
      (self.paths.four_day_json.as_path(), four_day.json.as_bytes()),
      (self.paths.four_day_csv.as_path(), four_day.table.as_slice()),
    ])?;
    info!(total = four_day.len, "updated four-day views");
    Ok(four_day.len)
  }

  fn render_four_day(&self, history: &[PuzzleEntry]) -> Result<FourDay> {
    let window = &history[..history.len().min(FOUR_DAY_WINDOW)];
    let doc = ViewDocument::new(window.to_vec(), self.today());
    let json = doc.to_pretty_json()?;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(VIEW_COLUMNS)?;
    for entry in window {
      writer.serialize(entry)?;
    }
    let table = writer
      .into_inner()
      .map_err(|e| std::io::Error::other(e.to_string()))?;

    Ok(FourDay { json, table, len: window.len() })
  }

  /// Rebuild everything: history and the four-day window from it, then
  /// latest from the daily store.
  pub fn regenerate_all(&self) -> Result<()> {
    self.regenerate_history()?;
    self.refresh_latest_from_daily()?;
    Ok(())
  }
}

// ─── Post-write hook ─────────────────────────────────────────────────────────

impl StoreObserver for ViewGenerator {
  fn on_insert(
    &self,
    kind: StoreKind,
    record: &PuzzleRecord,
  ) -> Result<(), ObserverError> {
    if kind == StoreKind::Daily {
      self.regenerate_latest(record)?;
    }
    self.regenerate_history()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use difficulty_core::{Score, puzzle_number_for};
  use tempfile::TempDir;

  use super::*;

  const HEADER: &str =
    "date,puzzle_date,day,month,puzzle_number,difficulty_score,max_score\n";

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn record(day: NaiveDate, value: f64) -> PuzzleRecord {
    PuzzleRecord::observed(day, puzzle_number_for(day), Score { value, scale: 5 })
  }

  fn setup(history: &str, daily: Option<&str>) -> (TempDir, ViewGenerator) {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    fs::write(&paths.history_csv, history).unwrap();
    if let Some(daily) = daily {
      fs::write(&paths.daily_csv, daily).unwrap();
    }
    let views = ViewGenerator::new(paths).with_today(ymd(2025, 3, 11));
    (dir, views)
  }

  fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
  }

  fn history_of(days: &[u32]) -> String {
    let mut body = HEADER.to_owned();
    for d in days {
      let day = ymd(2025, 3, *d);
      body.push_str(&format!("{day},,,,{},2.0,5\n", puzzle_number_for(day)));
    }
    body
  }

  #[test]
  fn history_is_newest_first_with_display_dates() {
    let (_dir, views) = setup(&history_of(&[8, 9, 10]), None);
    views.regenerate_history().unwrap();

    let json = read_json(&views.paths().history_json);
    assert_eq!(json["puzzles"][0]["date"], "3/10/2025");
    assert_eq!(json["puzzles"][0]["puzzle_date"], "3/11/2025");
    assert_eq!(json["puzzles"][0]["day"], "Tuesday");
    assert_eq!(json["puzzles"][2]["date"], "3/8/2025");
    assert_eq!(json["metadata"]["total_puzzles"], 3);
    assert_eq!(json["metadata"]["last_updated"], "2025-03-11");
  }

  #[test]
  fn history_sorts_mixed_formats_and_drops_bad_rows() {
    let body = format!(
      "{HEADER}3/10/2025,,,,639,2.0,5\nwhenever,,,,1,1.0,5\n2025-03-09,,,,638,3.0,5\n03/11/2025,,,,640,x,5\n"
    );
    let (_dir, views) = setup(&body, None);
    let entries = views.regenerate_history().unwrap();
    let dates: Vec<_> = entries.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, vec!["3/10/2025", "3/9/2025"]);
  }

  #[test]
  fn history_ties_keep_store_order() {
    let body = format!("{HEADER}2025-03-09,,,,638,1.0,5\n3/9/2025,,,,9999,2.0,5\n");
    let (_dir, views) = setup(&body, None);
    let entries = views.regenerate_history().unwrap();
    assert_eq!(entries[0].puzzle_number, 638);
    assert_eq!(entries[1].puzzle_number, 9999);
  }

  #[test]
  fn history_regeneration_is_byte_identical() {
    let (_dir, views) = setup(&history_of(&[1, 5, 3]), None);
    views.regenerate_history().unwrap();
    let first = fs::read(&views.paths().history_json).unwrap();
    views.regenerate_history().unwrap();
    assert_eq!(fs::read(&views.paths().history_json).unwrap(), first);
  }

  #[test]
  fn four_day_is_prefix_of_history() {
    for days in [&[1u32, 2, 3, 4, 5, 6][..], &[7, 8][..], &[][..]] {
      let (_dir, views) = setup(&history_of(days), None);
      views.regenerate_history().unwrap();
      let written = views.regenerate_four_day().unwrap();
      assert_eq!(written, days.len().min(4));

      let history = read_json(&views.paths().history_json);
      let four = read_json(&views.paths().four_day_json);
      let history = history["puzzles"].as_array().unwrap();
      let four = four["puzzles"].as_array().unwrap();
      assert_eq!(four.as_slice(), &history[..written]);
    }
  }

  #[test]
  fn history_and_four_day_are_replaced_together() {
    let (dir, views) = setup(&history_of(&[8]), None);
    views.regenerate_history().unwrap();
    let history_before = fs::read(&views.paths().history_json).unwrap();
    let four_day_before = fs::read(&views.paths().four_day_json).unwrap();

    fs::write(&views.paths().history_csv, history_of(&[8, 9])).unwrap();
    let not_a_dir = dir.path().join("not_a_dir");
    fs::write(&not_a_dir, "").unwrap();
    let mut paths = views.paths().clone();
    paths.four_day_csv = not_a_dir.join("four_day.csv");
    let views = ViewGenerator::new(paths).with_today(ymd(2025, 3, 11));

    assert!(
      views
        .on_insert(StoreKind::History, &record(ymd(2025, 3, 9), 2.0))
        .is_err()
    );
    assert_eq!(fs::read(&views.paths().history_json).unwrap(), history_before);
    assert_eq!(fs::read(&views.paths().four_day_json).unwrap(), four_day_before);
  }

  #[test]
  fn four_day_csv_matches_json() {
    let (_dir, views) = setup(&history_of(&[1, 2, 3, 4, 5]), None);
    views.regenerate_history().unwrap();

    let table = fs::read_to_string(&views.paths().four_day_csv).unwrap();
    let mut lines = table.lines();
    assert_eq!(lines.next(), Some(HEADER.trim_end()));
    assert_eq!(lines.next(), Some("3/5/2025,3/6/2025,Thursday,3,634,2.0,5"));

    let mut reader = csv::Reader::from_reader(table.as_bytes());
    let from_csv: Vec<PuzzleEntry> = reader
      .deserialize::<PuzzleEntry>()
      .collect::<std::result::Result<_, _>>()
      .unwrap();
    let doc = ViewDocument::from_json(
      &fs::read_to_string(&views.paths().four_day_json).unwrap(),
    )
    .unwrap();
    assert_eq!(from_csv, doc.puzzles);
    assert_eq!(doc.metadata.total_puzzles, 4);
  }

  #[test]
  fn empty_history_still_writes_csv_header() {
    let (_dir, views) = setup(HEADER, None);
    assert!(views.regenerate_history().unwrap().is_empty());
    assert_eq!(fs::read_to_string(&views.paths().four_day_csv).unwrap(), HEADER);
  }

  #[test]
  fn four_day_without_history_view_is_skipped() {
    let (_dir, views) = setup(HEADER, None);
    assert_eq!(views.regenerate_four_day().unwrap(), 0);
    assert!(!views.paths().four_day_json.exists());
  }

  #[test]
  fn latest_from_daily_picks_max_date() {
    let daily = format!("{HEADER}2025-03-10,,,,639,2.0,5\n3/9/2025,,,,638,3.0,5\n");
    let (_dir, views) = setup(HEADER, Some(&daily));
    let latest = views.refresh_latest_from_daily().unwrap().unwrap();
    assert_eq!(latest.observation_date, ymd(2025, 3, 10));

    let json = read_json(&views.paths().latest_json);
    assert_eq!(json["puzzles"].as_array().unwrap().len(), 1);
    assert_eq!(json["puzzles"][0]["date"], "3/10/2025");
    assert_eq!(json["metadata"]["total_puzzles"], 1);
  }

  #[test]
  fn latest_left_alone_when_daily_empty() {
    let (_dir, views) = setup(HEADER, None);
    assert!(views.refresh_latest_from_daily().unwrap().is_none());
    assert!(!views.paths().latest_json.exists());
  }

  #[test]
  fn daily_insert_hook_refreshes_every_view() {
    let (_dir, views) = setup(&history_of(&[8]), None);
    let r = record(ymd(2025, 3, 9), 3.0);
    views.on_insert(StoreKind::Daily, &r).unwrap();

    let latest = read_json(&views.paths().latest_json);
    assert_eq!(latest["puzzles"][0]["puzzle_number"], 638);
    assert!(views.paths().history_json.exists());
    assert!(views.paths().four_day_csv.exists());
  }

  #[test]
  fn history_insert_hook_skips_latest() {
    let (_dir, views) = setup(&history_of(&[8]), None);
    views
      .on_insert(StoreKind::History, &record(ymd(2025, 3, 8), 2.0))
      .unwrap();
    assert!(!views.paths().latest_json.exists());
    assert!(views.paths().four_day_json.exists());
  }
}
