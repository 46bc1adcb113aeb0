//! Conversions between store rows and domain records.
//!
//! Rows are read as plain strings so that hand-edited or legacy rows survive
//! a load even when individual cells are malformed; interpretation happens
//! afterwards in [`RawRow::into_record`].

use difficulty_core::{
  Error as CoreError, PuzzleRecord, Score,
  date::{self, DerivedDates},
};
use serde::Deserialize;

// ─── Read side ───────────────────────────────────────────────────────────────

/// Cells of one row, matched by header name. Columns absent from a legacy
/// header deserialize as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
  pub date:             String,
  pub puzzle_date:      Option<String>,
  pub day:              Option<String>,
  pub month:            Option<String>,
  pub puzzle_number:    String,
  pub difficulty_score: String,
  pub max_score:        String,
}

fn parse_field<T: std::str::FromStr>(
  field: &'static str,
  value: &str,
) -> Result<T, CoreError> {
  value.trim().parse().map_err(|_| CoreError::InvalidField {
    field,
    value: value.to_owned(),
  })
}

impl RawRow {
  /// Normalize into a record. Derived date columns are recomputed from the
  /// observation date; whatever the row says about them is ignored.
  pub fn into_record(&self) -> Result<PuzzleRecord, CoreError> {
    let observation = date::parse_date(&self.date)?;
    Ok(PuzzleRecord::with_derived(
      observation,
      date::derive(observation),
      parse_field("puzzle_number", &self.puzzle_number)?,
      self.score()?,
    ))
  }

  fn score(&self) -> Result<Score, CoreError> {
    Ok(Score {
      value: parse_field("difficulty_score", &self.difficulty_score)?,
      scale: parse_field("max_score", &self.max_score)?,
    })
  }

  /// Whether this row names the same puzzle as `record`: same observation
  /// date under any accepted format, or the exact same puzzle number.
  pub fn matches(&self, record: &PuzzleRecord) -> bool {
    let date_match = match date::parse_date(&self.date) {
      Ok(d) => d == record.observation_date,
      Err(_) => self.date.trim() == date::iso_date(record.observation_date),
    };
    date_match || self.puzzle_number.trim() == record.puzzle_number.to_string()
  }

  /// Fill in the derived date columns, keeping every other cell verbatim.
  /// An existing `puzzle_date` wins when it parses.
  pub fn migrated(&self) -> Result<StoredRow, CoreError> {
    let observation = date::parse_date(&self.date)?;
    let derived = self
      .puzzle_date
      .as_deref()
      .and_then(|s| date::parse_date(s).ok())
      .map(DerivedDates::from_puzzle_date)
      .unwrap_or_else(|| date::derive(observation));

    Ok(StoredRow {
      date:             self.date.clone(),
      puzzle_date:      date::iso_date(derived.puzzle_date),
      day:              date::weekday_name(derived.weekday).to_owned(),
      month:            derived.month.to_string(),
      puzzle_number:    self.puzzle_number.clone(),
      difficulty_score: self.difficulty_score.clone(),
      max_score:        self.max_score.clone(),
    })
  }
}

// ─── Write side ──────────────────────────────────────────────────────────────

/// Cells of one row to be written. Cells are looked up by column name so
/// the row can follow whatever header order the file already has.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
  pub date:             String,
  pub puzzle_date:      String,
  pub day:              String,
  pub month:            String,
  pub puzzle_number:    String,
  pub difficulty_score: String,
  pub max_score:        String,
}

impl From<&PuzzleRecord> for StoredRow {
  fn from(r: &PuzzleRecord) -> Self {
    Self {
      date:             date::iso_date(r.observation_date),
      puzzle_date:      date::iso_date(r.puzzle_date),
      day:              r.weekday_name().to_owned(),
      month:            r.month.to_string(),
      puzzle_number:    r.puzzle_number.to_string(),
      difficulty_score: format_score(r.difficulty_score),
      max_score:        r.max_score.to_string(),
    }
  }
}

impl StoredRow {
  /// The cell for `column`, empty for a column this store doesn't know.
  pub fn cell(&self, column: &str) -> &str {
    match column.trim() {
      "date" => &self.date,
      "puzzle_date" => &self.puzzle_date,
      "day" => &self.day,
      "month" => &self.month,
      "puzzle_number" => &self.puzzle_number,
      "difficulty_score" => &self.difficulty_score,
      "max_score" => &self.max_score,
      _ => "",
    }
  }
}

/// Whole scores keep one decimal place (`3.0`, not `3`).
pub fn format_score(value: f64) -> String {
  let s = value.to_string();
  if !value.is_finite() || s.contains(['.', 'e', 'E']) {
    s
  } else {
    format!("{s}.0")
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn legacy(date: &str, number: &str) -> RawRow {
    RawRow {
      date: date.into(),
      puzzle_number: number.into(),
      difficulty_score: "3.0".into(),
      max_score: "5".into(),
      ..RawRow::default()
    }
  }

  #[test]
  fn into_record_ignores_stale_derived_columns() {
    let mut row = legacy("3/9/2025", "638");
    row.puzzle_date = Some("2025-01-01".into());
    row.day = Some("Friday".into());
    let record = row.into_record().unwrap();
    assert_eq!(record.puzzle_date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    assert_eq!(record.weekday_name(), "Monday");
  }

  #[test]
  fn migration_prefers_existing_puzzle_date() {
    let mut row = legacy("2025-03-09", "638");
    row.puzzle_date = Some("3/11/2025".into());
    let migrated = row.migrated().unwrap();
    assert_eq!(migrated.puzzle_date, "2025-03-11");
    assert_eq!(migrated.day, "Tuesday");
  }

  #[test]
  fn migration_falls_back_when_puzzle_date_unparseable() {
    let mut row = legacy("2025-03-09", "638");
    row.puzzle_date = Some("soon".into());
    let migrated = row.migrated().unwrap();
    assert_eq!(migrated.puzzle_date, "2025-03-10");
    assert_eq!(migrated.day, "Monday");
    assert_eq!(migrated.month, "3");
  }

  #[test]
  fn bad_numbers_are_typed_errors() {
    let row = legacy("2025-03-09", "six hundred");
    assert!(matches!(
      row.into_record(),
      Err(CoreError::InvalidField { field: "puzzle_number", .. })
    ));
  }

  #[test]
  fn matches_on_date_or_number() {
    let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    let record = PuzzleRecord::observed(day, 638, Score { value: 1.0, scale: 5 });
    assert!(legacy("03/09/2025", "1").matches(&record));
    assert!(legacy("2025-01-01", "638").matches(&record));
    assert!(!legacy("2025-03-08", "637").matches(&record));
    assert!(legacy(" 2025-03-09 ", "x").matches(&record));
  }

  #[test]
  fn cells_are_looked_up_by_column_name() {
    let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    let row = StoredRow::from(&PuzzleRecord::observed(day, 638, Score { value: 3.0, scale: 5 }));
    let order = ["max_score", " puzzle_number", "date", "notes"];
    let cells: Vec<&str> = order.iter().map(|c| row.cell(c)).collect();
    assert_eq!(cells, ["5", "638", "2025-03-09", ""]);
  }

  #[test]
  fn scores_keep_a_decimal() {
    assert_eq!(format_score(3.0), "3.0");
    assert_eq!(format_score(2.25), "2.25");
  }
}
