//! View documents: the read projections written for consumers.
//!
//! A view is never a source of truth. It is always recomputed in full from a
//! store and written over the previous file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  date::{display_date, iso_date},
  record::PuzzleRecord,
};

/// The `metadata.source` label carried by every view.
pub const SOURCE_LABEL: &str = "Connections Game Difficulty Data";

/// Column order for tabular views.
pub const VIEW_COLUMNS: [&str; 7] = [
  "date",
  "puzzle_date",
  "day",
  "month",
  "puzzle_number",
  "difficulty_score",
  "max_score",
];

/// One puzzle as rendered in a view. Dates use `M/D/YYYY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleEntry {
  pub date:             String,
  pub puzzle_date:      String,
  pub day:              String,
  pub month:            u32,
  pub puzzle_number:    i64,
  pub difficulty_score: f64,
  pub max_score:        u32,
}

impl From<&PuzzleRecord> for PuzzleEntry {
  fn from(r: &PuzzleRecord) -> Self {
    Self {
      date:             display_date(r.observation_date),
      puzzle_date:      display_date(r.puzzle_date),
      day:              r.weekday_name().to_owned(),
      month:            r.month,
      puzzle_number:    r.puzzle_number,
      difficulty_score: r.difficulty_score,
      max_score:        r.max_score,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewMetadata {
  /// ISO date the view was generated.
  pub last_updated:  String,
  pub total_puzzles: usize,
  pub source:        String,
}

/// `{ puzzles: [...], metadata: {...} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDocument {
  pub puzzles:  Vec<PuzzleEntry>,
  pub metadata: ViewMetadata,
}

impl ViewDocument {
  pub fn new(puzzles: Vec<PuzzleEntry>, generated_on: NaiveDate) -> Self {
    let metadata = ViewMetadata {
      last_updated:  iso_date(generated_on),
      total_puzzles: puzzles.len(),
      source:        SOURCE_LABEL.to_owned(),
    };
    Self { puzzles, metadata }
  }

  /// Two-space indented JSON with a trailing newline.
  pub fn to_pretty_json(&self) -> Result<String> {
    let mut out = serde_json::to_string_pretty(self)?;
    out.push('\n');
    Ok(out)
  }

  pub fn from_json(s: &str) -> Result<Self> { Ok(serde_json::from_str(s)?) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{puzzle_number_for, record::Score};

  #[test]
  fn entry_renders_display_dates() {
    let day = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
    let record = PuzzleRecord::observed(
      day,
      puzzle_number_for(day),
      Score { value: 2.5, scale: 5 },
    );
    let entry = PuzzleEntry::from(&record);
    assert_eq!(entry.date, "8/31/2025");
    assert_eq!(entry.puzzle_date, "9/1/2025");
    assert_eq!(entry.day, "Monday");
    assert_eq!(entry.month, 9);
  }

  #[test]
  fn document_json_shape() {
    let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    let record =
      PuzzleRecord::observed(day, 638, Score { value: 3.0, scale: 5 });
    let doc = ViewDocument::new(vec![PuzzleEntry::from(&record)], day);
    let json: serde_json::Value =
      serde_json::from_str(&doc.to_pretty_json().unwrap()).unwrap();

    assert_eq!(json["puzzles"][0]["date"], "3/9/2025");
    assert_eq!(json["puzzles"][0]["day"], "Monday");
    assert_eq!(json["puzzles"][0]["difficulty_score"], 3.0);
    assert_eq!(json["metadata"]["last_updated"], "2025-03-09");
    assert_eq!(json["metadata"]["total_puzzles"], 1);
    assert_eq!(json["metadata"]["source"], SOURCE_LABEL);
  }
}
