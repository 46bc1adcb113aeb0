//! Column layout of the store files.
//!
//! Current files carry all seven columns. Files written before the derived
//! date columns existed carry only `date, puzzle_number, difficulty_score,
//! max_score` and are upgraded by migration. Columns are always matched by
//! header name, never by position.

use csv::{ByteRecord, StringRecord};

/// Header written for every new or migrated file.
pub const COLUMNS: [&str; 7] = [
  "date",
  "puzzle_date",
  "day",
  "month",
  "puzzle_number",
  "difficulty_score",
  "max_score",
];

/// Columns a legacy file may be missing.
pub const DERIVED_COLUMNS: [&str; 3] = ["puzzle_date", "day", "month"];

/// What is on disk at a store path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// No file yet.
  Missing,
  /// A file with no header line.
  Empty,
  /// Header has every derived column.
  Current,
  /// Header lacks at least one derived column.
  Legacy,
}

impl Layout {
  pub fn of(headers: &StringRecord) -> Self {
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
      return Self::Empty;
    }
    let has = |name: &str| headers.iter().any(|h| h.trim() == name);
    if DERIVED_COLUMNS.iter().all(|c| has(c)) {
      Self::Current
    } else {
      Self::Legacy
    }
  }
}

/// Cells of `raw`, read under `headers`, rearranged into [`COLUMNS`] order.
/// Bytes are copied as they are, valid UTF-8 or not. Columns the header
/// lacks come out empty.
pub fn realign(headers: &StringRecord, raw: &ByteRecord) -> ByteRecord {
  COLUMNS
    .iter()
    .map(|column| {
      headers
        .iter()
        .position(|h| h.trim() == *column)
        .and_then(|i| raw.get(i))
        .unwrap_or_default()
    })
    .collect()
}
