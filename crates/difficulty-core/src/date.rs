//! Date normalization.
//!
//! Store files accumulated over time carry dates in several textual formats.
//! Parsing is a prioritized list of strategies; the first one that succeeds
//! wins, and a string none of them accept is a [`DateParseError`].

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::DateParseError;

// ─── Strategies ──────────────────────────────────────────────────────────────

/// A textual date layout accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
  /// `2025-03-09`
  Iso,
  /// `03/09/2025`
  UsSlash,
  /// `3/9/2025`
  UsSlashUnpadded,
  /// Last resort: split on `/` and read month, day, year as integers.
  ManualSlash,
}

impl DateFormat {
  /// Strategies in the order they are tried.
  pub const PRIORITY: [DateFormat; 4] = [
    DateFormat::Iso,
    DateFormat::UsSlash,
    DateFormat::UsSlashUnpadded,
    DateFormat::ManualSlash,
  ];

  fn pattern(self) -> Option<&'static str> {
    match self {
      Self::Iso => Some("%Y-%m-%d"),
      Self::UsSlash => Some("%m/%d/%Y"),
      Self::UsSlashUnpadded => Some("%-m/%-d/%Y"),
      Self::ManualSlash => None,
    }
  }

  /// Try this single strategy.
  pub fn parse(self, input: &str) -> Option<NaiveDate> {
    match self.pattern() {
      Some(fmt) => NaiveDate::parse_from_str(input, fmt).ok(),
      None => parse_manual_slash(input),
    }
  }
}

fn parse_manual_slash(input: &str) -> Option<NaiveDate> {
  let parts: Vec<&str> = input.split('/').collect();
  let [month, day, year] = parts.as_slice() else {
    return None;
  };
  let month: u32 = month.trim().parse().ok()?;
  let day: u32 = day.trim().parse().ok()?;
  let year: i32 = year.trim().parse().ok()?;
  NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse `input` and report which strategy accepted it.
pub fn parse_date_with_format(
  input: &str,
) -> Result<(NaiveDate, DateFormat), DateParseError> {
  let trimmed = input.trim();
  DateFormat::PRIORITY
    .iter()
    .find_map(|fmt| fmt.parse(trimmed).map(|d| (d, *fmt)))
    .ok_or_else(|| DateParseError { input: input.to_owned() })
}

/// Parse `input` using the first strategy that accepts it.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
  parse_date_with_format(input).map(|(d, _)| d)
}

// ─── Derived fields ──────────────────────────────────────────────────────────

/// The fields that follow from an observation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedDates {
  pub puzzle_date: NaiveDate,
  pub weekday:     Weekday,
  pub month:       u32,
}

impl DerivedDates {
  /// Weekday and month taken from an already-known puzzle date.
  pub fn from_puzzle_date(puzzle_date: NaiveDate) -> Self {
    Self {
      puzzle_date,
      weekday: puzzle_date.weekday(),
      month: puzzle_date.month(),
    }
  }
}

/// The puzzle is played the day after its companion page is published.
pub fn puzzle_date_for(observation: NaiveDate) -> NaiveDate {
  observation
    .checked_add_days(Days::new(1))
    .unwrap_or(NaiveDate::MAX)
}

pub fn derive(observation: NaiveDate) -> DerivedDates {
  DerivedDates::from_puzzle_date(puzzle_date_for(observation))
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// `M/D/YYYY` with no leading zeros, as shown in every view.
pub fn display_date(date: NaiveDate) -> String {
  format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// `YYYY-MM-DD`, used for new store rows.
pub fn iso_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn weekday_name(weekday: Weekday) -> &'static str {
  match weekday {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}
