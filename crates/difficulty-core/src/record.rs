//! The puzzle record, the unit both stores hold.
//!
//! A record is identified by its observation date. Everything else about the
//! date (puzzle date, weekday, month) is derived, and the puzzle number is in
//! strict one-to-one correspondence with the observation date.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::date::{self, DerivedDates};

// ─── Puzzle numbering ────────────────────────────────────────────────────────

/// Observation date whose companion page rates puzzle [`REFERENCE_NUMBER`].
pub const REFERENCE_DATE: (i32, u32, u32) = (2025, 3, 9);
pub const REFERENCE_NUMBER: i64 = 638;

fn reference_date() -> NaiveDate {
  let (y, m, d) = REFERENCE_DATE;
  NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Puzzle number for an observation date; increases by exactly one per day.
pub fn puzzle_number_for(observation: NaiveDate) -> i64 {
  REFERENCE_NUMBER + (observation - reference_date()).num_days()
}

// ─── Score ───────────────────────────────────────────────────────────────────

/// A difficulty rating as published: `value` out of `scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
  pub value: f64,
  pub scale: u32,
}

// ─── PuzzleRecord ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleRecord {
  /// Date the companion page was published; the identity key.
  pub observation_date: NaiveDate,
  /// Always `observation_date + 1`, except for migrated legacy rows that
  /// carried their own parseable value.
  pub puzzle_date:      NaiveDate,
  pub weekday:          Weekday,
  pub month:            u32,
  pub puzzle_number:    i64,
  pub difficulty_score: f64,
  pub max_score:        u32,
}

impl PuzzleRecord {
  /// Build a record for a fresh observation. The caller supplies the puzzle
  /// number (normally [`puzzle_number_for`]); it is trusted as given.
  pub fn observed(
    observation_date: NaiveDate,
    puzzle_number: i64,
    score: Score,
  ) -> Self {
    Self::with_derived(
      observation_date,
      date::derive(observation_date),
      puzzle_number,
      score,
    )
  }

  /// Build a record whose date-derived fields are already known.
  pub fn with_derived(
    observation_date: NaiveDate,
    derived: DerivedDates,
    puzzle_number: i64,
    score: Score,
  ) -> Self {
    Self {
      observation_date,
      puzzle_date: derived.puzzle_date,
      weekday: derived.weekday,
      month: derived.month,
      puzzle_number,
      difficulty_score: score.value,
      max_score: score.scale,
    }
  }

  pub fn weekday_name(&self) -> &'static str { date::weekday_name(self.weekday) }
}
