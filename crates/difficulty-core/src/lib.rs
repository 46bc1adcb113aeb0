//! Core types and trait definitions for the puzzle difficulty tracker.
//!
//! This crate is deliberately free of filesystem and network dependencies.
//! Storage, view and collector crates depend on it.

pub mod date;
pub mod error;
pub mod record;
pub mod store;
pub mod view;

pub use error::{DateParseError, Error, Result};
pub use record::{PuzzleRecord, Score, puzzle_number_for};
