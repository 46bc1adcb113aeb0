//! Derived views over the puzzle stores.
//!
//! Three projections are materialized: the latest daily record, the full
//! history newest-first, and the four most recent history entries. Each is
//! recomputed in full and written atomically; none is ever read back as a
//! source of truth except the history view feeding the four-day view.

pub mod error;
pub mod generator;
pub mod paths;
mod write;

pub use error::{Error, Result};
pub use generator::ViewGenerator;
pub use paths::DataPaths;
