//! CSV backend for the puzzle difficulty stores.
//!
//! Each store is a single flat file. Appends never touch existing rows; the
//! only rewrite is schema migration, which goes through a temporary file and
//! an atomic rename.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod lock;

pub use error::{Error, Result, SchemaMigrationRowError};
pub use lock::DataDirLock;
pub use store::CsvStore;
