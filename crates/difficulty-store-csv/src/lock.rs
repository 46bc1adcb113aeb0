//! Advisory lock on the data directory.
//!
//! Runs are single-process and sequential, but nothing stops an operator or
//! a scheduler from starting two at once. Whoever takes the lock first owns
//! the stores and views until it is dropped.

use std::{
  fs::{self, File, OpenOptions},
  path::{Path, PathBuf},
};

use fs2::FileExt;

use crate::{Error, Result};

pub const LOCK_FILE: &str = ".lock";

/// Held for the duration of a run; released on drop.
#[derive(Debug)]
pub struct DataDirLock {
  file: File,
  path: PathBuf,
}

impl DataDirLock {
  /// Create `dir` if needed and take an exclusive lock on it without
  /// blocking. Fails with [`Error::Locked`] if another process holds it.
  pub fn acquire(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(LOCK_FILE);
    let file = OpenOptions::new()
      .create(true)
      .truncate(false)
      .write(true)
      .open(&path)?;

    file
      .try_lock_exclusive()
      .map_err(|_| Error::Locked(path.clone()))?;

    Ok(Self { file, path })
  }

  pub fn path(&self) -> &Path { &self.path }
}

impl Drop for DataDirLock {
  fn drop(&mut self) {
    let _ = FileExt::unlock(&self.file);
  }
}
