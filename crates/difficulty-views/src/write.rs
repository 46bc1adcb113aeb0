//! All-or-nothing file replacement.
//!
//! Content is fully rendered before anything touches the destination, then
//! written to a temporary file beside it and renamed into place.

use std::{
  fs,
  io::Write as _,
  path::Path,
};

use tempfile::NamedTempFile;

use crate::Result;

fn staged(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
  let dir = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  fs::create_dir_all(dir)?;
  let mut tmp = NamedTempFile::new_in(dir)?;
  tmp.write_all(bytes)?;
  tmp.as_file().sync_all()?;
  Ok(tmp)
}

pub fn replace(path: &Path, bytes: &[u8]) -> Result<()> {
  staged(path, bytes)?.persist(path)?;
  Ok(())
}

/// Stage every file first so a failure while writing leaves all of the
/// destinations as they were.
pub fn replace_all(files: &[(&Path, &[u8])]) -> Result<()> {
  let staged = files
    .iter()
    .map(|(path, bytes)| staged(path, bytes).map(|tmp| (tmp, *path)))
    .collect::<Result<Vec<_>>>()?;
  for (tmp, path) in staged {
    tmp.persist(path)?;
  }
  Ok(())
}
