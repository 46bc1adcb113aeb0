//! CSV implementation of [`RecordStore`].

use std::{
  collections::BTreeSet,
  fs::{self, OpenOptions},
  io::{Read as _, Seek as _, SeekFrom, Write as _},
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use difficulty_core::{
  PuzzleRecord, date,
  store::{Outcome, RecordStore, StoreKind, StoreObserver},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
  Error, Result, SchemaMigrationRowError,
  encode::{RawRow, StoredRow},
  schema::{COLUMNS, Layout, realign},
};

/// Rows as read from disk, alongside the header they were read under.
struct Contents {
  headers: StringRecord,
  layout:  Layout,
  rows:    Vec<Row>,
}

/// One data row. The raw bytes are kept so that a rewrite can carry rows
/// that don't decode through unchanged.
struct Row {
  line:   u64,
  raw:    ByteRecord,
  parsed: Option<RawRow>,
}

impl Contents {
  fn parsed(&self) -> impl Iterator<Item = (u64, &RawRow)> {
    self.rows.iter().filter_map(|row| Some((row.line, row.parsed.as_ref()?)))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A puzzle record store backed by one CSV file.
///
/// A missing file reads as an empty store and is created on first append.
pub struct CsvStore {
  path:      PathBuf,
  kind:      StoreKind,
  observers: Vec<Arc<dyn StoreObserver>>,
}

impl CsvStore {
  pub fn new(path: impl Into<PathBuf>, kind: StoreKind) -> Self {
    Self { path: path.into(), kind, observers: Vec::new() }
  }

  /// Register a hook to run after every successful insert.
  pub fn with_observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
    self.observers.push(observer);
    self
  }

  pub fn path(&self) -> &Path { &self.path }

  fn read(&self) -> Result<Contents> {
    if !self.path.exists() {
      return Ok(Contents {
        headers: StringRecord::new(),
        layout:  Layout::Missing,
        rows:    Vec::new(),
      });
    }

    let mut reader = ReaderBuilder::new()
      .flexible(true)
      .trim(Trim::All)
      .from_path(&self.path)?;
    let headers = reader.headers()?.clone();
    let layout = Layout::of(&headers);

    let mut rows = Vec::new();
    for result in reader.byte_records() {
      let raw = result?;
      let line = raw.position().map_or(0, |p| p.line());
      let parsed = match StringRecord::from_byte_record(raw.clone()) {
        Ok(record) => match record.deserialize::<RawRow>(Some(&headers)) {
          Ok(row) => Some(row),
          Err(e) => {
            warn!(path = %self.path.display(), line, "skipping malformed row: {e}");
            None
          }
        },
        Err(e) => {
          warn!(path = %self.path.display(), line, "skipping row that is not UTF-8: {e}");
          None
        }
      };
      rows.push(Row { line, raw, parsed });
    }

    Ok(Contents { headers, layout, rows })
  }

  /// Append one row with its cells in the order of `headers`. Without
  /// headers the file is new and gets the [`COLUMNS`] header first.
  fn write_row(&self, row: &StoredRow, headers: Option<&StringRecord>) -> Result<()> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
      .read(true)
      .append(true)
      .create(true)
      .open(&self.path)?;

    // Hand-edited files may lack a final newline.
    let len = file.metadata()?.len();
    if len > 0 && headers.is_some() {
      let mut last = [0u8; 1];
      file.seek(SeekFrom::End(-1))?;
      file.read_exact(&mut last)?;
      if last[0] != b'\n' {
        file.write_all(b"\n")?;
      }
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    match headers {
      Some(headers) => writer.write_record(headers.iter().map(|c| row.cell(c)))?,
      None => {
        writer.write_record(COLUMNS)?;
        writer.write_record(COLUMNS.map(|c| row.cell(c)))?;
      }
    }
    writer.flush()?;
    Ok(())
  }

  /// Rewrite the whole file through a temporary sibling and an atomic
  /// rename. The original is untouched if anything fails before the rename.
  fn rewrite(&self, rows: &[ByteRecord]) -> Result<()> {
    let dir = match self.path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p,
      _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
      let mut writer =
        WriterBuilder::new().has_headers(false).from_writer(tmp.as_file_mut());
      writer.write_record(COLUMNS)?;
      for row in rows {
        writer.write_byte_record(row)?;
      }
      writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&self.path)?;
    Ok(())
  }

  fn notify(&self, record: &PuzzleRecord) -> Result<()> {
    for observer in &self.observers {
      observer
        .on_insert(self.kind, record)
        .map_err(Error::Observer)?;
    }
    Ok(())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for CsvStore {
  type Error = Error;

  fn kind(&self) -> StoreKind { self.kind }

  fn append(&self, record: &PuzzleRecord) -> Result<Outcome> {
    let contents = self.read()?;

    if let Some((_, existing)) = contents.parsed().find(|(_, row)| row.matches(record)) {
      info!(
        store = self.kind.as_str(),
        date = %record.observation_date,
        puzzle_number = record.puzzle_number,
        existing_date = %existing.date,
        "entry already exists, skipping"
      );
      return Ok(Outcome::Duplicate);
    }

    let headers = match contents.layout {
      Layout::Missing | Layout::Empty => None,
      Layout::Current => Some(contents.headers),
      Layout::Legacy => {
        self.migrate()?;
        Some(StringRecord::from(COLUMNS.to_vec()))
      }
    };

    self.write_row(&StoredRow::from(record), headers.as_ref())?;
    info!(
      store = self.kind.as_str(),
      date = %record.observation_date,
      puzzle_number = record.puzzle_number,
      puzzle_date = %record.puzzle_date,
      "saved score {}/{}",
      record.difficulty_score,
      record.max_score,
    );

    self.notify(record)?;
    Ok(Outcome::Inserted)
  }

  fn migrate(&self) -> Result<usize> {
    let contents = self.read()?;
    match contents.layout {
      Layout::Missing => {
        info!(path = %self.path.display(), "no file, nothing to migrate");
        return Ok(0);
      }
      Layout::Empty | Layout::Current => {
        debug!(path = %self.path.display(), "already has all required columns");
        return Ok(0);
      }
      Layout::Legacy => {}
    }

    info!(path = %self.path.display(), "migrating to include puzzle_date, day and month");

    let mut migrated = 0;
    let rows: Vec<ByteRecord> = contents
      .rows
      .iter()
      .map(|row| match row.parsed.as_ref().map(RawRow::migrated) {
        Some(Ok(stored)) => {
          migrated += 1;
          COLUMNS.iter().map(|c| stored.cell(c)).collect()
        }
        Some(Err(source)) => {
          let err = SchemaMigrationRowError { line: row.line, source };
          warn!(path = %self.path.display(), "keeping row unmigrated: {err}");
          realign(&contents.headers, &row.raw)
        }
        None => {
          warn!(path = %self.path.display(), line = row.line, "keeping undecodable row as is");
          realign(&contents.headers, &row.raw)
        }
      })
      .collect();

    self.rewrite(&rows)?;
    info!(path = %self.path.display(), migrated, total = rows.len(), "migration complete");
    Ok(migrated)
  }

  fn load(&self) -> Result<Vec<PuzzleRecord>> {
    let contents = self.read()?;
    let records = contents
      .parsed()
      .filter_map(|(line, raw)| match raw.into_record() {
        Ok(record) => Some(record),
        Err(e) => {
          warn!(path = %self.path.display(), line, "skipping row: {e}");
          None
        }
      })
      .collect();
    Ok(records)
  }

  fn load_processed_keys(&self) -> Result<BTreeSet<NaiveDate>> {
    let contents = self.read()?;
    let keys = contents
      .parsed()
      .filter_map(|(line, raw)| match date::parse_date(&raw.date) {
        Ok(d) => Some(d),
        Err(e) => {
          warn!(path = %self.path.display(), line, "ignoring row: {e}");
          None
        }
      })
      .collect();
    Ok(keys)
  }
}
