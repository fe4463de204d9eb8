//! Flat-file [`ScoreStore`] using the two-column CSV format.
//!
//! ```text
//! Alice,0.212
//! Bob,0.287
//! ```
//!
//! One record per line, `name,elapsed_seconds`, no header row. Names that
//! contain commas or quotes are quoted. Scores are written in shortest
//! round-trip form so loading and re-saving leaves the file unchanged.
//!
//! Saves are atomic: the new contents go to a uniquely named temporary file
//! in the same directory, which is then renamed over the original.
//!
//! Every store opened on the same path in this process shares one write
//! lock (see [`ScoreStore::exclusive`]), so leaderboards built from
//! separate `CsvFileStore` values still serialize their submissions.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError};

use lightsout_types::ScoreRecord;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::{LeaderboardWarning, LoadOutcome, ScoreStore};

/// Number of fields in a valid row.
const FIELDS_PER_ROW: usize = 2;

/// Write locks by absolute file path.
static PATH_LOCKS: OnceLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    OnceLock::new();

/// The process-wide write lock for `path`.
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_err| path.to_path_buf());
    let mut locks = PATH_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

/// A leaderboard stored as a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvFileStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file does not need to exist; it is created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let write_lock = lock_for(&path);
        Self { path, write_lock }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the temporary file is created in.
    fn staging_dir(&self) -> PathBuf {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScoreStore for CsvFileStore {
    async fn load(&self) -> Result<LoadOutcome, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No leaderboard file yet");
                return Ok(LoadOutcome::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let outcome = decode(&bytes);
        for warning in &outcome.warnings {
            warn!(path = %self.path.display(), %warning, "Leaderboard row skipped");
        }
        Ok(outcome)
    }

    async fn save(&self, records: &[ScoreRecord]) -> Result<(), StoreError> {
        let bytes = encode(records)?;

        let dir = self.staging_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| self.io_error(err))?;

        let target = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &bytes))
            .await
            .map_err(std::io::Error::other)
            .and_then(|written| written)
            .map_err(|err| self.io_error(err))?;

        debug!(
            path = %self.path.display(),
            records = records.len(),
            "Leaderboard saved"
        );
        Ok(())
    }

    async fn exclusive(&self) -> Option<OwnedMutexGuard<()>> {
        Some(Arc::clone(&self.write_lock).lock_owned().await)
    }
}

/// Write `bytes` to a fresh temporary file in `dir`, then rename it to
/// `target`.
fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut staging = tempfile::NamedTempFile::new_in(dir)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(target).map_err(|err| err.error)?;
    Ok(())
}

/// Parse CSV bytes into records, skipping rows that are not valid.
pub fn decode(bytes: &[u8]) -> LoadOutcome {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut outcome = LoadOutcome::default();

    for row in reader.records() {
        let record = match row {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map_or(0, csv::Position::line);
                outcome.warnings.push(LeaderboardWarning::MalformedRow {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map_or(0, csv::Position::line);
        match parse_row(&record) {
            Ok(score) => outcome.records.push(score),
            Err(reason) => outcome
                .warnings
                .push(LeaderboardWarning::MalformedRow { line, reason }),
        }
    }

    outcome
}

fn parse_row(record: &csv::StringRecord) -> Result<ScoreRecord, String> {
    if record.len() != FIELDS_PER_ROW {
        return Err(format!(
            "expected {FIELDS_PER_ROW} fields, found {}",
            record.len()
        ));
    }

    let name = record.get(0).unwrap_or_default();
    if name.is_empty() {
        return Err("empty name".to_owned());
    }

    let raw_score = record.get(1).unwrap_or_default();
    let elapsed_seconds: f64 = raw_score
        .parse()
        .map_err(|_err| format!("score {raw_score:?} is not a number"))?;
    if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
        return Err(format!("score {raw_score:?} is out of range"));
    }

    Ok(ScoreRecord::new(name, elapsed_seconds))
}

/// Render records in the stored CSV format.
///
/// # Errors
///
/// Returns [`StoreError::Csv`] if serialization fails.
pub fn encode(records: &[ScoreRecord]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|err| StoreError::Csv(csv::Error::from(err.into_error())))
}
