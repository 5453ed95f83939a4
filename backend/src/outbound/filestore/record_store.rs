//! File-backed `RecordStore` adapter.
//!
//! The log lives in `records.jsonl`, one JSON document per line, append-only.
//! Appends are buffered in memory and written out every `flush_every`
//! entries and on explicit flush; duplicate detection and queries run against
//! the full in-memory log, so a buffered entry is visible to `exists`
//! immediately (read-your-own-write).

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use cap_std::fs::{Dir, OpenOptions};
use tracing::{debug, warn};

use crate::domain::ports::{RecordStore, RecordStoreError};
use crate::domain::record::{RecordEntry, RecordQuery};
use crate::domain::scan::{ScanCode, ScreenContext};

use super::FileStoreOpenError;

const RECORDS_FILE: &str = "records.jsonl";

/// How many appends may sit in the buffer before an automatic flush.
pub const DEFAULT_FLUSH_EVERY: usize = 400;

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<RecordEntry>,
    pending: Vec<String>,
}

/// File-backed append-only record log.
#[derive(Debug)]
pub struct FileRecordStore {
    dir: Dir,
    flush_every: usize,
    state: Mutex<LogState>,
}

impl FileRecordStore {
    /// Open (or initialise) the log inside `data_dir` with the default flush
    /// interval.
    pub fn open(data_dir: &Path) -> Result<Self, FileStoreOpenError> {
        Self::open_with_flush_every(data_dir, DEFAULT_FLUSH_EVERY)
    }

    /// Open with an explicit flush interval. An interval of 1 makes every
    /// append durable immediately.
    pub fn open_with_flush_every(
        data_dir: &Path,
        flush_every: usize,
    ) -> Result<Self, FileStoreOpenError> {
        let dir = super::open_data_dir(data_dir)?;
        let entries = load_log(&dir)?;
        debug!(entries = entries.len(), "file record store opened");
        Ok(Self {
            dir,
            flush_every: flush_every.max(1),
            state: Mutex::new(LogState {
                entries,
                pending: Vec::new(),
            }),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LogState>, RecordStoreError> {
        self.state
            .lock()
            .map_err(|_| RecordStoreError::query("record store lock poisoned"))
    }

    fn flush_locked(&self, state: &mut LogState) -> Result<(), RecordStoreError> {
        if state.pending.is_empty() {
            return Ok(());
        }
        let mut file = self
            .dir
            .open_with(
                RECORDS_FILE,
                OpenOptions::new().create(true).append(true),
            )
            .map_err(|error| RecordStoreError::connection(error.to_string()))?;
        let mut payload = String::new();
        for line in &state.pending {
            payload.push_str(line);
            payload.push('\n');
        }
        file.write_all(payload.as_bytes())
            .map_err(|error| RecordStoreError::connection(error.to_string()))?;
        file.flush()
            .map_err(|error| RecordStoreError::connection(error.to_string()))?;
        debug!(flushed = state.pending.len(), "record log flushed to disk");
        state.pending.clear();
        Ok(())
    }
}

fn load_log(dir: &Dir) -> Result<Vec<RecordEntry>, FileStoreOpenError> {
    if !dir.exists(RECORDS_FILE) {
        return Ok(Vec::new());
    }
    let payload = dir
        .read_to_string(RECORDS_FILE)
        .map_err(|source| FileStoreOpenError::Read {
            file: RECORDS_FILE.to_owned(),
            source,
        })?;
    let mut entries = Vec::new();
    for (index, line) in payload.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RecordEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(error) => {
                warn!(line = index + 1, %error, "record log line failed to parse");
                return Err(FileStoreOpenError::Corrupt {
                    file: RECORDS_FILE.to_owned(),
                    detail: format!("line {}: {error}", index + 1),
                });
            }
        }
    }
    Ok(entries)
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn exists(
        &self,
        context: ScreenContext,
        transport: &ScanCode,
        order: &ScanCode,
    ) -> Result<bool, RecordStoreError> {
        let state = self.lock()?;
        Ok(state.entries.iter().any(|entry| {
            entry.context == context && &entry.transport == transport && &entry.order == order
        }))
    }

    async fn append(&self, entry: &RecordEntry) -> Result<(), RecordStoreError> {
        let line = serde_json::to_string(entry)
            .map_err(|error| RecordStoreError::query(error.to_string()))?;
        let mut state = self.lock()?;
        state.entries.push(entry.clone());
        state.pending.push(line);
        if state.pending.len() >= self.flush_every {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<RecordEntry>, RecordStoreError> {
        let state = self.lock()?;
        let mut matched: Vec<RecordEntry> = state
            .entries
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect();
        matched.sort_by_key(|entry| entry.recorded_at);
        Ok(matched)
    }

    async fn flush(&self) -> Result<(), RecordStoreError> {
        let mut state = self.lock()?;
        self.flush_locked(&mut state)
    }
}
