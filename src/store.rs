use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::FieldMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted submission: bookkeeping columns plus the field mapping in
/// its stored form (multi-select values joined with ","). Submitted keys live
/// under `fields`, so they can never collide with the bookkeeping columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl StoredRecord {
    pub fn new(id: RecordId, fields: &FieldMap) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            fields: fields
                .iter()
                .map(|(k, v)| (k.clone(), v.stored()))
                .collect(),
        }
    }
}

pub trait RecordStore {
    fn save(&mut self, fields: &FieldMap) -> Result<RecordId, Error>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<StoredRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&StoredRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

impl RecordStore for MemoryStore {
    fn save(&mut self, fields: &FieldMap) -> Result<RecordId, Error> {
        let id = RecordId(self.records.len() as u64 + 1);
        self.records.push(StoredRecord::new(id, fields));
        Ok(id)
    }
}

/// Append-only store: one JSON object per line. Each save takes an
/// exclusive lock on the file, reads the highest stored id and appends the
/// next one, so several handles or processes sharing a file never hand out
/// the same id.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    /// Open a store, checking that any existing file parses.
    pub fn open(path: &Path) -> Result<Self, Error> {
        if path.exists() {
            let file = File::open(path).map_err(|e| store_err(path, e))?;
            let lock = fd_lock::RwLock::new(file);
            let guard = lock.read().map_err(|e| store_err(path, e))?;
            let last = max_id(BufReader::new(&*guard), path)?;
            log::debug!("record store {} opened, last id {last}", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> Result<Vec<StoredRecord>, Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(|e| store_err(&self.path, e))?;
        let lock = fd_lock::RwLock::new(file);
        let guard = lock.read().map_err(|e| store_err(&self.path, e))?;
        BufReader::new(&*guard)
            .lines()
            .filter(|line| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|line| {
                let line = line.map_err(|e| store_err(&self.path, e))?;
                serde_json::from_str(&line).map_err(|e| Error::Store(e.to_string()))
            })
            .collect()
    }
}

impl RecordStore for JsonLinesStore {
    fn save(&mut self, fields: &FieldMap) -> Result<RecordId, Error> {
        let path = self.path.as_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| store_err(path, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| store_err(path, e))?;

        let mut lock = fd_lock::RwLock::new(file);
        let guard = lock.write().map_err(|e| store_err(path, e))?;
        let mut file: &File = &guard;

        file.seek(SeekFrom::Start(0)).map_err(|e| store_err(path, e))?;
        let id = RecordId(max_id(BufReader::new(file), path)? + 1);
        let record = StoredRecord::new(id, fields);
        let mut line = serde_json::to_string(&record).map_err(|e| Error::Store(e.to_string()))?;
        line.push('\n');
        file.write_all(line.as_bytes()).map_err(|e| store_err(path, e))?;
        drop(guard);

        log::info!("stored agreement record {id} in {}", path.display());
        Ok(id)
    }
}

/// Highest record id in a JSON-lines stream, 0 when empty.
fn max_id(reader: impl BufRead, path: &Path) -> Result<u64, Error> {
    let mut last = 0;
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| store_err(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: StoredRecord = serde_json::from_str(&line)
            .map_err(|e| Error::Store(format!("{}:{}: {e}", path.display(), n + 1)))?;
        last = last.max(record.id.0);
    }
    Ok(last)
}

fn store_err(path: &Path, e: std::io::Error) -> Error {
    Error::Store(format!("{}: {e}", path.display()))
}
