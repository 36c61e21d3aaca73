//! Job records and the stores that keep them.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use graylabel_core::PixelCoord;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RepositoryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Frames sampled, positions not decoded yet.
    Queued,
    Mapped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    GrayLabel,
    /// Light one pixel at a time. Not implemented by the service.
    SequentialScan,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::GrayLabel => "gray_label",
            Strategy::SequentialScan => "sequential_scan",
        })
    }
}

/// State of one mapping job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    pub total_pixels: usize,
    pub strategy: Strategy,
    /// Pixel positions ordered by LED index once mapped.
    pub positions: Vec<PixelCoord>,
}

impl JobRecord {
    /// Fresh queued record with a random id.
    pub fn new(total_pixels: usize, strategy: Strategy) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            total_pixels,
            strategy,
            positions: Vec::new(),
        }
    }

    /// Storage directory holding the job files.
    pub fn dir(&self) -> String {
        self.id.to_string()
    }
}

pub trait JobRepository {
    /// Insert or replace a record. With a `ttl` the record disappears once
    /// it expires; without one it is kept indefinitely.
    fn save(&self, record: &JobRecord, ttl: Option<Duration>) -> Result<(), RepositoryError>;

    fn get(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError>;
}

impl<T: JobRepository + ?Sized> JobRepository for &T {
    fn save(&self, record: &JobRecord, ttl: Option<Duration>) -> Result<(), RepositoryError> {
        (**self).save(record, ttl)
    }

    fn get(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        (**self).get(id)
    }
}

/// In-memory repository.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<HashMap<Uuid, (JobRecord, Option<Instant>)>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRepository for MemoryRepository {
    fn save(&self, record: &JobRecord, ttl: Option<Duration>) -> Result<(), RepositoryError> {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id, (record.clone(), expires_at));
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = match records.get(&id) {
            None => return Ok(None),
            Some((_, expires_at)) => expires_at.is_some_and(|t| Instant::now() >= t),
        };
        if expired {
            records.remove(&id);
            return Ok(None);
        }
        Ok(records.get(&id).map(|(record, _)| record.clone()))
    }
}

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    #[serde(flatten)]
    record: JobRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<u64>,
}

fn unix_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// One pretty JSON file per record, `<dir>/<id>.json`.
///
/// Expired records read as absent and are removed on access.
#[derive(Clone, Debug)]
pub struct FsRepository {
    dir: PathBuf,
}

impl FsRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl JobRepository for FsRepository {
    fn save(&self, record: &JobRecord, ttl: Option<Duration>) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.dir)?;
        let stored = StoredRecord {
            record: record.clone(),
            // A TTL past the end of representable time never expires.
            expires_at_ms: ttl
                .and_then(|ttl| SystemTime::now().checked_add(ttl))
                .map(unix_millis),
        };
        let path = self.record_path(record.id);
        fs::write(&path, serde_json::to_string_pretty(&stored)?)?;
        debug!("saved job record {}", path.display());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        let path = self.record_path(id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredRecord = serde_json::from_str(&raw)?;
        if stored
            .expires_at_ms
            .is_some_and(|t| unix_millis(SystemTime::now()) >= t)
        {
            debug!("job record {id} expired");
            fs::remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(stored.record))
    }
}
