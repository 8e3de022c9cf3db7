//! File-per-record store: `<root>/jobs/<id>.json` and `<root>/candidates/<id>.json`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::error::{RecordStoreError, RecordStoreResult};
use super::model::{CandidateRecord, JobRecord};
use super::RecordStore;

const JSON_EXTENSION: &str = "json";
const JOBS_DIR: &str = "jobs";
const CANDIDATES_DIR: &str = "candidates";

#[derive(Debug, Clone)]
/// Stores each record as a pretty-printed JSON file.
///
/// Writes go through a temp file in the same directory and are renamed into place.
pub struct JsonRecordStore {
    root: PathBuf,
}

fn validate_id(id: &str) -> RecordStoreResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(RecordStoreError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

fn record_path(dir: &Path, id: &str) -> RecordStoreResult<PathBuf> {
    validate_id(id)?;
    Ok(dir.join(format!("{}.{}", id, JSON_EXTENSION)))
}

fn read_record<T: DeserializeOwned>(path: &Path) -> RecordStoreResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RecordStoreError::io(path, e)),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn write_record<T: Serialize>(dir: &Path, path: &Path, record: &T) -> RecordStoreResult<()> {
    fs::create_dir_all(dir).map_err(|e| RecordStoreError::io(dir, e))?;

    let bytes = serde_json::to_vec_pretty(record)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RecordStoreError::io(dir, e))?;
    tmp.write_all(&bytes)
        .map_err(|e| RecordStoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| RecordStoreError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| RecordStoreError::io(path, e.error))?;

    debug!(path = %path.display(), "Record written");
    Ok(())
}

fn list_records<T: DeserializeOwned>(dir: &Path, limit: usize) -> RecordStoreResult<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| RecordStoreError::io(dir, e))? {
        let entry = entry.map_err(|e| RecordStoreError::io(dir, e))?;
        let path = entry.path();
        if let Some(ext) = path.extension()
            && ext == JSON_EXTENSION
        {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::new();
    for path in paths.into_iter().take(limit) {
        match read_record(&path) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(RecordStoreError::Serialization(e)) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable record");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}

async fn blocking<T, F>(f: F) -> RecordStoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> RecordStoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RecordStoreError::Unavailable(format!("record worker failed: {}", e)))?
}

impl JsonRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn jobs_dir(&self) -> PathBuf {
        self.root.join(JOBS_DIR)
    }

    fn candidates_dir(&self) -> PathBuf {
        self.root.join(CANDIDATES_DIR)
    }
}

impl RecordStore for JsonRecordStore {
    async fn get_job(&self, job_id: &str) -> RecordStoreResult<Option<JobRecord>> {
        let path = record_path(&self.jobs_dir(), job_id)?;
        blocking(move || read_record(&path)).await
    }

    async fn get_candidate(&self, candidate_id: &str) -> RecordStoreResult<Option<CandidateRecord>> {
        let path = record_path(&self.candidates_dir(), candidate_id)?;
        blocking(move || read_record(&path)).await
    }

    async fn put_job(&self, job: JobRecord) -> RecordStoreResult<()> {
        let dir = self.jobs_dir();
        let path = record_path(&dir, &job.job_id)?;
        blocking(move || write_record(&dir, &path, &job)).await
    }

    async fn put_candidate(&self, candidate: CandidateRecord) -> RecordStoreResult<()> {
        let dir = self.candidates_dir();
        let path = record_path(&dir, &candidate.candidate_id)?;
        blocking(move || write_record(&dir, &path, &candidate)).await
    }

    async fn list_jobs(&self, limit: usize) -> RecordStoreResult<Vec<JobRecord>> {
        let dir = self.jobs_dir();
        blocking(move || list_records(&dir, limit)).await
    }

    async fn list_candidates(&self, limit: usize) -> RecordStoreResult<Vec<CandidateRecord>> {
        let dir = self.candidates_dir();
        blocking(move || list_records(&dir, limit)).await
    }
}
