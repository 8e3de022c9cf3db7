use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::RecordStoreResult;
use super::model::{CandidateRecord, JobRecord};
use super::RecordStore;

#[derive(Debug, Default, Clone)]
/// Process-local record store backed by ordered maps.
pub struct InMemoryRecordStore {
    jobs: Arc<RwLock<BTreeMap<String, JobRecord>>>,
    candidates: Arc<RwLock<BTreeMap<String, CandidateRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.read().len()
    }

    /// Removes a candidate. Index entries pointing at it are left in place.
    pub fn remove_candidate(&self, candidate_id: &str) -> Option<CandidateRecord> {
        self.candidates.write().remove(candidate_id)
    }
}

impl RecordStore for InMemoryRecordStore {
    async fn get_job(&self, job_id: &str) -> RecordStoreResult<Option<JobRecord>> {
        Ok(self.jobs.read().get(job_id).cloned())
    }

    async fn get_candidate(&self, candidate_id: &str) -> RecordStoreResult<Option<CandidateRecord>> {
        Ok(self.candidates.read().get(candidate_id).cloned())
    }

    async fn put_job(&self, job: JobRecord) -> RecordStoreResult<()> {
        self.jobs.write().insert(job.job_id.clone(), job);
        Ok(())
    }

    async fn put_candidate(&self, candidate: CandidateRecord) -> RecordStoreResult<()> {
        self.candidates
            .write()
            .insert(candidate.candidate_id.clone(), candidate);
        Ok(())
    }

    async fn list_jobs(&self, limit: usize) -> RecordStoreResult<Vec<JobRecord>> {
        Ok(self.jobs.read().values().take(limit).cloned().collect())
    }

    async fn list_candidates(&self, limit: usize) -> RecordStoreResult<Vec<CandidateRecord>> {
        Ok(self
            .candidates
            .read()
            .values()
            .take(limit)
            .cloned()
            .collect())
    }
}
