//! Job and candidate record storage.

pub mod error;
pub mod json;
pub mod memory;
pub mod model;

#[cfg(test)]
mod tests;

pub use error::{RecordStoreError, RecordStoreResult};
pub use json::JsonRecordStore;
pub use memory::InMemoryRecordStore;
pub use model::{CandidateRecord, EducationEntry, JobRecord, Project, project_skills};

use std::future::Future;

/// Keyed access to job and candidate records.
///
/// Absent records are `Ok(None)`; errors mean the store itself could not answer.
pub trait RecordStore: Send + Sync {
    fn get_job(
        &self,
        job_id: &str,
    ) -> impl Future<Output = RecordStoreResult<Option<JobRecord>>> + Send;

    fn get_candidate(
        &self,
        candidate_id: &str,
    ) -> impl Future<Output = RecordStoreResult<Option<CandidateRecord>>> + Send;

    /// Inserts or replaces the job keyed by `job.job_id`.
    fn put_job(&self, job: JobRecord) -> impl Future<Output = RecordStoreResult<()>> + Send;

    /// Inserts or replaces the candidate keyed by `candidate.candidate_id`.
    fn put_candidate(
        &self,
        candidate: CandidateRecord,
    ) -> impl Future<Output = RecordStoreResult<()>> + Send;

    /// Up to `limit` jobs ordered by id.
    fn list_jobs(
        &self,
        limit: usize,
    ) -> impl Future<Output = RecordStoreResult<Vec<JobRecord>>> + Send;

    /// Up to `limit` candidates ordered by id.
    fn list_candidates(
        &self,
        limit: usize,
    ) -> impl Future<Output = RecordStoreResult<Vec<CandidateRecord>>> + Send;
}
