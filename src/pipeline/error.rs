use std::fmt;

use thiserror::Error;

use crate::index::IndexError;
use crate::records::RecordStoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Pipeline step that raised an error.
pub enum PipelineStage {
    JobLookup,
    Retrieval,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JobLookup => f.write_str("job lookup"),
            Self::Retrieval => f.write_str("retrieval"),
        }
    }
}

#[derive(Debug, Error)]
/// Failures that abort a whole pipeline run.
///
/// Per-candidate scoring failures never show up here; they become degraded evaluations.
pub enum PipelineError {
    /// The job record does not exist.
    #[error("job not found: {job_id}")]
    NotFound { job_id: String },

    /// The job exists but has no overall embedding.
    #[error("job {job_id} has no embeddings")]
    NoEmbeddings { job_id: String },

    /// Retrieval was asked to search without a job vector.
    #[error("no job embedding supplied for retrieval")]
    NoJobEmbedding,

    /// The vector index failed.
    #[error("index error during {stage}: {source}")]
    Index {
        stage: PipelineStage,
        #[source]
        source: IndexError,
    },

    /// The record store failed.
    #[error("record store error during {stage}: {source}")]
    RecordStore {
        stage: PipelineStage,
        #[source]
        source: RecordStoreError,
    },

    /// Cancellation was requested before any work could be done.
    #[error("pipeline cancelled during {stage}")]
    Cancelled { stage: PipelineStage },

    /// Pipeline settings are unusable.
    #[error("invalid pipeline configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl PipelineError {
    /// Stage that failed, when the error is tied to one.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::NotFound { .. } | Self::NoEmbeddings { .. } => Some(PipelineStage::JobLookup),
            Self::NoJobEmbedding => Some(PipelineStage::Retrieval),
            Self::Index { stage, .. }
            | Self::RecordStore { stage, .. }
            | Self::Cancelled { stage } => Some(*stage),
            Self::InvalidConfig { .. } => None,
        }
    }

    /// HTTP-equivalent status for callers that expose the pipeline over a request surface.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::NoEmbeddings { .. } | Self::NoJobEmbedding => 400,
            Self::Cancelled { .. } => 503,
            Self::Index { .. } | Self::RecordStore { .. } | Self::InvalidConfig { .. } => 500,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
