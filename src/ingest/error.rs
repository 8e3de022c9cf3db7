use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::index::IndexError;
use crate::records::RecordStoreError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index update failed: {0}")]
    Index(#[from] IndexError),

    #[error("record store failed: {0}")]
    RecordStore(#[from] RecordStoreError),

    #[error("index persistence task failed: {reason}")]
    Persist { reason: String },

    /// The chat model could not turn a job description into fields.
    #[error("job description extraction failed: {reason}")]
    Parser { reason: String },
}

pub type IngestResult<T> = Result<T, IngestError>;
