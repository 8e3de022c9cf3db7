use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
/// Errors returned by record store backends.
pub enum RecordStoreError {
    /// I/O error on a record file or directory.
    #[error("record I/O error at '{path}': {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded or decoded.
    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Id contains characters that cannot be used as a file name.
    #[error("invalid record id '{id}'")]
    InvalidId {
        /// Rejected id.
        id: String,
    },

    /// Backend unreachable or its worker failed.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl RecordStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for record store operations.
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;
