use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by vector index operations.
pub enum IndexError {
    /// Index could not be created with the requested settings.
    #[error("invalid index configuration: {reason}")]
    Config {
        /// Error message.
        reason: String,
    },

    /// Vector or query length differs from the index dimension.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Index dimension.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Reading or writing an index artifact failed.
    #[error("index I/O error at '{path}': {source}")]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Label table could not be encoded or decoded.
    #[error("index serialization error: {0}")]
    Serialization(String),

    /// An artifact exists but its contents are inconsistent.
    #[error("corrupt index artifact '{path}': {reason}")]
    Corrupt {
        /// Artifact path.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors returned when an opaque label does not follow `<entity_id>_<section>`.
pub enum LabelError {
    /// No `_` separator was found.
    #[error("label '{label}' has no section suffix")]
    MissingSection {
        /// Raw label.
        label: String,
    },

    /// Suffix is not a known section name.
    #[error("label '{label}' has unknown section '{section}'")]
    UnknownSection {
        /// Raw label.
        label: String,
        /// Unrecognised suffix.
        section: String,
    },

    /// Nothing precedes the section suffix.
    #[error("label '{label}' has an empty entity id")]
    EmptyEntityId {
        /// Raw label.
        label: String,
    },
}
