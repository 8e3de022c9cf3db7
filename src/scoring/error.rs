use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring provider unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("scoring call timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("malformed scoring response: {reason}")]
    MalformedResponse { reason: String },

    #[error("invalid scoring configuration: {reason}")]
    InvalidConfig { reason: String },
}
