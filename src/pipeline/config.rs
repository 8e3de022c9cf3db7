use std::time::Duration;

use crate::constants::{DEFAULT_EVAL_CONCURRENCY, DEFAULT_EVAL_TIMEOUT_SECS, DEFAULT_MAX_RESULTS};

use super::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Nearest-neighbour hits requested from the index.
    pub max_results: usize,
    /// Scoring calls allowed in flight at once.
    pub eval_concurrency: usize,
    /// Deadline for each individual scoring call.
    pub eval_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            eval_concurrency: DEFAULT_EVAL_CONCURRENCY,
            eval_timeout: Duration::from_secs(DEFAULT_EVAL_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_results == 0 {
            return Err(PipelineError::InvalidConfig {
                reason: "max_results must be greater than zero".to_string(),
            });
        }
        if self.eval_concurrency == 0 {
            return Err(PipelineError::InvalidConfig {
                reason: "eval_concurrency must be greater than zero".to_string(),
            });
        }
        if self.eval_timeout.is_zero() {
            return Err(PipelineError::InvalidConfig {
                reason: "eval_timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
