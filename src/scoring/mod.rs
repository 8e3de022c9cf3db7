//! Qualitative scoring of candidate/job pairs.
//!
//! The scoring provider sees bounded [`CandidateSummary`] / [`JobSummary`] views built by
//! [`summary`], never whole records. [`ChatCompletionScorer`] asks a chat model for a JSON
//! verdict; failures are reported as [`ScoringError`] and contained by the evaluation stage.

pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod summary;
pub mod types;


pub use error::ScoringError;
pub use http::ChatCompletionScorer;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBehavior, MockScorer};
pub use summary::{summarize_candidate, summarize_job};
pub use types::{CandidateSummary, JobSummary, ScoringVerdict};

use async_trait::async_trait;

#[async_trait]
/// Produces a verdict for one candidate/job pair.
pub trait ScoringProvider: Send + Sync {
    async fn score(
        &self,
        candidate: &CandidateSummary,
        job: &JobSummary,
        similarity: f32,
    ) -> Result<ScoringVerdict, ScoringError>;
}
