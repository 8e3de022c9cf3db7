//! Talent funnel library crate (used by the `funnel` binary and integration tests).
//!
//! Matches candidates to a job in two stages: an exact vector search over every candidate's
//! overall embedding, then a qualitative scoring pass over the top 40%.
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Environment configuration
//! - [`FlatIndex`], [`SharedIndex`], [`IndexLabel`] - Exact L2 vector index and its labels
//! - [`CandidateRecord`], [`JobRecord`], [`RecordStore`] - Record storage
//!
//! ## Providers
//! - [`EmbeddingProvider`]: [`HttpEmbedder`], [`StubEmbedder`]
//! - [`ScoringProvider`]: [`ChatCompletionScorer`]
//!
//! ## Pipeline
//! - [`MatchingPipeline`] - Retrieval, shortlist, evaluation
//! - [`ProfileIndexer`] - Embeds and indexes new candidates and jobs, searches jobs by text
//! - [`JobDescriptionParser`] - Raw job description text to [`JobPosting`]
//!
//! ## Test/Mock Support
//! Mock providers are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod index;
pub mod ingest;
pub mod pipeline;
pub mod records;
pub mod scoring;

#[cfg(test)]
mod test_http;

pub use config::{ApiEndpoint, Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{EmbeddingError, EmbeddingProvider, HttpEmbedder, StubEmbedder};
pub use index::{
    EntityKind, FlatIndex, IndexError, IndexLabel, IndexResult, LabelError, LabeledHit,
    SearchHit, Section, SharedIndex,
};
pub use ingest::{
    CandidateSubmission, IngestError, JobDescriptionParser, JobMatch, JobPosting, ProfileIndexer,
};
pub use pipeline::{
    CancellationFlag, FinalEvaluation, JobEvaluationReport, MatchCandidate, MatchingPipeline,
    PipelineConfig, PipelineError, PipelineStage, PipelineState, ShortlistResult,
};
pub use records::{
    CandidateRecord, EducationEntry, InMemoryRecordStore, JobRecord, JsonRecordStore, Project,
    RecordStore, RecordStoreError,
};
#[cfg(any(test, feature = "mock"))]
pub use scoring::{MockBehavior, MockScorer};
pub use scoring::{ChatCompletionScorer, ScoringError, ScoringProvider, ScoringVerdict};
