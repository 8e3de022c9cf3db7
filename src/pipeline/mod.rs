//! The matching funnel: retrieval, shortlist, evaluation.
//!
//! [`MatchingPipeline::process_job`] ties the stages together. Each stage is usable on its own:
//! [`RetrievalStage`] ranks candidates by vector similarity, [`shortlist`] keeps the top 40%,
//! and [`EvaluationStage`] scores survivors with bounded concurrency.

pub mod cancel;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod matcher;
pub mod retrieval;
pub mod shortlist;
pub mod types;


pub use cancel::CancellationFlag;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, PipelineStage};
pub use evaluation::{EvaluationBatch, EvaluationStage};
pub use matcher::{MatchingPipeline, recommendation_order};
pub use retrieval::{RetrievalStage, similarity_for};
pub use shortlist::{shortlist, shortlist_size};
pub use types::{
    FinalEvaluation, JobEvaluationReport, MatchCandidate, PipelineState, ScoreSource,
    ShortlistResult,
};
