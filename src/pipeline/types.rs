use std::fmt;

use serde::Serialize;

use crate::records::CandidateRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
/// Where a [`MatchCandidate`]'s similarity came from.
pub enum ScoreSource {
    /// `(cosine + 1) / 2` against the candidate's stored overall vector.
    Cosine,
    /// `1 / (1 + distance)` from the index hit; the stored vector was missing or unusable.
    Distance,
}

#[derive(Debug, Clone)]
/// A retrieved candidate with its similarity to the job.
pub struct MatchCandidate {
    pub candidate_id: String,
    /// Similarity in `[0, 1]`.
    pub similarity: f32,
    pub source: ScoreSource,
    pub candidate: CandidateRecord,
    /// Index position of the hit, used to break ties.
    pub position: usize,
}

#[derive(Debug, Clone, Default)]
/// Survivors of the percentile cut.
pub struct ShortlistResult {
    pub kept: Vec<MatchCandidate>,
    pub eliminated_count: usize,
}

impl ShortlistResult {
    pub fn total(&self) -> usize {
        self.kept.len() + self.eliminated_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Outcome of evaluating one shortlisted candidate.
pub struct FinalEvaluation {
    pub candidate_id: String,
    pub job_id: String,
    pub job_title: String,
    pub similarity_score: f32,
    /// Scoring-provider score mapped to `[0, 1]`, or the similarity when degraded.
    pub final_score: f32,
    pub recommendation: String,
    pub rationale: String,
    pub advance: bool,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    /// True when scoring failed and this is the fallback verdict.
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Retrieving,
    Filtering,
    Evaluating,
    Done,
    /// Retrieval found nobody; terminal.
    Empty,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Empty)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Retrieving => "retrieving",
            Self::Filtering => "filtering",
            Self::Evaluating => "evaluating",
            Self::Done => "done",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
/// Result of one `process_job` run.
pub struct JobEvaluationReport {
    pub job_id: String,
    pub job_title: String,
    pub company: Option<String>,
    /// Candidates found by retrieval.
    pub total_candidates: usize,
    pub eliminated_count: usize,
    pub shortlisted: usize,
    /// Evaluations with `advance == true`, best first.
    pub recommendations: Vec<FinalEvaluation>,
    /// Every evaluation produced, best first.
    pub evaluations: Vec<FinalEvaluation>,
    pub degraded_count: usize,
    /// Shortlisted candidates never dispatched because of cancellation.
    pub skipped: usize,
    pub cancelled: bool,
    pub state: PipelineState,
    /// States visited, in order.
    pub transitions: Vec<PipelineState>,
    pub message: String,
}
