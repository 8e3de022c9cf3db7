use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::constants::EVALUATION_ERROR_LABEL;
use crate::records::JobRecord;
use crate::scoring::{
    CandidateSummary, JobSummary, ScoringError, ScoringProvider, ScoringVerdict,
    summarize_candidate, summarize_job,
};

use super::cancel::CancellationFlag;
use super::types::{FinalEvaluation, MatchCandidate};

#[derive(Debug, Clone, Default)]
pub struct EvaluationBatch {
    /// One per dispatched candidate, in shortlist order.
    pub evaluations: Vec<FinalEvaluation>,
    /// Candidates never dispatched because the run was cancelled.
    pub skipped: usize,
}

impl FinalEvaluation {
    fn from_verdict(
        candidate_id: String,
        job: &JobSummary,
        similarity: f32,
        verdict: ScoringVerdict,
    ) -> Self {
        Self {
            candidate_id,
            job_id: job.job_id.clone(),
            job_title: job.title.clone(),
            similarity_score: similarity,
            final_score: verdict.normalized_score(),
            recommendation: verdict.recommendation,
            rationale: verdict.rationale,
            advance: verdict.advance,
            strengths: verdict.strengths,
            concerns: verdict.concerns,
            degraded: false,
        }
    }

    /// Fallback used when scoring fails: keeps the similarity and never advances.
    pub fn degraded(
        candidate_id: String,
        job: &JobSummary,
        similarity: f32,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self {
            candidate_id,
            job_id: job.job_id.clone(),
            job_title: job.title.clone(),
            similarity_score: similarity,
            final_score: similarity,
            recommendation: EVALUATION_ERROR_LABEL.to_string(),
            rationale: format!("Could not complete evaluation: {}", reason),
            advance: false,
            strengths: Vec::new(),
            concerns: Vec::new(),
            degraded: true,
        }
    }
}

async fn score_with_timeout(
    scorer: &dyn ScoringProvider,
    candidate: &CandidateSummary,
    job: &JobSummary,
    similarity: f32,
    timeout: Duration,
) -> Result<ScoringVerdict, ScoringError> {
    match tokio::time::timeout(timeout, scorer.score(candidate, job, similarity)).await {
        Ok(result) => result,
        Err(_) => Err(ScoringError::Timeout { timeout }),
    }
}

async fn evaluate_one(
    scorer: &dyn ScoringProvider,
    candidate: CandidateSummary,
    job: &JobSummary,
    similarity: f32,
    timeout: Duration,
) -> FinalEvaluation {
    match score_with_timeout(scorer, &candidate, job, similarity, timeout).await {
        Ok(verdict) => {
            debug!(
                candidate_id = %candidate.candidate_id,
                score = verdict.score,
                advance = verdict.advance,
                "Candidate evaluated"
            );
            FinalEvaluation::from_verdict(candidate.candidate_id, job, similarity, verdict)
        }
        Err(e) => {
            warn!(
                candidate_id = %candidate.candidate_id,
                error = %e,
                "Scoring failed, recording degraded evaluation"
            );
            FinalEvaluation::degraded(candidate.candidate_id, job, similarity, e)
        }
    }
}

/// Runs the scoring provider over a shortlist with bounded concurrency.
///
/// Each call gets its own timeout; a failing or slow call only degrades its own result.
#[derive(Clone)]
pub struct EvaluationStage {
    scorer: Arc<dyn ScoringProvider>,
    concurrency: usize,
    timeout: Duration,
}

impl EvaluationStage {
    pub fn new(scorer: Arc<dyn ScoringProvider>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            scorer,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Evaluates a single candidate. Never fails; scoring errors yield a degraded evaluation.
    pub async fn evaluate(&self, candidate: &MatchCandidate, job: &JobRecord) -> FinalEvaluation {
        let job = summarize_job(job);
        evaluate_one(
            self.scorer.as_ref(),
            summarize_candidate(&candidate.candidate),
            &job,
            candidate.similarity,
            self.timeout,
        )
        .await
    }

    /// Evaluates every shortlisted candidate, at most `concurrency` at a time.
    ///
    /// Once `cancel` is raised no new call is dispatched; running calls complete.
    #[instrument(skip_all, fields(job_id = %job.job_id, shortlisted = shortlist.len()))]
    pub async fn evaluate_all(
        &self,
        shortlist: Vec<MatchCandidate>,
        job: &JobRecord,
        cancel: &CancellationFlag,
    ) -> EvaluationBatch {
        let job_summary = Arc::new(summarize_job(job));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let total = shortlist.len();

        let mut handles = Vec::with_capacity(total);
        let mut skipped = 0;

        for (dispatched, candidate) in shortlist.into_iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    skipped = total - dispatched;
                    break;
                }
            };

            if cancel.is_cancelled() {
                skipped = total - dispatched;
                info!(dispatched, skipped, "Cancellation requested, stopping dispatch");
                break;
            }

            let scorer = Arc::clone(&self.scorer);
            let job_summary = Arc::clone(&job_summary);
            let timeout = self.timeout;
            let candidate_id = candidate.candidate_id.clone();
            let similarity = candidate.similarity;
            let summary = summarize_candidate(&candidate.candidate);

            let handle = tokio::spawn(async move {
                let evaluation =
                    evaluate_one(scorer.as_ref(), summary, &job_summary, similarity, timeout)
                        .await;
                drop(permit);
                evaluation
            });
            handles.push((candidate_id, similarity, handle));
        }

        let (meta, joins): (Vec<_>, Vec<_>) = handles
            .into_iter()
            .map(|(id, similarity, handle)| ((id, similarity), handle))
            .unzip();
        let results = join_all(joins).await;

        let evaluations: Vec<FinalEvaluation> = meta
            .into_iter()
            .zip(results)
            .map(|((candidate_id, similarity), result)| match result {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    warn!(candidate_id = %candidate_id, error = %e, "Evaluation task failed");
                    FinalEvaluation::degraded(candidate_id, &job_summary, similarity, e)
                }
            })
            .collect();

        let degraded = evaluations.iter().filter(|e| e.degraded).count();
        info!(
            evaluated = evaluations.len(),
            degraded, skipped, "Evaluation complete"
        );

        EvaluationBatch {
            evaluations,
            skipped,
        }
    }
}
