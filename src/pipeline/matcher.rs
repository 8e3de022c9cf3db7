use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::index::{IndexLabel, SharedIndex};
use crate::records::{JobRecord, RecordStore};
use crate::scoring::ScoringProvider;

use super::cancel::CancellationFlag;
use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineResult, PipelineStage};
use super::evaluation::EvaluationStage;
use super::retrieval::RetrievalStage;
use super::shortlist::shortlist;
use super::types::{FinalEvaluation, JobEvaluationReport, PipelineState};

/// Best first: final score, then similarity, then candidate id.
pub fn recommendation_order(a: &FinalEvaluation, b: &FinalEvaluation) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| b.similarity_score.total_cmp(&a.similarity_score))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

struct RunTrace {
    job_id: String,
    transitions: Vec<PipelineState>,
}

/// Drives one job through retrieval, shortlisting and evaluation.
///
/// State machine: `Idle -> Retrieving -> Filtering -> Evaluating -> Done`, or
/// `Retrieving -> Empty` when no candidate is found. Index and record-store failures abort the
/// run; scoring failures are absorbed per candidate.
pub struct MatchingPipeline<S> {
    records: Arc<S>,
    retrieval: RetrievalStage<S>,
    evaluation: EvaluationStage,
    config: PipelineConfig,
    /// Shared by every run on this pipeline; the last run to transition wins.
    state: Mutex<PipelineState>,
}

impl<S: RecordStore> MatchingPipeline<S> {
    pub fn new(
        index: SharedIndex,
        records: Arc<S>,
        scorer: Arc<dyn ScoringProvider>,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            retrieval: RetrievalStage::new(index, Arc::clone(&records)),
            evaluation: EvaluationStage::new(scorer, config.eval_concurrency, config.eval_timeout),
            records,
            config,
            state: Mutex::new(PipelineState::Idle),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Last state written by any run. Concurrent runs overwrite each other here, so read a
    /// run's own history from [`JobEvaluationReport::transitions`].
    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    pub fn retrieval(&self) -> &RetrievalStage<S> {
        &self.retrieval
    }

    fn transition(&self, trace: &mut RunTrace, to: PipelineState) {
        let from = {
            let mut state = self.state.lock();
            std::mem::replace(&mut *state, to)
        };
        trace.transitions.push(to);
        info!(job_id = %trace.job_id, %from, %to, "Pipeline state transition");
    }

    pub async fn process_job(&self, job_id: &str) -> PipelineResult<JobEvaluationReport> {
        self.process_job_with_cancel(job_id, &CancellationFlag::new())
            .await
    }

    #[instrument(skip(self, cancel))]
    pub async fn process_job_with_cancel(
        &self,
        job_id: &str,
        cancel: &CancellationFlag,
    ) -> PipelineResult<JobEvaluationReport> {
        let mut trace = RunTrace {
            job_id: job_id.to_string(),
            transitions: vec![PipelineState::Idle],
        };
        *self.state.lock() = PipelineState::Idle;

        let job = self.load_job(job_id).await?;
        let job_embedding = match job.overall_embedding.as_deref() {
            Some(e) if !e.is_empty() => e,
            _ => {
                return Err(PipelineError::NoEmbeddings {
                    job_id: job_id.to_string(),
                });
            }
        };

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled {
                stage: PipelineStage::Retrieval,
            });
        }

        self.transition(&mut trace, PipelineState::Retrieving);
        let candidates = self
            .retrieval
            .find_candidates(
                Some(job_embedding),
                IndexLabel::is_candidate_overall,
                self.config.max_results,
            )
            .await?;

        if candidates.is_empty() {
            self.transition(&mut trace, PipelineState::Empty);
            return Ok(JobEvaluationReport {
                job_id: job.job_id.clone(),
                job_title: job.title.clone(),
                company: job.company.clone(),
                total_candidates: 0,
                eliminated_count: 0,
                shortlisted: 0,
                recommendations: Vec::new(),
                evaluations: Vec::new(),
                degraded_count: 0,
                skipped: 0,
                cancelled: false,
                state: PipelineState::Empty,
                transitions: trace.transitions,
                message: "No candidates found for this job.".to_string(),
            });
        }

        self.transition(&mut trace, PipelineState::Filtering);
        let total_candidates = candidates.len();
        let shortlisted = shortlist(candidates);
        let eliminated_count = shortlisted.eliminated_count;
        let shortlisted_count = shortlisted.kept.len();

        self.transition(&mut trace, PipelineState::Evaluating);
        let batch = self
            .evaluation
            .evaluate_all(shortlisted.kept, &job, cancel)
            .await;

        let mut evaluations = batch.evaluations;
        evaluations.sort_by(recommendation_order);
        let recommendations: Vec<FinalEvaluation> =
            evaluations.iter().filter(|e| e.advance).cloned().collect();
        let degraded_count = evaluations.iter().filter(|e| e.degraded).count();
        let cancelled = batch.skipped > 0;

        self.transition(&mut trace, PipelineState::Done);

        let message = if cancelled {
            format!(
                "Evaluation cancelled after {} of {} candidates. {} candidates recommended so far.",
                evaluations.len(),
                shortlisted_count,
                recommendations.len()
            )
        } else {
            format!(
                "Evaluation complete. {} candidates recommended for the next round.",
                recommendations.len()
            )
        };

        info!(
            job_id = %job.job_id,
            total_candidates,
            shortlisted = shortlisted_count,
            recommended = recommendations.len(),
            degraded = degraded_count,
            cancelled,
            "Job processed"
        );

        Ok(JobEvaluationReport {
            job_id: job.job_id.clone(),
            job_title: job.title.clone(),
            company: job.company.clone(),
            total_candidates,
            eliminated_count,
            shortlisted: shortlisted_count,
            recommendations,
            evaluations,
            degraded_count,
            skipped: batch.skipped,
            cancelled,
            state: PipelineState::Done,
            transitions: trace.transitions,
            message,
        })
    }

    async fn load_job(&self, job_id: &str) -> PipelineResult<JobRecord> {
        self.records
            .get_job(job_id)
            .await
            .map_err(|source| PipelineError::RecordStore {
                stage: PipelineStage::JobLookup,
                source,
            })?
            .ok_or_else(|| PipelineError::NotFound {
                job_id: job_id.to_string(),
            })
    }
}
