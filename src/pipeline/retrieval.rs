use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::index::math::{cosine_similarity, distance_similarity, unit_similarity};
use crate::index::{IndexLabel, LabeledHit, SharedIndex};
use crate::records::{CandidateRecord, RecordStore, RecordStoreError};

use super::error::{PipelineError, PipelineResult, PipelineStage};
use super::types::{MatchCandidate, ScoreSource};

/// Similarity of a job vector to a candidate, preferring the candidate's stored vector.
pub fn similarity_for(
    job_embedding: &[f32],
    candidate: &CandidateRecord,
    distance: f32,
) -> (f32, ScoreSource) {
    match candidate.overall_embedding.as_deref() {
        Some(stored) if !stored.is_empty() && stored.len() == job_embedding.len() => (
            unit_similarity(cosine_similarity(job_embedding, stored)),
            ScoreSource::Cosine,
        ),
        _ => (distance_similarity(distance), ScoreSource::Distance),
    }
}

/// Descending similarity, ties by ascending index position.
pub fn rank_order(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.position.cmp(&b.position))
}

/// Turns a job vector into ranked candidates: index search, label filter, record fetch, rescoring.
pub struct RetrievalStage<S> {
    index: SharedIndex,
    records: Arc<S>,
}

impl<S> Clone for RetrievalStage<S> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            records: Arc::clone(&self.records),
        }
    }
}

struct ResolvedHit {
    hit: LabeledHit,
    candidate_id: String,
}

impl<S: RecordStore> RetrievalStage<S> {
    pub fn new(index: SharedIndex, records: Arc<S>) -> Self {
        Self { index, records }
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    /// Candidates whose overall vector is near `job_embedding`, best first.
    ///
    /// Only hits whose label satisfies `predicate` are considered; a candidate id seen twice
    /// keeps its closest hit. Hits pointing at records missing from the store are skipped.
    #[instrument(skip(self, job_embedding, predicate))]
    pub async fn find_candidates<P>(
        &self,
        job_embedding: Option<&[f32]>,
        predicate: P,
        max_results: usize,
    ) -> PipelineResult<Vec<MatchCandidate>>
    where
        P: Fn(&IndexLabel) -> bool,
    {
        let job_embedding = match job_embedding {
            Some(e) if !e.is_empty() => e,
            _ => return Err(PipelineError::NoJobEmbedding),
        };

        let hits = self
            .index
            .search_labeled(job_embedding, max_results)
            .map_err(|source| PipelineError::Index {
                stage: PipelineStage::Retrieval,
                source,
            })?;
        let raw_hits = hits.len();

        let mut seen = HashSet::new();
        let resolved: Vec<ResolvedHit> = hits
            .into_iter()
            .filter_map(|hit| {
                let label = match hit.label.parse::<IndexLabel>() {
                    Ok(label) => label,
                    Err(e) => {
                        debug!(position = hit.position, error = %e, "Skipping unparsable label");
                        return None;
                    }
                };
                if !predicate(&label) || !seen.insert(label.entity_id.clone()) {
                    return None;
                }
                Some(ResolvedHit {
                    hit,
                    candidate_id: label.entity_id,
                })
            })
            .collect();

        debug!(
            raw_hits,
            matching = resolved.len(),
            "Index search complete, loading candidate records"
        );

        let records = Arc::clone(&self.records);
        let load_futures = resolved.iter().map(|r| {
            let records = Arc::clone(&records);
            async move { records.get_candidate(&r.candidate_id).await }
        });
        let loaded = join_all(load_futures).await;

        let mut candidates = Vec::with_capacity(resolved.len());
        for (resolved, result) in resolved.into_iter().zip(loaded) {
            let record = match result {
                Ok(record) => record,
                Err(RecordStoreError::InvalidId { id }) => {
                    warn!(
                        candidate_id = %id,
                        position = resolved.hit.position,
                        "Index entry names an id the record store rejects, skipping"
                    );
                    continue;
                }
                Err(source) => {
                    return Err(PipelineError::RecordStore {
                        stage: PipelineStage::Retrieval,
                        source,
                    });
                }
            };

            let Some(candidate) = record else {
                warn!(
                    candidate_id = %resolved.candidate_id,
                    position = resolved.hit.position,
                    "Index entry has no candidate record, skipping"
                );
                continue;
            };

            let (similarity, source) =
                similarity_for(job_embedding, &candidate, resolved.hit.distance);
            if source == ScoreSource::Distance {
                debug!(
                    candidate_id = %resolved.candidate_id,
                    "Stored vector unavailable, using index distance"
                );
            }

            candidates.push(MatchCandidate {
                candidate_id: resolved.candidate_id,
                similarity,
                source,
                candidate,
                position: resolved.hit.position,
            });
        }

        candidates.sort_by(rank_order);

        info!(
            raw_hits,
            candidates = candidates.len(),
            best_score = candidates.first().map(|c| c.similarity),
            "Retrieval complete"
        );

        Ok(candidates)
    }
}
