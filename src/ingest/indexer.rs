use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::{join_all, try_join_all};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::index::label::{CANDIDATE_PREFIX, JOB_PREFIX};
use crate::index::math::distance_similarity;
use crate::index::{IndexError, IndexLabel, Section, SharedIndex};
use crate::records::{CandidateRecord, JobRecord, RecordStore, RecordStoreError, project_skills};

use super::error::{IngestError, IngestResult};
use super::types::{CandidateSubmission, JobMatch, JobPosting};

const SHORT_ID_LEN: usize = 8;

fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &hex[..SHORT_ID_LEN])
}

/// Sections embedded for a candidate, `overall` first.
pub fn candidate_sections(submission: &CandidateSubmission) -> Vec<(Section, String)> {
    let mut sections = vec![
        (Section::Overall, submission.overall_text()),
        (Section::Resume, submission.resume_text.clone()),
    ];
    sections.extend(
        submission
            .projects
            .iter()
            .enumerate()
            .map(|(i, p)| (Section::Project(i), p.embedding_text())),
    );
    sections.extend(
        submission
            .education
            .iter()
            .enumerate()
            .map(|(i, e)| (Section::EducationEntry(i), e.embedding_text())),
    );

    let skills = project_skills(&submission.projects);
    if !skills.is_empty() {
        sections.push((Section::Skills, format!("Skills: {}", skills.join(", "))));
    }
    sections
}

/// Sections embedded for a job, `overall` first. Absent or empty fields get no section.
pub fn job_sections(posting: &JobPosting) -> Vec<(Section, String)> {
    let mut sections = vec![(
        Section::Overall,
        format!("{} {}", posting.title, posting.description),
    )];

    if !posting.required_skills.is_empty() {
        sections.push((
            Section::Skills,
            format!("Required Skills: {}", posting.required_skills.join(", ")),
        ));
    }
    if let Some(experience) = posting.experience.as_deref().filter(|s| !s.is_empty()) {
        sections.push((
            Section::Experience,
            format!("Experience Required: {}", experience),
        ));
    }
    if let Some(education) = posting.education.as_deref().filter(|s| !s.is_empty()) {
        sections.push((
            Section::Education,
            format!("Education Required: {}", education),
        ));
    }
    if !posting.responsibilities.is_empty() {
        sections.push((
            Section::Responsibilities,
            format!("Responsibilities: {}", posting.responsibilities.join(". ")),
        ));
    }
    if !posting.benefits.is_empty() {
        sections.push((
            Section::Benefits,
            format!("Benefits: {}", posting.benefits.join(", ")),
        ));
    }
    sections
}

struct Indexed {
    positions: BTreeMap<String, usize>,
    overall: Vec<f32>,
}

/// Embeds submissions section by section and records them in the index and the record store.
///
/// Every vector is computed before the index is touched; the batch append is all-or-nothing.
pub struct ProfileIndexer<S> {
    index: SharedIndex,
    records: Arc<S>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl<S: RecordStore> ProfileIndexer<S> {
    pub fn new(
        index: SharedIndex,
        records: Arc<S>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> IngestResult<Self> {
        if embedder.dimension() != index.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: index.dimension(),
                actual: embedder.dimension(),
            }
            .into());
        }
        Ok(Self {
            index,
            records,
            embedder,
        })
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    pub fn records(&self) -> &Arc<S> {
        &self.records
    }

    async fn embed_and_append(
        &self,
        entity_id: &str,
        sections: Vec<(Section, String)>,
    ) -> IngestResult<Indexed> {
        let vectors = try_join_all(
            sections
                .iter()
                .map(|(_, text)| self.embedder.embed(text.as_str())),
        )
        .await?;
        debug!(entity_id, sections = vectors.len(), "Sections embedded");

        let overall = vectors.first().cloned().unwrap_or_default();
        let batch: Vec<(Vec<f32>, String)> = sections
            .iter()
            .zip(vectors)
            .map(|((section, _), vector)| {
                (vector, IndexLabel::new(entity_id, *section).to_string())
            })
            .collect();

        let positions = self.index.append_batch(&batch)?;
        let positions = sections
            .iter()
            .zip(positions)
            .map(|((section, _), position)| (section.to_string(), position))
            .collect();

        Ok(Indexed { positions, overall })
    }

    async fn persist(&self) -> IngestResult<()> {
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || index.persist())
            .await
            .map_err(|e| IngestError::Persist {
                reason: e.to_string(),
            })??;
        Ok(())
    }

    #[instrument(skip_all, fields(profile_handle = %submission.profile_handle))]
    pub async fn index_candidate(
        &self,
        submission: CandidateSubmission,
    ) -> IngestResult<CandidateRecord> {
        submission.validate()?;
        let candidate_id = short_id(CANDIDATE_PREFIX);

        let sections = candidate_sections(&submission);
        let indexed = self.embed_and_append(&candidate_id, sections).await?;

        let record = CandidateRecord {
            candidate_id: candidate_id.clone(),
            profile_handle: submission.profile_handle,
            profile_stats: submission.profile_stats,
            resume_text: submission.resume_text,
            projects: submission.projects,
            education: submission.education,
            interview_answers: submission.interview_answers,
            overall_embedding: Some(indexed.overall),
            index_positions: indexed.positions,
            created_at: Utc::now(),
        };
        self.records.put_candidate(record.clone()).await?;
        self.persist().await?;

        info!(
            candidate_id = %candidate_id,
            embeddings = record.index_positions.len(),
            "Candidate indexed"
        );
        Ok(record)
    }

    #[instrument(skip_all, fields(title = %posting.title))]
    pub async fn index_job(&self, posting: JobPosting) -> IngestResult<JobRecord> {
        posting.validate()?;
        let job_id = short_id(JOB_PREFIX);

        let sections = job_sections(&posting);
        let indexed = self.embed_and_append(&job_id, sections).await?;

        let record = JobRecord {
            job_id: job_id.clone(),
            title: posting.title,
            company: posting.company,
            location: posting.location,
            description: posting.description,
            required_skills: posting.required_skills,
            preferred_skills: posting.preferred_skills,
            experience: posting.experience,
            education: posting.education,
            responsibilities: posting.responsibilities,
            benefits: posting.benefits,
            overall_embedding: Some(indexed.overall),
            index_positions: indexed.positions,
            created_at: Utc::now(),
        };
        self.records.put_job(record.clone()).await?;
        self.persist().await?;

        info!(
            job_id = %job_id,
            embeddings = record.index_positions.len(),
            "Job indexed"
        );
        Ok(record)
    }

    /// Jobs closest to a free-text query, one entry per job, best first.
    ///
    /// Every job section takes part; a job ranks by its closest section.
    #[instrument(skip(self))]
    pub async fn search_jobs(&self, query: &str, k: usize) -> IngestResult<Vec<JobMatch>> {
        if query.trim().is_empty() {
            return Err(IngestError::InvalidSubmission {
                reason: "search query is empty".to_string(),
            });
        }
        if k == 0 || self.index.size() == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        let hits = self.index.search_labeled(&vector, self.index.size())?;

        let mut seen = HashSet::new();
        let mut best: Vec<(IndexLabel, f32)> = Vec::new();
        for hit in hits {
            let Ok(label) = hit.label.parse::<IndexLabel>() else {
                continue;
            };
            if !label.is_job() || !seen.insert(label.entity_id.clone()) {
                continue;
            }
            best.push((label, distance_similarity(hit.distance)));
            if best.len() == k {
                break;
            }
        }

        let records = Arc::clone(&self.records);
        let loaded = join_all(best.iter().map(|(label, _)| {
            let records = Arc::clone(&records);
            async move { records.get_job(&label.entity_id).await }
        }))
        .await;

        let mut matches = Vec::with_capacity(best.len());
        for ((label, similarity), result) in best.into_iter().zip(loaded) {
            let job = match result {
                Ok(Some(job)) => job,
                Ok(None) | Err(RecordStoreError::InvalidId { .. }) => {
                    warn!(job_id = %label.entity_id, "Index entry has no job record, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            matches.push(JobMatch {
                job_id: label.entity_id,
                similarity,
                matched_section: label.section.to_string(),
                job,
            });
        }

        info!(k, returned = matches.len(), "Job search complete");
        Ok(matches)
    }
}
