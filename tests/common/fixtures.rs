//! Test fixtures for integration tests.

use std::sync::Arc;

use funnel::embedding::MockEmbedder;
use funnel::index::SharedIndex;
use funnel::ingest::{CandidateSubmission, JobPosting, ProfileIndexer};
use funnel::records::{EducationEntry, Project, RecordStore};

pub const TEST_DIM: usize = 4;

/// Unit vector along `axis`, optionally flipped.
pub fn axis(axis: usize, sign: f32) -> Vec<f32> {
    let mut v = vec![0.0; TEST_DIM];
    v[axis] = sign;
    v
}

/// Text the indexer embeds for a candidate's overall section starts with this.
pub fn overall_needle(handle: &str) -> String {
    format!("Profile Handle: {}\n", handle)
}

#[derive(Default)]
pub struct SubmissionBuilder {
    handle: Option<String>,
    resume: Option<String>,
    projects: Option<Vec<Project>>,
    education: Option<Vec<EducationEntry>>,
}

impl SubmissionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(mut self, handle: &str) -> Self {
        self.handle = Some(handle.to_string());
        self
    }

    pub fn resume(mut self, resume: &str) -> Self {
        self.resume = Some(resume.to_string());
        self
    }

    pub fn projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = Some(projects);
        self
    }

    pub fn build(self) -> CandidateSubmission {
        let handle = self.handle.unwrap_or_else(|| "someone".to_string());
        CandidateSubmission {
            resume_text: self
                .resume
                .unwrap_or_else(|| format!("{} writes software", handle)),
            projects: self.projects.unwrap_or_else(|| {
                vec![
                    sample_project(&format!("{} api", handle), &["Rust"]),
                    sample_project(&format!("{} ui", handle), &["TypeScript"]),
                ]
            }),
            education: self.education.unwrap_or_else(|| {
                vec![EducationEntry {
                    degree: "BSc".to_string(),
                    field_of_study: "Computer Science".to_string(),
                    institution: "State University".to_string(),
                    graduation_year: Some(2020),
                    gpa: None,
                }]
            }),
            interview_answers: Default::default(),
            profile_stats: None,
            profile_handle: handle,
        }
    }
}

pub fn sample_project(name: &str, techs: &[&str]) -> Project {
    Project {
        name: name.to_string(),
        description: format!("{} built end to end", name),
        repository_url: None,
        technologies: techs.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn sample_posting(title: &str) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        company: Some("Acme".to_string()),
        location: Some("Remote".to_string()),
        description: "Own the matching service".to_string(),
        required_skills: vec!["Rust".to_string()],
        preferred_skills: vec![],
        experience: Some("2+ years".to_string()),
        education: None,
        responsibilities: vec!["Ship".to_string()],
        benefits: vec!["Equity".to_string()],
    }
}

/// Indexer over `records` whose embedder maps each `(handle, vector)` overall text to `vector`.
pub fn pinned_indexer<S: RecordStore>(
    index: SharedIndex,
    records: Arc<S>,
    job_title: &str,
    job_vector: Vec<f32>,
    candidates: &[(&str, Vec<f32>)],
) -> ProfileIndexer<S> {
    let embedder = MockEmbedder::new(TEST_DIM);
    embedder.pin(format!("{} ", job_title), job_vector);
    for (handle, vector) in candidates {
        embedder.pin(overall_needle(handle), vector.clone());
    }
    ProfileIndexer::new(index, records, Arc::new(embedder)).unwrap()
}
