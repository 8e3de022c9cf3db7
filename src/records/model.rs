//! Job and candidate records as kept by a [`RecordStore`](super::RecordStore).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

impl Project {
    /// Text embedded for the `project_<n>` section.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}: {} Technologies: {}",
            self.name,
            self.description,
            self.technologies.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub field_of_study: String,
    pub institution: String,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub gpa: Option<f32>,
}

impl EducationEntry {
    /// Text embedded for the `education_<n>` section.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} in {} from {}",
            self.degree, self.field_of_study, self.institution
        )
    }
}

/// Stored job posting.
///
/// `overall_embedding` is what matching runs against; a job without it has never been embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub overall_embedding: Option<Vec<f32>>,
    /// Index position per section label suffix (e.g. `"overall"`, `"skills"`).
    #[serde(default)]
    pub index_positions: BTreeMap<String, usize>,
    pub created_at: DateTime<Utc>,
}

/// Stored candidate profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate_id: String,
    /// Handle on the third-party coding profile site.
    pub profile_handle: String,
    /// Opaque statistics fetched for `profile_handle`, if any.
    #[serde(default)]
    pub profile_stats: Option<serde_json::Value>,
    pub resume_text: String,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub interview_answers: BTreeMap<String, String>,
    #[serde(default)]
    pub overall_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub index_positions: BTreeMap<String, usize>,
    pub created_at: DateTime<Utc>,
}

/// Technologies across `projects`, deduplicated in first-seen order.
pub fn project_skills(projects: &[Project]) -> Vec<String> {
    let mut seen = Vec::new();
    for tech in projects.iter().flat_map(|p| p.technologies.iter()) {
        if !seen.contains(tech) {
            seen.push(tech.clone());
        }
    }
    seen
}

impl CandidateRecord {
    pub fn skills(&self) -> Vec<String> {
        project_skills(&self.projects)
    }
}
