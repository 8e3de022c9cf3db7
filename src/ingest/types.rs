use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{EducationEntry, JobRecord, Project};

use super::error::{IngestError, IngestResult};

/// Minimum projects a candidate must submit.
pub const MIN_PROJECTS: usize = 2;
/// Minimum education entries a candidate must submit.
pub const MIN_EDUCATION: usize = 1;

/// A candidate profile as submitted, before ids and embeddings are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSubmission {
    pub profile_handle: String,
    pub resume_text: String,
    pub projects: Vec<Project>,
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub interview_answers: BTreeMap<String, String>,
    #[serde(default)]
    pub profile_stats: Option<serde_json::Value>,
}

impl CandidateSubmission {
    pub fn validate(&self) -> IngestResult<()> {
        if self.projects.len() < MIN_PROJECTS {
            return Err(IngestError::InvalidSubmission {
                reason: format!(
                    "at least {} projects required, got {}",
                    MIN_PROJECTS,
                    self.projects.len()
                ),
            });
        }
        if self.education.len() < MIN_EDUCATION {
            return Err(IngestError::InvalidSubmission {
                reason: "at least one education entry required".to_string(),
            });
        }
        Ok(())
    }

    /// Text for the `overall` section.
    pub fn overall_text(&self) -> String {
        format!(
            "Profile Handle: {}\nResume: {}\nProjects: {}\n",
            self.profile_handle,
            self.resume_text,
            self.projects.len()
        )
    }
}

/// A job posting as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
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
}

impl JobPosting {
    pub fn validate(&self) -> IngestResult<()> {
        if self.title.trim().is_empty() {
            return Err(IngestError::InvalidSubmission {
                reason: "job title is empty".to_string(),
            });
        }
        if self.description.trim().is_empty() {
            return Err(IngestError::InvalidSubmission {
                reason: "job description is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// One job returned by a free-text job search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMatch {
    pub job_id: String,
    /// `1 / (1 + d)` over the closest matching section.
    pub similarity: f32,
    /// Section label of the closest hit, e.g. `skills`.
    pub matched_section: String,
    pub job: JobRecord,
}
