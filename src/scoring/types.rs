use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Bounded view of a candidate handed to the scoring provider.
pub struct CandidateSummary {
    pub candidate_id: String,
    pub profile_handle: String,
    pub resume_excerpt: String,
    pub project_count: usize,
    /// One excerpt per project, `name: description`.
    pub projects: Vec<String>,
    pub education_count: usize,
    pub education: Vec<String>,
    pub skills: Vec<String>,
    /// `key: value` lines lifted from the profile statistics.
    pub profile_highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Bounded view of a job handed to the scoring provider.
pub struct JobSummary {
    pub job_id: String,
    pub title: String,
    pub company: Option<String>,
    pub description_excerpt: String,
    pub required_skills: Vec<String>,
    pub experience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// What the scoring provider concluded about one candidate/job pair.
pub struct ScoringVerdict {
    /// Raw score on a 0-100 scale (not yet clamped).
    pub score: f32,
    pub recommendation: String,
    pub rationale: String,
    /// Whether the candidate should move on to the next round.
    pub advance: bool,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
}

impl ScoringVerdict {
    /// Score mapped onto `[0, 1]`.
    pub fn normalized_score(&self) -> f32 {
        if self.score.is_nan() {
            return 0.0;
        }
        self.score.clamp(0.0, 100.0) / 100.0
    }
}
