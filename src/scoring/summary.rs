//! Builds the bounded summaries sent to the scoring provider.

use crate::constants::SUMMARY_EXCERPT_CHARS;
use crate::records::{CandidateRecord, JobRecord};

use super::types::{CandidateSummary, JobSummary};

const MAX_PROFILE_HIGHLIGHTS: usize = 8;

/// First `max_chars` characters of `text` (char-boundary safe).
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

fn profile_highlights(stats: Option<&serde_json::Value>) -> Vec<String> {
    let Some(serde_json::Value::Object(map)) = stats else {
        return Vec::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                serde_json::Value::String(s) => excerpt(s, 64),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some(format!("{}: {}", key, rendered))
        })
        .take(MAX_PROFILE_HIGHLIGHTS)
        .collect()
}

pub fn summarize_candidate(candidate: &CandidateRecord) -> CandidateSummary {
    CandidateSummary {
        candidate_id: candidate.candidate_id.clone(),
        profile_handle: candidate.profile_handle.clone(),
        resume_excerpt: excerpt(&candidate.resume_text, SUMMARY_EXCERPT_CHARS),
        project_count: candidate.projects.len(),
        projects: candidate
            .projects
            .iter()
            .map(|p| excerpt(&format!("{}: {}", p.name, p.description), SUMMARY_EXCERPT_CHARS))
            .collect(),
        education_count: candidate.education.len(),
        education: candidate
            .education
            .iter()
            .map(|e| excerpt(&e.embedding_text(), SUMMARY_EXCERPT_CHARS))
            .collect(),
        skills: candidate.skills(),
        profile_highlights: profile_highlights(candidate.profile_stats.as_ref()),
    }
}

pub fn summarize_job(job: &JobRecord) -> JobSummary {
    JobSummary {
        job_id: job.job_id.clone(),
        title: job.title.clone(),
        company: job.company.clone(),
        description_excerpt: excerpt(&job.description, SUMMARY_EXCERPT_CHARS),
        required_skills: job.required_skills.clone(),
        experience: job.experience.clone(),
    }
}
