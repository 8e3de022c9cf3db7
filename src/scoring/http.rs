use std::fmt::Write as _;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::error::ScoringError;
use super::types::{CandidateSummary, JobSummary, ScoringVerdict};
use super::ScoringProvider;
use crate::config::ApiEndpoint;

const SYSTEM_PROMPT: &str = "You are an expert technical recruiter. Provide objective, fair evaluations. Always return valid JSON.";
const TEMPERATURE: f32 = 0.3;
const DEFAULT_RECOMMENDATION: &str = "Not Recommended";

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Verdict as the model is asked to emit it.
#[derive(Debug, Serialize, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    final_score: f32,
    #[serde(default = "default_recommendation")]
    recommendation: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    proceed_to_oa: bool,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
}

fn default_recommendation() -> String {
    DEFAULT_RECOMMENDATION.to_string()
}

impl From<RawVerdict> for ScoringVerdict {
    fn from(raw: RawVerdict) -> Self {
        Self {
            score: raw.final_score,
            recommendation: raw.recommendation,
            rationale: raw.reasoning,
            advance: raw.proceed_to_oa,
            strengths: raw.strengths,
            concerns: raw.concerns,
        }
    }
}

/// Renders the evaluation prompt for one candidate/job pair.
pub fn render_prompt(candidate: &CandidateSummary, job: &JobSummary, similarity: f32) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are an expert technical recruiter. Evaluate the following candidate for the job position.\n"
    );

    let _ = writeln!(prompt, "JOB DETAILS:");
    let _ = writeln!(prompt, "- Title: {}", job.title);
    let _ = writeln!(
        prompt,
        "- Company: {}",
        job.company.as_deref().unwrap_or("N/A")
    );
    let _ = writeln!(prompt, "- Description: {}", job.description_excerpt);
    if !job.required_skills.is_empty() {
        let _ = writeln!(prompt, "- Required Skills: {}", job.required_skills.join(", "));
    }
    if let Some(experience) = &job.experience {
        let _ = writeln!(prompt, "- Experience: {}", experience);
    }

    let _ = writeln!(prompt, "\nCANDIDATE PROFILE:");
    let _ = writeln!(prompt, "- Profile Handle: {}", candidate.profile_handle);
    let _ = writeln!(prompt, "- Resume Summary: {}", candidate.resume_excerpt);
    let _ = writeln!(prompt, "- Projects: {} projects", candidate.project_count);
    for project in &candidate.projects {
        let _ = writeln!(prompt, "  * {}", project);
    }
    let _ = writeln!(prompt, "- Education: {} degrees", candidate.education_count);
    for entry in &candidate.education {
        let _ = writeln!(prompt, "  * {}", entry);
    }
    if !candidate.skills.is_empty() {
        let _ = writeln!(prompt, "- Skills: {}", candidate.skills.join(", "));
    }
    if !candidate.profile_highlights.is_empty() {
        let _ = writeln!(
            prompt,
            "- Coding Profile: {}",
            candidate.profile_highlights.join("; ")
        );
    }

    let _ = writeln!(prompt, "\nInitial Similarity Score: {:.2}\n", similarity);
    let _ = writeln!(
        prompt,
        "TASK:\nEvaluate this candidate for the job. Provide:\n\
         1. A final score (0-100)\n\
         2. A recommendation (Highly Recommended / Recommended / Consider / Not Recommended)\n\
         3. Brief reasoning (2-3 sentences)\n\
         4. Whether they should proceed to the next round (true/false)\n"
    );
    let _ = write!(
        prompt,
        "Return ONLY a valid JSON object with these fields:\n\
         {{\"final_score\": <number 0-100>, \"recommendation\": \"<string>\", \
         \"reasoning\": \"<string>\", \"proceed_to_oa\": <boolean>, \
         \"strengths\": [\"<string>\"], \"concerns\": [\"<string>\"]}}"
    );
    prompt
}

/// Parses the JSON object the model returned as message content.
pub fn parse_verdict(content: &str) -> Result<ScoringVerdict, ScoringError> {
    let raw: RawVerdict =
        serde_json::from_str(content.trim()).map_err(|e| ScoringError::MalformedResponse {
            reason: format!("verdict is not a JSON object: {}", e),
        })?;
    if !raw.final_score.is_finite() {
        return Err(ScoringError::MalformedResponse {
            reason: "final_score is not a finite number".to_string(),
        });
    }
    Ok(raw.into())
}

/// Scorer backed by an OpenAI-compatible `POST {base_url}/chat/completions` endpoint in JSON mode.
pub struct ChatCompletionScorer {
    http: HttpClient,
    endpoint: ApiEndpoint,
    model: String,
}

impl ChatCompletionScorer {
    pub fn new(endpoint: ApiEndpoint, model: impl Into<String>) -> Result<Self, ScoringError> {
        let http = HttpClient::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| ScoringError::InvalidConfig {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            http,
            endpoint,
            model: model.into(),
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> ScoringError {
        if err.is_timeout() {
            ScoringError::Timeout {
                timeout: self.endpoint.timeout,
            }
        } else {
            ScoringError::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ScoringProvider for ChatCompletionScorer {
    #[instrument(skip_all, fields(candidate_id = %candidate.candidate_id, job_id = %job.job_id))]
    async fn score(
        &self,
        candidate: &CandidateSummary,
        job: &JobSummary,
        similarity: f32,
    ) -> Result<ScoringVerdict, ScoringError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": render_prompt(candidate, job, similarity)},
            ],
            "temperature": TEMPERATURE,
            "response_format": {"type": "json_object"},
        });

        let resp = self
            .http
            .post(self.endpoint.url("chat/completions"))
            .bearer_auth(&self.endpoint.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !resp.status().is_success() {
            return Err(ScoringError::Unavailable {
                reason: format!("chat endpoint returned {}", resp.status()),
            });
        }

        let body: ChatResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_transport(e)
            } else {
                ScoringError::MalformedResponse {
                    reason: e.to_string(),
                }
            }
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ScoringError::MalformedResponse {
                reason: "response contained no message content".to_string(),
            })?;

        let verdict = parse_verdict(&content)?;
        debug!(
            score = verdict.score,
            recommendation = %verdict.recommendation,
            advance = verdict.advance,
            "Scoring verdict received"
        );
        Ok(verdict)
    }
}
