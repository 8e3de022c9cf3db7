//! Structured [`JobPosting`]s from free-form job descriptions.
//!
//! With an API endpoint the text goes through an OpenAI-compatible chat model in JSON mode.
//! Keyword rules fill whatever the model leaves out, and take over completely when the call
//! fails or no endpoint is configured.

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::config::ApiEndpoint;

use super::error::{IngestError, IngestResult};
use super::types::JobPosting;

const SYSTEM_PROMPT: &str = "You are an expert at extracting structured information from job descriptions. Always return valid JSON.";
const TEMPERATURE: f32 = 0.3;

/// Technologies recognised by the rule-based parser, in reporting order.
pub const KNOWN_SKILLS: &[&str] = &[
    "Python",
    "Java",
    "JavaScript",
    "TypeScript",
    "C++",
    "C#",
    "Go",
    "Rust",
    "Ruby",
    "PHP",
    "Swift",
    "Kotlin",
    "React",
    "Angular",
    "Vue",
    "Node.js",
    "Django",
    "Flask",
    "FastAPI",
    "Spring",
    "Express",
    "MongoDB",
    "PostgreSQL",
    "MySQL",
    "Redis",
    "Elasticsearch",
    "DynamoDB",
    "AWS",
    "Azure",
    "GCP",
    "Docker",
    "Kubernetes",
    "Jenkins",
    "CI/CD",
    "Git",
    "GitHub",
    "GitLab",
    "Jira",
    "Agile",
    "Scrum",
];

const EDUCATION_MARKERS: &[&str] = &[
    "bachelor", "master", "phd", "doctorate", "mba", "bs in", "ms in", "bsc", "msc",
];

const TITLE_KEYS: &[&str] = &["title", "job title", "position", "role"];

/// Longest text before a `:` still read as a field name or heading.
const MAX_KEY_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Other,
    Required,
    Preferred,
    Responsibilities,
    Benefits,
}

fn classify_heading(key: &str) -> Block {
    let key = key.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| key.contains(n));

    if has(&["preferred", "nice to have", "bonus"]) {
        Block::Preferred
    } else if has(&["responsibilit", "what you'll do", "what you will do", "duties"]) {
        Block::Responsibilities
    } else if has(&["benefit", "perks", "we offer"]) {
        Block::Benefits
    } else if has(&["requirement", "qualification", "required", "skills", "must have"]) {
        Block::Required
    } else {
        Block::Other
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// First index of `term` in `haystack` that starts a word.
fn find_word_start(haystack: &str, term: &str) -> Option<usize> {
    haystack
        .match_indices(term)
        .map(|(at, _)| at)
        .find(|&at| !haystack[..at].chars().next_back().is_some_and(is_word_char))
}

/// Whether `term` appears in `haystack` as a whole word. Both sides must already be lowercase.
fn mentions(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + term.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    let item = item.trim();
    if !item.is_empty() && !list.iter().any(|s| s.eq_ignore_ascii_case(item)) {
        list.push(item.to_string());
    }
}

fn known_skills_in(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KNOWN_SKILLS
        .iter()
        .filter(|skill| mentions(&lower, &skill.to_lowercase()))
        .map(|skill| skill.to_string())
        .collect()
}

/// End of an `N[+-] [to|-] [M] years|yrs` phrase starting at `start`, if there is one.
fn match_experience(bytes: &[u8], start: usize) -> Option<usize> {
    let skip_digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let skip_spaces = |mut i: usize| {
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        i
    };

    let mut i = skip_spaces(skip_digits(start));
    if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
        i = skip_spaces(i + 1);
    }
    if bytes[i..].starts_with(b"to ") {
        i = skip_spaces(i + 2);
    }
    i = skip_spaces(skip_digits(i));
    if i < bytes.len() && bytes[i] == b'+' {
        i = skip_spaces(i + 1);
    }

    [
        b"years".as_slice(),
        b"year".as_slice(),
        b"yrs".as_slice(),
        b"yr".as_slice(),
    ]
        .into_iter()
        .find(|unit| bytes[i..].starts_with(unit))
        .map(|unit| i + unit.len())
        .filter(|&end| end == bytes.len() || !bytes[end].is_ascii_alphanumeric())
}

/// First years-of-experience phrase, e.g. `5+ years` or `3 to 5 yrs`.
pub fn find_experience(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    (0..bytes.len())
        .filter(|&i| bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_alphanumeric()))
        .find_map(|start| match_experience(bytes, start).map(|end| text[start..end].to_string()))
}

/// First degree requirement, up to the end of its sentence.
pub fn find_education(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = EDUCATION_MARKERS
        .iter()
        .filter_map(|marker| find_word_start(&lower, marker))
        .min()?;
    let rest = &text[start..];
    let end = rest.find(['.', ';', '\n']).unwrap_or(rest.len());
    let phrase = rest[..end].trim();
    (!phrase.is_empty()).then(|| phrase.to_string())
}

fn bullet_item(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix(|c: char| matches!(c, '-' | '*' | '•')) {
        return rest.trim();
    }
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0
        && let Some(rest) = line[digits..].strip_prefix(|c: char| c == '.' || c == ')')
    {
        return rest.trim();
    }
    line
}

/// Splits `Key: value` lines. Returns `None` for plain content lines.
fn split_key(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim().trim_start_matches('#').trim();
    if key.is_empty() || key.chars().count() > MAX_KEY_CHARS || value.starts_with("//") {
        return None;
    }
    Some((key, value.trim()))
}

/// Keyword-based extraction, used when no chat model is available or it fails.
pub fn parse_with_rules(raw: &str) -> JobPosting {
    let mut title = None;
    let mut fallback_title = None;
    let mut company = None;
    let mut location = None;
    let mut required_skills = Vec::new();
    let mut preferred_skills = Vec::new();
    let mut responsibilities = Vec::new();
    let mut benefits = Vec::new();
    let mut required_text = String::new();
    let mut preferred_text = String::new();
    let mut block = Block::Other;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if fallback_title.is_none() {
            fallback_title = Some(line.trim_start_matches('#').trim().to_string());
        }

        let markdown_heading = line.starts_with('#');
        let mut line_block = block;
        match split_key(line) {
            Some((key, value)) => {
                let lower = key.to_lowercase();
                if TITLE_KEYS.contains(&lower.as_str()) && !value.is_empty() {
                    title.get_or_insert_with(|| value.to_string());
                } else if lower == "company" && !value.is_empty() {
                    company.get_or_insert_with(|| value.to_string());
                } else if lower == "location" && !value.is_empty() {
                    location.get_or_insert_with(|| value.to_string());
                } else {
                    let heading = classify_heading(key);
                    if value.is_empty() {
                        block = heading;
                    } else if heading != Block::Other {
                        // An inline list is complete on its own line.
                        block = Block::Other;
                    }
                    if heading != Block::Other {
                        line_block = heading;
                    }
                    match heading {
                        Block::Required => {
                            value.split(',').for_each(|s| push_unique(&mut required_skills, s))
                        }
                        Block::Preferred => {
                            value.split(',').for_each(|s| push_unique(&mut preferred_skills, s))
                        }
                        Block::Benefits => value.split(',').for_each(|s| push_unique(&mut benefits, s)),
                        Block::Responsibilities => push_unique(&mut responsibilities, value),
                        Block::Other => {}
                    }
                }
            }
            None if markdown_heading => {
                block = classify_heading(line.trim_start_matches('#'));
                continue;
            }
            None => match block {
                Block::Responsibilities => push_unique(&mut responsibilities, bullet_item(line)),
                Block::Benefits => push_unique(&mut benefits, bullet_item(line)),
                _ => {}
            },
        }

        let sink = if line_block == Block::Preferred {
            &mut preferred_text
        } else {
            &mut required_text
        };
        sink.push_str(line);
        sink.push('\n');
    }

    for skill in known_skills_in(&required_text) {
        push_unique(&mut required_skills, &skill);
    }
    for skill in known_skills_in(&preferred_text) {
        if !required_skills.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
            push_unique(&mut preferred_skills, &skill);
        }
    }

    JobPosting {
        title: title.or(fallback_title).unwrap_or_default(),
        company,
        location,
        description: raw.trim().to_string(),
        required_skills,
        preferred_skills,
        experience: find_experience(raw),
        education: find_education(raw),
        responsibilities,
        benefits,
    }
}

/// Fields as the model is asked to emit them. Anything missing falls back to the rules.
#[derive(Debug, Default, Deserialize)]
struct ExtractedFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    required_skills: Vec<String>,
    #[serde(default)]
    preferred_skills: Vec<String>,
    #[serde(default, alias = "experience")]
    experience_years: Option<Value>,
    #[serde(default)]
    education: Option<Value>,
    #[serde(default)]
    responsibilities: Vec<String>,
    #[serde(default)]
    benefits: Vec<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Models return numbers or lists where text is expected often enough to accept them.
fn value_text(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    non_empty(Some(text))
}

fn list_or(items: Vec<String>, fallback: Vec<String>) -> Vec<String> {
    let mut cleaned = Vec::new();
    for item in &items {
        push_unique(&mut cleaned, item);
    }
    if cleaned.is_empty() { fallback } else { cleaned }
}

impl ExtractedFields {
    fn overlay(self, rules: JobPosting) -> JobPosting {
        JobPosting {
            title: non_empty(self.title).unwrap_or(rules.title),
            company: non_empty(self.company).or(rules.company),
            location: non_empty(self.location).or(rules.location),
            description: rules.description,
            required_skills: list_or(self.required_skills, rules.required_skills),
            preferred_skills: list_or(self.preferred_skills, rules.preferred_skills),
            experience: value_text(self.experience_years).or(rules.experience),
            education: value_text(self.education).or(rules.education),
            responsibilities: list_or(self.responsibilities, rules.responsibilities),
            benefits: list_or(self.benefits, rules.benefits),
        }
    }
}

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

fn render_prompt(description: &str) -> String {
    format!(
        "Extract the following information from the job description below. \
         Return the data as a valid JSON object.\n\n\
         Required fields:\n\
         - title: Job title\n\
         - company: Company name (if mentioned)\n\
         - location: Job location (if mentioned)\n\
         - required_skills: List of required skills\n\
         - preferred_skills: List of preferred/nice-to-have skills\n\
         - experience_years: Required years of experience (e.g. \"3-5 years\", \"5+\")\n\
         - education: Education requirements\n\
         - responsibilities: List of main responsibilities\n\
         - benefits: List of benefits offered\n\n\
         Job Description:\n{}\n\n\
         Return only the JSON object, no additional text.",
        description
    )
}

struct ChatExtractor {
    http: HttpClient,
    endpoint: ApiEndpoint,
    model: String,
}

impl ChatExtractor {
    async fn extract(&self, description: &str) -> IngestResult<ExtractedFields> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": render_prompt(description)},
            ],
            "temperature": TEMPERATURE,
            "response_format": {"type": "json_object"},
        });

        let parser_error = |reason: String| IngestError::Parser { reason };

        let resp = self
            .http
            .post(self.endpoint.url("chat/completions"))
            .bearer_auth(&self.endpoint.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| parser_error(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(parser_error(format!(
                "chat endpoint returned {}",
                resp.status()
            )));
        }

        let body: ChatResponse = resp.json().await.map_err(|e| parser_error(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| parser_error("response contained no message content".to_string()))?;

        serde_json::from_str(content.trim())
            .map_err(|e| parser_error(format!("extraction is not a JSON object: {}", e)))
    }
}

/// Turns raw job description text into a [`JobPosting`] ready for indexing.
pub struct JobDescriptionParser {
    chat: Option<ChatExtractor>,
}

impl JobDescriptionParser {
    /// Parser that never leaves the process.
    pub fn rules_only() -> Self {
        Self { chat: None }
    }

    pub fn with_llm(endpoint: ApiEndpoint, model: impl Into<String>) -> IngestResult<Self> {
        let http = HttpClient::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| IngestError::Parser {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            chat: Some(ChatExtractor {
                http,
                endpoint,
                model: model.into(),
            }),
        })
    }

    pub fn uses_llm(&self) -> bool {
        self.chat.is_some()
    }

    #[instrument(skip_all, fields(chars = raw.len()))]
    pub async fn parse(&self, raw: &str) -> IngestResult<JobPosting> {
        if raw.trim().is_empty() {
            return Err(IngestError::InvalidSubmission {
                reason: "job description is empty".to_string(),
            });
        }

        let rules = parse_with_rules(raw);
        let (posting, source) = match &self.chat {
            Some(chat) => match chat.extract(raw).await {
                Ok(fields) => (fields.overlay(rules), "llm"),
                Err(e) => {
                    warn!(error = %e, "Chat extraction failed, using rule-based parsing");
                    (rules, "rules")
                }
            },
            None => {
                debug!("No chat endpoint, using rule-based parsing");
                (rules, "rules")
            }
        };

        info!(
            source,
            title = %posting.title,
            required_skills = posting.required_skills.len(),
            "Job description parsed"
        );
        Ok(posting)
    }
}
