use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use super::parser::find_experience;
use super::*;
use crate::config::ApiEndpoint;
use crate::embedding::{EmbeddingError, MockEmbedder};
use crate::index::{IndexLabel, Section, SharedIndex};
use crate::records::{EducationEntry, InMemoryRecordStore, Project, RecordStore};
use crate::test_http::serve_once;

const TEST_DIM: usize = 8;

fn project(name: &str, techs: &[&str]) -> Project {
    Project {
        name: name.to_string(),
        description: format!("{} description", name),
        repository_url: None,
        technologies: techs.iter().map(|t| t.to_string()).collect(),
    }
}

fn create_test_submission() -> CandidateSubmission {
    CandidateSubmission {
        profile_handle: "jdoe".to_string(),
        resume_text: "Backend engineer with five years of Rust".to_string(),
        projects: vec![
            project("Pipeline", &["Rust", "Tokio"]),
            project("Dashboard", &["React", "Rust"]),
        ],
        education: vec![EducationEntry {
            degree: "BSc".to_string(),
            field_of_study: "Computer Science".to_string(),
            institution: "State University".to_string(),
            graduation_year: Some(2019),
            gpa: None,
        }],
        interview_answers: Default::default(),
        profile_stats: None,
    }
}

fn create_test_posting() -> JobPosting {
    JobPosting {
        title: "Rust Engineer".to_string(),
        company: Some("Acme".to_string()),
        location: None,
        description: "Build distributed systems".to_string(),
        required_skills: vec!["Rust".to_string(), "SQL".to_string()],
        preferred_skills: vec![],
        experience: Some("3+ years".to_string()),
        education: None,
        responsibilities: vec!["Ship features".to_string(), "Review code".to_string()],
        benefits: vec![],
    }
}

fn indexer(
    embedder: MockEmbedder,
) -> (ProfileIndexer<InMemoryRecordStore>, Arc<InMemoryRecordStore>) {
    let store = Arc::new(InMemoryRecordStore::new());
    let indexer = ProfileIndexer::new(
        SharedIndex::in_memory(TEST_DIM).unwrap(),
        Arc::clone(&store),
        Arc::new(embedder),
    )
    .unwrap();
    (indexer, store)
}

#[test]
fn test_candidate_sections() {
    let sections = candidate_sections(&create_test_submission());
    let names: Vec<String> = sections.iter().map(|(s, _)| s.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "overall",
            "resume",
            "project_0",
            "project_1",
            "education_0",
            "skills"
        ]
    );
    assert_eq!(
        sections[0].1,
        "Profile Handle: jdoe\nResume: Backend engineer with five years of Rust\nProjects: 2\n"
    );
    assert_eq!(
        sections[2].1,
        "Pipeline: Pipeline description Technologies: Rust, Tokio"
    );
    assert_eq!(
        sections[4].1,
        "BSc in Computer Science from State University"
    );
    assert_eq!(sections[5].1, "Skills: Rust, Tokio, React");
}

#[test]
fn test_candidate_sections_without_technologies_has_no_skills() {
    let mut submission = create_test_submission();
    for p in &mut submission.projects {
        p.technologies.clear();
    }
    let sections = candidate_sections(&submission);
    assert!(sections.iter().all(|(s, _)| *s != Section::Skills));
}

#[test]
fn test_job_sections() {
    let sections = job_sections(&create_test_posting());
    let rendered: Vec<(String, &str)> = sections
        .iter()
        .map(|(s, t)| (s.to_string(), t.as_str()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            (
                "overall".to_string(),
                "Rust Engineer Build distributed systems"
            ),
            ("skills".to_string(), "Required Skills: Rust, SQL"),
            ("experience".to_string(), "Experience Required: 3+ years"),
            (
                "responsibilities".to_string(),
                "Responsibilities: Ship features. Review code"
            ),
        ]
    );
}

#[test]
fn test_submission_validation() {
    let mut submission = create_test_submission();
    submission.projects.truncate(1);
    assert!(matches!(
        submission.validate(),
        Err(IngestError::InvalidSubmission { .. })
    ));

    let mut submission = create_test_submission();
    submission.education.clear();
    assert!(submission.validate().is_err());

    let mut posting = create_test_posting();
    posting.title = "  ".to_string();
    assert!(posting.validate().is_err());

    let mut posting = create_test_posting();
    posting.description.clear();
    assert!(posting.validate().is_err());
}

#[test]
fn test_indexer_rejects_dimension_mismatch() {
    let result = ProfileIndexer::new(
        SharedIndex::in_memory(TEST_DIM).unwrap(),
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(MockEmbedder::new(TEST_DIM + 1)),
    );
    assert!(matches!(result, Err(IngestError::Index(_))));
}

#[tokio::test]
async fn test_index_candidate() {
    let (indexer, store) = indexer(MockEmbedder::new(TEST_DIM));

    let record = indexer
        .index_candidate(create_test_submission())
        .await
        .unwrap();

    assert!(record.candidate_id.starts_with("candidate_"));
    assert_eq!(record.candidate_id.len(), "candidate_".len() + 8);
    assert_eq!(indexer.index().size(), 6);
    assert_eq!(record.index_positions.len(), 6);
    assert_eq!(record.overall_embedding.as_ref().map(Vec::len), Some(TEST_DIM));

    let overall = record.index_positions["overall"];
    let label: IndexLabel = indexer
        .index()
        .label_of(overall)
        .unwrap()
        .parse()
        .unwrap();
    assert!(label.is_candidate_overall());
    assert_eq!(label.entity_id, record.candidate_id);

    let stored = store
        .get_candidate(&record.candidate_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, record);
}

#[tokio::test]
async fn test_skills_section_matches_stored_record_skills() {
    let (indexer, _store) = indexer(MockEmbedder::new(TEST_DIM));
    let submission = create_test_submission();
    let skills_text = candidate_sections(&submission)
        .into_iter()
        .find(|(s, _)| *s == Section::Skills)
        .map(|(_, text)| text)
        .unwrap();

    let record = indexer.index_candidate(submission).await.unwrap();
    assert_eq!(record.skills(), vec!["Rust", "Tokio", "React"]);
    assert_eq!(skills_text, format!("Skills: {}", record.skills().join(", ")));
}

#[tokio::test]
async fn test_index_job() {
    let (indexer, store) = indexer(MockEmbedder::new(TEST_DIM));

    let record = indexer.index_job(create_test_posting()).await.unwrap();

    assert!(record.job_id.starts_with("job_"));
    assert_eq!(indexer.index().size(), 4);
    assert!(record.index_positions.contains_key("overall"));
    assert!(record.index_positions.contains_key("experience"));
    assert!(!record.index_positions.contains_key("benefits"));
    assert!(store.get_job(&record.job_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_embedding_failure_leaves_index_untouched() {
    let embedder = MockEmbedder::new(TEST_DIM);
    embedder.fail_when_contains("Dashboard");
    let (indexer, store) = indexer(embedder);

    let result = indexer.index_candidate(create_test_submission()).await;

    assert!(matches!(
        result,
        Err(IngestError::Embedding(EmbeddingError::Unavailable { .. }))
    ));
    assert_eq!(indexer.index().size(), 0);
    assert_eq!(store.candidate_count(), 0);
}

#[tokio::test]
async fn test_invalid_submission_embeds_nothing() {
    let embedder = MockEmbedder::new(TEST_DIM);
    let (indexer, _) = indexer(embedder.clone());
    let mut submission = create_test_submission();
    submission.projects.truncate(1);

    assert!(indexer.index_candidate(submission).await.is_err());
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_indexing_persists_the_index() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(InMemoryRecordStore::new());
    let indexer = ProfileIndexer::new(
        SharedIndex::open(dir.path(), TEST_DIM).unwrap(),
        Arc::clone(&store),
        Arc::new(MockEmbedder::new(TEST_DIM)),
    )
    .unwrap();

    indexer.index_job(create_test_posting()).await.unwrap();
    indexer
        .index_candidate(create_test_submission())
        .await
        .unwrap();

    let reopened = SharedIndex::open(dir.path(), TEST_DIM).unwrap();
    assert_eq!(reopened.size(), 10);
    assert_eq!(reopened.snapshot(), indexer.index().snapshot());
}

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; TEST_DIM];
    v[i] = 1.0;
    v
}

fn marketing_posting() -> JobPosting {
    JobPosting {
        title: "Marketing Lead".to_string(),
        description: "Design marketing campaigns".to_string(),
        required_skills: vec![],
        experience: None,
        responsibilities: vec![],
        ..create_test_posting()
    }
}

#[tokio::test]
async fn test_search_jobs_returns_each_job_once_and_never_candidates() {
    let embedder = MockEmbedder::new(TEST_DIM);
    embedder.pin("Build distributed systems", axis(0));
    embedder.pin("Design marketing campaigns", axis(1));
    embedder.pin("Profile Handle: jdoe", axis(0));
    let (indexer, _store) = indexer(embedder);

    let rust_job = indexer.index_job(create_test_posting()).await.unwrap();
    let marketing_job = indexer.index_job(marketing_posting()).await.unwrap();
    indexer
        .index_candidate(create_test_submission())
        .await
        .unwrap();

    let found = indexer
        .search_jobs("Build distributed systems", 5)
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].job_id, rust_job.job_id);
    assert_eq!(found[0].matched_section, "overall");
    assert!((found[0].similarity - 1.0).abs() < 1e-6);
    assert_eq!(found[0].job, rust_job);
    assert_eq!(found[1].job_id, marketing_job.job_id);
    assert!(found[1].similarity < found[0].similarity);

    let top = indexer
        .search_jobs("Build distributed systems", 1)
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].job_id, rust_job.job_id);
}

#[tokio::test]
async fn test_search_jobs_skips_entries_without_records() {
    let embedder = MockEmbedder::new(TEST_DIM);
    embedder.pin("Build distributed systems", axis(0));
    let (indexer, _store) = indexer(embedder);

    indexer.index().append(&axis(0), "job_ghost_overall").unwrap();
    let job = indexer.index_job(create_test_posting()).await.unwrap();

    let found = indexer
        .search_jobs("Build distributed systems", 5)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].job_id, job.job_id);
}

#[tokio::test]
async fn test_search_jobs_edge_cases() {
    let embedder = MockEmbedder::new(TEST_DIM);
    let (indexer, _) = indexer(embedder.clone());

    assert!(indexer.search_jobs("anything", 5).await.unwrap().is_empty());
    assert_eq!(embedder.call_count(), 0);

    indexer.index_job(create_test_posting()).await.unwrap();
    assert!(indexer.search_jobs("anything", 0).await.unwrap().is_empty());
    assert!(matches!(
        indexer.search_jobs("   ", 5).await,
        Err(IngestError::InvalidSubmission { .. })
    ));
}

// --- job description parsing ---

const RAW_DESCRIPTION: &str = "Senior Rust Engineer
Company: Acme Robotics
Location: Remote (EU)

We build fleet software in Rust and Python on AWS.

Requirements:
- 5+ years of backend experience
- Strong Rust and PostgreSQL skills
- Bachelor's degree in Computer Science or equivalent

Nice to have:
- Kubernetes and Terraform
- Experience with Python tooling

Responsibilities:
- Design the telemetry pipeline
- Review code

Benefits:
- Remote-first team
- Learning budget
";

fn test_endpoint(base_url: String) -> ApiEndpoint {
    ApiEndpoint {
        base_url,
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn chat_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[test]
fn test_rules_parse_structured_description() {
    let posting = parse_with_rules(RAW_DESCRIPTION);

    assert_eq!(posting.title, "Senior Rust Engineer");
    assert_eq!(posting.company.as_deref(), Some("Acme Robotics"));
    assert_eq!(posting.location.as_deref(), Some("Remote (EU)"));
    assert_eq!(posting.description, RAW_DESCRIPTION.trim());
    assert_eq!(
        posting.required_skills,
        vec!["Python", "Rust", "PostgreSQL", "AWS"]
    );
    assert_eq!(posting.preferred_skills, vec!["Kubernetes"]);
    assert_eq!(posting.experience.as_deref(), Some("5+ years"));
    assert_eq!(
        posting.education.as_deref(),
        Some("Bachelor's degree in Computer Science or equivalent")
    );
    assert_eq!(
        posting.responsibilities,
        vec!["Design the telemetry pipeline", "Review code"]
    );
    assert_eq!(posting.benefits, vec!["Remote-first team", "Learning budget"]);
    assert!(posting.validate().is_ok());
}

#[test]
fn test_rules_inline_lists_and_title_field() {
    let posting = parse_with_rules(
        "Job Title: Data Engineer\nRequired Skills: SQL, Airflow\nBenefits: Health, Dental\nBuild pipelines.",
    );
    assert_eq!(posting.title, "Data Engineer");
    assert_eq!(posting.required_skills, vec!["SQL", "Airflow"]);
    assert_eq!(posting.benefits, vec!["Health", "Dental"]);
    assert!(posting.experience.is_none());
    assert!(posting.education.is_none());
}

#[test]
fn test_rules_skill_matching_respects_word_boundaries() {
    let posting = parse_with_rules("Frontend role\nWe use JavaScript, GitHub and Node.js daily.");
    assert_eq!(posting.required_skills, vec!["JavaScript", "Node.js", "GitHub"]);
}

#[test]
fn test_experience_phrases() {
    assert_eq!(find_experience("needs 3-5 years").as_deref(), Some("3-5 years"));
    assert_eq!(
        find_experience("at least 3 to 5 yrs of Go").as_deref(),
        Some("3 to 5 yrs")
    );
    assert_eq!(find_experience("10+ Years in fintech").as_deref(), Some("10+ Years"));
    assert_eq!(find_experience("founded in 2020, 40 people"), None);
    assert_eq!(find_experience("B2B yearly plans"), None);
}

#[tokio::test]
async fn test_parser_without_endpoint_uses_rules() {
    let parser = JobDescriptionParser::rules_only();
    assert!(!parser.uses_llm());
    let posting = parser.parse(RAW_DESCRIPTION).await.unwrap();
    assert_eq!(posting, parse_with_rules(RAW_DESCRIPTION));

    assert!(matches!(
        parser.parse("  \n ").await,
        Err(IngestError::InvalidSubmission { .. })
    ));
}

#[tokio::test]
async fn test_parser_llm_fields_fill_gaps_from_rules() {
    let content = r#"{"title": "Staff Rust Engineer", "company": "Acme", "required_skills": ["Rust", "Tokio"], "experience_years": 5, "benefits": []}"#;
    let (base_url, server) = serve_once(200, chat_body(content), Duration::ZERO).await;
    let parser = JobDescriptionParser::with_llm(test_endpoint(base_url), "m").unwrap();
    assert!(parser.uses_llm());

    let posting = parser.parse(RAW_DESCRIPTION).await.unwrap();
    assert_eq!(posting.title, "Staff Rust Engineer");
    assert_eq!(posting.company.as_deref(), Some("Acme"));
    assert_eq!(posting.location.as_deref(), Some("Remote (EU)"));
    assert_eq!(posting.required_skills, vec!["Rust", "Tokio"]);
    assert_eq!(posting.preferred_skills, vec!["Kubernetes"]);
    assert_eq!(posting.experience.as_deref(), Some("5"));
    assert_eq!(posting.benefits, vec!["Remote-first team", "Learning budget"]);
    assert_eq!(posting.description, RAW_DESCRIPTION.trim());

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /chat/completions"));
    assert!(request.contains("\"response_format\":{\"type\":\"json_object\"}"));
    assert!(request.contains("Senior Rust Engineer"));
}

#[tokio::test]
async fn test_parser_falls_back_to_rules_on_endpoint_failure() {
    let (base_url, _server) = serve_once(500, "{}".to_string(), Duration::ZERO).await;
    let parser = JobDescriptionParser::with_llm(test_endpoint(base_url), "m").unwrap();
    let posting = parser.parse(RAW_DESCRIPTION).await.unwrap();
    assert_eq!(posting, parse_with_rules(RAW_DESCRIPTION));

    let (base_url, _server) = serve_once(200, chat_body("not json"), Duration::ZERO).await;
    let parser = JobDescriptionParser::with_llm(test_endpoint(base_url), "m").unwrap();
    let posting = parser.parse(RAW_DESCRIPTION).await.unwrap();
    assert_eq!(posting, parse_with_rules(RAW_DESCRIPTION));
}
