use std::collections::BTreeMap;

use chrono::Utc;
use tempfile::TempDir;

use super::*;

fn create_test_job(job_id: &str) -> JobRecord {
    JobRecord {
        job_id: job_id.to_string(),
        title: "Backend Engineer".to_string(),
        company: Some("Acme".to_string()),
        location: None,
        description: "Build services in Rust".to_string(),
        required_skills: vec!["Rust".to_string()],
        preferred_skills: vec![],
        experience: Some("3+".to_string()),
        education: None,
        responsibilities: vec![],
        benefits: vec![],
        overall_embedding: Some(vec![0.1, 0.2, 0.3]),
        index_positions: BTreeMap::from([("overall".to_string(), 0)]),
        created_at: Utc::now(),
    }
}

fn create_test_candidate(candidate_id: &str) -> CandidateRecord {
    CandidateRecord {
        candidate_id: candidate_id.to_string(),
        profile_handle: "coder".to_string(),
        profile_stats: Some(serde_json::json!({"solved": 300})),
        resume_text: "Systems programmer".to_string(),
        projects: vec![
            Project {
                name: "cache".to_string(),
                description: "a cache".to_string(),
                repository_url: None,
                technologies: vec!["Rust".to_string(), "Tokio".to_string()],
            },
            Project {
                name: "cli".to_string(),
                description: "a cli".to_string(),
                repository_url: Some("https://example.com/cli".to_string()),
                technologies: vec!["Rust".to_string(), "Clap".to_string()],
            },
        ],
        education: vec![EducationEntry {
            degree: "BSc".to_string(),
            field_of_study: "CS".to_string(),
            institution: "Uni".to_string(),
            graduation_year: Some(2020),
            gpa: None,
        }],
        interview_answers: BTreeMap::new(),
        overall_embedding: None,
        index_positions: BTreeMap::new(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_memory_store_put_get() {
    let store = InMemoryRecordStore::new();
    let job = create_test_job("job_00000001");
    store.put_job(job.clone()).await.unwrap();

    assert_eq!(store.get_job("job_00000001").await.unwrap(), Some(job));
    assert_eq!(store.get_job("job_missing").await.unwrap(), None);
    assert_eq!(store.job_count(), 1);
}

#[tokio::test]
async fn test_memory_store_list_limit_ordered() {
    let store = InMemoryRecordStore::new();
    for id in ["candidate_c", "candidate_a", "candidate_b"] {
        store.put_candidate(create_test_candidate(id)).await.unwrap();
    }

    let listed = store.list_candidates(2).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.candidate_id.as_str()).collect();
    assert_eq!(ids, vec!["candidate_a", "candidate_b"]);
}

#[tokio::test]
async fn test_memory_store_remove_candidate() {
    let store = InMemoryRecordStore::new();
    store
        .put_candidate(create_test_candidate("candidate_a"))
        .await
        .unwrap();
    assert!(store.remove_candidate("candidate_a").is_some());
    assert_eq!(store.get_candidate("candidate_a").await.unwrap(), None);
}

#[tokio::test]
async fn test_json_store_roundtrip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = JsonRecordStore::new(dir.path());

    let candidate = create_test_candidate("candidate_0a0b0c0d");
    store.put_candidate(candidate.clone()).await.unwrap();

    assert!(dir
        .path()
        .join("candidates")
        .join("candidate_0a0b0c0d.json")
        .exists());
    assert_eq!(
        store.get_candidate("candidate_0a0b0c0d").await.unwrap(),
        Some(candidate)
    );
}

#[tokio::test]
async fn test_json_store_overwrite_and_list() {
    let dir = TempDir::new().unwrap();
    let store = JsonRecordStore::new(dir.path());

    let mut job = create_test_job("job_a");
    store.put_job(job.clone()).await.unwrap();
    job.title = "Staff Engineer".to_string();
    store.put_job(job.clone()).await.unwrap();
    store.put_job(create_test_job("job_b")).await.unwrap();

    let jobs = store.list_jobs(10).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].title, "Staff Engineer");

    let names: Vec<_> = std::fs::read_dir(dir.path().join("jobs"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 2);
}

#[tokio::test]
async fn test_json_store_missing_dir_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonRecordStore::new(dir.path().join("nowhere"));
    assert!(store.list_candidates(10).await.unwrap().is_empty());
    assert_eq!(store.get_job("job_x").await.unwrap(), None);
}

#[tokio::test]
async fn test_json_store_rejects_path_traversal() {
    let dir = TempDir::new().unwrap();
    let store = JsonRecordStore::new(dir.path());

    assert!(matches!(
        store.get_job("../etc/passwd").await,
        Err(RecordStoreError::InvalidId { .. })
    ));
    assert!(matches!(
        store.put_job(create_test_job("a/b")).await,
        Err(RecordStoreError::InvalidId { .. })
    ));
    assert!(matches!(
        store.get_candidate("").await,
        Err(RecordStoreError::InvalidId { .. })
    ));
}

#[tokio::test]
async fn test_json_store_skips_unreadable_records_when_listing() {
    let dir = TempDir::new().unwrap();
    let store = JsonRecordStore::new(dir.path());
    store.put_job(create_test_job("job_a")).await.unwrap();
    std::fs::write(dir.path().join("jobs").join("job_b.json"), b"{not json").unwrap();

    let jobs = store.list_jobs(10).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(matches!(
        store.get_job("job_b").await,
        Err(RecordStoreError::Serialization(_))
    ));
}

#[test]
fn test_candidate_skills_deduplicated() {
    let candidate = create_test_candidate("candidate_a");
    assert_eq!(candidate.skills(), vec!["Rust", "Tokio", "Clap"]);
}

#[test]
fn test_section_texts() {
    let candidate = create_test_candidate("candidate_a");
    assert_eq!(
        candidate.projects[0].embedding_text(),
        "cache: a cache Technologies: Rust, Tokio"
    );
    assert_eq!(candidate.education[0].embedding_text(), "BSc in CS from Uni");
}
