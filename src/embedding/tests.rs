use std::time::Duration;

use super::*;
use crate::config::ApiEndpoint;
use crate::index::math::{cosine_similarity, l2_norm};
use crate::test_http::serve_once;

const TEST_DIM: usize = 16;

fn test_endpoint(base_url: String) -> ApiEndpoint {
    ApiEndpoint {
        base_url,
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_stub_is_deterministic_and_unit_length() {
    let embedder = StubEmbedder::new(TEST_DIM).unwrap();
    let a = embedder.embed("Rust backend engineer").await.unwrap();
    let b = embedder.embed("Rust backend engineer").await.unwrap();

    assert_eq!(a.len(), TEST_DIM);
    assert_eq!(a, b);
    assert!((l2_norm(&a) - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_stub_different_texts_differ() {
    let embedder = StubEmbedder::new(TEST_DIM).unwrap();
    let a = embedder.embed("frontend").await.unwrap();
    let b = embedder.embed("backend").await.unwrap();
    assert!(cosine_similarity(&a, &b) < 0.999);
}

#[test]
fn test_stub_rejects_zero_dimension() {
    assert!(matches!(
        StubEmbedder::new(0),
        Err(EmbeddingError::InvalidConfig { .. })
    ));
}

#[tokio::test]
async fn test_mock_pin_and_failure() {
    let embedder = MockEmbedder::new(3);
    embedder.pin("pinned", vec![1.0, 0.0, 0.0]);
    embedder.fail_when_contains("boom");

    assert_eq!(
        embedder.embed("a pinned text").await.unwrap(),
        vec![1.0, 0.0, 0.0]
    );
    assert!(matches!(
        embedder.embed("boom").await,
        Err(EmbeddingError::Unavailable { .. })
    ));
    assert_eq!(embedder.embed("other").await.unwrap().len(), 3);
    assert_eq!(embedder.call_count(), 3);
}

#[tokio::test]
async fn test_http_embedder_parses_response() {
    let body = serde_json::json!({
        "data": [{"embedding": [0.5, 0.5, 0.5, 0.5]}]
    })
    .to_string();
    let (base_url, server) = serve_once(200, body, Duration::ZERO).await;

    let embedder = HttpEmbedder::new(test_endpoint(base_url), "test-model", 4).unwrap();
    let vector = embedder.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.5, 0.5, 0.5, 0.5]);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /embeddings"));
    assert!(request.contains("\"model\":\"test-model\""));
    assert!(request.to_lowercase().contains("authorization: bearer test-key"));
}

#[tokio::test]
async fn test_http_embedder_dimension_mismatch() {
    let body = serde_json::json!({"data": [{"embedding": [1.0, 2.0]}]}).to_string();
    let (base_url, _server) = serve_once(200, body, Duration::ZERO).await;

    let embedder = HttpEmbedder::new(test_endpoint(base_url), "m", 4).unwrap();
    assert!(matches!(
        embedder.embed("hello").await,
        Err(EmbeddingError::DimensionMismatch {
            expected: 4,
            actual: 2
        })
    ));
}

#[tokio::test]
async fn test_http_embedder_error_status_is_unavailable() {
    let (base_url, _server) = serve_once(429, "{}".to_string(), Duration::ZERO).await;

    let embedder = HttpEmbedder::new(test_endpoint(base_url), "m", 4).unwrap();
    assert!(matches!(
        embedder.embed("hello").await,
        Err(EmbeddingError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn test_http_embedder_empty_data_is_invalid() {
    let (base_url, _server) = serve_once(200, r#"{"data":[]}"#.to_string(), Duration::ZERO).await;

    let embedder = HttpEmbedder::new(test_endpoint(base_url), "m", 4).unwrap();
    assert!(matches!(
        embedder.embed("hello").await,
        Err(EmbeddingError::InvalidResponse { .. })
    ));
}
