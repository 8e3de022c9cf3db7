use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{EmbeddingError, EmbeddingProvider, check_dimension};
use crate::config::ApiEndpoint;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `POST {base_url}/embeddings` endpoint.
pub struct HttpEmbedder {
    http: HttpClient,
    endpoint: ApiEndpoint,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: ApiEndpoint,
        model: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding dimension must be greater than zero".to_string(),
            });
        }
        let http = HttpClient::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            http,
            endpoint,
            model: model.into(),
            dimension,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = self.endpoint.url("embeddings");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(EmbeddingError::Unavailable {
                reason: format!("embedding endpoint returned {}", resp.status()),
            });
        }

        let body: EmbeddingResponse =
            resp.json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "response contained no embeddings".to_string(),
            })?;

        check_dimension(&embedding, self.dimension)?;
        debug!(dimension = embedding.len(), "Embedding received");
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
