use async_trait::async_trait;
use tracing::debug;

use super::{EmbeddingError, EmbeddingProvider};
use crate::index::math::normalize;

/// Offline embedder: the same text always yields the same unit vector.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    pub(super) dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding dimension must be greater than zero".to_string(),
            });
        }
        Ok(Self { dimension })
    }

    /// Synchronous form of [`EmbeddingProvider::embed`].
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let hash = blake3::hash(text.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&hash.as_bytes()[..8]);
        let mut state = u64::from_le_bytes(seed);

        let mut embedding = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }
        normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        debug!(text_len = text.len(), "Generating stub embedding");
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
