//! Text embedding providers.
//!
//! - [`HttpEmbedder`] calls an OpenAI-compatible `/embeddings` endpoint.
//! - [`StubEmbedder`] derives deterministic vectors from a BLAKE3 hash of the text.

mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stub;

#[cfg(test)]
mod tests;

pub use error::EmbeddingError;
pub use http::HttpEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use stub::StubEmbedder;

use async_trait::async_trait;

#[async_trait]
/// Turns text into a fixed-length vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `text`. The result always has [`dimension`](Self::dimension) elements.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output vector length.
    fn dimension(&self) -> usize;
}

pub(crate) fn check_dimension(vector: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if vector.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}
