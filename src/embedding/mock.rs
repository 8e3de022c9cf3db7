use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{EmbeddingError, EmbeddingProvider, StubEmbedder};

/// Test embedder: stub vectors by default, with optional pinned vectors and failures.
#[derive(Clone)]
pub struct MockEmbedder {
    stub: StubEmbedder,
    pinned: Arc<RwLock<Vec<(String, Vec<f32>)>>>,
    fail_on: Arc<RwLock<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            stub: StubEmbedder { dimension },
            pinned: Arc::default(),
            fail_on: Arc::default(),
            calls: Arc::default(),
        }
    }

    /// Texts containing `needle` embed to `vector`.
    pub fn pin(&self, needle: impl Into<String>, vector: Vec<f32>) {
        self.pinned.write().push((needle.into(), vector));
    }

    /// Texts containing `needle` fail with [`EmbeddingError::Unavailable`].
    pub fn fail_when_contains(&self, needle: impl Into<String>) {
        *self.fail_on.write() = Some(needle.into());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(needle) = self.fail_on.read().as_deref()
            && text.contains(needle)
        {
            return Err(EmbeddingError::Unavailable {
                reason: "mock failure".to_string(),
            });
        }

        if let Some((_, vector)) = self
            .pinned
            .read()
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
        {
            return Ok(vector.clone());
        }

        Ok(self.stub.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.stub.dimension()
    }
}
