use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::error::{IndexError, IndexResult};
use super::flat::{FlatIndex, SearchHit};

#[derive(Debug, Clone, PartialEq)]
/// A search hit with its label already resolved.
pub struct LabeledHit {
    pub position: usize,
    pub distance: f32,
    pub label: String,
}

/// Process-wide handle to one [`FlatIndex`], cheap to clone.
///
/// Searches share a read lock; appends and [`persist`](Self::persist) take the write lock, so
/// a save never observes a half-applied append.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<FlatIndex>>,
    dir: Option<PathBuf>,
}

impl SharedIndex {
    /// Loads the index persisted in `dir` (or starts empty) and binds future saves to `dir`.
    pub fn open(dir: impl Into<PathBuf>, dimension: usize) -> IndexResult<Self> {
        let dir = dir.into();
        let index = FlatIndex::load(&dir, dimension)?;
        info!(
            dir = %dir.display(),
            entries = index.size(),
            "Shared index opened"
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(index)),
            dir: Some(dir),
        })
    }

    /// Index without a backing directory; [`persist`](Self::persist) is a no-op.
    pub fn in_memory(dimension: usize) -> IndexResult<Self> {
        Ok(Self::from_index(FlatIndex::new(dimension)?))
    }

    pub fn from_index(index: FlatIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
            dir: None,
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn dimension(&self) -> usize {
        self.inner.read().dimension()
    }

    pub fn size(&self) -> usize {
        self.inner.read().size()
    }

    pub fn append(&self, vector: &[f32], label: impl Into<String>) -> IndexResult<usize> {
        self.inner.write().add(vector, label)
    }

    /// Appends every item or none of them; returns the assigned positions in order.
    pub fn append_batch(&self, items: &[(Vec<f32>, String)]) -> IndexResult<Vec<usize>> {
        let mut index = self.inner.write();

        let expected = index.dimension();
        if let Some((vector, _)) = items.iter().find(|(v, _)| v.len() != expected) {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        items
            .iter()
            .map(|(vector, label)| index.add(vector, label.clone()))
            .collect()
    }

    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<SearchHit>> {
        self.inner.read().search(query, k)
    }

    /// Searches and resolves labels under a single read guard.
    ///
    /// Hits whose position has no label are dropped.
    pub fn search_labeled(&self, query: &[f32], k: usize) -> IndexResult<Vec<LabeledHit>> {
        let index = self.inner.read();
        let hits = index.search(query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                index.label_of(hit.position).map(|label| LabeledHit {
                    position: hit.position,
                    distance: hit.distance,
                    label: label.to_string(),
                })
            })
            .collect())
    }

    pub fn label_of(&self, position: usize) -> Option<String> {
        self.inner.read().label_of(position).map(str::to_string)
    }

    /// Saves to the bound directory while holding the write lock.
    pub fn persist(&self) -> IndexResult<()> {
        let Some(dir) = &self.dir else {
            debug!("In-memory index; skipping persist");
            return Ok(());
        };
        let index = self.inner.write();
        index.save(dir)
    }

    /// Copies the current index state.
    pub fn snapshot(&self) -> FlatIndex {
        self.inner.read().clone()
    }
}
