use tracing::debug;

use super::error::{IndexError, IndexResult};
use super::math::{normalize, squared_l2};

#[derive(Debug, Clone, Copy, PartialEq)]
/// A single nearest-neighbour result.
pub struct SearchHit {
    /// Dense insertion position of the matched vector.
    pub position: usize,
    /// Squared Euclidean distance between the normalised query and the stored vector.
    pub distance: f32,
}

/// Exact (brute-force) vector index over unit-length vectors.
///
/// Vectors are stored row-major in a single buffer with a parallel label table. Positions are
/// assigned densely in insertion order and never reused; there is no removal.
///
/// # Example
/// ```
/// use funnel::index::FlatIndex;
///
/// let mut index = FlatIndex::new(2).unwrap();
/// index.add(&[1.0, 0.0], "candidate_a_overall").unwrap();
/// index.add(&[0.0, 1.0], "candidate_b_overall").unwrap();
///
/// let hits = index.search(&[0.9, 0.1], 1).unwrap();
/// assert_eq!(hits[0].position, 0);
/// assert_eq!(index.label_of(0), Some("candidate_a_overall"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
    labels: Vec<String>,
}

impl FlatIndex {
    /// Creates an empty index for vectors of length `dimension`.
    pub fn new(dimension: usize) -> IndexResult<Self> {
        if dimension == 0 {
            return Err(IndexError::Config {
                reason: "index dimension must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            dimension,
            vectors: Vec::new(),
            labels: Vec::new(),
        })
    }

    pub(crate) fn from_parts(
        dimension: usize,
        vectors: Vec<f32>,
        labels: Vec<String>,
    ) -> IndexResult<Self> {
        let mut index = Self::new(dimension)?;
        if vectors.len() != labels.len() * dimension {
            return Err(IndexError::Config {
                reason: format!(
                    "{} vector values do not cover {} labels of dimension {}",
                    vectors.len(),
                    labels.len(),
                    dimension
                ),
            });
        }
        index.vectors = vectors;
        index.labels = labels;
        Ok(index)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn check_dimension(&self, len: usize) -> IndexResult<()> {
        if len != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }

    /// Appends `vector` (normalised to unit length) and returns its position.
    pub fn add(&mut self, vector: &[f32], label: impl Into<String>) -> IndexResult<usize> {
        self.check_dimension(vector.len())?;

        let position = self.labels.len();
        let start = self.vectors.len();
        self.vectors.extend_from_slice(vector);
        normalize(&mut self.vectors[start..]);
        self.labels.push(label.into());

        Ok(position)
    }

    /// Returns up to `k` hits ordered by ascending distance, ties broken by position.
    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<SearchHit>> {
        self.check_dimension(query.len())?;

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        let mut hits: Vec<SearchHit> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| SearchHit {
                position,
                distance: squared_l2(&query, row),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.position.cmp(&b.position))
        });
        hits.truncate(k);

        debug!(
            k,
            size = self.size(),
            returned = hits.len(),
            "Flat index search complete"
        );

        Ok(hits)
    }

    pub fn label_of(&self, position: usize) -> Option<&str> {
        self.labels.get(position).map(String::as_str)
    }

    /// Returns the stored (normalised) vector at `position`.
    pub fn vector_of(&self, position: usize) -> Option<&[f32]> {
        if position >= self.size() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.vectors[start..start + self.dimension])
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }
}
