//! Flat vector index for exact nearest-neighbor search.
//!
//! The index stores fixed-dimension float vectors append-only and answers
//! k-nearest queries by exhaustive scan. Positions are assigned sequentially
//! and are stable for the process lifetime; nothing is ever removed or
//! reordered.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplarError};

/// Distance metric for vector comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance. Search results are ordered by ascending
    /// distance.
    L2,
    /// Inner product. Search results are ordered by descending score; over
    /// unit-normalized vectors this is cosine similarity.
    InnerProduct,
}

impl DistanceMetric {
    /// Compute the raw score between two equal-length vectors.
    ///
    /// For [`DistanceMetric::L2`] the score is the distance (lower is
    /// better); for [`DistanceMetric::InnerProduct`] it is the similarity
    /// (higher is better).
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::L2 => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            DistanceMetric::InnerProduct => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        }
    }

    fn rank(&self, a: f32, b: f32) -> std::cmp::Ordering {
        let ordering = a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal);
        match self {
            DistanceMetric::L2 => ordering,
            DistanceMetric::InnerProduct => ordering.reverse(),
        }
    }
}

/// Exact (flat) vector index.
///
/// Serializable with serde so the whole structure can be snapshotted with
/// bincode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatVectorIndex {
    dimension: usize,
    metric: DistanceMetric,
    vectors: Vec<Vec<f32>>,
}

impl FlatVectorIndex {
    /// Create an empty index for vectors of `dimension` length.
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            vectors: Vec::new(),
        }
    }

    /// The configured vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The configured distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Whether the index is ready to accept vectors.
    ///
    /// A flat index needs no training phase, so this is always true. The
    /// check exists because the add contract admits trainable structures
    /// (e.g. IVF), which fail [`add`](Self::add) until trained.
    pub fn is_trained(&self) -> bool {
        true
    }

    /// Append a vector, returning its position.
    ///
    /// Fails with [`TemplarError::IndexNotTrained`] if the index is not
    /// ready, or [`TemplarError::DimensionMismatch`] if `vector` has the
    /// wrong length.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if !self.is_trained() {
            return Err(TemplarError::IndexNotTrained);
        }
        self.check_dimension(vector)?;
        self.vectors.push(vector.to_vec());
        Ok(self.vectors.len() - 1)
    }

    /// Find the `k` nearest vectors to `query`.
    ///
    /// Returns `(position, score)` pairs ordered best-first, of length
    /// `min(k, len)`. An empty index yields an empty result, not an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(query)?;

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, self.metric.score(query, vector)))
            .collect();

        scored.sort_by(|a, b| self.metric.rank(a.1, b.1));
        scored.truncate(k);
        Ok(scored)
    }

    /// Drop vectors beyond `len`. Used only to reconcile a partially
    /// recovered snapshot; never called during normal operation.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.vectors.truncate(len);
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(TemplarError::dimension_mismatch(
                self.dimension,
                vector.len(),
            ));
        }
        Ok(())
    }
}
