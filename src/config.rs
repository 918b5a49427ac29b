//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::vector_index::DistanceMetric;

/// Default embedding dimension (matches the all-MiniLM family of sentence
/// encoders).
pub const DEFAULT_DIMENSION: usize = 384;

/// Default number of results returned per modality when the caller does not
/// specify one.
pub const DEFAULT_TOP_K: usize = 5;

/// Configuration for a [`HybridEngine`](crate::engine::HybridEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base directory for all persisted state (snapshot files and the
    /// keyword index directory).
    pub data_dir: PathBuf,
    /// Embedding dimension. All vectors handled by the engine must have
    /// exactly this length.
    pub dimension: usize,
    /// Distance metric for vector search.
    pub metric: DistanceMetric,
    /// Default top-k for searches that do not specify one.
    pub default_top_k: usize,
    /// Upper bound on a single embedding provider call.
    pub embed_timeout: Duration,
    /// Whether to write a snapshot after every successful store. When
    /// disabled, durability is whatever the last explicit save captured.
    pub snapshot_on_write: bool,
}

impl EngineConfig {
    /// Create a configuration with defaults rooted at `data_dir`.
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            dimension: DEFAULT_DIMENSION,
            metric: DistanceMetric::InnerProduct,
            default_top_k: DEFAULT_TOP_K,
            embed_timeout: Duration::from_secs(30),
            snapshot_on_write: true,
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the default top-k.
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    /// Set the embedding call timeout.
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Enable or disable snapshot-after-write.
    pub fn with_snapshot_on_write(mut self, enabled: bool) -> Self {
        self.snapshot_on_write = enabled;
        self
    }
}
