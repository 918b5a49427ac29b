//! Embedding provider seam.
//!
//! The neural model that turns text into a fixed-length vector lives outside
//! this crate (typically behind a network call). The engine consumes it
//! through [`EmbeddingProvider`] and makes at most one call per operation,
//! with no internal retry. Provider failures are split into two kinds: the
//! provider could not be reached at all
//! ([`EmbeddingUnavailable`](crate::error::TemplarError::EmbeddingUnavailable))
//! versus the provider answered with something unusable
//! ([`EmbeddingMalformed`](crate::error::TemplarError::EmbeddingMalformed)).

use crate::error::{Result, TemplarError};

/// Trait for external embedding providers.
///
/// Implementations may block (e.g. an HTTP client); the engine runs the call
/// on a blocking task and bounds it with the configured timeout. Providers
/// intended for inner-product search should return unit-normalized vectors
/// (see [`normalize`]).
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into a fixed-length vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Normalize a vector to unit L2 norm in place.
///
/// A zero vector is left unchanged. With normalized vectors, inner-product
/// search ranks by cosine similarity.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Validate a provider-returned vector before it enters the index.
///
/// Rejects empty output, a dimension other than `dimension`, and non-finite
/// values, all as [`TemplarError::EmbeddingMalformed`].
pub fn validate(vector: &[f32], dimension: usize) -> Result<()> {
    if vector.is_empty() {
        return Err(TemplarError::embedding_malformed(
            "provider returned an empty vector",
        ));
    }
    if vector.len() != dimension {
        return Err(TemplarError::embedding_malformed(format!(
            "provider returned dimension {}, expected {}",
            vector.len(),
            dimension
        )));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(TemplarError::embedding_malformed(
            "provider returned non-finite values",
        ));
    }
    Ok(())
}
