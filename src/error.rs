//! Error types for the Templar library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`TemplarError`] enum. Variants name the subsystem that failed so that a
//! caller can tell a vector-index fault from a keyword-index or embedding
//! fault without parsing messages.

use std::io;

use thiserror::Error;

/// The main error type for Templar operations.
#[derive(Error, Debug)]
pub enum TemplarError {
    /// I/O errors (file operations, directory handling, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A vector's length does not match the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was configured with.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// The vector index is not ready to accept vectors.
    #[error("vector index is not trained")]
    IndexNotTrained,

    /// Document content is not a structured mapping.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The embedding provider could not be reached or did not answer in time.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The embedding provider answered with an unusable vector.
    #[error("embedding provider returned malformed output: {0}")]
    EmbeddingMalformed(String),

    /// Keyword index errors.
    #[error("keyword index error: {0}")]
    Keyword(String),

    /// Snapshot persistence errors.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Internal consistency faults that should never occur in correct operation.
    #[error("internal error: {0}")]
    Internal(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error.
    #[error("error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`TemplarError`].
pub type Result<T> = std::result::Result<T, TemplarError>;

impl TemplarError {
    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        TemplarError::DimensionMismatch { expected, actual }
    }

    /// Create a new invalid document error.
    pub fn invalid_document<S: Into<String>>(msg: S) -> Self {
        TemplarError::InvalidDocument(msg.into())
    }

    /// Create a new embedding-unavailable error.
    pub fn embedding_unavailable<S: Into<String>>(msg: S) -> Self {
        TemplarError::EmbeddingUnavailable(msg.into())
    }

    /// Create a new embedding-malformed error.
    pub fn embedding_malformed<S: Into<String>>(msg: S) -> Self {
        TemplarError::EmbeddingMalformed(msg.into())
    }

    /// Create a new keyword index error.
    pub fn keyword<S: Into<String>>(msg: S) -> Self {
        TemplarError::Keyword(msg.into())
    }

    /// Create a new snapshot error.
    pub fn snapshot<S: Into<String>>(msg: S) -> Self {
        TemplarError::Snapshot(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        TemplarError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TemplarError::dimension_mismatch(384, 512);
        assert_eq!(error.to_string(), "dimension mismatch: expected 384, got 512");

        let error = TemplarError::invalid_document("content is not an object");
        assert_eq!(
            error.to_string(),
            "invalid document: content is not an object"
        );

        let error = TemplarError::keyword("postings file unreadable");
        assert_eq!(
            error.to_string(),
            "keyword index error: postings file unreadable"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = TemplarError::from(io_error);

        match error {
            TemplarError::Io(_) => {}
            _ => panic!("expected IO error variant"),
        }
    }

    #[test]
    fn test_embedding_variants_are_distinct() {
        let unreachable = TemplarError::embedding_unavailable("connection refused");
        let malformed = TemplarError::embedding_malformed("vector contains NaN");

        assert!(matches!(unreachable, TemplarError::EmbeddingUnavailable(_)));
        assert!(matches!(malformed, TemplarError::EmbeddingMalformed(_)));
    }
}
