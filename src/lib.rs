//! # Templar
//!
//! A hybrid retrieval engine for small structured documents (JSON-LD
//! UI-component templates). Documents are stored under a logical name and
//! retrieved by semantic similarity of an embedding vector, by lexical
//! keyword match (BM25), or both merged.
//!
//! ## Features
//!
//! - Exact (flat) nearest-neighbor search over fixed-dimension embeddings
//! - BM25-ranked inverted keyword index over canonicalized JSON content
//! - Position-to-name identity map tying vector order to document identity
//! - Snapshot persistence with independent per-piece corruption recovery
//! - Concurrency-safe coordinator for simultaneous reads and writes

pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod identity;
pub mod keyword_index;
pub mod persistence;
pub mod vector_index;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
