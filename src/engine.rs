//! Hybrid query coordinator.
//!
//! [`HybridEngine`] owns the vector index, identity map, and keyword index,
//! and is the only mutation path into them. It is built once at startup via
//! [`HybridEngine::open`] and shared (behind an `Arc`) across concurrent
//! request handlers.
//!
//! Locking discipline: one `RwLock` guards the `{vector index, identity
//! map}` pair, so a reader can never observe a vector without its identity
//! entry. The keyword index has its own lock and interleaves freely with
//! vector mutations. Embedding calls happen before any lock is taken and are
//! bounded by the configured timeout. Snapshots are written inside the
//! state's exclusive section, never mid-mutation.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::document;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::{Result, TemplarError};
use crate::identity::IdentityMap;
use crate::keyword_index::KeywordIndex;
use crate::persistence::SnapshotStore;
use crate::vector_index::FlatVectorIndex;

/// Vector index and identity map, guarded together so their sizes can never
/// be observed out of step.
#[derive(Debug)]
struct IndexState {
    vectors: FlatVectorIndex,
    identities: IdentityMap,
}

/// Statistics about an engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    /// Number of stored documents.
    pub documents: usize,
    /// Configured embedding dimension.
    pub dimension: usize,
    /// Distinct terms in the keyword index.
    pub terms: usize,
}

/// Coordinator for the hybrid store/search paths.
pub struct HybridEngine {
    config: EngineConfig,
    provider: Arc<dyn EmbeddingProvider>,
    state: RwLock<IndexState>,
    keyword: RwLock<KeywordIndex>,
    snapshots: SnapshotStore,
}

impl HybridEngine {
    /// Open an engine rooted at the configured data directory.
    ///
    /// Runs once before any request is served: loads the snapshot (each
    /// piece independently recovered to empty if unreadable) and prepares
    /// the keyword index directory. If the two snapshot pieces disagree in
    /// length, both are truncated to the shorter so every position keeps its
    /// identity pairing.
    pub fn open(config: EngineConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let snapshots = SnapshotStore::open(&config.data_dir)?;
        let (mut vectors, mut identities) = snapshots.load(config.dimension, config.metric);

        if vectors.len() != identities.len() {
            let len = vectors.len().min(identities.len());
            warn!(
                vectors = vectors.len(),
                identities = identities.len(),
                kept = len,
                "snapshot pieces disagree, truncating to the shorter"
            );
            vectors.truncate(len);
            identities.truncate(len);
        }

        let keyword = KeywordIndex::open(snapshots.keyword_dir())?;
        debug!(documents = identities.len(), dimension = config.dimension, "engine opened");

        Ok(Self {
            config,
            provider,
            state: RwLock::new(IndexState { vectors, identities }),
            keyword: RwLock::new(keyword),
            snapshots,
        })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Store a new document under `name`, returning its vector position.
    ///
    /// The content is canonicalized and embedded (outside any lock, bounded
    /// by the embed timeout), appended to the vector index and identity map
    /// under one exclusive section, then indexed into the keyword index.
    /// Success requires both writes; a keyword failure after the vector
    /// write is reported as a keyword error and does not roll back the
    /// vector side.
    pub async fn store_new(&self, name: &str, content: &Value) -> Result<usize> {
        document::require_object(content)?;
        let text = document::canonical_json(content);

        let vector = self.embed_with_timeout(text).await?;
        embedding::validate(&vector, self.config.dimension)?;

        let position = {
            let mut state = self.state.write().await;
            let position = state.vectors.add(&vector)?;
            let assigned = state.identities.assign(name);
            if assigned != position {
                return Err(TemplarError::internal(format!(
                    "identity position {assigned} does not match vector position {position}"
                )));
            }
            if self.config.snapshot_on_write {
                self.snapshots.save(&state.vectors, &state.identities)?;
            }
            position
        };

        {
            let mut keyword = self.keyword.write().await;
            keyword.index_document(name, content)?;
        }

        debug!(name, position, "stored document");
        Ok(position)
    }

    /// Hybrid search: semantic hits by `query_vector`, lexical hits by
    /// `query_text`, merged with duplicates removed.
    ///
    /// `top_k` bounds each modality independently and defaults to the
    /// configured value. Only set membership is contractual; the returned
    /// order places semantic hits first.
    pub async fn search(
        &self,
        query_vector: &[f32],
        query_text: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<String>> {
        let top_k = top_k.unwrap_or(self.config.default_top_k);

        let mut merged = {
            let state = self.state.read().await;
            let hits = state.vectors.search(query_vector, top_k)?;
            let mut names = Vec::with_capacity(hits.len());
            for (position, _score) in hits {
                match state.identities.resolve(position) {
                    Some(name) => names.push(name.to_string()),
                    None => {
                        return Err(TemplarError::internal(format!(
                            "no identity for vector position {position}"
                        )));
                    }
                }
            }
            names
        };

        let lexical = {
            let keyword = self.keyword.read().await;
            keyword.search(query_text, top_k)
        };
        for id in lexical {
            if !merged.contains(&id) {
                merged.push(id);
            }
        }

        Ok(merged)
    }

    /// Resolve a vector position back to its document name.
    pub async fn resolve(&self, position: usize) -> Option<String> {
        let state = self.state.read().await;
        state.identities.resolve(position).map(str::to_string)
    }

    /// Write a snapshot of the vector index and identity map.
    ///
    /// Takes the state's exclusive lock, so it never captures a mid-mutation
    /// view. Intended for graceful shutdown when snapshot-on-write is
    /// disabled.
    pub async fn save(&self) -> Result<()> {
        let state = self.state.write().await;
        self.snapshots.save(&state.vectors, &state.identities)
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.identities.len()
    }

    /// Whether no documents are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Statistics about the engine.
    pub async fn stats(&self) -> EngineStats {
        let documents = self.len().await;
        let terms = self.keyword.read().await.term_count();
        EngineStats {
            documents,
            dimension: self.config.dimension,
            terms,
        }
    }

    /// Call the embedding provider on a blocking task, bounded by the
    /// configured timeout.
    async fn embed_with_timeout(&self, text: String) -> Result<Vec<f32>> {
        let provider = Arc::clone(&self.provider);
        let task = tokio::task::spawn_blocking(move || provider.embed(&text));

        match tokio::time::timeout(self.config.embed_timeout, task).await {
            Err(_) => Err(TemplarError::embedding_unavailable(format!(
                "provider did not answer within {:?}",
                self.config.embed_timeout
            ))),
            Ok(Err(join_err)) => Err(TemplarError::internal(format!(
                "embedding task failed: {join_err}"
            ))),
            Ok(Ok(result)) => result,
        }
    }
}
