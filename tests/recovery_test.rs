//! Persistence and recovery scenarios: snapshot round-trips, independent
//! per-piece fallback, and keyword index self-healing.

use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use templar::config::EngineConfig;
use templar::document;
use templar::embedding::{self, EmbeddingProvider};
use templar::engine::HybridEngine;
use templar::error::Result;
use templar::vector_index::DistanceMetric;

const DIM: usize = 16;

struct HashProvider;

impl EmbeddingProvider for HashProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIM];
        for (i, byte) in text.bytes().enumerate() {
            vector[(byte as usize).wrapping_mul(31).wrapping_add(i) % DIM] += 1.0;
        }
        embedding::normalize(&mut vector);
        Ok(vector)
    }
}

fn config(dir: &TempDir) -> EngineConfig {
    EngineConfig::new(dir.path())
        .with_dimension(DIM)
        .with_metric(DistanceMetric::InnerProduct)
}

fn open(dir: &TempDir) -> HybridEngine {
    HybridEngine::open(config(dir), Arc::new(HashProvider)).unwrap()
}

fn embed(content: &serde_json::Value) -> Vec<f32> {
    HashProvider.embed(&document::canonical_json(content)).unwrap()
}

#[tokio::test]
async fn test_save_load_round_trip_preserves_state() {
    let dir = TempDir::new().unwrap();
    let login = json!({"description": "a login form", "library": "React"});
    let nav = json!({"description": "a navigation bar", "library": "Vue"});

    {
        let engine = open(&dir);
        engine.store_new("LoginForm", &login).await.unwrap();
        engine.store_new("NavBar", &nav).await.unwrap();
        engine.save().await.unwrap();
    }

    let engine = open(&dir);
    assert_eq!(engine.len().await, 2);
    assert_eq!(engine.resolve(0).await.as_deref(), Some("LoginForm"));
    assert_eq!(engine.resolve(1).await.as_deref(), Some("NavBar"));

    // Keyword results survive the restart.
    let results = engine.search(&vec![0.0; DIM], "React", None).await.unwrap();
    assert!(results.contains(&"LoginForm".to_string()));

    // So do semantic results.
    let results = engine.search(&embed(&nav), "zzzz", None).await.unwrap();
    assert_eq!(results.first().map(String::as_str), Some("NavBar"));
}

#[tokio::test]
async fn test_snapshot_on_write_survives_ungraceful_shutdown() {
    let dir = TempDir::new().unwrap();

    {
        let engine = open(&dir);
        engine
            .store_new("Footer", &json!({"library": "React"}))
            .await
            .unwrap();
        // No explicit save: the engine is simply dropped.
    }

    let engine = open(&dir);
    assert_eq!(engine.len().await, 1);
    assert_eq!(engine.resolve(0).await.as_deref(), Some("Footer"));
}

#[tokio::test]
async fn test_corrupt_snapshot_piece_starts_engine_empty_but_usable() {
    let dir = TempDir::new().unwrap();

    {
        let engine = open(&dir);
        engine
            .store_new("Card", &json!({"library": "React"}))
            .await
            .unwrap();
    }

    // Corrupt only the mapping file; the engine must still open and stay
    // internally consistent (unpaired vectors are dropped with it).
    fs::write(dir.path().join("mappings.bin"), b"garbage").unwrap();

    let engine = open(&dir);
    assert_eq!(engine.len().await, 0);

    // The engine remains fully writable after recovery.
    let position = engine
        .store_new("Fresh", &json!({"library": "Svelte"}))
        .await
        .unwrap();
    assert_eq!(position, 0);
    assert_eq!(engine.resolve(0).await.as_deref(), Some("Fresh"));
}

#[tokio::test]
async fn test_corrupt_keyword_index_heals_on_next_store() {
    let dir = TempDir::new().unwrap();
    let engine = open(&dir);

    engine
        .store_new("Old", &json!({"description": "stored before corruption"}))
        .await
        .unwrap();

    // Inject unreadable bytes into the keyword index's self-managed file.
    fs::write(dir.path().join("keyword").join("postings.bin"), b"\xde\xad\xbe\xef").unwrap();

    // The store still succeeds and the new document is searchable.
    engine
        .store_new("New", &json!({"description": "stored after recovery"}))
        .await
        .unwrap();

    let results = engine.search(&vec![0.0; DIM], "recovery", None).await.unwrap();
    assert!(results.contains(&"New".to_string()));

    // The pre-corruption document lost its keyword entry with the wipe but
    // kept its vector identity.
    assert_eq!(engine.len().await, 2);
    assert_eq!(engine.resolve(0).await.as_deref(), Some("Old"));
}
