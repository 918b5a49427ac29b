//! Inverted keyword index with BM25 ranking.
//!
//! The index lives in a directory of its own and self-persists on every
//! write, so the on-disk state is always current and no separate flush is
//! needed. Each operation opens the postings file fresh; if the file is
//! present but unreadable, the opener wipes the directory and rebuilds an
//! empty index, so callers never observe corruption as a failure of the
//! write itself.
//!
//! Documents are canonicalized to deterministic JSON before tokenization, so
//! both keys and values of a template are searchable.

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use crate::document;
use crate::error::{Result, TemplarError};

/// BM25 term frequency saturation parameter.
const BM25_K1: f32 = 1.2;

/// BM25 length normalization parameter.
const BM25_B: f32 = 0.75;

/// Name of the self-persisted postings file inside the index directory.
const POSTINGS_FILE: &str = "postings.bin";

/// On-disk postings state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Postings {
    /// term -> document id -> term frequency.
    terms: AHashMap<String, AHashMap<String, u32>>,
    /// document id -> token count.
    doc_lengths: AHashMap<String, u64>,
}

impl Postings {
    fn remove_doc(&mut self, id: &str) {
        if self.doc_lengths.remove(id).is_none() {
            return;
        }
        self.terms.retain(|_, docs| {
            docs.remove(id);
            !docs.is_empty()
        });
    }
}

/// Directory-backed inverted index over canonicalized document content.
#[derive(Debug)]
pub struct KeywordIndex {
    dir: PathBuf,
}

impl KeywordIndex {
    /// Open (or create) the index under `dir`.
    ///
    /// The directory is created if missing. Unreadable on-disk state is
    /// detected and healed lazily by the individual operations.
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The directory holding the index's self-managed files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Index `content` under `id`, replacing any previous entry for `id`.
    ///
    /// Fails with [`TemplarError::InvalidDocument`] if `content` is not a
    /// JSON object. A corrupt on-disk index is wiped and rebuilt before the
    /// write; the caller only sees an error if the rebuilt index cannot be
    /// written either.
    pub fn index_document(&mut self, id: &str, content: &serde_json::Value) -> Result<()> {
        document::require_object(content)?;
        let text = document::canonical_json(content);

        let mut postings = self.open_or_rebuild()?;
        postings.remove_doc(id);

        let tokens = tokenize(&text);
        postings.doc_lengths.insert(id.to_string(), tokens.len() as u64);
        for token in tokens {
            *postings
                .terms
                .entry(token)
                .or_default()
                .entry(id.to_string())
                .or_insert(0) += 1;
        }

        self.persist(&postings)
    }

    /// BM25-ranked lexical search, returning up to `top_k` document ids.
    ///
    /// Returns an empty result (never an error) when the index is absent,
    /// empty, unreadable, or the query has no hits.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<String> {
        let postings = match self.read_postings() {
            Ok(postings) => postings,
            Err(err) => {
                warn!(path = %self.dir.display(), error = %err, "keyword index unreadable during search, returning no hits");
                return Vec::new();
            }
        };

        let total_docs = postings.doc_lengths.len();
        if total_docs == 0 {
            return Vec::new();
        }
        let avg_doc_length = postings.doc_lengths.values().sum::<u64>() as f32 / total_docs as f32;

        let query_terms = tokenize(query);
        let mut scores: AHashMap<&str, f32> = AHashMap::new();

        for term in &query_terms {
            let Some(docs) = postings.terms.get(term) else {
                continue;
            };
            let df = docs.len() as f32;
            let idf = (1.0 + (total_docs as f32 - df + 0.5) / (df + 0.5)).ln();

            for (id, tf) in docs {
                let tf = *tf as f32;
                let doc_length = *postings.doc_lengths.get(id).unwrap_or(&0) as f32;
                let tf_component = (tf * (BM25_K1 + 1.0))
                    / (tf
                        + BM25_K1 * (1.0 - BM25_B + BM25_B * (doc_length / avg_doc_length)));
                *scores.entry(id.as_str()).or_insert(0.0) += idf * tf_component;
            }
        }

        let mut ranked: Vec<(&str, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(top_k);
        ranked.into_iter().map(|(id, _)| id.to_string()).collect()
    }

    /// Number of distinct terms in the index. Zero when unreadable.
    pub fn term_count(&self) -> usize {
        self.read_postings()
            .map(|postings| postings.terms.len())
            .unwrap_or(0)
    }

    /// Read the postings file, wiping the directory and starting empty if it
    /// is present but unreadable.
    fn open_or_rebuild(&self) -> Result<Postings> {
        match self.read_postings() {
            Ok(postings) => Ok(postings),
            Err(err) => {
                warn!(path = %self.dir.display(), error = %err, "keyword index corrupt, wiping and rebuilding");
                self.wipe()?;
                Ok(Postings::default())
            }
        }
    }

    fn read_postings(&self) -> Result<Postings> {
        let path = self.dir.join(POSTINGS_FILE);
        if !path.exists() {
            return Ok(Postings::default());
        }
        let bytes = fs::read(&path)
            .map_err(|e| TemplarError::keyword(format!("cannot read postings file: {e}")))?;
        bincode::deserialize(&bytes)
            .map_err(|e| TemplarError::keyword(format!("cannot decode postings file: {e}")))
    }

    fn persist(&self, postings: &Postings) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let bytes = bincode::serialize(postings)
            .map_err(|e| TemplarError::keyword(format!("cannot encode postings: {e}")))?;
        fs::write(self.dir.join(POSTINGS_FILE), bytes)
            .map_err(|e| TemplarError::keyword(format!("cannot write postings file: {e}")))
    }

    fn wipe(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }
}

/// Lowercased unicode-word tokenization.
fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|word| word.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn open_index(dir: &TempDir) -> KeywordIndex {
        KeywordIndex::open(dir.path().join("keyword")).unwrap()
    }

    #[test]
    fn test_tokenize_lowercases_and_splits_json() {
        let tokens = tokenize(r#"{"library":"React","name":"LoginForm"}"#);
        assert_eq!(tokens, vec!["library", "react", "name", "loginform"]);
    }

    #[test]
    fn test_index_and_search() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);

        index
            .index_document(
                "LoginForm",
                &json!({"description": "a login form with two fields", "library": "React"}),
            )
            .unwrap();
        index
            .index_document(
                "Chart",
                &json!({"description": "a bar chart", "library": "D3"}),
            )
            .unwrap();

        let hits = index.search("React", 5);
        assert_eq!(hits, vec!["LoginForm"]);

        let hits = index.search("chart", 5);
        assert_eq!(hits, vec!["Chart"]);
    }

    #[test]
    fn test_search_ranks_higher_term_frequency_first() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);

        index
            .index_document("A", &json!({"text": "button button button"}))
            .unwrap();
        index
            .index_document("B", &json!({"text": "button label input"}))
            .unwrap();

        let hits = index.search("button", 5);
        assert_eq!(hits[0], "A");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_respects_top_k() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);

        for i in 0..10 {
            index
                .index_document(&format!("doc{i}"), &json!({"text": "widget"}))
                .unwrap();
        }

        assert_eq!(index.search("widget", 3).len(), 3);
    }

    #[test]
    fn test_search_absent_index_is_empty() {
        let dir = TempDir::new().unwrap();
        let index = open_index(&dir);
        assert!(index.search("anything", 5).is_empty());
    }

    #[test]
    fn test_rejects_non_object_content() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);

        let err = index.index_document("bad", &json!("a bare string")).unwrap_err();
        assert!(matches!(err, TemplarError::InvalidDocument(_)));
        assert!(index.search("bare", 5).is_empty());
    }

    #[test]
    fn test_reindex_replaces_previous_postings() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);

        index
            .index_document("Card", &json!({"library": "React"}))
            .unwrap();
        index
            .index_document("Card", &json!({"library": "Svelte"}))
            .unwrap();

        assert!(index.search("React", 5).is_empty());
        assert_eq!(index.search("Svelte", 5), vec!["Card"]);
    }

    #[test]
    fn test_corrupt_postings_recovered_on_write() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);

        index
            .index_document("Old", &json!({"text": "before corruption"}))
            .unwrap();

        fs::write(index.dir().join(POSTINGS_FILE), b"not bincode at all").unwrap();

        // The write succeeds against a rebuilt index.
        index
            .index_document("New", &json!({"text": "after recovery"}))
            .unwrap();

        assert_eq!(index.search("recovery", 5), vec!["New"]);
        // The pre-corruption document was wiped with the rest of the directory.
        assert!(index.search("before", 5).is_empty());
    }

    #[test]
    fn test_corrupt_postings_search_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let index = open_index(&dir);

        fs::write(index.dir().join(POSTINGS_FILE), b"garbage").unwrap();
        assert!(index.search("anything", 5).is_empty());
    }
}
