//! Snapshot persistence for the vector index and identity map.
//!
//! The two structures are serialized to `vectors.bin` and `mappings.bin`
//! under the engine's data directory; the keyword index keeps its own files
//! in a `keyword/` subdirectory. Loading never fails: each piece that cannot
//! be deserialized is replaced by a freshly constructed empty structure for
//! that piece alone, with a warn-level log. A corrupt mapping file does not
//! prevent a valid vector index from loading, and vice versa.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Result, TemplarError};
use crate::identity::IdentityMap;
use crate::vector_index::{DistanceMetric, FlatVectorIndex};

const VECTORS_FILE: &str = "vectors.bin";
const MAPPINGS_FILE: &str = "mappings.bin";
const KEYWORD_DIR: &str = "keyword";

/// Loads and saves the persisted snapshot under a fixed base path.
#[derive(Debug)]
pub struct SnapshotStore {
    vectors_path: PathBuf,
    mappings_path: PathBuf,
    keyword_dir: PathBuf,
}

impl SnapshotStore {
    /// Open a snapshot store rooted at `base`, creating the directory if
    /// missing.
    pub fn open<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref();
        fs::create_dir_all(base)?;
        Ok(Self {
            vectors_path: base.join(VECTORS_FILE),
            mappings_path: base.join(MAPPINGS_FILE),
            keyword_dir: base.join(KEYWORD_DIR),
        })
    }

    /// Directory reserved for the keyword index's self-managed files.
    pub fn keyword_dir(&self) -> &Path {
        &self.keyword_dir
    }

    /// Load the vector index and identity map from disk.
    ///
    /// Each piece falls back to an empty structure independently when its
    /// file is missing, unreadable, or does not match the configured
    /// `dimension`/`metric`. Never returns an error.
    pub fn load(&self, dimension: usize, metric: DistanceMetric) -> (FlatVectorIndex, IdentityMap) {
        let index = match self.read_index(dimension, metric) {
            Ok(index) => index,
            Err(err) => {
                warn!(path = %self.vectors_path.display(), error = %err, "could not load vector index, starting empty");
                FlatVectorIndex::new(dimension, metric)
            }
        };

        let map = match self.read_mappings() {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %self.mappings_path.display(), error = %err, "could not load identity map, starting empty");
                IdentityMap::new()
            }
        };

        (index, map)
    }

    /// Serialize both structures to disk, overwriting prior contents.
    pub fn save(&self, index: &FlatVectorIndex, map: &IdentityMap) -> Result<()> {
        let bytes = bincode::serialize(index)
            .map_err(|e| TemplarError::snapshot(format!("cannot encode vector index: {e}")))?;
        fs::write(&self.vectors_path, bytes)
            .map_err(|e| TemplarError::snapshot(format!("cannot write vector index: {e}")))?;

        let bytes = bincode::serialize(map)
            .map_err(|e| TemplarError::snapshot(format!("cannot encode identity map: {e}")))?;
        fs::write(&self.mappings_path, bytes)
            .map_err(|e| TemplarError::snapshot(format!("cannot write identity map: {e}")))?;

        Ok(())
    }

    fn read_index(&self, dimension: usize, metric: DistanceMetric) -> Result<FlatVectorIndex> {
        if !self.vectors_path.exists() {
            return Ok(FlatVectorIndex::new(dimension, metric));
        }
        let bytes = fs::read(&self.vectors_path)?;
        let index: FlatVectorIndex = bincode::deserialize(&bytes)
            .map_err(|e| TemplarError::snapshot(format!("cannot decode vector index: {e}")))?;
        if index.dimension() != dimension || index.metric() != metric {
            return Err(TemplarError::snapshot(format!(
                "snapshot was built with dimension {} and metric {:?}, configured {} and {:?}",
                index.dimension(),
                index.metric(),
                dimension,
                metric
            )));
        }
        Ok(index)
    }

    fn read_mappings(&self) -> Result<IdentityMap> {
        if !self.mappings_path.exists() {
            return Ok(IdentityMap::new());
        }
        let bytes = fs::read(&self.mappings_path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| TemplarError::snapshot(format!("cannot decode identity map: {e}")))
    }
}
