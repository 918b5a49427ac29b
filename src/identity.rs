//! Position-to-name identity map.
//!
//! Vector positions are bare integers; this table ties each position back to
//! the logical document name it was stored under. It is append-only and must
//! stay exactly as long as the vector index: one `assign` per successful
//! vector add, in the same critical section.

use serde::{Deserialize, Serialize};

/// Append-only table mapping vector positions to document names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityMap {
    names: Vec<String>,
}

impl IdentityMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name`, returning the position it was assigned.
    ///
    /// The position equals the map's size before insertion.
    pub fn assign<S: Into<String>>(&mut self, name: S) -> usize {
        let position = self.names.len();
        self.names.push(name.into());
        position
    }

    /// Resolve a position back to its name.
    ///
    /// `None` only for out-of-range positions; after a successful add this
    /// indicates an internal consistency fault.
    pub fn resolve(&self, position: usize) -> Option<&str> {
        self.names.get(position).map(String::as_str)
    }

    /// Number of assigned positions.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no positions have been assigned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Drop entries beyond `len`. Used only to reconcile a partially
    /// recovered snapshot; never called during normal operation.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.names.truncate(len);
    }
}
