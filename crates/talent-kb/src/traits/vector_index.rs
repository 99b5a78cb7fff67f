//! VectorIndex trait definition for nearest-neighbour search

use serde::{Deserialize, Serialize};

use crate::data::errors::VectorIndexError;

/// Whether an index could serve a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Ready,
    /// No index has been created yet. Not an error: searches simply
    /// return nothing.
    Unavailable,
}

/// One search result: an id and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: i64,
    pub distance: f32,
}

/// Result of an index search. Neighbours are ordered by ascending distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSearch {
    pub status: IndexStatus,
    pub neighbors: Vec<Neighbor>,
}

impl IndexSearch {
    pub fn unavailable() -> Self {
        Self {
            status: IndexStatus::Unavailable,
            neighbors: Vec::new(),
        }
    }

    pub fn ready(neighbors: Vec<Neighbor>) -> Self {
        Self {
            status: IndexStatus::Ready,
            neighbors,
        }
    }
}

/// Exact nearest-neighbour index keyed by candidate id.
///
/// The first vector appended fixes the index dimension; later vectors and
/// queries of a different width are rejected. Appends are durable when the
/// call returns.
pub trait VectorIndex: Send + Sync {
    /// Adds one vector under `id`.
    fn append(&self, id: i64, vector: &[f32]) -> Result<(), VectorIndexError>;

    /// Returns up to `k` nearest neighbours of `query`.
    fn search(&self, query: &[f32], k: usize) -> Result<IndexSearch, VectorIndexError>;

    /// Ids currently indexed, in insertion order.
    fn ids(&self) -> Result<Vec<i64>, VectorIndexError>;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    /// Established dimension, or `None` before the first append.
    fn dimension(&self) -> Option<usize>;

    /// Discards every vector and the persisted file.
    fn wipe(&self) -> Result<(), VectorIndexError>;
}
