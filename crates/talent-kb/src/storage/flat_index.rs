//! Exact L2 vector index persisted to a single file
//!
//! Vectors are held in contiguous memory in insertion order and searched by
//! brute force, so results are exact. Every append rewrites the file through
//! a temporary sibling that is renamed into place, so a crash leaves either
//! the old or the new index on disk, never a torn one.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::data::errors::VectorIndexError;
use crate::traits::{IndexSearch, Neighbor, VectorIndex};

const FLAT_INDEX_VERSION: u32 = 1;

/// On-disk layout, encoded with bincode.
#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    dimension: usize,
    ids: Vec<i64>,
    vectors: Vec<f32>,
}

struct FlatState {
    dimension: usize,
    /// Ids in insertion order; `ids[i]` owns `vectors[i * dimension..]`.
    ids: Vec<i64>,
    vectors: Vec<f32>,
    known: HashSet<i64>,
}

impl FlatState {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            vectors: Vec::new(),
            known: HashSet::new(),
        }
    }

    fn from_file(file: IndexFile) -> Result<Self, VectorIndexError> {
        if file.version != FLAT_INDEX_VERSION {
            return Err(VectorIndexError::Corrupt(format!(
                "unsupported index version {}",
                file.version
            )));
        }
        if file.dimension == 0 || file.ids.len() * file.dimension != file.vectors.len() {
            return Err(VectorIndexError::Corrupt(format!(
                "{} ids do not fit {} values at dimension {}",
                file.ids.len(),
                file.vectors.len(),
                file.dimension
            )));
        }

        let known: HashSet<i64> = file.ids.iter().copied().collect();
        if known.len() != file.ids.len() {
            return Err(VectorIndexError::Corrupt("duplicate ids in index file".to_string()));
        }

        Ok(Self {
            dimension: file.dimension,
            ids: file.ids,
            vectors: file.vectors,
            known,
        })
    }

    fn to_file(&self) -> IndexFile {
        IndexFile {
            version: FLAT_INDEX_VERSION,
            dimension: self.dimension,
            ids: self.ids.clone(),
            vectors: self.vectors.clone(),
        }
    }

    fn truncate(&mut self, len: usize) {
        for id in self.ids.drain(len..) {
            self.known.remove(&id);
        }
        self.vectors.truncate(len * self.dimension);
    }
}

#[inline]
fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Flat (brute-force) index, optionally backed by a file.
pub struct FlatFileIndex {
    path: Option<PathBuf>,
    state: RwLock<Option<FlatState>>,
}

impl FlatFileIndex {
    /// Opens the index at `path`, loading it if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, VectorIndexError> {
        let path = path.into();
        let state = match fs::File::open(&path) {
            Ok(file) => {
                let decoded: IndexFile = bincode::deserialize_from(BufReader::new(file))?;
                let state = FlatState::from_file(decoded)?;
                debug!(path = %path.display(), vectors = state.ids.len(), "Loaded vector index");
                Some(state)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// Index that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(None),
        }
    }

    fn persist(&self, state: &FlatState) -> Result<(), VectorIndexError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            bincode::serialize_into(&mut writer, &state.to_file())?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| VectorIndexError::Io(e.error))?;
        Ok(())
    }
}

impl VectorIndex for FlatFileIndex {
    fn append(&self, id: i64, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.is_empty() {
            return Err(VectorIndexError::EmptyVector);
        }

        let mut guard = self.state.write();
        let state = guard.get_or_insert_with(|| FlatState::new(vector.len()));

        if vector.len() != state.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: state.dimension,
                actual: vector.len(),
            });
        }
        if state.known.contains(&id) {
            return Err(VectorIndexError::DuplicateId(id));
        }

        let previous_len = state.ids.len();
        state.ids.push(id);
        state.known.insert(id);
        state.vectors.extend_from_slice(vector);

        if let Err(e) = self.persist(state) {
            state.truncate(previous_len);
            if state.ids.is_empty() {
                *guard = None;
            }
            return Err(e);
        }

        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<IndexSearch, VectorIndexError> {
        let guard = self.state.read();
        let Some(state) = guard.as_ref() else {
            return Ok(IndexSearch::unavailable());
        };

        if query.len() != state.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: state.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || state.ids.is_empty() {
            return Ok(IndexSearch::ready(Vec::new()));
        }

        let mut neighbors: Vec<Neighbor> = state
            .vectors
            .chunks_exact(state.dimension)
            .zip(&state.ids)
            .map(|(vector, &id)| Neighbor {
                id,
                distance: l2_distance_squared(query, vector),
            })
            .collect();

        // Stable sort keeps insertion order among equal distances.
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(IndexSearch::ready(neighbors))
    }

    fn ids(&self) -> Result<Vec<i64>, VectorIndexError> {
        Ok(self
            .state
            .read()
            .as_ref()
            .map(|state| state.ids.clone())
            .unwrap_or_default())
    }

    fn len(&self) -> usize {
        self.state.read().as_ref().map_or(0, |state| state.ids.len())
    }

    fn dimension(&self) -> Option<usize> {
        self.state.read().as_ref().map(|state| state.dimension)
    }

    fn wipe(&self) -> Result<(), VectorIndexError> {
        let mut guard = self.state.write();
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed vector index file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove vector index file");
                    return Err(e.into());
                }
            }
        }
        *guard = None;
        Ok(())
    }
}
