use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::io;

use crate::data::errors::{CoreError, VectorIndexError};
use crate::traits::{EmbeddingGenerator, IndexSearch, VectorIndex};

/// Embedding generator returning preset vectors.
///
/// Texts registered with [`with_text`](Self::with_text) get their own vector;
/// every other text gets the default.
#[derive(Debug, Clone)]
pub struct FixedEmbeddingGenerator {
    default: Vec<f32>,
    by_text: HashMap<String, Vec<f32>>,
}

impl FixedEmbeddingGenerator {
    pub fn new(default: Vec<f32>) -> Self {
        Self {
            default,
            by_text: HashMap::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.by_text.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingGenerator for FixedEmbeddingGenerator {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        Ok(self.by_text.get(text).unwrap_or(&self.default).clone())
    }
}

#[derive(Default)]
struct ScriptState {
    result: Option<IndexSearch>,
    fail_appends: bool,
    fail_wipes: bool,
    appended: Vec<(i64, Vec<f32>)>,
}

/// Vector index whose search answer is scripted ahead of time.
///
/// Appends are recorded (or rejected with a dimension mismatch when built
/// with [`failing_appends`](Self::failing_appends)) but never influence the
/// scripted search result. [`failing_wipes`](Self::failing_wipes) makes
/// `wipe` fail with a permission error and leave everything in place.
pub struct ScriptedVectorIndex {
    state: Mutex<ScriptState>,
}

impl ScriptedVectorIndex {
    pub fn with_result(result: IndexSearch) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                result: Some(result),
                ..Default::default()
            }),
        }
    }

    pub fn failing_appends() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                fail_appends: true,
                ..Default::default()
            }),
        }
    }

    pub fn failing_wipes(mut self) -> Self {
        self.state.get_mut().fail_wipes = true;
        self
    }

    /// Vectors accepted so far, in append order.
    pub fn appended(&self) -> Vec<(i64, Vec<f32>)> {
        self.state.lock().appended.clone()
    }
}

impl fmt::Debug for ScriptedVectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedVectorIndex").finish()
    }
}

impl VectorIndex for ScriptedVectorIndex {
    fn append(&self, id: i64, vector: &[f32]) -> Result<(), VectorIndexError> {
        let mut state = self.state.lock();
        if state.fail_appends {
            return Err(VectorIndexError::DimensionMismatch {
                expected: vector.len() + 1,
                actual: vector.len(),
            });
        }
        state.appended.push((id, vector.to_vec()));
        Ok(())
    }

    fn search(&self, _query: &[f32], k: usize) -> Result<IndexSearch, VectorIndexError> {
        let state = self.state.lock();
        let mut result = state.result.clone().unwrap_or_else(IndexSearch::unavailable);
        result.neighbors.truncate(k);
        Ok(result)
    }

    fn ids(&self) -> Result<Vec<i64>, VectorIndexError> {
        Ok(self.state.lock().appended.iter().map(|(id, _)| *id).collect())
    }

    fn len(&self) -> usize {
        self.state.lock().appended.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.state.lock().appended.first().map(|(_, v)| v.len())
    }

    fn wipe(&self) -> Result<(), VectorIndexError> {
        let mut state = self.state.lock();
        if state.fail_wipes {
            return Err(VectorIndexError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "index file is read-only",
            )));
        }
        state.appended.clear();
        state.result = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Neighbor;

    #[tokio::test]
    async fn test_fixed_generator() {
        let generator = FixedEmbeddingGenerator::new(vec![0.0, 1.0]).with_text("special", vec![1.0, 0.0]);
        assert_eq!(generator.generate_embedding("special").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(generator.generate_embedding("other").await.unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_scripted_index_truncates_to_k() {
        let index = ScriptedVectorIndex::with_result(IndexSearch::ready(vec![
            Neighbor { id: 1, distance: 0.0 },
            Neighbor { id: 2, distance: 1.0 },
        ]));
        assert_eq!(index.search(&[], 1).unwrap().neighbors.len(), 1);
        index.append(5, &[1.0]).unwrap();
        assert_eq!(index.ids().unwrap(), vec![5]);
        assert_eq!(index.appended(), vec![(5, vec![1.0])]);
    }

    #[test]
    fn test_failing_wipe_keeps_vectors() {
        let index = ScriptedVectorIndex::failing_appends().failing_wipes();
        assert!(matches!(index.wipe(), Err(VectorIndexError::Io(_))));

        let index = ScriptedVectorIndex::with_result(IndexSearch::unavailable()).failing_wipes();
        index.append(3, &[0.5]).unwrap();
        assert!(index.wipe().is_err());
        assert_eq!(index.ids().unwrap(), vec![3]);
    }
}
