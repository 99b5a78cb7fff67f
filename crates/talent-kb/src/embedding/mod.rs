use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::CoreError;
use crate::traits::EmbeddingGenerator;

mod openai;

#[cfg(feature = "embed-openai")]
pub use openai::OpenAIEmbeddingGenerator;

/// Default width, matching the small sentence-embedding models.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// Local, dependency-free embedder using the hashing trick.
///
/// Lowercased word unigrams and bigrams are hashed (FNV-1a) into buckets
/// with a hash-derived sign, then the vector is L2-normalised. Texts that
/// share vocabulary land close together. Output is stable across runs and
/// builds.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingGenerator {
    dimensions: usize,
}

impl HashingEmbeddingGenerator {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn fnv1a(bytes: impl IntoIterator<Item = u8>) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash
    }

    fn add_feature(&self, embedding: &mut [f32], feature: u64, weight: f32) {
        let bucket = (feature % self.dimensions as u64) as usize;
        let sign = if (feature >> 63) == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        for token in &tokens {
            self.add_feature(&mut embedding, Self::fnv1a(token.bytes()), 1.0);
        }
        for pair in tokens.windows(2) {
            let joined = pair[0].bytes().chain(std::iter::once(b' ')).chain(pair[1].bytes());
            self.add_feature(&mut embedding, Self::fnv1a(joined), 0.5);
        }

        let magnitude: f32 = embedding.iter().map(|&v| v * v).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        embedding
    }
}

impl Default for HashingEmbeddingGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingGenerator for HashingEmbeddingGenerator {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        Ok(self.embed(text))
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}

/// Configuration for embedding providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum EmbeddingConfig {
    /// Local hashing embedder
    Hashing { dimensions: usize },
    /// OpenAI embeddings API (requires the `embed-openai` feature)
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(default, skip_serializing)]
        api_key: String,
        model: String,
    },
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::Hashing {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

/// Create an embedding generator from the provided configuration
pub fn create_embedding_generator(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingGenerator>, CoreError> {
    match config {
        EmbeddingConfig::Hashing { dimensions } => {
            if *dimensions == 0 {
                return Err(CoreError::ConfigurationError(
                    "embedding dimensions must be greater than zero".to_string(),
                ));
            }
            Ok(Arc::new(HashingEmbeddingGenerator::new(*dimensions)))
        }
        #[cfg(feature = "embed-openai")]
        EmbeddingConfig::OpenAI { api_key, model } => {
            if api_key.is_empty() {
                return Err(CoreError::ConfigurationError(
                    "OPENAI_API_KEY is required for the openai provider".to_string(),
                ));
            }
            Ok(Arc::new(OpenAIEmbeddingGenerator::new(api_key.clone(), model.clone())))
        }
        #[cfg(not(feature = "embed-openai"))]
        EmbeddingConfig::OpenAI { .. } => Err(CoreError::UnsupportedOperation(
            "OpenAI embeddings require the 'embed-openai' feature".to_string(),
        )),
    }
}
