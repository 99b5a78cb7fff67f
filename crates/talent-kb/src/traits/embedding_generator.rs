//! EmbeddingGenerator trait definition for vector embeddings

use async_trait::async_trait;
use crate::data::errors::CoreError;

/// Converts text into a fixed-width vector.
///
/// Implementations must be deterministic for a given model and text, and
/// must return vectors of one width for the life of an index.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Generates an embedding vector for the given text.
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError>;

    /// Generates embeddings for several texts, in input order.
    ///
    /// The default calls `generate_embedding` once per text; remote
    /// providers override it to batch the request.
    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.generate_embedding(text).await?);
        }
        Ok(embeddings)
    }

    /// Width of the vectors this generator produces, when known up front.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}
