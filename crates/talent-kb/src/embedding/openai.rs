#[cfg(feature = "embed-openai")]
use async_openai::{
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client, config::OpenAIConfig,
};
#[cfg(feature = "embed-openai")]
use async_trait::async_trait;

#[cfg(feature = "embed-openai")]
use crate::data::CoreError;
#[cfg(feature = "embed-openai")]
use crate::traits::EmbeddingGenerator;

/// Embeddings from the OpenAI embeddings endpoint.
#[cfg(feature = "embed-openai")]
pub struct OpenAIEmbeddingGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

#[cfg(feature = "embed-openai")]
impl OpenAIEmbeddingGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);
        Self { client, model }
    }
}

#[cfg(feature = "embed-openai")]
#[async_trait]
impl EmbeddingGenerator for OpenAIEmbeddingGenerator {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()
            .map_err(|e| CoreError::EmbeddingError(e.to_string()))?;

        let response = self.client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| CoreError::EmbeddingError(e.to_string()))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CoreError::EmbeddingError("empty embedding response".to_string()))
    }

    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| CoreError::EmbeddingError(e.to_string()))?;

        let response = self.client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| CoreError::EmbeddingError(e.to_string()))?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        if data.len() != texts.len() {
            return Err(CoreError::EmbeddingError(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                data.len()
            )));
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(all(test, feature = "embed-openai"))]
mod tests {
    use super::*;
    use dotenv::dotenv;
    use std::env;

    #[tokio::test]
    async fn test_generate_embeddings() {
        dotenv().ok();
        let api_key = match env::var("OPENAI_API_KEY") {
            Ok(key) => key,
            Err(_) => {
                eprintln!("Skipping test: OPENAI_API_KEY not set");
                return;
            }
        };

        let generator = OpenAIEmbeddingGenerator::new(api_key, "text-embedding-3-small".to_string());
        let texts = vec!["ICU nurse".to_string(), "Staff accountant".to_string()];
        match generator.generate_embeddings(&texts).await {
            Ok(embeddings) => {
                assert_eq!(embeddings.len(), 2);
                assert_eq!(embeddings[0].len(), embeddings[1].len());
            }
            Err(err) => eprintln!("OpenAI API error: {}", err),
        }
    }
}
