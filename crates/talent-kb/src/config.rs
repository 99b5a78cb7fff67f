//! Configuration for the candidate knowledge base
//!
//! Defaults are overridden from environment variables (a `.env` file is
//! honoured). Unparsable values are logged and ignored.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::embedding::{EmbeddingConfig, DEFAULT_EMBEDDING_DIMENSIONS};

const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// Knowledge base configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbConfig {
    /// SQLite database file for attribute records
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Vector index file
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Embedding provider
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Neighbours returned by a search when the caller does not say
    #[serde(default = "default_search_k")]
    pub search_k: usize,

    /// Browse page size when the caller does not say
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// SQLite pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("candidates.db")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("candidates.index")
}

fn default_search_k() -> usize {
    5
}

fn default_page_size() -> u32 {
    10
}

fn default_max_connections() -> u32 {
    5
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            index_path: default_index_path(),
            embedding: EmbeddingConfig::default(),
            search_k: default_search_k(),
            page_size: default_page_size(),
            max_connections: default_max_connections(),
        }
    }
}

impl KbConfig {
    /// Load configuration from `.env` and environment variables
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("TALENT_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("TALENT_INDEX_PATH") {
            config.index_path = PathBuf::from(path);
        }

        if let Some(k) = lookup("TALENT_SEARCH_K") {
            match k.parse::<usize>() {
                Ok(k) if k > 0 => config.search_k = k,
                _ => warn!("Invalid TALENT_SEARCH_K value: {}", k),
            }
        }

        if let Some(size) = lookup("TALENT_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(size) if size > 0 => config.page_size = size,
                _ => warn!("Invalid TALENT_PAGE_SIZE value: {}", size),
            }
        }

        if let Some(max) = lookup("TALENT_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) if max > 0 => config.max_connections = max,
                _ => warn!("Invalid TALENT_DB_MAX_CONNECTIONS value: {}", max),
            }
        }

        let mut dimensions = DEFAULT_EMBEDDING_DIMENSIONS;
        if let Some(dims) = lookup("TALENT_EMBEDDING_DIMENSIONS") {
            match dims.parse::<usize>() {
                Ok(dims) if dims > 0 => dimensions = dims,
                _ => warn!("Invalid TALENT_EMBEDDING_DIMENSIONS value: {}", dims),
            }
        }

        let provider = lookup("TALENT_EMBEDDING_PROVIDER").unwrap_or_else(|| "hashing".to_string());
        config.embedding = match provider.to_lowercase().as_str() {
            "hashing" => EmbeddingConfig::Hashing { dimensions },
            "openai" => EmbeddingConfig::OpenAI {
                api_key: lookup("OPENAI_API_KEY").unwrap_or_default(),
                model: lookup("TALENT_EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            other => {
                warn!("Unknown TALENT_EMBEDDING_PROVIDER value: {}, using hashing", other);
                EmbeddingConfig::Hashing { dimensions }
            }
        };

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = KbConfig::from_vars(vars(&[]));
        assert_eq!(config, KbConfig::default());
        assert_eq!(config.search_k, 5);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.embedding, EmbeddingConfig::Hashing { dimensions: 384 });
    }

    #[test]
    fn test_overrides() {
        let config = KbConfig::from_vars(vars(&[
            ("TALENT_DB_PATH", "/tmp/x.db"),
            ("TALENT_SEARCH_K", "8"),
            ("TALENT_EMBEDDING_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.search_k, 8);
        assert_eq!(
            config.embedding,
            EmbeddingConfig::OpenAI {
                api_key: "sk-test".to_string(),
                model: DEFAULT_OPENAI_MODEL.to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = KbConfig::from_vars(vars(&[
            ("TALENT_SEARCH_K", "zero"),
            ("TALENT_PAGE_SIZE", "0"),
            ("TALENT_EMBEDDING_DIMENSIONS", "-1"),
            ("TALENT_EMBEDDING_PROVIDER", "faiss"),
        ]));
        assert_eq!(config.search_k, 5);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.embedding, EmbeddingConfig::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: KbConfig = serde_json::from_str(r#"{"search_k": 3}"#).unwrap();
        assert_eq!(config.search_k, 3);
        assert_eq!(config.index_path, PathBuf::from("candidates.index"));
    }
}
