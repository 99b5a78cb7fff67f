//! Talent Knowledge Base
//!
//! Hybrid retrieval over candidate profiles: structured attributes live in a
//! relational store, one embedding per profile lives in a vector index, and
//! [`CandidateRepository`] keeps the two joined by candidate id.

// Core modules
pub mod config;
pub mod data;
pub mod embedding;
pub mod services;
pub mod storage;
pub mod traits;

// Testing utilities - shared with the integration tests
pub mod test_utils;

// Re-export key types for convenient usage
pub use config::KbConfig;
pub use data::errors::{CoreError, StateStoreError, VectorIndexError};
pub use data::identifiers::CandidateId;
pub use data::entities::{Candidate, CandidateProfile, EducationEntry, ExperienceEntry, JobQuery};
pub use data::filters::{BrowseFilter, BrowsePage, PageRequest};

// Re-export core traits
pub use traits::{AttributeStore, EmbeddingGenerator, IndexSearch, IndexStatus, Neighbor, VectorIndex};

// Re-export storage and embedding implementations
pub use storage::{FlatFileIndex, SqliteAttributeStore};
#[cfg(feature = "embed-openai")]
pub use embedding::OpenAIEmbeddingGenerator;
pub use embedding::{create_embedding_generator, EmbeddingConfig, HashingEmbeddingGenerator};

// Re-export core services
pub use services::{
    load_profiles, BatchFailure, BatchReport, CandidateHit, CandidateRepository, CandidateSearch,
    ConsistencyReport,
};

/// Initialize tracing for the knowledge base
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
    }
}
