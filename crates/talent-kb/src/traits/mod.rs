//! Core traits (interfaces) for the candidate knowledge base

pub mod attribute_store;
pub mod vector_index;
mod embedding_generator;

pub use attribute_store::AttributeStore;
pub use vector_index::{IndexSearch, IndexStatus, Neighbor, VectorIndex};
pub use embedding_generator::EmbeddingGenerator;
