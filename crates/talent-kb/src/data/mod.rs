//! Core data structures for the candidate knowledge base

pub mod identifiers;
pub mod entities;
pub mod filters;
pub mod errors;

// Re-export all common types
pub use identifiers::CandidateId;
pub use entities::{Candidate, CandidateProfile, EducationEntry, ExperienceEntry, JobQuery};
pub use filters::{BrowseFilter, PageRequest, BrowsePage};
pub use errors::{CoreError, StateStoreError, VectorIndexError};
