//! Services for the candidate knowledge base

pub mod loader;
pub mod repository;

// Re-exports
pub use loader::{load_profiles, read_profiles};
pub use repository::{
    BatchFailure, BatchReport, CandidateHit, CandidateRepository, CandidateSearch,
    ConsistencyReport,
};
