// Test doubles and fixtures shared by unit and integration tests
pub mod fakes;
pub mod fixtures;

// Re-export commonly used test utilities
pub use fakes::*;
pub use fixtures::*;
