//! Error types for the candidate knowledge base

use thiserror::Error;

/// Base error type for repository operations.
///
/// Store-layer errors are wrapped transparently so callers see them
/// unchanged; use the `is_*` helpers to classify without matching on the
/// nesting.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    StateStore(#[from] StateStoreError),

    #[error(transparent)]
    VectorIndex(#[from] VectorIndexError),

    #[error("Serialization/Deserialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Embedding generation error: {0}")]
    EmbeddingError(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Repository busy: {0}")]
    Busy(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True when the attribute store rejected a write on a unique constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, CoreError::StateStore(StateStoreError::ConstraintViolation(_)))
    }

    /// True when a vector did not match the index's established width.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, CoreError::VectorIndex(VectorIndexError::DimensionMismatch { .. }))
    }

    /// True when a non-blocking ingest was turned away.
    pub fn is_busy(&self) -> bool {
        matches!(self, CoreError::Busy(_))
    }
}

/// Errors raised by the relational attribute store.
#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    #[error("Query execution error: {0}")]
    QueryError(String),
    #[error("Data mapping error from row: {0}")]
    MappingError(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Attribute store not initialized: {0}")]
    NotInitialized(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StateStoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StateStoreError::ConstraintViolation(db_err.message().to_string())
            }
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => StateStoreError::MappingError(error.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StateStoreError::ConnectionError(error.to_string())
            }
            _ => StateStoreError::QueryError(error.to_string()),
        }
    }
}

/// Errors raised by the vector index.
#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Vector dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Vector already indexed for candidate {0}")]
    DuplicateId(i64),
    #[error("Cannot index an empty vector")]
    EmptyVector,
    #[error("Index file is corrupt: {0}")]
    Corrupt(String),
    #[error("Index encoding error: {0}")]
    Encoding(String),
    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for VectorIndexError {
    fn from(error: bincode::Error) -> Self {
        match *error {
            bincode::ErrorKind::Io(io) => VectorIndexError::Io(io),
            other => VectorIndexError::Encoding(other.to_string()),
        }
    }
}
