//! Store error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("LanceDB error: {0}")]
    Backend(String),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidEmbeddingDimension { expected: usize, actual: usize },

    #[error("Embedding backend error: {0}")]
    Embedding(#[from] marginalia_llm::LlmError),
}

impl From<lancedb::Error> for StoreError {
    fn from(err: lancedb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<arrow_schema::ArrowError> for StoreError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        StoreError::Arrow(err.to_string())
    }
}
