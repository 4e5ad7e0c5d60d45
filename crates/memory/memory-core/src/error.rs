use thiserror::Error;

/// Failures of memory store operations.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Malformed arguments (mismatched list lengths, importance outside [0, 1]).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The vector store or embedding backend failed.
    #[error("Memory backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type MemoryResult<T> = std::result::Result<T, MemoryError>;
