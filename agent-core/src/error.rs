use memory_core::MemoryError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Required setup (model binding, memory binding) has not completed.
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The model or retrieval backend is unreachable or failing.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A tool's own failure; reported to the model as text, never aborts a turn.
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Agent is shut down")]
    ShutDown,
}

impl AgentError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        AgentError::BackendUnavailable(err.to_string())
    }
}

impl From<MemoryError> for AgentError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::Validation(msg) => AgentError::Validation(msg),
            MemoryError::Backend(e) => AgentError::BackendUnavailable(format!("{:#}", e)),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
