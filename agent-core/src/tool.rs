//! The [`Tool`] capability: a named operation the model can request.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::ToolResult;

/// What a tool hands back: text for the model, and results for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Content of the tool message sent back to the model.
    pub feedback: String,
    /// Results streamed to the caller of the agent.
    pub results: Vec<ToolResult>,
}

impl ToolOutput {
    pub fn text(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            results: Vec::new(),
        }
    }

    pub fn with_results(feedback: impl Into<String>, results: Vec<ToolResult>) -> Self {
        Self {
            feedback: feedback.into(),
            results,
        }
    }
}

/// A tool's failure, rendered as text for the model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Missing or malformed arguments.
    #[error("ValidationError: {0}")]
    Validation(String),

    #[error("ToolExecutionError: {0}")]
    Execution(String),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> serde_json::Value;

    /// Runs the tool. `invocation_id` is the model's tool-call id; results derive their ids from it.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        invocation_id: &str,
    ) -> Result<ToolOutput, ToolError>;
}

/// Reads a required string argument.
pub fn required_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::Validation(format!("missing required argument '{}'", key)))
}
