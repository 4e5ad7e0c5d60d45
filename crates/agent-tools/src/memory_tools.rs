//! Tools over the memory store: deliberate recall and explicit remembering.

use agent_core::{required_str, Tool, ToolError, ToolOutput};
use async_trait::async_trait;
use memory::{
    format_recalled, Clock, MemoryError, MemoryStore, RecallSession, DEFAULT_IMPORTANCE,
    DEFAULT_MEMORY_TYPE,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Deliberate recall is looser than spontaneous association.
pub const DELIBERATE_RECALL_THRESHOLD: f64 = 0.6;
pub const DELIBERATE_RECALL_K: usize = 5;

fn to_tool_error(err: MemoryError) -> ToolError {
    match err {
        MemoryError::Validation(msg) => ToolError::Validation(msg),
        MemoryError::Backend(e) => ToolError::Execution(format!("memory backend failed: {}", e)),
    }
}

/// Searches long-term memory through one conversation's [`RecallSession`].
pub struct RecallMemoryTool {
    session: Arc<RecallSession>,
    k: usize,
    threshold: f64,
}

impl RecallMemoryTool {
    pub const NAME: &'static str = "recall_memory";

    pub fn new(session: Arc<RecallSession>) -> Self {
        Self {
            session,
            k: DELIBERATE_RECALL_K,
            threshold: DELIBERATE_RECALL_THRESHOLD,
        }
    }

    pub fn with_limits(mut self, k: usize, threshold: f64) -> Self {
        self.k = k;
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl Tool for RecallMemoryTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Search your long-term memory for things related to a query."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "What to remember"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value, _invocation_id: &str) -> Result<ToolOutput, ToolError> {
        let query = required_str(&arguments, "query")?;
        let recalled = self
            .session
            .retrieve(query, self.k, self.threshold, None)
            .await
            .map_err(to_tool_error)?;
        let now = self.session.store().clock().now_secs();
        Ok(ToolOutput::text(
            format_recalled(&recalled, now).unwrap_or_else(|| "No related memories found.".to_string()),
        ))
    }
}

/// Stores one memory fragment chosen by the model.
pub struct RememberTool {
    store: Arc<MemoryStore>,
}

impl RememberTool {
    pub const NAME: &'static str = "remember";

    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RememberTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Save something worth keeping in long-term memory."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {"type": "string", "description": "One or two sentences, from your point of view"},
                "type": {"type": "string", "description": "Label such as preference, fact or event"},
                "importance": {
                    "type": "number",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "description": "1.0 is never forgotten, 0.0 is forgotten at once"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, arguments: Value, _invocation_id: &str) -> Result<ToolOutput, ToolError> {
        let content = required_str(&arguments, "content")?;
        let memory_type = match arguments.get("type") {
            None | Some(Value::Null) => DEFAULT_MEMORY_TYPE,
            Some(v) => v
                .as_str()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| ToolError::Validation("'type' must be a non-empty string".into()))?,
        };
        let importance = match arguments.get("importance") {
            None | Some(Value::Null) => DEFAULT_IMPORTANCE,
            Some(v) => v
                .as_f64()
                .ok_or_else(|| ToolError::Validation("'importance' must be a number".into()))?,
        };
        let ids = self
            .store
            .store(content, memory_type, importance)
            .await
            .map_err(to_tool_error)?;
        Ok(ToolOutput::text(format!(
            "Remembered ({}).",
            ids.first().map(String::as_str).unwrap_or_default()
        )))
    }
}
