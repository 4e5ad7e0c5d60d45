//! Tool dispatch: resolves model tool calls against the registered tools and runs them
//! concurrently. A failing or unknown tool becomes error text for the model, never an error
//! of the turn.

use agent_core::{PendingToolResults, Tool, ToolError, ToolResult};
use futures::stream::{FuturesUnordered, StreamExt};
use llm_client::ToolSpec;
use prompt::ToolCall;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedCall {
    pub call_id: String,
    pub tool_name: String,
    /// Content of the tool message for the model.
    pub feedback: String,
    pub results: Vec<ToolResult>,
}

/// The tools available to one agent, by name.
#[derive(Clone, Default)]
pub struct ToolDispatcher {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, for stable tool specs.
    order: Vec<String>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool`, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Runs `calls` concurrently and returns their outcomes in completion order.
    #[instrument(skip_all, fields(count = calls.len()))]
    pub async fn dispatch(&self, calls: Vec<ToolCall>) -> Vec<DispatchedCall> {
        let mut running: FuturesUnordered<_> = calls
            .into_iter()
            .map(|call| self.run_one(call))
            .collect();
        let mut done = Vec::new();
        while let Some(outcome) = running.next().await {
            done.push(outcome);
        }
        done
    }

    async fn run_one(&self, call: ToolCall) -> DispatchedCall {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "step: unknown tool requested");
            return DispatchedCall {
                feedback: ToolError::Execution(format!("unknown tool '{}'", call.name)).to_string(),
                call_id: call.id,
                tool_name: call.name,
                results: Vec::new(),
            };
        };

        let arguments = match parse_arguments(&call.arguments) {
            Ok(v) => v,
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "step: tool arguments rejected");
                return DispatchedCall {
                    feedback: e.to_string(),
                    call_id: call.id,
                    tool_name: call.name,
                    results: Vec::new(),
                };
            }
        };

        info!(tool = %call.name, call_id = %call.id, "step: tool executing");
        match tool.execute(arguments, &call.id).await {
            Ok(output) => {
                info!(
                    tool = %call.name,
                    call_id = %call.id,
                    results = output.results.len(),
                    "step: tool finished"
                );
                DispatchedCall {
                    call_id: call.id,
                    tool_name: call.name,
                    feedback: output.feedback,
                    results: output.results,
                }
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "step: tool failed");
                DispatchedCall {
                    call_id: call.id,
                    tool_name: call.name,
                    feedback: e.to_string(),
                    results: Vec::new(),
                }
            }
        }
    }
}

fn parse_arguments(raw: &str) -> Result<serde_json::Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ToolError::Validation(format!("arguments are not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ToolError::Validation("arguments must be a JSON object".into()));
    }
    Ok(value)
}

/// Drops calls whose id was already seen in `calls`, keeping the first.
pub fn dedup_calls(calls: Vec<ToolCall>) -> Vec<ToolCall> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(c.id.clone());
            if !fresh {
                warn!(call_id = %c.id, "step: duplicate tool call dropped");
            }
            fresh
        })
        .collect()
}

/// Merges `results` into `pending`, returning the ones that were new.
pub fn merge_results(
    pending: &mut PendingToolResults,
    results: impl IntoIterator<Item = ToolResult>,
) -> Vec<ToolResult> {
    results
        .into_iter()
        .filter_map(|r| {
            if pending.merge(r.clone()) {
                Some(r)
            } else {
                info!(invocation_id = %r.invocation_id, "step: duplicate tool result dropped");
                None
            }
        })
        .collect()
}
