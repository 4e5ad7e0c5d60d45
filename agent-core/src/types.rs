//! Turn input and output types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// What started a call to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A person wrote to the agent; the input becomes a user message.
    UserMessage,
    /// A timer or other host event; the input (if any) becomes a system note.
    Scheduled,
}

/// Non-text payload of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "url", rename_all = "snake_case")]
pub enum Attachment {
    /// http(s) or `data:` URL of an already-encoded image.
    Image(String),
}

/// Optional text plus attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeInput {
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl InvokeInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.trim().is_empty()) && self.attachments.is_empty()
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.attachments
            .iter()
            .map(|a| match a {
                Attachment::Image(url) => url.clone(),
            })
            .collect()
    }
}

impl From<&str> for InvokeInput {
    fn from(text: &str) -> Self {
        InvokeInput::text(text)
    }
}

impl From<String> for InvokeInput {
    fn from(text: String) -> Self {
        InvokeInput::text(text)
    }
}

/// Discriminator of a [`ToolResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultKind {
    Text,
    Image,
    Audio,
    File,
}

/// Content of a tool result, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum ToolPayload {
    Text(String),
    /// http(s) or `data:` URL.
    Image(String),
    Audio(PathBuf),
    File(PathBuf),
}

impl ToolPayload {
    pub fn kind(&self) -> ToolResultKind {
        match self {
            ToolPayload::Text(_) => ToolResultKind::Text,
            ToolPayload::Image(_) => ToolResultKind::Image,
            ToolPayload::Audio(_) => ToolResultKind::Audio,
            ToolPayload::File(_) => ToolResultKind::File,
        }
    }
}

/// A structured result produced by a tool for the caller of the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    /// Unique within one accumulation cycle (one turn).
    pub invocation_id: String,
    #[serde(flatten)]
    pub payload: ToolPayload,
}

impl ToolResult {
    pub fn new(tool_name: impl Into<String>, invocation_id: impl Into<String>, payload: ToolPayload) -> Self {
        Self {
            tool_name: tool_name.into(),
            invocation_id: invocation_id.into(),
            payload,
        }
    }

    pub fn kind(&self) -> ToolResultKind {
        self.payload.kind()
    }
}

/// One item of an agent's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    /// Text delta of the assistant reply.
    Text(String),
    Tool(ToolResult),
}

/// Tool results of the current turn, keyed by invocation id. The first result for an id wins.
#[derive(Debug, Clone, Default)]
pub struct PendingToolResults {
    results: Vec<ToolResult>,
    seen: HashSet<String>,
}

impl PendingToolResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and drops `result`) when its invocation id is already present.
    pub fn merge(&mut self, result: ToolResult) -> bool {
        if !self.seen.insert(result.invocation_id.clone()) {
            return false;
        }
        self.results.push(result);
        true
    }

    pub fn contains(&self, invocation_id: &str) -> bool {
        self.seen.contains(invocation_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolResult> {
        self.results.iter()
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: &str, body: &str) -> ToolResult {
        ToolResult::new("t", id, ToolPayload::Text(body.into()))
    }

    #[test]
    fn duplicate_invocation_id_keeps_first() {
        let mut pending = PendingToolResults::new();
        assert!(pending.merge(text("call_1", "first")));
        assert!(!pending.merge(text("call_1", "second")));
        assert!(pending.merge(text("call_2", "other")));
        assert_eq!(pending.len(), 2);
        let first = pending.iter().next().unwrap();
        assert_eq!(first.payload, ToolPayload::Text("first".into()));

        pending.clear();
        assert!(pending.is_empty());
        assert!(!pending.contains("call_1"));
    }

    #[test]
    fn tool_result_serializes_with_kind_tag() {
        let r = ToolResult::new("generate_image", "call_1_0", ToolPayload::Image("https://x/y.png".into()));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["content"], "https://x/y.png");
        assert_eq!(json["invocation_id"], "call_1_0");
        assert_eq!(r.kind(), ToolResultKind::Image);
    }

    #[test]
    fn input_emptiness() {
        assert!(InvokeInput::default().is_empty());
        assert!(InvokeInput::text("  ").is_empty());
        let with_image = InvokeInput::default().with_attachment(Attachment::Image("data:image/png;base64,AA".into()));
        assert!(!with_image.is_empty());
        assert_eq!(with_image.image_urls().len(), 1);
    }
}
