//! Long-term memory extraction before compaction.
//!
//! The model reads the transcript and answers `{"items": [{"content", "type", "importance"}]}`.
//! Items are stored in one batch through [`MemoryStore::store`].

use anyhow::{Context, Result};
use llm_client::{complete_to_end, ChatModel, CompletionRequest};
use memory::{MemoryStore, DEFAULT_IMPORTANCE, DEFAULT_MEMORY_TYPE};
use prompt::ChatMessage;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

pub const MEMORIZE_TEMPERATURE: f32 = 1.0;

#[derive(Debug, Deserialize)]
struct ExtractedItems {
    #[serde(default)]
    items: Vec<ExtractedItem>,
}

#[derive(Debug, Deserialize)]
struct ExtractedItem {
    content: String,
    #[serde(rename = "type", default)]
    memory_type: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
}

pub struct Memorizer {
    model: Arc<dyn ChatModel>,
    store: Arc<MemoryStore>,
}

impl Memorizer {
    pub fn new(model: Arc<dyn ChatModel>, store: Arc<MemoryStore>) -> Self {
        Self { model, store }
    }

    /// Extracts and stores memories from `messages`; returns the new fragment ids.
    #[instrument(skip_all, fields(message_count = messages.len()))]
    pub async fn memorize(&self, messages: &[ChatMessage]) -> Result<Vec<String>> {
        if prompt::format_transcript(messages).is_empty() {
            return Ok(Vec::new());
        }
        let request = CompletionRequest::new(prompt::memorize_request(messages))
            .with_temperature(MEMORIZE_TEMPERATURE);
        let completion = complete_to_end(self.model.as_ref(), request).await?;
        let items = parse_items(&completion.content)?;
        if items.is_empty() {
            info!("step: nothing worth remembering");
            return Ok(Vec::new());
        }

        let mut contents = Vec::with_capacity(items.len());
        let mut types = Vec::with_capacity(items.len());
        let mut importances = Vec::with_capacity(items.len());
        for item in items {
            contents.push(item.content);
            types.push(item.memory_type.unwrap_or_else(|| DEFAULT_MEMORY_TYPE.to_string()));
            importances.push(
                item.importance
                    .filter(|i| i.is_finite())
                    .map(|i| i.clamp(0.0, 1.0))
                    .unwrap_or(DEFAULT_IMPORTANCE),
            );
        }
        let ids = self.store.store(contents, types, importances).await?;
        info!(count = ids.len(), "step: memories extracted");
        Ok(ids)
    }
}

/// Parses the model reply, tolerating a surrounding code fence. Blank items are skipped.
fn parse_items(reply: &str) -> Result<Vec<ExtractedItem>> {
    let body = strip_code_fence(reply.trim());
    let parsed: ExtractedItems =
        serde_json::from_str(body).with_context(|| format!("unparseable memory reply: {}", reply))?;
    Ok(parsed
        .items
        .into_iter()
        .filter(|i| !i.content.trim().is_empty())
        .collect())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_fenced_replies() {
        let plain = r#"{"items":[{"content":"I know Alex likes oolong","type":"preference","importance":0.7}]}"#;
        let items = parse_items(plain).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].memory_type.as_deref(), Some("preference"));

        let fenced = "```json\n{\"items\": [{\"content\": \"x\"}, {\"content\": \"  \"}]}\n```";
        let items = parse_items(fenced).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].importance.is_none());

        assert!(parse_items("{\"items\": []}").unwrap().is_empty());
        assert!(parse_items("sure, here you go").is_err());
    }
}
