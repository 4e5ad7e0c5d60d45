//! Context compaction: condenses the conversation into one summary system message.

use anyhow::Result;
use chrono::{DateTime, Local};
use llm_client::{complete_to_end, ChatModel, CompletionRequest};
use prompt::ChatMessage;
use std::sync::Arc;
use tracing::{info, instrument};

pub const SUMMARY_TEMPERATURE: f32 = 0.3;

/// A finished summary and the tokens it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    /// Completion tokens of the summary call; 0 when the backend reported none.
    pub tokens_consumed: u32,
}

pub struct Summarizer {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            temperature: SUMMARY_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Summarizes the user and assistant turns of `messages`.
    #[instrument(skip_all, fields(message_count = messages.len()))]
    pub async fn summarize(&self, messages: &[ChatMessage]) -> Result<Summary> {
        let request = CompletionRequest::new(prompt::summary_request(messages))
            .with_temperature(self.temperature);
        let completion = complete_to_end(self.model.as_ref(), request).await?;
        let tokens_consumed = completion.usage.map(|u| u.completion_tokens).unwrap_or(0);
        info!(
            summary_len = completion.content.len(),
            tokens_consumed,
            "step: context summarized"
        );
        Ok(Summary {
            text: completion.content.trim().to_string(),
            tokens_consumed,
        })
    }
}

/// The compacted context: the system prompt followed by the wrapped summary.
pub fn compacted_context(system_prompt: &str, summary: &str, at: DateTime<Local>) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::system(prompt::wrap_context_summary(summary, at)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use llm_client::{CompletionEvent, CompletionStream, TokenUsage};
    use prompt::MessageRole;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<CompletionRequest>>,
        usage: Option<TokenUsage>,
    }

    #[async_trait]
    impl ChatModel for Recording {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionStream> {
            self.seen.lock().unwrap().push(request);
            let mut events = vec![Ok(CompletionEvent::ContentDelta(" Alex asked about tea. ".into()))];
            if let Some(u) = self.usage {
                events.push(Ok(CompletionEvent::Usage(u)));
            }
            Ok(Box::pin(stream::iter(events)))
        }
    }

    #[tokio::test]
    async fn summary_uses_low_temperature_and_completion_tokens() {
        let model = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            usage: Some(TokenUsage {
                prompt_tokens: 900,
                completion_tokens: 42,
                total_tokens: 942,
            }),
        });
        let summarizer = Summarizer::new(model.clone());
        let summary = summarizer
            .summarize(&[
                ChatMessage::system("sys"),
                ChatMessage::user("Alex: which tea?"),
                ChatMessage::tool("call_1", "noise"),
                ChatMessage::assistant("Try oolong."),
            ])
            .await
            .unwrap();
        assert_eq!(summary.text, "Alex asked about tea.");
        assert_eq!(summary.tokens_consumed, 42);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, Some(SUMMARY_TEMPERATURE));
        assert!(seen[0].tools.is_empty());
        let transcript = &seen[0].messages[1].content;
        assert!(transcript.contains("user: Alex: which tea?"));
        assert!(transcript.contains("assistant: Try oolong."));
        assert!(!transcript.contains("noise"));
        assert!(!transcript.contains("sys"));
    }

    #[tokio::test]
    async fn missing_usage_costs_zero() {
        let model = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            usage: None,
        });
        let summary = Summarizer::new(model).summarize(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(summary.tokens_consumed, 0);
    }

    #[test]
    fn compacted_context_has_two_system_messages() {
        let ctx = compacted_context("sys", "they talked", Local::now());
        assert_eq!(ctx.len(), 2);
        assert!(ctx.iter().all(|m| m.role == MessageRole::System));
        assert_eq!(ctx[0].content, "sys");
        assert!(prompt::is_context_summary(&ctx[1].content));
    }
}
