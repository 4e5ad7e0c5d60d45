//! [`ChatModel`] over openai-client: converts messages and tool specs, maps stream events.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use openai_client::StreamEvent;
use prompt::ToolCall;
use tracing::instrument;

use super::{
    chat_message_to_openai, tool_spec_to_openai, ChatModel, CompletionEvent, CompletionRequest,
    CompletionStream, LlmConfig, TokenUsage,
};

/// OpenAI-compatible chat model. The conversation's system prompt travels in the messages.
#[derive(Clone)]
pub struct OpenAIChatModel {
    client: openai_client::OpenAIClient,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIChatModel {
    pub fn new(api_key: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::new(api_key),
            model: "gpt-4o-mini".to_string(),
            temperature: None,
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model: "gpt-4o-mini".to_string(),
            temperature: None,
        }
    }

    pub fn from_config(config: &dyn LlmConfig) -> Self {
        Self::with_base_url(config.api_key().to_string(), config.base_url().to_string())
            .with_model(config.model().to_string())
            .with_temperature_opt(config.temperature())
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Default temperature, used when a request does not set its own.
    pub fn with_temperature_opt(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn map_event(event: StreamEvent) -> CompletionEvent {
    match event {
        StreamEvent::Content(text) => CompletionEvent::ContentDelta(text),
        StreamEvent::ToolCalls(calls) => CompletionEvent::ToolCalls(
            calls
                .into_iter()
                .map(|c| ToolCall {
                    id: c.id,
                    name: c.name,
                    arguments: c.arguments,
                })
                .collect(),
        ),
        StreamEvent::Usage(u) => CompletionEvent::Usage(TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionStream> {
        let messages = request
            .messages
            .iter()
            .map(chat_message_to_openai)
            .collect::<Result<Vec<_>>>()?;
        let tools = request
            .tools
            .iter()
            .map(tool_spec_to_openai)
            .collect::<Result<Vec<_>>>()?;
        let temperature = request.temperature.or(self.temperature);

        let events = self
            .client
            .chat_completion_stream(&self.model, messages, tools, temperature)
            .await?;
        Ok(Box::pin(events.map(|item| item.map(map_event))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_stream_events() {
        let calls = map_event(StreamEvent::ToolCalls(vec![openai_client::AssembledToolCall {
            id: "call_1".into(),
            name: "generate_image".into(),
            arguments: "{\"prompt\":\"cat\"}".into(),
        }]));
        assert_eq!(
            calls,
            CompletionEvent::ToolCalls(vec![ToolCall {
                id: "call_1".into(),
                name: "generate_image".into(),
                arguments: "{\"prompt\":\"cat\"}".into(),
            }])
        );
        assert_eq!(
            map_event(StreamEvent::Content("hi".into())),
            CompletionEvent::ContentDelta("hi".into())
        );
    }

    #[test]
    fn request_temperature_overrides_default() {
        let model = OpenAIChatModel::new("sk-test-key-123456".into()).with_temperature_opt(Some(0.9));
        let req = CompletionRequest::default().with_temperature(0.3);
        assert_eq!(req.temperature.or(model.temperature), Some(0.3));
        assert_eq!(model.model(), "gpt-4o-mini");
    }
}
