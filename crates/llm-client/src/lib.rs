//! # LLM client abstraction
//!
//! Defines the [`ChatModel`] capability consumed by the agent: given an ordered message list
//! (and optionally tool specs and a temperature), produce a stream of content deltas, tool-call
//! requests and a final usage report. [`OpenAIChatModel`] implements it over `openai-client`.
//!
//! The trait is object-safe so the agent can hold `Arc<dyn ChatModel>` and tests can script
//! their own models.

use anyhow::Result;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use openai_client::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContentPart, ChatCompletionTool, ChatCompletionToolArgs,
    ChatCompletionToolType, FunctionCall, FunctionObjectArgs, ImageUrlArgs,
};
use prompt::{ChatMessage, MessageRole, ToolCall};
use std::pin::Pin;

mod config;
mod openai_llm;

pub use config::{EnvLlmConfig, LlmConfig};
pub use openai_llm::OpenAIChatModel;

/// Token counts reported by the backend for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A tool the model may call: name, description and JSON-schema parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Empty means plain completion (no tool-augmented mode).
    pub tools: Vec<ToolSpec>,
    /// Overrides the model's default temperature when set.
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// One item of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionEvent {
    ContentDelta(String),
    ToolCalls(Vec<ToolCall>),
    Usage(TokenUsage),
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionEvent>> + Send>>;

/// Chat completion capability: streamed deltas, tool-call requests and a final usage report.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Starts a completion. Failing to reach the backend is an `Err`; failures mid-stream
    /// are `Err` items of the returned stream.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionStream>;
}

/// A completion drained into its final shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// `None` when the backend did not report usage.
    pub usage: Option<TokenUsage>,
}

/// Runs `request` and collects the whole stream. Used where no incremental output is needed
/// (summaries, memory extraction).
pub async fn complete_to_end(model: &dyn ChatModel, request: CompletionRequest) -> Result<Completion> {
    let mut stream = model.complete(request).await?;
    let mut completion = Completion::default();
    while let Some(event) = stream.next().await {
        match event? {
            CompletionEvent::ContentDelta(delta) => completion.content.push_str(&delta),
            CompletionEvent::ToolCalls(calls) => completion.tool_calls.extend(calls),
            CompletionEvent::Usage(usage) => completion.usage = Some(usage),
        }
    }
    Ok(completion)
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User if msg.images.is_empty() => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => {
            let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> = Vec::new();
            if !content.is_empty() {
                parts.push(
                    ChatCompletionRequestMessageContentPartTextArgs::default()
                        .text(content)
                        .build()?
                        .into(),
                );
            }
            for url in &msg.images {
                parts.push(
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(ImageUrlArgs::default().url(url.clone()).build()?)
                        .build()?
                        .into(),
                );
            }
            ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()?
                .into()
        }
        MessageRole::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !content.is_empty() || msg.tool_calls.is_empty() {
                args.content(content);
            }
            if !msg.tool_calls.is_empty() {
                let calls: Vec<ChatCompletionMessageToolCall> = msg
                    .tool_calls
                    .iter()
                    .map(|c| ChatCompletionMessageToolCall {
                        id: c.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect();
                args.tool_calls(calls);
            }
            args.build()?.into()
        }
        MessageRole::Tool => ChatCompletionRequestToolMessageArgs::default()
            .content(content)
            .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
            .build()?
            .into(),
    };
    Ok(openai_msg)
}

/// Converts a [`ToolSpec`] into the OpenAI function-tool definition.
fn tool_spec_to_openai(spec: &ToolSpec) -> Result<ChatCompletionTool> {
    Ok(ChatCompletionToolArgs::default()
        .r#type(ChatCompletionToolType::Function)
        .function(
            FunctionObjectArgs::default()
                .name(spec.name.clone())
                .description(spec.description.clone())
                .parameters(spec.parameters.clone())
                .build()?,
        )
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct ScriptedModel(Vec<CompletionEvent>);

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionStream> {
            let events: Vec<Result<CompletionEvent>> = self.0.clone().into_iter().map(Ok).collect();
            Ok(Box::pin(stream::iter(events)))
        }
    }

    #[tokio::test]
    async fn complete_to_end_collects_all_events() {
        let model = ScriptedModel(vec![
            CompletionEvent::ContentDelta("Hel".into()),
            CompletionEvent::ContentDelta("lo".into()),
            CompletionEvent::ToolCalls(vec![ToolCall {
                id: "call_1".into(),
                name: "recall_memory".into(),
                arguments: "{}".into(),
            }]),
            CompletionEvent::Usage(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 2,
                total_tokens: 12,
            }),
        ]);
        let done = complete_to_end(&model, CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(done.content, "Hello");
        assert_eq!(done.tool_calls.len(), 1);
        assert_eq!(done.usage.unwrap().total_tokens, 12);
    }

    #[test]
    fn converts_every_role() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "play_sound".into(),
            arguments: "{\"file_name\":\"a.wav\"}".into(),
        };
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("hi"),
            ChatMessage::user_with_images("see", vec!["https://example.com/a.png".into()]),
            ChatMessage::assistant_with_tool_calls("", vec![call]),
            ChatMessage::tool("call_1", "played"),
            ChatMessage::assistant("done"),
        ];
        for m in &messages {
            assert!(chat_message_to_openai(m).is_ok(), "failed on {:?}", m.role);
        }
        match chat_message_to_openai(&messages[4]).unwrap() {
            ChatCompletionRequestMessage::Tool(t) => assert_eq!(t.tool_call_id, "call_1"),
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn converts_tool_spec() {
        let spec = ToolSpec {
            name: "recall_memory".into(),
            description: "Recall".into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        };
        let tool = tool_spec_to_openai(&spec).unwrap();
        assert_eq!(tool.function.name, "recall_memory");
    }
}
