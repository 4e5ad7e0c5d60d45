//! # OpenAI API client
//!
//! Thin wrapper around [async-openai] for streamed chat completion.
//! Yields content deltas as they arrive, tool calls once their streamed fragments are
//! assembled, and the final token usage. Provides token masking for safe logging.

use async_openai::types::{
    ChatCompletionResponseStream, ChatCompletionStreamOptions, CreateChatCompletionRequestArgs,
    CreateChatCompletionStreamResponse,
};
use async_openai::Client;
use futures::{Stream, StreamExt};
use std::collections::{BTreeMap, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use tracing;

pub use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContentPart, ChatCompletionTool, ChatCompletionToolArgs,
    ChatCompletionToolType, FunctionCall, FunctionObjectArgs, ImageUrlArgs,
};

/// API key reduced to its first 7 and last 4 characters for logs; keys of 11 characters or
/// fewer are hidden entirely.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

/// A tool call assembled from streamed fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Token usage reported with the last chunk of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One event of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Text appended to the assistant reply.
    Content(String),
    /// All tool calls requested in this response, emitted once when the stream ends.
    ToolCalls(Vec<AssembledToolCall>),
    /// Usage for the whole request.
    Usage(Usage),
}

pub type EventStream = Pin<Box<dyn Stream<Item = anyhow::Result<StreamEvent>> + Send>>;

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Merges streamed tool-call fragments by their `index`.
///
/// The first fragment of a call carries its id and name; later fragments append to the arguments.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    calls: BTreeMap<u32, PartialToolCall>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) {
        let call = self.calls.entry(index).or_default();
        if let Some(id) = id.filter(|s| !s.is_empty()) {
            call.id = Some(id.to_string());
        }
        if let Some(name) = name {
            call.name.push_str(name);
        }
        if let Some(args) = arguments {
            call.arguments.push_str(args);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Returns the assembled calls in index order. Calls without an id get a generated one.
    pub fn finish(&mut self) -> Vec<AssembledToolCall> {
        std::mem::take(&mut self.calls)
            .into_values()
            .filter(|c| !c.name.is_empty())
            .map(|c| AssembledToolCall {
                id: c
                    .id
                    .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple())),
                name: c.name,
                arguments: if c.arguments.trim().is_empty() {
                    "{}".to_string()
                } else {
                    c.arguments
                },
            })
            .collect()
    }
}

struct StreamState {
    inner: ChatCompletionResponseStream,
    tool_calls: ToolCallAssembler,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

impl StreamState {
    fn absorb(&mut self, chunk: CreateChatCompletionStreamResponse) {
        if let Some(ref u) = chunk.usage {
            tracing::info!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "OpenAI chat_completion_stream usage"
            );
            self.pending.push_back(StreamEvent::Usage(Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }));
        }
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                self.pending.push_back(StreamEvent::Content(content));
            }
            for fragment in choice.delta.tool_calls.unwrap_or_default() {
                let function = fragment.function.as_ref();
                self.tool_calls.push(
                    fragment.index as u32,
                    fragment.id.as_deref(),
                    function.and_then(|f| f.name.as_deref()),
                    function.and_then(|f| f.arguments.as_deref()),
                );
            }
        }
    }

    fn flush_tool_calls(&mut self) {
        if !self.tool_calls.is_empty() {
            let calls = self.tool_calls.finish();
            tracing::info!(count = calls.len(), "OpenAI chat_completion_stream tool calls");
            if !calls.is_empty() {
                self.pending.push_back(StreamEvent::ToolCalls(calls));
            }
        }
    }
}

/// OpenAI chat client. Wraps async-openai client; optionally holds API key for masked logging.
#[derive(Clone)]
pub struct OpenAIClient {
    /// Shared async-openai client used for all API calls.
    client: Arc<Client<async_openai::config::OpenAIConfig>>,
    /// API key stored only for logging (masked). None when created via `with_client()`.
    api_key_for_logging: Option<String>,
}

impl OpenAIClient {
    /// Builds a client using the given API key and default API base URL.
    pub fn new(api_key: String) -> Self {
        let api_key_for_logging = Some(api_key.clone());
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging,
        }
    }

    /// Builds a client with a custom base URL (e.g. for proxies or compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let api_key_for_logging = Some(api_key.clone());
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging,
        }
    }

    /// Builds a client from an existing async-openai client (no API key stored for logging).
    pub fn with_client(client: Client<async_openai::config::OpenAIConfig>) -> Self {
        Self {
            client: Arc::new(client),
            api_key_for_logging: None,
        }
    }

    /// Starts a streamed chat completion and returns its events.
    ///
    /// Usage is requested through stream options, so the last chunk carries the token counts.
    /// `tools` may be empty (plain completion). Errors opening the stream are returned directly;
    /// errors during the stream end it with one `Err` item.
    pub async fn chat_completion_stream(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
        temperature: Option<f32>,
    ) -> anyhow::Result<EventStream> {
        let masked = self
            .api_key_for_logging
            .as_deref()
            .map(mask_token)
            .unwrap_or_else(|| "***".to_string());

        tracing::info!(
            model = %model,
            message_count = messages.len(),
            tool_count = tools.len(),
            temperature = ?temperature,
            api_key = %masked,
            "OpenAI chat_completion_stream request"
        );

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(messages)
            .stream_options(ChatCompletionStreamOptions {
                include_usage: true,
            });
        if !tools.is_empty() {
            args.tools(tools);
        }
        if let Some(t) = temperature {
            args.temperature(t);
        }
        let request = args.build()?;

        if let Ok(json) = serde_json::to_string(&request) {
            tracing::debug!(request_json = %json, "OpenAI chat_completion_stream request JSON");
        }

        let inner = self.client.chat().create_stream(request).await?;
        let state = StreamState {
            inner,
            tool_calls: ToolCallAssembler::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        let events = futures::stream::unfold(state, |mut st| async move {
            loop {
                if let Some(event) = st.pending.pop_front() {
                    return Some((Ok(event), st));
                }
                if st.finished {
                    return None;
                }
                match st.inner.next().await {
                    Some(Ok(chunk)) => st.absorb(chunk),
                    Some(Err(e)) => {
                        st.finished = true;
                        return Some((Err(anyhow::anyhow!("Stream error: {}", e)), st));
                    }
                    None => {
                        st.finished = true;
                        st.flush_tool_calls();
                    }
                }
            }
        });

        Ok(Box::pin(events))
    }
}
