//! # Prompt
//!
//! Chat message model shared by the agent, the LLM client and the summarizer, plus the
//! fixed prompt fragments that wrap context for the model.
//!
//! ## Format
//!
//! - **Transcript**: `user: {content}` / `assistant: {content}` lines (system and tool messages excluded)
//! - **Context summary**: `<context_summary summary_time=YYYY-MM-DD HH:MM>\n{summary}\n</context_summary>`
//! - **Recalled memories**: `<memory>[relative time] content\n---\n...</memory>`
//! - **Current time**: `<current_time>YYYY-MM-DD HH:MM</current_time>`
//!
//! ## External interactions
//!
//! - **AI models**: Output is sent to LLM APIs (OpenAI-compatible chat completions).

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

mod relative_time;

pub use relative_time::relative_time_label;

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
    /// Tool result answering one tool call (API `role: "tool"`).
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// A structured tool invocation requested by the model. `arguments` is the raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Image attachments of a user message (http(s) or data URLs).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Id of the tool call a tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: Vec::new(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    /// User message carrying image attachments alongside its text.
    pub fn user_with_images(content: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            images,
            ..Self::plain(MessageRole::User, content)
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// Assistant message that requests tool calls (content may be empty).
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(MessageRole::Assistant, content)
        }
    }

    /// Tool message answering the call with `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(MessageRole::Tool, content)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Default system instruction when no custom system prompt is configured.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Instruction given to the model when compacting the context.
pub const SUMMARY_INSTRUCTION: &str = "You are a summary assistant. \
Your ONLY task is to produce a concise summary of the following conversation in its original language. \
Do NOT extend the dialogue, answer questions, or generate new sentences. \
Output the summary and NOTHING else. \
Use the nickname from the message prefix in place of \"user\", and replace \"assistant\" with \"you\".";

/// Instruction given to the model when extracting long-term memories from a conversation.
pub const MEMORIZE_INSTRUCTION: &str = "You are a memory extraction assistant. \
Extract the information from the following conversation between the user and the agent that is worth keeping in long-term memory. \
Rephrase each item as one or two short sentences from the agent's point of view, using \"I\" for the agent. \
You may pick several items or none. \
Reply with JSON only, in the form {\"items\": [{\"content\": string, \"type\": string, \"importance\": number}]}, \
where type is a label such as preference, fact or event and importance is between 0.0 and 1.0 \
(1.0 is never forgotten, 0.0 is forgotten at once). Reply {\"items\": []} when nothing is worth remembering.";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const SUMMARY_OPEN_TAG: &str = "<context_summary";
const SUMMARY_CLOSE_TAG: &str = "</context_summary>";
const MEMORY_SEPARATOR: &str = "\n---\n";

/// Serializes the human/assistant turns of `messages` as `role: content` lines.
///
/// System and tool messages are excluded, as are assistant messages without text (pure tool-call turns).
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wraps a transcript in `<conversation>` tags.
pub fn wrap_conversation(transcript: &str) -> String {
    format!("<conversation>\n{}\n</conversation>", transcript)
}

/// Builds the two-message request sent to the model to summarize `messages`.
pub fn summary_request(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUMMARY_INSTRUCTION),
        ChatMessage::user(wrap_conversation(&format_transcript(messages))),
    ]
}

/// Builds the request used to extract memorable items from `messages`.
pub fn memorize_request(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(MEMORIZE_INSTRUCTION),
        ChatMessage::user(wrap_conversation(&format_transcript(messages))),
    ]
}

/// Wraps a summary in the context-summary delimiter, stamped with `at`.
pub fn wrap_context_summary(summary: &str, at: DateTime<Local>) -> String {
    format!(
        "{} summary_time={}>\n{}\n{}",
        SUMMARY_OPEN_TAG,
        at.format(TIME_FORMAT),
        summary.trim(),
        SUMMARY_CLOSE_TAG
    )
}

/// True when `content` is a context summary produced by [`wrap_context_summary`].
pub fn is_context_summary(content: &str) -> bool {
    content.starts_with(SUMMARY_OPEN_TAG) && content.trim_end().ends_with(SUMMARY_CLOSE_TAG)
}

/// Transient note telling the model the current local time.
pub fn current_time_note(at: DateTime<Local>) -> String {
    format!("<current_time>{}</current_time>", at.format(TIME_FORMAT))
}

/// Formats recalled memories as one `<memory>` block; `None` when there is nothing to show.
///
/// Each item is `(created_at_secs, content)`; the timestamp is rendered relative to `now_secs`.
pub fn format_memory_block<S: AsRef<str>>(items: &[(i64, S)], now_secs: i64) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let body = items
        .iter()
        .map(|(ts, content)| format!("[{}] {}", relative_time_label(*ts, now_secs), content.as_ref()))
        .collect::<Vec<_>>()
        .join(MEMORY_SEPARATOR);
    Some(format!("<memory>{}</memory>", body))
}
