//! # Agent
//!
//! The conversation controller and the components it sequences:
//!
//! - [`controller`] - [`Agent`]: single-flight turns, pending-input queue, tool loop
//! - [`state`] - conversation record and busy flag
//! - [`budget`] - token budget check that triggers compaction
//! - [`summarizer`] - context compaction into one summary message
//! - [`memorizer`] - long-term memory extraction before compaction
//! - [`dispatcher`] - tool dispatch with invocation-id dedup
//! - [`split`] - re-chunking of streamed reply text
//! - [`commands`] - `/help`, `/context`, `/token`
//! - [`registry`] - one agent per conversation id

pub mod budget;
pub mod commands;
pub mod controller;
pub mod dispatcher;
pub mod memorizer;
pub mod registry;
pub mod split;
pub mod state;
pub mod summarizer;

pub use budget::{over_budget, DEFAULT_TOKEN_LIMIT};
pub use commands::{handle_command, parse_command, Command};
pub use controller::{render_context, Agent, AgentBuilder, AgentSettings, AgentStream};
pub use dispatcher::{DispatchedCall, ToolDispatcher};
pub use memorizer::Memorizer;
pub use registry::AgentRegistry;
pub use split::{split_stream, TextSplitter};
pub use state::{ConversationState, PendingInput};
pub use summarizer::{Summarizer, Summary};
