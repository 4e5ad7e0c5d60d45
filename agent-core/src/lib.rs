//! # agent-core
//!
//! Core types and traits shared by the agent, its tools and its hosts: the [`AgentError`]
//! taxonomy, turn input/output types ([`Trigger`], [`InvokeInput`], [`OutputChunk`],
//! [`ToolResult`]), the [`Tool`] trait, and tracing initialization. Transport-agnostic.

pub mod error;
pub mod logger;
pub mod tool;
pub mod types;

pub use error::{AgentError, Result};
pub use logger::init_tracing;
pub use tool::{required_str, Tool, ToolError, ToolOutput};
pub use types::{
    Attachment, InvokeInput, OutputChunk, PendingToolResults, ToolPayload, ToolResult,
    ToolResultKind, Trigger,
};
