//! # Agent tools
//!
//! Concrete [`Tool`](agent_core::Tool) implementations:
//!
//! - [`GenerateImageTool`] - `generate_image {prompt}`, image results for the caller
//! - [`PlaySoundTool`] - `play_sound {file_name}`, a file result for a local sound effect
//! - [`RecallMemoryTool`] - `recall_memory {query}`, deliberate recall through the conversation's session
//! - [`RememberTool`] - `remember {content, type?, importance?}`, stores a memory fragment

mod image;
mod memory_tools;
mod sound;

pub use image::GenerateImageTool;
pub use memory_tools::{RecallMemoryTool, RememberTool, DELIBERATE_RECALL_K, DELIBERATE_RECALL_THRESHOLD};
pub use sound::PlaySoundTool;
