//! # Memory Crate
//!
//! Long-term associative memory for the agent.
//!
//! [`MemoryStore`] wraps a [`VectorStore`](memory_core::VectorStore) backend and adds what the
//! backend does not know about: fragment creation with validated metadata, and retrieval that
//! re-ranks similarity hits by importance, recency and recall history
//! ([`DecayParams`](memory_core::DecayParams)). Each conversation holds a [`RecallSession`],
//! which owns the set of fragment ids already surfaced in the current episode so the same
//! memory is not injected twice before the context is compacted.
//!
//! ## Modules
//!
//! - [`store`] - MemoryStore (store / retrieve)
//! - [`input`] - OneOrMany arguments of `store`
//! - [`recall`] - RecallSession and RecalledSet

pub mod input;
pub mod recall;
pub mod store;

pub use input::OneOrMany;
pub use memory_core::*;
pub use recall::{RecallSession, RecalledSet};
pub use store::{format_recalled, MemoryStore, RecalledMemory, DEFAULT_IMPORTANCE, DEFAULT_MEMORY_TYPE};
