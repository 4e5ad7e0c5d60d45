//! # Memory Core
//!
//! Core types and traits for long-term associative memory.
//! Used by the `memory` crate and the vector store backends.
//!
//! ## Modules
//!
//! - [`types`] - MemoryFragment, FragmentMetadata, SearchHit, MetadataFilter
//! - [`store`] - VectorStore trait (similarity search, add, metadata update)
//! - [`scoring`] - DecayParams and the time-decayed retrieval score
//! - [`clock`] - Clock trait, system and manual clocks
//! - [`error`] - MemoryError

pub mod clock;
pub mod error;
pub mod scoring;
pub mod store;
pub mod types;

pub use clock::*;
pub use error::*;
pub use scoring::*;
pub use store::*;
pub use types::*;
