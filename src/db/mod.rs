//! Vector indexes.
//!
//! The following backends are supported:
//! - `memory` (default) - process-local exact search, lost on restart
//! - `qdrant` - external Qdrant server, shared collection filtered per document
//!
//! Qdrant support is behind the `qdrant` Cargo feature (enabled by default).

#![allow(missing_docs)]

// Index abstraction layer
pub mod vectorstore;

// Backend implementations
pub mod memory;
#[cfg(feature = "qdrant")]
pub mod qdrant;

// Re-exports
pub use memory::InMemoryVectorIndex;
pub use vectorstore::{cosine_similarity, VectorIndex, VectorIndexProvider};

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorIndex;
