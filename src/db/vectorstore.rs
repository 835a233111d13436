//! Vector Index Abstraction Layer
//!
//! Every index holds [`IndexEntry`] values grouped by document identity and
//! answers similarity queries restricted to a single document. Two backends
//! implement the trait and behave identically from the pipeline's point of
//! view:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    VectorIndex Trait                      │
//! ├──────────────────────────────────────────────────────────┤
//! │   upsert   │   search   │  remove_document  │ documents │
//! └──────────────────────────────────────────────────────────┘
//!          ▲                              ▲
//!   ┌──────┴───────┐              ┌───────┴──────┐
//!   │   InMemory   │              │    Qdrant    │
//!   │  (default)   │              │  (external)  │
//!   └──────────────┘              └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfchat::db::{VectorIndex, VectorIndexProvider};
//!
//! let index = VectorIndexProvider::InMemory.create_index(1536).await?;
//! index.upsert(entries).await?;
//! let result = index.search("handbook.pdf", &query_embedding, 3).await?;
//! ```

use crate::types::{AppError, IndexEntry, Result, RetrievalResult};
use crate::utils::config::{VectorBackend, VectorConfig};
use async_trait::async_trait;
use std::sync::Arc;

// ============================================================================
// Vector Index Provider Configuration
// ============================================================================

/// Configuration for vector index backends.
#[derive(Clone)]
pub enum VectorIndexProvider {
    /// Process-local index. Lost when the process exits.
    InMemory,

    /// Qdrant - High-performance vector search engine.
    ///
    /// Requires a running Qdrant server.
    #[cfg(feature = "qdrant")]
    Qdrant {
        /// Qdrant server URL (e.g., "http://localhost:6334").
        url: String,
        /// Optional API key for authentication.
        api_key: Option<String>,
        /// Collection shared by all documents.
        collection: String,
    },
}

impl VectorIndexProvider {
    pub fn from_config(config: &VectorConfig) -> Result<Self> {
        match config.backend {
            VectorBackend::Memory => Ok(VectorIndexProvider::InMemory),

            #[cfg(feature = "qdrant")]
            VectorBackend::Qdrant => Ok(VectorIndexProvider::Qdrant {
                url: config.qdrant_url.clone(),
                api_key: config.qdrant_api_key.clone(),
                collection: config.collection.clone(),
            }),

            #[cfg(not(feature = "qdrant"))]
            VectorBackend::Qdrant => Err(AppError::Configuration(
                "Qdrant support not enabled. Rebuild with the `qdrant` feature.".into(),
            )),
        }
    }

    /// Create an index whose vectors have exactly `dimensions` components.
    pub async fn create_index(&self, dimensions: usize) -> Result<Arc<dyn VectorIndex>> {
        match self {
            VectorIndexProvider::InMemory => {
                Ok(Arc::new(super::memory::InMemoryVectorIndex::new(dimensions)))
            }

            #[cfg(feature = "qdrant")]
            VectorIndexProvider::Qdrant {
                url,
                api_key,
                collection,
            } => {
                let index = super::qdrant::QdrantVectorIndex::connect(
                    url,
                    api_key.clone(),
                    collection,
                    dimensions,
                )
                .await?;
                Ok(Arc::new(index))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VectorIndexProvider::InMemory => "in-memory",
            #[cfg(feature = "qdrant")]
            VectorIndexProvider::Qdrant { .. } => "qdrant",
        }
    }
}

// ============================================================================
// Vector Index Trait
// ============================================================================

/// Abstract trait for per-document vector storage and search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Get the name of this index backend.
    fn provider_name(&self) -> &'static str;

    /// Dimension every stored and queried vector must have.
    fn dimensions(&self) -> usize;

    /// Replace the entries of every document present in `entries`.
    ///
    /// For each document the swap is all-or-nothing: a search sees either
    /// the complete previous set of entries or the complete new one.
    ///
    /// # Returns
    ///
    /// Number of entries written.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize>;

    /// Search one document's entries.
    ///
    /// # Arguments
    ///
    /// * `document_id` - Only entries of this document are considered.
    /// * `query` - Query vector.
    /// * `k` - Maximum number of results, at least 1.
    ///
    /// # Returns
    ///
    /// Entries ranked by descending cosine similarity. An unknown or empty
    /// document yields an empty result, not an error.
    async fn search(&self, document_id: &str, query: &[f32], k: usize)
        -> Result<RetrievalResult>;

    /// Delete every entry of a document.
    ///
    /// # Returns
    ///
    /// Number of entries removed (0 for an unknown document).
    async fn remove_document(&self, document_id: &str) -> Result<usize>;

    /// Identities of the documents currently held, sorted.
    async fn documents(&self) -> Result<Vec<String>>;

    /// Whether any entries of `document_id` are held.
    async fn contains_document(&self, document_id: &str) -> Result<bool>;
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Cosine similarity, 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

pub(crate) fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(AppError::Validation(
            "number of results (k) must be at least 1".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_dimensions(expected: usize, vector: &[f32], what: &str) -> Result<()> {
    if vector.len() != expected {
        return Err(AppError::Validation(format!(
            "{} has {} dimensions, index expects {}",
            what,
            vector.len(),
            expected
        )));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(AppError::Validation(format!(
            "{} contains non-finite components",
            what
        )));
    }
    Ok(())
}

pub(crate) fn validate_document_id(document_id: &str) -> Result<()> {
    if document_id.trim().is_empty() {
        return Err(AppError::Validation("document identity must not be empty".into()));
    }
    Ok(())
}
