//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`rag::loader`](crate::rag::loader) - PDF bytes to per-page text
//! - [`rag::chunker`](crate::rag::chunker) - Overlapping character windows
//! - [`rag::embeddings`](crate::rag::embeddings) - OpenAI-compatible embeddings
//! - [`rag::pipeline`](crate::rag::pipeline) - Ingest and retrieval over a vector index
//! - [`rag::analytics`](crate::rag::analytics) - Word frequencies for the upload response
//!
//! # RAG Pipeline
//!
//! 1. **Extraction** - PDF text is pulled out page by page
//! 2. **Chunking** - Pages are cut into overlapping windows
//! 3. **Embedding** - Every chunk becomes a vector
//! 4. **Indexing** - The document's previous chunks are replaced
//! 5. **Retrieval** - The question is embedded and the closest chunks returned
//!
//! # Example
//!
//! ```ignore
//! use pdfchat::rag::{chunker::TextChunker, pipeline::RetrievalPipeline};
//!
//! let pipeline = RetrievalPipeline::new(index, embedder, TextChunker::new(500, 100)?, 4000)?;
//! pipeline.ingest("handbook.pdf", &pages).await?;
//! let context = pipeline.retrieve("handbook.pdf", "What is the refund policy?", 3).await?;
//! ```

pub mod analytics;
pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod pipeline;

pub use chunker::TextChunker;
pub use embeddings::{EmbeddingProvider, OpenAIEmbeddings};
pub use loader::PdfLoader;
pub use pipeline::RetrievalPipeline;
