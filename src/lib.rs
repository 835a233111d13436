//! # PDFChat - Retrieval-augmented chat over uploaded PDFs
//!
//! Upload a PDF, have its text chunked, embedded and indexed, then ask
//! questions that are answered from the most relevant chunks with a streamed
//! language-model response.
//!
//! ## Overview
//!
//! PDFChat can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `pdfchat-server` binary
//! 2. **As a library** - Drive the retrieval pipeline from your own code
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use pdfchat::{db::VectorIndexProvider, rag::{OpenAIEmbeddings, RetrievalPipeline, TextChunker}};
//! use std::sync::Arc;
//!
//! let embedder = Arc::new(OpenAIEmbeddings::from_config(&config.openai));
//! let index = VectorIndexProvider::InMemory.create_index(1536).await?;
//! let pipeline = RetrievalPipeline::new(index, embedder, TextChunker::new(500, 100)?, 4000)?;
//!
//! pipeline.ingest("handbook.pdf", &pages).await?;
//! let context = pipeline.retrieve("handbook.pdf", "What is the refund policy?", 3).await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `qdrant` | Qdrant vector index (default) |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`chat`] - Prompt assembly and answer streaming
//! - [`db`] - Vector indexes (in-memory, Qdrant)
//! - [`llm`] - Chat completion clients
//! - [`rag`] - Extraction, chunking, embeddings and the retrieval pipeline
//! - [`types`] - Common types and error handling
//! - [`utils`] - Environment configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Chat orchestration over the retrieval pipeline.
pub mod chat;
/// Vector index backends.
pub mod db;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use chat::{ChatOrchestrator, ChatStream};
pub use db::{VectorIndex, VectorIndexProvider};
pub use llm::{LLMClient, Provider};
pub use rag::{EmbeddingProvider, RetrievalPipeline, TextChunker};
pub use types::{AppError, Result};
pub use utils::config::Config;

use rag::OpenAIEmbeddings;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Environment-derived configuration
    pub config: Arc<Config>,
    /// Ingest and retrieval over the vector index
    pub pipeline: Arc<RetrievalPipeline>,
    /// Prompt assembly and completion streaming
    pub orchestrator: Arc<ChatOrchestrator>,
}

impl AppState {
    /// Wire the pipeline and orchestrator from explicit components.
    pub fn new(
        config: Config,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LLMClient>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
        let pipeline = Arc::new(RetrievalPipeline::new(
            index,
            embedder,
            chunker,
            config.rag.max_chunk_bytes,
        )?);
        let orchestrator = Arc::new(ChatOrchestrator::new(
            pipeline.clone(),
            llm,
            config.openai.chat_model.clone(),
            config.rag.top_k,
            config.rag.stream_buffer,
        ));

        Ok(Self {
            config: Arc::new(config),
            pipeline,
            orchestrator,
        })
    }

    /// Build every component from configuration, connecting to external services.
    pub async fn from_config(config: Config) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbeddings::from_config(&config.openai));
        let provider = VectorIndexProvider::from_config(&config.vector)?;
        let index = provider
            .create_index(config.openai.embedding_dimensions)
            .await?;
        let llm = Provider::from_config(&config.openai).create_client();

        tracing::info!(
            index = provider.name(),
            embedding_model = %config.openai.embedding_model,
            chat_model = %config.openai.chat_model,
            "Components initialised"
        );

        Self::new(config, index, embedder, llm)
    }
}
