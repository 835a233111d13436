//! Ingest and retrieval over one vector index.
//!
//! Ingest walks a document through
//! `Uploaded -> Chunked -> Embedded -> Indexed -> Ready`. A failure at any
//! step aborts the ingest with [`AppError::Indexing`] naming the state that
//! could not be reached; the document's previous version stays live until
//! the index swap succeeds.

use crate::db::VectorIndex;
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{AppError, Chunk, IndexEntry, IngestReport, IngestState, Result, RetrievalResult};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OwnedMutexGuard;

type LockTable = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Exclusive hold on one document identity.
///
/// Releasing it removes the document's table entry when nobody else is
/// waiting for it.
struct DocumentLock<'a> {
    table: &'a LockTable,
    document_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DocumentLock<'_> {
    fn drop(&mut self) {
        let mut table = self.table.lock();
        drop(self.guard.take());
        if table
            .get(&self.document_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.document_id);
        }
    }
}

pub struct RetrievalPipeline {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
    max_chunk_bytes: usize,
    /// One lock per document identity; ingests of the same document queue up.
    ingest_locks: LockTable,
}

impl RetrievalPipeline {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: TextChunker,
        max_chunk_bytes: usize,
    ) -> Result<Self> {
        if index.dimensions() != embedder.dimensions() {
            return Err(AppError::Configuration(format!(
                "{} index expects {}-dimensional vectors but {} produces {}",
                index.provider_name(),
                index.dimensions(),
                embedder.provider_name(),
                embedder.dimensions()
            )));
        }
        if max_chunk_bytes == 0 {
            return Err(AppError::Configuration(
                "max chunk bytes must be positive".into(),
            ));
        }

        Ok(Self {
            index,
            embedder,
            chunker,
            max_chunk_bytes,
            ingest_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    async fn lock_document(&self, document_id: &str) -> DocumentLock<'_> {
        let lock = self
            .ingest_locks
            .lock()
            .entry(document_id.to_string())
            .or_default()
            .clone();
        let guard = lock.lock_owned().await;

        DocumentLock {
            table: &self.ingest_locks,
            document_id: document_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of documents with an ingest or removal in progress or queued.
    pub fn pending_locks(&self) -> usize {
        self.ingest_locks.lock().len()
    }

    /// Chunk, embed and index `pages` as the new content of `document_id`.
    pub async fn ingest(&self, document_id: &str, pages: &[String]) -> Result<IngestReport> {
        if document_id.trim().is_empty() {
            return Err(AppError::Validation("document identity must not be empty".into()));
        }

        let _lock = self.lock_document(document_id).await;
        let start = Instant::now();

        tracing::debug!(document_id, state = %IngestState::Uploaded, pages = pages.len(), "Ingest started");

        let (chunks, discarded) =
            partition_oversized(self.chunker.chunk_document(document_id, pages), self.max_chunk_bytes);
        let max_chunk_len = chunks.iter().map(|c| c.text.chars().count()).max().unwrap_or(0);

        if discarded > 0 {
            tracing::warn!(
                document_id,
                discarded,
                max_chunk_bytes = self.max_chunk_bytes,
                "Discarded oversized chunks"
            );
        }
        tracing::debug!(document_id, state = %IngestState::Chunked, chunks = chunks.len(), max_chunk_len, "Chunked document");

        let chunks_indexed = if chunks.is_empty() {
            self.index
                .remove_document(document_id)
                .await
                .map_err(|e| e.at_stage(IngestState::Indexed))?;
            0
        } else {
            let entries = self
                .embed_chunks(&chunks)
                .await
                .map_err(|e| e.at_stage(IngestState::Embedded))?;
            tracing::debug!(document_id, state = %IngestState::Embedded, vectors = entries.len(), "Embedded chunks");

            self.index
                .upsert(entries)
                .await
                .map_err(|e| e.at_stage(IngestState::Indexed))?
        };
        tracing::debug!(document_id, state = %IngestState::Indexed, chunks = chunks_indexed, "Indexed chunks");

        let report = IngestReport {
            document_id: document_id.to_string(),
            chunks_indexed,
            chunks_discarded: discarded,
            max_chunk_len,
            duration_ms: start.elapsed().as_millis() as u64,
            indexed_at: Utc::now(),
        };

        tracing::info!(
            document_id,
            state = %IngestState::Ready,
            chunks = report.chunks_indexed,
            discarded = report.chunks_discarded,
            max_chunk_len = report.max_chunk_len,
            duration_ms = report.duration_ms,
            index = self.index.provider_name(),
            "Document ingested"
        );

        Ok(report)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<IndexEntry>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(AppError::provider(
                self.embedder.provider_name(),
                format!(
                    "expected {} embeddings, received {}",
                    chunks.len(),
                    vectors.len()
                ),
            ));
        }

        Ok(chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry::from_chunk(chunk, vector))
            .collect())
    }

    /// The `k` chunks of `document_id` closest to `query`.
    ///
    /// An unknown document yields an empty result without embedding the query.
    pub async fn retrieve(&self, document_id: &str, query: &str, k: usize) -> Result<RetrievalResult> {
        if !self.index.contains_document(document_id).await? {
            tracing::debug!(document_id, "Unknown document, nothing to retrieve");
            return Ok(RetrievalResult::empty(document_id));
        }

        let start = Instant::now();
        let vector = self.embedder.embed_query(query).await?;
        let result = self.index.search(document_id, &vector, k).await?;

        tracing::debug!(
            document_id,
            k,
            results = result.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Retrieved context"
        );

        Ok(result)
    }

    /// Drop every indexed chunk of `document_id`.
    pub async fn remove(&self, document_id: &str) -> Result<usize> {
        let _lock = self.lock_document(document_id).await;

        let removed = self.index.remove_document(document_id).await?;
        tracing::info!(document_id, removed, "Document removed");
        Ok(removed)
    }

    pub async fn documents(&self) -> Result<Vec<String>> {
        self.index.documents().await
    }
}

/// Split off chunks larger than `max_bytes`, returning the rest and the number dropped.
fn partition_oversized(chunks: Vec<Chunk>, max_bytes: usize) -> (Vec<Chunk>, usize) {
    let total = chunks.len();
    let kept: Vec<Chunk> = chunks
        .into_iter()
        .filter(|c| !c.text.is_empty() && c.text.len() <= max_bytes)
        .collect();
    let discarded = total - kept.len();
    (kept, discarded)
}
