//! Process-local vector index.
//!
//! Entries live in a map from document identity to that document's entries in
//! insertion order. Search is an exact linear scan over one document, so ties
//! keep insertion order.

use crate::types::{IndexEntry, Result, RetrievalResult, RetrievedChunk};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::vectorstore::{
    cosine_similarity, validate_dimensions, validate_document_id, validate_k, VectorIndex,
};

pub struct InMemoryVectorIndex {
    dimensions: usize,
    documents: Arc<RwLock<HashMap<String, Vec<IndexEntry>>>>,
}

impl InMemoryVectorIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of entries held for `document_id`.
    pub fn entry_count(&self, document_id: &str) -> usize {
        self.documents
            .read()
            .get(document_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        // Validate everything before touching the map.
        let mut grouped: HashMap<String, Vec<IndexEntry>> = HashMap::new();
        for entry in entries {
            validate_document_id(&entry.payload.document_id)?;
            validate_dimensions(self.dimensions, &entry.vector, "entry vector")?;
            grouped
                .entry(entry.payload.document_id.clone())
                .or_default()
                .push(entry);
        }

        let count = grouped.values().map(Vec::len).sum();
        let mut documents = self.documents.write();
        for (document_id, entries) in grouped {
            documents.insert(document_id, entries);
        }

        Ok(count)
    }

    async fn search(
        &self,
        document_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<RetrievalResult> {
        validate_k(k)?;

        let documents = self.documents.read();
        let entries = match documents.get(document_id) {
            Some(entries) if !entries.is_empty() => entries,
            _ => return Ok(RetrievalResult::empty(document_id)),
        };
        validate_dimensions(self.dimensions, query, "query vector")?;

        let mut scored: Vec<(f32, &IndexEntry)> = entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.vector), entry))
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(RetrievalResult {
            document_id: document_id.to_string(),
            chunks: scored
                .into_iter()
                .map(|(score, entry)| RetrievedChunk {
                    text: entry.payload.text.clone(),
                    score,
                    sequence_index: entry.payload.sequence_index,
                })
                .collect(),
        })
    }

    async fn remove_document(&self, document_id: &str) -> Result<usize> {
        let removed = self.documents.write().remove(document_id);
        Ok(removed.map(|entries| entries.len()).unwrap_or(0))
    }

    async fn documents(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.documents.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn contains_document(&self, document_id: &str) -> Result<bool> {
        Ok(self
            .documents
            .read()
            .get(document_id)
            .is_some_and(|entries| !entries.is_empty()))
    }
}

// ============================================================================
// Tests
// ============================================================================
