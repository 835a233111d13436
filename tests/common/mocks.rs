//! Mock implementations for testing.
//!
//! Deterministic stand-ins for the embedding service and the completion
//! client, shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pdfchat::llm::{CompletionDelta, CompletionStream, LLMClient};
use pdfchat::rag::EmbeddingProvider;
use pdfchat::types::{AppError, ChatMessage, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============= Embeddings =============

/// Bag-of-words embedder: every lower-cased word is hashed into one of
/// `dimensions` buckets and the vector is normalised.
///
/// Texts sharing words end up close to each other, identical texts get
/// identical vectors.
pub struct MockEmbeddings {
    dimensions: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make subsequent `embed` calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddings {
    fn provider_name(&self) -> &'static str {
        "mock-embeddings"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::provider(self.provider_name(), "mock embedding failure"));
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

// ============= LLM =============

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Mock completion client yielding a scripted list of deltas.
///
/// Every request's model and messages are recorded. `None` entries produce
/// deltas without content.
#[derive(Clone)]
pub struct MockLLMClient {
    deltas: Vec<Option<String>>,
    should_fail: bool,
    fail_in_stream: bool,
    hang_after_deltas: bool,
    requests: Arc<Mutex<Vec<(String, Vec<ChatMessage>)>>>,
    stream_dropped: Arc<AtomicBool>,
}

impl MockLLMClient {
    pub fn new(deltas: &[&str]) -> Self {
        Self::with_deltas(deltas.iter().map(|d| Some(d.to_string())).collect())
    }

    pub fn with_deltas(deltas: Vec<Option<String>>) -> Self {
        Self {
            deltas,
            should_fail: false,
            fail_in_stream: false,
            hang_after_deltas: false,
            requests: Arc::new(Mutex::new(Vec::new())),
            stream_dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A client whose `stream_chat` always fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new(&[])
        }
    }

    /// A client that opens its stream but fails on the first item, the way
    /// an HTTP error status arrives through a streaming API.
    pub fn failing_stream() -> Self {
        Self {
            fail_in_stream: true,
            ..Self::new(&["never sent"])
        }
    }

    /// A client whose stream never finishes after its deltas.
    pub fn hanging(deltas: &[&str]) -> Self {
        Self {
            hang_after_deltas: true,
            ..Self::new(deltas)
        }
    }

    pub fn requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests.lock().clone()
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.requests
            .lock()
            .last()
            .map(|(_, messages)| messages.clone())
            .unwrap_or_default()
    }

    pub fn stream_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }

    /// Wait up to one second for the upstream stream to be dropped.
    pub async fn wait_for_drop(&self) -> bool {
        for _ in 0..100 {
            if self.stream_dropped() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.stream_dropped()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn stream_chat(&self, model: &str, messages: &[ChatMessage]) -> Result<CompletionStream> {
        self.requests
            .lock()
            .push((model.to_string(), messages.to_vec()));

        if self.should_fail {
            return Err(AppError::provider("mock", "Mock LLM failure"));
        }

        let deltas = self.deltas.clone();
        let fail_first = self.fail_in_stream;
        let hang = self.hang_after_deltas;
        let guard = DropFlag(self.stream_dropped.clone());

        let stream = async_stream::stream! {
            let _guard = guard;
            if fail_first {
                yield Err(AppError::provider("mock", "401 Unauthorized"));
                return;
            }
            for content in deltas {
                yield Ok(CompletionDelta { content, finish_reason: None });
            }
            if hang {
                futures::future::pending::<()>().await;
            }
        };

        Ok(Box::pin(stream))
    }
}
