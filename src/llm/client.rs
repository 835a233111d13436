//! Chat completion client abstraction.
//!
//! The orchestrator only needs one thing from a language model: open a
//! streamed completion for a list of messages. Anything speaking the OpenAI
//! chat completions protocol can sit behind [`LLMClient`].

use crate::types::{ChatMessage, Result};
use crate::utils::config::OpenAIConfig;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// One increment of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionDelta {
    /// Text produced since the previous delta, if any.
    pub content: Option<String>,
    /// Set on the last delta of a choice (e.g. "stop", "length").
    pub finish_reason: Option<String>,
}

impl CompletionDelta {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: None,
        }
    }

    /// The delta's text when it carries a non-empty one.
    pub fn non_empty_text(self) -> Option<String> {
        self.content.filter(|c| !c.is_empty())
    }
}

/// Lazily produced completion increments.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionDelta>> + Send>>;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Name used in logs and error messages.
    fn provider_name(&self) -> &'static str;

    /// Open a streamed completion.
    ///
    /// Returns once the upstream has accepted the request, so transport and
    /// authentication failures surface here rather than mid-stream.
    async fn stream_chat(&self, model: &str, messages: &[ChatMessage])
        -> Result<CompletionStream>;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API or any compatible server.
    OpenAI { api_key: String, api_base: String },
}

impl Provider {
    pub fn from_config(config: &OpenAIConfig) -> Self {
        Provider::OpenAI {
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
        }
    }

    /// Create a client instance for this provider
    pub fn create_client(&self) -> Arc<dyn LLMClient> {
        match self {
            Provider::OpenAI { api_key, api_base } => Arc::new(
                super::openai::OpenAIClient::new(api_key.clone(), api_base.clone()),
            ),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
        }
    }
}
